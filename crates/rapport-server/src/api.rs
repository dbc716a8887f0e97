use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rapport::services::{Deleted, Project, ProjectWithReports, Report};
use rapport::validation::{
    parse_update, parse_validated, project_schema, project_update_schema, report_schema,
    report_update_schema, PROJECT_UPDATE_FIELDS, REPORT_UPDATE_FIELDS,
};
use rapport::ApiResult;
use tower_http::cors::CorsLayer;

use crate::auth::{auth_middleware, TokenAuth};
use crate::dispatch::{with_dispatch, JsonBody};
use crate::state::AppState;

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "OK", "message": "Server is running" }))
}

// -- Projects --

async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.project_service.list().await?))
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectWithReports>> {
    Ok(Json(state.project_service.get(&id).await?))
}

async fn create_project(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let new = parse_validated(&project_schema(), &body)?;
    let project = state.project_service.create(new).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<Project>> {
    let update = parse_update(&project_update_schema(), PROJECT_UPDATE_FIELDS, &body)?;
    Ok(Json(state.project_service.update(&id, update).await?))
}

async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    Ok(Json(state.project_service.remove(&id).await?))
}

// -- Reports --

async fn list_reports(State(state): State<AppState>) -> ApiResult<Json<Vec<Report>>> {
    Ok(Json(state.report_service.list().await?))
}

async fn repeated_word_reports(State(state): State<AppState>) -> ApiResult<Json<Vec<Report>>> {
    Ok(Json(state.report_service.with_repeated_words().await?))
}

async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Report>> {
    Ok(Json(state.report_service.get(&id).await?))
}

async fn create_report(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> ApiResult<(StatusCode, Json<Report>)> {
    let new = parse_validated(&report_schema(), &body)?;
    let report = state.report_service.create(new).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn update_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<Report>> {
    let update = parse_update(&report_update_schema(), REPORT_UPDATE_FIELDS, &body)?;
    Ok(Json(state.report_service.update(&id, update).await?))
}

async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    Ok(Json(state.report_service.remove(&id).await?))
}

pub fn build_router(state: AppState) -> Router {
    let token_auth = TokenAuth::new(&state.config.auth.token);
    let development = state.config.is_development();

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let project_routes = Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        );

    // The literal segment is registered before the `{id}` capture
    let report_routes = Router::new()
        .route("/api/reports", get(list_reports).post(create_report))
        .route("/api/reports/repeated-words", get(repeated_word_reports))
        .route(
            "/api/reports/{id}",
            get(get_report).put(update_report).delete(delete_report),
        );

    let api_routes = Router::new()
        .merge(project_routes)
        .merge(report_routes)
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(axum::Extension(token_auth));

    let router = Router::new()
        .route("/health", get(health))
        .merge(api_routes)
        .with_state(state);

    with_dispatch(router, development).layer(cors)
}
