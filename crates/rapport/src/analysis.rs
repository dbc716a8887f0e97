//! Text analysis over report bodies.

use crate::services::Report;
use std::collections::HashMap;

/// A word must appear this many times for a text to count as repetitive
pub const REPEAT_THRESHOLD: usize = 3;

/// Characters removed before splitting text into words
pub const STRIPPED_PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~',
    '(', ')',
];

/// Anything carrying a body of text the repetition filter can scan
pub trait HasText {
    fn text(&self) -> &str;
}

impl HasText for Report {
    fn text(&self) -> &str {
        &self.text
    }
}

impl HasText for String {
    fn text(&self) -> &str {
        self
    }
}

/// Lower-case `text`, drop punctuation and count each resulting word.
pub fn word_counts(text: &str) -> HashMap<String, usize> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();

    let mut counts = HashMap::new();
    for word in normalized.split_whitespace() {
        *counts.entry(word.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Whether some word in `text` occurs at least [`REPEAT_THRESHOLD`] times.
pub fn has_repeated_word(text: &str) -> bool {
    word_counts(text)
        .values()
        .any(|count| *count >= REPEAT_THRESHOLD)
}

/// Keep the records whose text repeats a word, preserving input order.
pub fn filter_repeated<T>(records: &[T]) -> Vec<T>
where
    T: HasText + Clone,
{
    records
        .iter()
        .filter(|record| has_repeated_word(record.text()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: i64, text: &str) -> Report {
        Report {
            id,
            text: text.to_string(),
            project_id: 1,
        }
    }

    #[test]
    fn keeps_word_repeated_three_times() {
        let kept = filter_repeated(&[report(1, "the cat the dog the bird")]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn drops_when_max_count_is_two() {
        let kept = filter_repeated(&[report(1, "a b c a b")]);
        assert!(kept.is_empty());
    }

    #[test]
    fn punctuation_and_case_collapse_tokens() {
        let kept = filter_repeated(&[report(1, "Hi! Hi, hi.")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(word_counts("Hi! Hi, hi.").get("hi"), Some(&3));
    }

    #[test]
    fn punctuation_only_tokens_do_not_count() {
        assert!(!has_repeated_word("... !!! ,,, ---"));
        assert!(word_counts("... !!! ,,,").is_empty());
    }

    #[test]
    fn stripping_can_join_word_fragments() {
        // "co-op" becomes "coop", matching the other two spellings
        assert!(has_repeated_word("coop co-op co_op"));
    }

    #[test]
    fn splits_on_any_whitespace_run() {
        assert!(has_repeated_word("go\tgo\n\n  go"));
    }

    #[test]
    fn unlisted_punctuation_is_kept() {
        // '?' and quotes are not in the stripped set
        assert!(!has_repeated_word("why? why why"));
        assert!(has_repeated_word("why? why? why?"));
    }

    #[test]
    fn empty_text_is_not_repetitive() {
        assert!(!has_repeated_word(""));
        assert!(!has_repeated_word("   "));
    }

    #[test]
    fn output_preserves_input_order() {
        let input = vec![
            report(3, "x x x"),
            report(1, "no repeats here"),
            report(2, "y y y"),
            report(5, "z z z z"),
        ];
        let ids: Vec<i64> = filter_repeated(&input).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 5]);
    }

    #[test]
    fn input_is_left_untouched() {
        let input = vec![report(1, "a a a"), report(2, "b")];
        let before = input.clone();
        let _ = filter_repeated(&input);
        let _ = filter_repeated(&input);
        assert_eq!(input, before);
    }

    #[test]
    fn works_on_plain_strings() {
        let texts = vec!["one one one".to_string(), "two".to_string()];
        assert_eq!(filter_repeated(&texts), vec!["one one one".to_string()]);
    }
}
