use crate::types::{AsrToken, BookWord, FilteredView};

/// Bumped whenever normalization output changes; recorded in the
/// `TranscriptIndex` provenance so stale artifacts can be detected.
pub const NORMALIZATION_VERSION: &str = "norm-2";

/// Case-fold and keep only letters and digits. Typographic punctuation
/// (quotes, dashes, ellipses) drops out; apostrophes collapse contractions
/// into a single token ("can't" -> "cant") so the filtered index map stays
/// bijective. Returns an empty string for pure-punctuation input.
pub fn normalize_word(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_alphanumeric() {
            for lc in c.to_lowercase() {
                out.push(lc);
            }
        }
    }
    out
}

pub fn build_book_view(words: &[BookWord]) -> FilteredView {
    build_view(words.iter().map(|w| w.text.as_str()))
}

pub fn build_asr_view(tokens: &[AsrToken]) -> FilteredView {
    build_view(tokens.iter().map(|t| t.text.as_str()))
}

/// Sentence index of each filtered book token, parallel to `view.tokens`.
pub fn filtered_sentences(words: &[BookWord], view: &FilteredView) -> Vec<usize> {
    view.filtered_to_original
        .iter()
        .map(|&pos| words[pos].sentence)
        .collect()
}

fn build_view<'a>(raw: impl Iterator<Item = &'a str>) -> FilteredView {
    let mut tokens = Vec::new();
    let mut filtered_to_original = Vec::new();
    for (pos, word) in raw.enumerate() {
        let normalized = normalize_word(word);
        if normalized.is_empty() {
            continue;
        }
        tokens.push(normalized);
        filtered_to_original.push(pos);
    }

    debug_assert!(
        filtered_to_original.windows(2).all(|p| p[0] < p[1]),
        "view index map contract violated"
    );

    FilteredView {
        tokens,
        filtered_to_original,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_word(text: &str, idx: usize) -> BookWord {
        BookWord {
            text: text.to_string(),
            idx,
            sentence: 0,
            paragraph: 0,
        }
    }

    #[test]
    fn normalize_case_folds_and_strips_punctuation() {
        assert_eq!(normalize_word("Hello,"), "hello");
        assert_eq!(normalize_word("\u{201c}Dark\u{201d}"), "dark");
        assert_eq!(normalize_word("1984"), "1984");
    }

    #[test]
    fn normalize_collapses_contractions() {
        assert_eq!(normalize_word("can't"), "cant");
        assert_eq!(normalize_word("won\u{2019}t"), "wont");
    }

    #[test]
    fn normalize_pure_punctuation_is_empty() {
        assert_eq!(normalize_word("--"), "");
        assert_eq!(normalize_word("\u{2026}"), "");
    }

    #[test]
    fn book_view_excludes_punctuation_tokens() {
        let words = vec![
            book_word("The", 0),
            book_word("\u{2014}", 1),
            book_word("forest.", 2),
        ];
        let view = build_book_view(&words);
        assert_eq!(view.tokens, vec!["the", "forest"]);
        assert_eq!(view.filtered_to_original, vec![0, 2]);
    }

    #[test]
    fn empty_input_produces_empty_view() {
        let view = build_book_view(&[]);
        assert!(view.is_empty());
        assert!(view.filtered_to_original.is_empty());
    }

    #[test]
    fn asr_view_maps_positions() {
        let tokens = vec![
            AsrToken {
                text: "um".to_string(),
                start_sec: 0.0,
                duration_sec: 0.2,
            },
            AsrToken {
                text: "...".to_string(),
                start_sec: 0.2,
                duration_sec: 0.1,
            },
            AsrToken {
                text: "Dark".to_string(),
                start_sec: 0.3,
                duration_sec: 0.4,
            },
        ];
        let view = build_asr_view(&tokens);
        assert_eq!(view.tokens, vec!["um", "dark"]);
        assert_eq!(view.filtered_to_original, vec![0, 2]);
    }

    #[test]
    fn filtered_sentences_follow_index_map() {
        let words = vec![
            BookWord {
                text: "One.".to_string(),
                idx: 0,
                sentence: 0,
                paragraph: 0,
            },
            BookWord {
                text: "\u{2014}".to_string(),
                idx: 1,
                sentence: 1,
                paragraph: 0,
            },
            BookWord {
                text: "Two".to_string(),
                idx: 2,
                sentence: 1,
                paragraph: 0,
            },
        ];
        let view = build_book_view(&words);
        assert_eq!(filtered_sentences(&words, &view), vec![0, 1]);
    }
}
