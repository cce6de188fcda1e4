use chrono::Utc;

use crate::alignment::normalize::filtered_sentences;
use crate::alignment::rollup::rollup;
use crate::alignment::windows::build_windows;
use crate::config::AlignPolicy;
use crate::error::AlignmentError;
use crate::pipeline::traits::{AnchorSelector, Normalizer, WindowAligner};
use crate::types::{
    AlignOp, AlignmentInput, AnchorDocument, BookWord, FilteredView, TranscriptIndex, WordAlign,
};

pub struct TranscriptAligner {
    policy: AlignPolicy,
    normalizer: Box<dyn Normalizer>,
    anchor_selector: Box<dyn AnchorSelector>,
    window_aligner: Box<dyn WindowAligner>,
}

pub(crate) struct TranscriptAlignerParts {
    pub policy: AlignPolicy,
    pub normalizer: Box<dyn Normalizer>,
    pub anchor_selector: Box<dyn AnchorSelector>,
    pub window_aligner: Box<dyn WindowAligner>,
}

impl TranscriptAligner {
    pub(crate) fn from_parts(parts: TranscriptAlignerParts) -> Self {
        Self {
            policy: parts.policy,
            normalizer: parts.normalizer,
            anchor_selector: parts.anchor_selector,
            window_aligner: parts.window_aligner,
        }
    }

    pub fn policy(&self) -> &AlignPolicy {
        &self.policy
    }

    /// Run the full pipeline: normalize both sides, discover anchors,
    /// partition into windows, align each window, roll word operations up
    /// into sentence and paragraph records.
    pub fn align(&self, input: &AlignmentInput) -> Result<TranscriptIndex, AlignmentError> {
        validate_input(input)?;

        let book_view = self.normalizer.book_view(&input.book_words);
        let asr_view = self.normalizer.asr_view(&input.asr_tokens);
        let book_sentences = filtered_sentences(&input.book_words, &book_view);

        let raw_words = self.align_views(&book_view, &asr_view, &book_sentences)?;
        let words = remap_book_indices(raw_words, &input.book_words);

        let (sentences, paragraphs) = rollup(&words, &input.book_words, &input.asr_tokens)?;

        Ok(TranscriptIndex {
            provenance: input.provenance.clone(),
            created_at: Utc::now(),
            normalization_version: self.normalizer.version().to_string(),
            words,
            sentences,
            paragraphs,
        })
    }

    /// Anchors and windows only, for diagnostics and `*.anchors.json`.
    pub fn anchor_document(
        &self,
        input: &AlignmentInput,
    ) -> Result<AnchorDocument, AlignmentError> {
        validate_input(input)?;

        let book_view = self.normalizer.book_view(&input.book_words);
        let asr_view = self.normalizer.asr_view(&input.asr_tokens);
        let book_sentences = filtered_sentences(&input.book_words, &book_view);

        let anchors = self.anchor_selector.select_anchors(
            &book_view,
            &book_sentences,
            &asr_view,
            &self.policy,
            None,
        )?;
        let windows = if book_view.is_empty() || asr_view.is_empty() {
            Vec::new()
        } else {
            build_windows(
                &anchors,
                0,
                book_view.len() - 1,
                0,
                asr_view.len() - 1,
            )?
        };

        Ok(AnchorDocument {
            book_tokens: book_view.len(),
            asr_tokens: asr_view.len(),
            anchors,
            windows,
        })
    }

    fn align_views(
        &self,
        book_view: &FilteredView,
        asr_view: &FilteredView,
        book_sentences: &[usize],
    ) -> Result<Vec<WordAlign>, AlignmentError> {
        // One-side-empty inputs never reach the window machinery: the
        // entire span is a boundary gap.
        if asr_view.is_empty() {
            return Ok(book_view
                .filtered_to_original
                .iter()
                .map(|&book| WordAlign {
                    op: AlignOp::Del { book },
                    reason: "boundary".to_string(),
                    score: 0.0,
                })
                .collect());
        }
        if book_view.is_empty() {
            return Ok(asr_view
                .filtered_to_original
                .iter()
                .map(|&asr| WordAlign {
                    op: AlignOp::Ins { asr },
                    reason: "boundary".to_string(),
                    score: 0.0,
                })
                .collect());
        }

        let anchors = self.anchor_selector.select_anchors(
            book_view,
            book_sentences,
            asr_view,
            &self.policy,
            None,
        )?;
        if anchors.is_empty() {
            tracing::warn!(
                book_tokens = book_view.len(),
                asr_tokens = asr_view.len(),
                "no anchors found, aligning a single full-span window"
            );
        }

        let windows = build_windows(
            &anchors,
            0,
            book_view.len() - 1,
            0,
            asr_view.len() - 1,
        )?;
        self.window_aligner
            .align(&anchors, &windows, book_view, asr_view, &self.policy)
    }
}

/// The aligner works in array positions; artifacts carry the book index's
/// own declared word indices.
fn remap_book_indices(records: Vec<WordAlign>, book_words: &[BookWord]) -> Vec<WordAlign> {
    records
        .into_iter()
        .map(|record| {
            let op = match record.op {
                AlignOp::Match { book, asr } => AlignOp::Match {
                    book: book_words[book].idx,
                    asr,
                },
                AlignOp::Sub { book, asr } => AlignOp::Sub {
                    book: book_words[book].idx,
                    asr,
                },
                AlignOp::Del { book } => AlignOp::Del {
                    book: book_words[book].idx,
                },
                ins @ AlignOp::Ins { .. } => ins,
            };
            WordAlign { op, ..record }
        })
        .collect()
}

fn validate_input(input: &AlignmentInput) -> Result<(), AlignmentError> {
    for pair in input.book_words.windows(2) {
        if pair[0].idx >= pair[1].idx {
            return Err(AlignmentError::invalid_input(format!(
                "book word indices must be strictly increasing: {} then {}",
                pair[0].idx, pair[1].idx
            )));
        }
        if pair[0].sentence > pair[1].sentence || pair[0].paragraph > pair[1].paragraph {
            return Err(AlignmentError::invalid_input(format!(
                "book sentence/paragraph indices must be non-decreasing at word {}",
                pair[1].idx
            )));
        }
    }
    for (pos, token) in input.asr_tokens.iter().enumerate() {
        if !token.start_sec.is_finite()
            || !token.duration_sec.is_finite()
            || token.start_sec < 0.0
            || token.duration_sec < 0.0
        {
            return Err(AlignmentError::invalid_input(format!(
                "asr token {pos} has invalid timing: start {} duration {}",
                token.start_sec, token.duration_sec
            )));
        }
    }
    for pair in input.asr_tokens.windows(2) {
        if pair[0].start_sec > pair[1].start_sec {
            return Err(AlignmentError::invalid_input(
                "asr token start times must be non-decreasing",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::builder::TranscriptAlignerBuilder;
    use crate::types::{AlignStatus, AsrToken, Provenance};

    fn book_words(texts: &[&str]) -> Vec<BookWord> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| BookWord {
                text: text.to_string(),
                idx: i,
                sentence: 0,
                paragraph: 0,
            })
            .collect()
    }

    fn asr_tokens(texts: &[&str]) -> Vec<AsrToken> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| AsrToken {
                text: text.to_string(),
                start_sec: i as f64 * 0.4,
                duration_sec: 0.3,
            })
            .collect()
    }

    fn input(book: &[&str], asr: &[&str]) -> AlignmentInput {
        AlignmentInput {
            book_words: book_words(book),
            asr_tokens: asr_tokens(asr),
            provenance: Provenance {
                audio_path: "chapter1.flac".to_string(),
                script_path: "chapter1.txt".to_string(),
                book_index_path: "book.index.json".to_string(),
            },
        }
    }

    fn aligner() -> TranscriptAligner {
        TranscriptAlignerBuilder::new(AlignPolicy::default())
            .build()
            .expect("build")
    }

    #[test]
    fn identical_inputs_align_clean() {
        let texts = ["silver", "river", "ran", "through", "quiet", "valley"];
        let index = aligner().align(&input(&texts, &texts)).expect("align");

        assert_eq!(index.words.len(), texts.len());
        assert!(index
            .words
            .iter()
            .all(|w| matches!(w.op, AlignOp::Match { .. })));
        assert!(index.sentences.iter().all(|s| {
            s.status == AlignStatus::Ok && s.metrics.wer == 0.0 && s.metrics.cer == 0.0
        }));
        assert_eq!(index.normalization_version, "norm-2");
        assert_eq!(index.provenance.audio_path, "chapter1.flac");
    }

    #[test]
    fn empty_inputs_produce_empty_index() {
        let index = aligner().align(&input(&[], &[])).expect("align");
        assert!(index.words.is_empty());
        assert!(index.sentences.is_empty());
        assert!(index.paragraphs.is_empty());
    }

    #[test]
    fn empty_transcript_marks_whole_book_missing() {
        let index = aligner()
            .align(&input(&["all", "words", "missing"], &[]))
            .expect("align");
        assert_eq!(index.words.len(), 3);
        assert!(index
            .words
            .iter()
            .all(|w| matches!(w.op, AlignOp::Del { .. }) && w.reason == "boundary"));
        assert_eq!(index.sentences[0].status, AlignStatus::Unreliable);
        assert_eq!(index.sentences[0].asr_range, None);
    }

    #[test]
    fn empty_book_marks_transcript_as_insertions() {
        let index = aligner()
            .align(&input(&[], &["stray", "speech"]))
            .expect("align");
        assert_eq!(index.words.len(), 2);
        assert!(index
            .words
            .iter()
            .all(|w| matches!(w.op, AlignOp::Ins { .. })));
        assert!(index.sentences.is_empty());
    }

    #[test]
    fn punctuation_tokens_never_appear_in_alignment() {
        let index = aligner()
            .align(&input(
                &["\u{2014}", "quiet", "valley", "..."],
                &["quiet", "valley"],
            ))
            .expect("align");
        // Original indices 1 and 2 survive filtering.
        let books: Vec<_> = index.words.iter().filter_map(|w| w.op.book_idx()).collect();
        assert_eq!(books, vec![1, 2]);
    }

    #[test]
    fn anchor_document_reports_partition() {
        let texts: Vec<String> = (0..120).map(|i| format!("word{i}")).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let doc = aligner().anchor_document(&input(&refs, &refs)).expect("doc");

        assert_eq!(doc.book_tokens, 120);
        assert!(!doc.anchors.is_empty());
        assert!(doc
            .anchors
            .windows(2)
            .all(|p| p[0].book_pos < p[1].book_pos && p[0].asr_pos < p[1].asr_pos));
        for pair in doc.windows.windows(2) {
            assert!(pair[0].b_hi <= pair[1].b_lo);
            assert!(pair[0].a_hi <= pair[1].a_lo);
        }
    }

    #[test]
    fn non_monotonic_book_indices_rejected() {
        let mut bad = input(&["one", "two"], &["one", "two"]);
        bad.book_words[1].idx = 0;
        assert!(aligner().align(&bad).is_err());
    }

    #[test]
    fn invalid_asr_timing_rejected() {
        let mut bad = input(&["one"], &["one"]);
        bad.asr_tokens[0].duration_sec = f64::NAN;
        assert!(aligner().align(&bad).is_err());
    }

    #[test]
    fn declared_book_indices_flow_into_artifacts() {
        let mut shifted = input(&["quiet", "valley"], &["quiet", "valley"]);
        shifted.book_words[0].idx = 10;
        shifted.book_words[1].idx = 11;
        let index = aligner().align(&shifted).expect("align");

        let books: Vec<_> = index.words.iter().filter_map(|w| w.op.book_idx()).collect();
        assert_eq!(books, vec![10, 11]);
        assert_eq!(index.sentences[0].book_range, (10, 12));
    }
}
