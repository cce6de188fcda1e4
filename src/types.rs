use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Book-side word as produced by the manuscript indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookWord {
    pub text: String,
    /// Index in the original book word stream. Strictly increasing.
    pub idx: usize,
    pub sentence: usize,
    pub paragraph: usize,
}

/// Transcript-side token as produced by the ASR integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsrToken {
    pub text: String,
    pub start_sec: f64,
    pub duration_sec: f64,
}

/// A normalized token array with a map back to original positions.
/// `filtered_to_original[i]` is the position of `tokens[i]` in the input
/// slice; the map is strictly increasing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView {
    pub tokens: Vec<String>,
    pub filtered_to_original: Vec<usize>,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A high-confidence position correspondence in filtered coordinates.
/// Across an anchor set, sorting by `book_pos` yields strictly increasing
/// `asr_pos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub book_pos: usize,
    pub asr_pos: usize,
}

/// Half-open token ranges in filtered coordinates still requiring
/// fine-grained alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub b_lo: usize,
    pub b_hi: usize,
    pub a_lo: usize,
    pub a_hi: usize,
}

impl Window {
    pub fn book_len(&self) -> usize {
        self.b_hi - self.b_lo
    }

    pub fn asr_len(&self) -> usize {
        self.a_hi - self.a_lo
    }
}

/// Word-level edit operation. Indices are original (pre-filter) positions:
/// `book` indexes the caller's book word stream by declared `idx`, `asr`
/// indexes the ASR token array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AlignOp {
    Match { book: usize, asr: usize },
    Sub { book: usize, asr: usize },
    Ins { asr: usize },
    Del { book: usize },
}

impl AlignOp {
    pub fn book_idx(&self) -> Option<usize> {
        match *self {
            AlignOp::Match { book, .. } | AlignOp::Sub { book, .. } | AlignOp::Del { book } => {
                Some(book)
            }
            AlignOp::Ins { .. } => None,
        }
    }

    pub fn asr_idx(&self) -> Option<usize> {
        match *self {
            AlignOp::Match { asr, .. } | AlignOp::Sub { asr, .. } | AlignOp::Ins { asr } => {
                Some(asr)
            }
            AlignOp::Del { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordAlign {
    pub op: AlignOp,
    pub reason: String,
    /// Match confidence in [0, 1].
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SentenceMetrics {
    pub wer: f64,
    pub cer: f64,
    /// WER over the resolved span including substitutions.
    pub span_wer: f64,
    pub missing_runs: usize,
    pub extra_runs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignStatus {
    Ok,
    Attention,
    Unreliable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceAlign {
    pub sentence: usize,
    /// Half-open range of original book word indices.
    pub book_range: (usize, usize),
    /// Inclusive range of ASR token indices, when any word resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asr_range: Option<(usize, usize)>,
    pub start_sec: f64,
    pub end_sec: f64,
    pub metrics: SentenceMetrics,
    pub status: AlignStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphAlign {
    pub paragraph: usize,
    pub book_range: (usize, usize),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asr_range: Option<(usize, usize)>,
    pub start_sec: f64,
    pub end_sec: f64,
    pub metrics: SentenceMetrics,
    pub status: AlignStatus,
    pub sentences: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub audio_path: String,
    pub script_path: String,
    pub book_index_path: String,
}

/// Root alignment artifact: word, sentence and paragraph alignments plus
/// the provenance needed for idempotent re-execution checks downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptIndex {
    #[serde(flatten)]
    pub provenance: Provenance,
    pub created_at: DateTime<Utc>,
    pub normalization_version: String,
    pub words: Vec<WordAlign>,
    pub sentences: Vec<SentenceAlign>,
    pub paragraphs: Vec<ParagraphAlign>,
}

/// Diagnostic artifact persisted by the orchestrator as `*.anchors.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorDocument {
    pub book_tokens: usize,
    pub asr_tokens: usize,
    pub anchors: Vec<Anchor>,
    pub windows: Vec<Window>,
}

#[derive(Debug, Clone)]
pub struct AlignmentInput {
    pub book_words: Vec<BookWord>,
    pub asr_tokens: Vec<AsrToken>,
    pub provenance: Provenance,
}
