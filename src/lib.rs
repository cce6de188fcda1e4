pub mod alignment;
pub mod config;
pub mod diff;
pub mod error;
pub mod pipeline;
pub mod types;

pub use config::AlignPolicy;
pub use diff::{analyze, DiffKind, DiffOp, DiffReport, DiffStats};
pub use error::AlignmentError;
pub use pipeline::builder::TranscriptAlignerBuilder;
pub use pipeline::runtime::TranscriptAligner;
pub use pipeline::traits::{AnchorSelector, Normalizer, WindowAligner};
pub use types::{
    AlignOp, AlignStatus, AlignmentInput, Anchor, AnchorDocument, AsrToken, BookWord,
    FilteredView, ParagraphAlign, Provenance, SentenceAlign, SentenceMetrics, TranscriptIndex,
    Window, WordAlign,
};
