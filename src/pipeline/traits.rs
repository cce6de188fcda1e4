use crate::config::AlignPolicy;
use crate::error::AlignmentError;
use crate::types::{Anchor, AsrToken, BookWord, FilteredView, Window, WordAlign};

pub trait Normalizer: Send + Sync {
    fn book_view(&self, words: &[BookWord]) -> FilteredView;
    fn asr_view(&self, tokens: &[AsrToken]) -> FilteredView;
    /// Version string recorded in artifact provenance.
    fn version(&self) -> &'static str;
}

pub trait AnchorSelector: Send + Sync {
    fn select_anchors(
        &self,
        book: &FilteredView,
        book_sentences: &[usize],
        asr: &FilteredView,
        policy: &AlignPolicy,
        book_span: Option<(usize, usize)>,
    ) -> Result<Vec<Anchor>, AlignmentError>;
}

pub trait WindowAligner: Send + Sync {
    fn align(
        &self,
        anchors: &[Anchor],
        windows: &[Window],
        book: &FilteredView,
        asr: &FilteredView,
        policy: &AlignPolicy,
    ) -> Result<Vec<WordAlign>, AlignmentError>;
}
