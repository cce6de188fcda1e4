use crate::alignment::anchors::select_anchors;
use crate::alignment::normalize::{
    build_asr_view, build_book_view, NORMALIZATION_VERSION,
};
use crate::alignment::window_dp::align_with_anchors;
use crate::config::AlignPolicy;
use crate::error::AlignmentError;
use crate::pipeline::traits::{AnchorSelector, Normalizer, WindowAligner};
use crate::types::{Anchor, AsrToken, BookWord, FilteredView, Window, WordAlign};

pub struct DefaultNormalizer;

impl Normalizer for DefaultNormalizer {
    fn book_view(&self, words: &[BookWord]) -> FilteredView {
        build_book_view(words)
    }

    fn asr_view(&self, tokens: &[AsrToken]) -> FilteredView {
        build_asr_view(tokens)
    }

    fn version(&self) -> &'static str {
        NORMALIZATION_VERSION
    }
}

pub struct NgramAnchorSelector;

impl AnchorSelector for NgramAnchorSelector {
    fn select_anchors(
        &self,
        book: &FilteredView,
        book_sentences: &[usize],
        asr: &FilteredView,
        policy: &AlignPolicy,
        book_span: Option<(usize, usize)>,
    ) -> Result<Vec<Anchor>, AlignmentError> {
        select_anchors(book, book_sentences, asr, policy, book_span)
    }
}

pub struct DpWindowAligner;

impl WindowAligner for DpWindowAligner {
    fn align(
        &self,
        anchors: &[Anchor],
        windows: &[Window],
        book: &FilteredView,
        asr: &FilteredView,
        policy: &AlignPolicy,
    ) -> Result<Vec<WordAlign>, AlignmentError> {
        Ok(align_with_anchors(anchors, windows, book, asr, policy))
    }
}
