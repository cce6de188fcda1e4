use crate::config::AlignPolicy;
use crate::error::AlignmentError;
use crate::pipeline::defaults::{DefaultNormalizer, DpWindowAligner, NgramAnchorSelector};
use crate::pipeline::runtime::{TranscriptAligner, TranscriptAlignerParts};
use crate::pipeline::traits::{AnchorSelector, Normalizer, WindowAligner};

pub struct TranscriptAlignerBuilder {
    policy: AlignPolicy,
    normalizer: Option<Box<dyn Normalizer>>,
    anchor_selector: Option<Box<dyn AnchorSelector>>,
    window_aligner: Option<Box<dyn WindowAligner>>,
}

impl TranscriptAlignerBuilder {
    pub fn new(policy: AlignPolicy) -> Self {
        Self {
            policy,
            normalizer: None,
            anchor_selector: None,
            window_aligner: None,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Box<dyn Normalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn with_anchor_selector(mut self, anchor_selector: Box<dyn AnchorSelector>) -> Self {
        self.anchor_selector = Some(anchor_selector);
        self
    }

    pub fn with_window_aligner(mut self, window_aligner: Box<dyn WindowAligner>) -> Self {
        self.window_aligner = Some(window_aligner);
        self
    }

    pub fn build(self) -> Result<TranscriptAligner, AlignmentError> {
        self.policy.validate()?;

        Ok(TranscriptAligner::from_parts(TranscriptAlignerParts {
            policy: self.policy,
            normalizer: self.normalizer.unwrap_or_else(|| Box::new(DefaultNormalizer)),
            anchor_selector: self
                .anchor_selector
                .unwrap_or_else(|| Box::new(NgramAnchorSelector)),
            window_aligner: self
                .window_aligner
                .unwrap_or_else(|| Box::new(DpWindowAligner)),
        }))
    }
}
