use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("{context}: {message}")]
    Structural {
        context: &'static str,
        message: String,
    },
    #[error("diff vocabulary overflow: {distinct} distinct tokens exceed encoding capacity {capacity}")]
    DiffVocabulary { distinct: usize, capacity: usize },
}

impl AlignmentError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn structural(context: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Structural {
            context,
            message: message.to_string(),
        }
    }
}
