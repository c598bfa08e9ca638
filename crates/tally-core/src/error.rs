use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid message format at index {index}: {reason}")]
    InvalidMessageFormat { index: usize, reason: String },

    #[error("Encoding unavailable: {0}")]
    EncodingUnavailable(String),
}

impl Error {
    pub fn invalid_message(index: usize, reason: impl Into<String>) -> Self {
        Error::InvalidMessageFormat {
            index,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
