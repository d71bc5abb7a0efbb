use thiserror::Error;

#[derive(Debug, Error)]
pub enum StampError {
    #[error("format '{0}' is not supported")]
    UnsupportedFormat(String),

    #[error("cannot read image: {0}")]
    ImageRead(String),

    #[error("cannot encode image: {0}")]
    ImageWrite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
