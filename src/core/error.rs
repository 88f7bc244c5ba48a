use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cache database error: {0}")]
    Database(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Annotation error: {0}")]
    Annotation(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Parsing error: {0}")]
    Parsing(String),

    #[error("Alignment error: {0}")]
    Alignment(String),

    #[error("Unknown file: {0}")]
    UnknownFile(String),
}

pub type Result<T> = std::result::Result<T, Error>;
