use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinderyError {
    #[error("invalid EPUB archive: {0}")]
    InvalidArchive(String),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BinderyError>;
