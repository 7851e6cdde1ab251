use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Document processing failed: {0}")]
    Processing(#[from] crate::error::ProcessError),

    #[error("Storage failed: {0}")]
    Storage(#[from] crate::error::StorageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    ImageSkipped {
        page: u32,
        image: String,
        reason: String,
    },
    /// No image on the page could be decoded and rendering failed too.
    PageNotRendered { page: u32, reason: String },
}
