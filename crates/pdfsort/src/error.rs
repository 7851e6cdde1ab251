use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfSortError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Failed to process image: {0}")]
    ImageProcessing(String),

    #[error("Unsupported image encoding: {0}")]
    UnsupportedImage(String),

    #[error("Failed to render page {page}: {reason}")]
    RenderPage { page: u32, reason: String },

    #[error("OCR failed: {0}")]
    OcrFailed(String),
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to open archive '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid archive '{path}': {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Failed to extract '{path}': {reason}")]
    Extract { path: PathBuf, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create file '{path}': {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove directory '{path}': {source}")]
    RemoveDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list directory '{path}': {source}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    #[error("Source has no file name: {0}")]
    MissingFileName(PathBuf),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Directory scan failed for '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Run interrupted by user")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, PdfSortError>;
