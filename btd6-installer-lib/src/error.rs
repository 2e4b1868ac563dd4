//! Error types for the installer

use std::path::PathBuf;
use thiserror::Error;

/// Installer result type
pub type Result<T> = std::result::Result<T, InstallerError>;

/// Main error type for installer operations
#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Download error: {0}")]
    Download(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Archive entry escapes the target directory: {0}")]
    UnsafeArchiveEntry(String),

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: String, got: String },

    #[error("Invalid game path: {}", .0.display())]
    InvalidTarget(PathBuf),

    #[error("No game installation selected")]
    NoSelection,

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Command execution failed: {command} - {error}")]
    CommandExecution { command: String, error: String },
}
