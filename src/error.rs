use std::path::PathBuf;
use thiserror::Error;

pub type PatchResult<T> = Result<T, PatchError>;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Failed to read workbook: {0}")]
    Read(#[from] calamine::XlsxError),

    #[error("Failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("Invalid xlsx package: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid sheet XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Patch plan error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Sheet not found: '{0}'")]
    MissingSheet(String),

    #[error("Invalid cell reference: '{0}'")]
    Address(String),

    #[error("Timeline error: {0}")]
    Timeline(String),

    #[error("Reschedule error: {0}")]
    Reschedule(String),
}
