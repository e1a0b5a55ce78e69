//! Error types shared by the loader, the export and the web layer.

use thiserror::Error;

/// Everything that can go wrong between opening the roster workbook and
/// handing a page or a download back to the caller.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Filesystem error while reading the roster or writing an export.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The roster workbook could not be opened or parsed.
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),

    /// The workbook has no sheet with the expected name.
    #[error("workbook has no sheet named '{0}'")]
    MissingSheet(String),

    /// The header row lacks a column the roster needs.
    #[error("sheet '{sheet}' is missing column '{column}'")]
    MissingColumn { sheet: String, column: String },

    /// Building the export workbook failed.
    #[error("failed to write export: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    /// A page template failed to compile.
    #[cfg(feature = "web")]
    #[error("template error: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    /// A page template failed to render.
    #[cfg(feature = "web")]
    #[error("render error: {0}")]
    Render(#[from] handlebars::RenderError),

    /// A blocking roster task panicked or was cancelled.
    #[cfg(feature = "web")]
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, RosterError>;
