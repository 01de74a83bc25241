//! PDF file picker.
//!
//! Validates the file a user picks or drops and tracks what the drop zone
//! shows. Only the first file of a selection is considered, and only
//! `application/pdf` is accepted. A rejected selection leaves the previous
//! state untouched. Nothing is uploaded anywhere.

use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use tracing::{info, warn};

/// The only accepted MIME type.
pub const PDF_MIME: &str = "application/pdf";

/// Blocking notice shown when a selection is rejected.
pub const REJECTION_NOTICE: &str = "Please upload a valid PDF file.";

/// A file offered by the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    /// MIME type declared by the browser, if any.
    pub content_type: Option<String>,
}

impl CandidateFile {
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: Option<String>) -> Self {
        Self {
            name: name.into(),
            content_type,
        }
    }

    /// Declared MIME type, or one guessed from the file name.
    #[must_use]
    pub fn effective_type(&self) -> String {
        match self.content_type.as_deref().map(str::trim) {
            Some(declared) if !declared.is_empty() => declared.to_ascii_lowercase(),
            _ => mime_guess::from_path(&self.name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        }
    }
}

/// What the drop zone currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FileSelection {
    #[default]
    Unselected,
    Selected { name: String, content_type: String },
}

impl FileSelection {
    #[must_use]
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected { .. })
    }
}

/// Reasons a selection is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("no file in selection")]
    NoFile,

    #[error("file '{name}' has unsupported type: {content_type}")]
    InvalidType { name: String, content_type: String },
}

impl SelectionError {
    /// Text shown to the user for any rejection.
    #[must_use]
    pub fn user_notice(&self) -> &'static str {
        REJECTION_NOTICE
    }
}

/// File selection state of the page.
#[derive(Debug, Default)]
pub struct FilePicker {
    selection: RwLock<FileSelection>,
}

impl FilePicker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn selection(&self) -> FileSelection {
        self.selection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Handle a picked or dropped selection.
    pub fn handle_files(&self, files: &[CandidateFile]) -> Result<FileSelection, SelectionError> {
        let Some(file) = files.first() else {
            warn!(name: "upload.rejected", reason = "empty", "Empty file selection");
            return Err(SelectionError::NoFile);
        };

        let content_type = file.effective_type();
        if content_type != PDF_MIME {
            warn!(
                name: "upload.rejected",
                file = %file.name,
                content_type = %content_type,
                "Rejected non-PDF file"
            );
            return Err(SelectionError::InvalidType {
                name: file.name.clone(),
                content_type,
            });
        }

        let selected = FileSelection::Selected {
            name: file.name.clone(),
            content_type,
        };
        *self
            .selection
            .write()
            .unwrap_or_else(PoisonError::into_inner) = selected.clone();

        info!(name: "upload.ready", file = %file.name, "Ready to upload");
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_is_selected() {
        let picker = FilePicker::new();
        let result = picker
            .handle_files(&[CandidateFile::new(
                "roadmap.pdf",
                Some(PDF_MIME.to_string()),
            )])
            .unwrap();

        assert_eq!(
            result,
            FileSelection::Selected {
                name: "roadmap.pdf".into(),
                content_type: PDF_MIME.into(),
            }
        );
        assert!(picker.selection().is_selected());
    }

    #[test]
    fn test_text_file_is_rejected_and_state_kept() {
        let picker = FilePicker::new();
        let err = picker
            .handle_files(&[CandidateFile::new(
                "notes.txt",
                Some("text/plain".to_string()),
            )])
            .unwrap_err();

        assert!(matches!(err, SelectionError::InvalidType { .. }));
        assert_eq!(err.user_notice(), REJECTION_NOTICE);
        assert_eq!(picker.selection(), FileSelection::Unselected);
    }

    #[test]
    fn test_rejection_keeps_previous_selection() {
        let picker = FilePicker::new();
        picker
            .handle_files(&[CandidateFile::new("a.pdf", Some(PDF_MIME.into()))])
            .unwrap();
        picker
            .handle_files(&[CandidateFile::new("b.png", Some("image/png".into()))])
            .unwrap_err();

        assert!(matches!(
            picker.selection(),
            FileSelection::Selected { ref name, .. } if name == "a.pdf"
        ));
    }

    #[test]
    fn test_only_first_file_counts() {
        let picker = FilePicker::new();
        let err = picker.handle_files(&[
            CandidateFile::new("first.txt", Some("text/plain".into())),
            CandidateFile::new("second.pdf", Some(PDF_MIME.into())),
        ]);

        assert!(err.is_err());
        assert!(!picker.selection().is_selected());
    }

    #[test]
    fn test_missing_type_is_guessed_from_name() {
        let picker = FilePicker::new();
        assert!(
            picker
                .handle_files(&[CandidateFile::new("scan.PDF", None)])
                .is_ok()
        );
        assert_eq!(
            CandidateFile::new("data.bin", Some(String::new())).effective_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let picker = FilePicker::new();
        assert_eq!(picker.handle_files(&[]), Err(SelectionError::NoFile));
    }
}
