use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversion selected by the user.
///
/// Processing is uniform regardless of kind (the pipeline copies source
/// bytes to the output); the kind is threaded into progress messages as a
/// label only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionKind {
    PdfToDocx,
    ResizeImage,
    Unknown,
}

impl ConversionKind {
    /// Parse a user-supplied label. Total: anything unrecognized maps to
    /// `Unknown` rather than failing.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "pdf-to-docx" | "pdf_to_docx" | "pdf to docx" => Self::PdfToDocx,
            "resize-image" | "resize_image" | "resize image" => Self::ResizeImage,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PdfToDocx => write!(f, "PDF to DOCX"),
            Self::ResizeImage => write!(f, "Resize Image"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

impl std::str::FromStr for ConversionKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl Default for ConversionKind {
    fn default() -> Self {
        Self::Unknown
    }
}
