// src/error.rs

use thiserror::Error;

use crate::config::{Period, ProgramType};

/// Result alias used across the portal core.
pub type PortalResult<T> = std::result::Result<T, PortalError>;

/// Every failure the portal core can report to its caller.
///
/// Each variant is distinguishable so the UI can show an actionable message;
/// see [`PortalError::user_message`].
#[derive(Error, Debug)]
pub enum PortalError {
    /// The (program, period) pair has no configured tables at all.
    #[error("practicum {program} period {period} is not offered")]
    ProgramPeriodNotOffered { program: ProgramType, period: Period },

    /// No row in the relevant table matched the student ID.
    #[error("student {student_id} not found")]
    StudentNotFound { student_id: String },

    /// Fetching or decoding a table or document failed (includes timeouts).
    #[error("resource {location} unavailable: {reason}")]
    ResourceUnavailable { location: String, reason: String },

    /// The computed certificate page does not exist in the combined document.
    #[error("page index {index} out of range for a document of {page_count} pages")]
    PageOutOfRange { index: usize, page_count: usize },

    /// A certificate document or extracted page came back with zero bytes.
    #[error("certificate from {location} is empty")]
    EmptyArtifact { location: String },

    #[error("unexpected failure: {0:#}")]
    Unknown(#[from] anyhow::Error),
}

impl PortalError {
    pub fn unavailable(location: impl Into<String>, reason: impl ToString) -> Self {
        PortalError::ResourceUnavailable {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// Message shown to the student.
    pub fn user_message(&self) -> String {
        match self {
            PortalError::ProgramPeriodNotOffered { program, period } => format!(
                "Praktikum {} periode {} belum dilaksanakan. Silakan cek kembali pada semester yang sesuai.",
                program, period
            ),
            PortalError::StudentNotFound { student_id } => {
                format!("NPM {} tidak ditemukan dalam daftar praktikan.", student_id)
            }
            PortalError::ResourceUnavailable { .. } => {
                "Data praktikum sedang tidak dapat diakses. Silakan coba lagi nanti.".to_string()
            }
            PortalError::PageOutOfRange { .. } => {
                "Halaman sertifikat tidak ditemukan. Silakan hubungi administrator laboratorium."
                    .to_string()
            }
            PortalError::EmptyArtifact { .. } => "File sertifikat kosong.".to_string(),
            PortalError::Unknown(_) => {
                "Terjadi kesalahan teknis. Silakan hubungi administrator laboratorium.".to_string()
            }
        }
    }
}
