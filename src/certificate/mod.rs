// src/certificate/mod.rs

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::{Period, PortalConfig, ProgramType};
use crate::eligibility::Role;
use crate::error::{PortalError, PortalResult};
use crate::fetch::ResourceFetcher;
use crate::roster::{find_student, load_table};

pub mod pdf;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9 .,'()&+_-]").expect("filename regex"));

/// A downloadable certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// ASCII-only filename segment: whitespace runs collapse to one space,
/// anything outside a conservative set becomes `_`.
fn ascii_safe(segment: &str) -> String {
    let collapsed = WHITESPACE.replace_all(segment.trim(), " ");
    UNSAFE_CHARS.replace_all(&collapsed, "_").into_owned()
}

/// `Sertifikat {program}_{period} - {name} - {id}.pdf`; a blank name drops its segment.
pub fn certificate_filename(program: ProgramType, period: Period, name: &str, student_id: &str) -> String {
    let name = ascii_safe(name);
    let student_id = ascii_safe(student_id);
    if name.is_empty() {
        format!("Sertifikat {}_{} - {}.pdf", program, period, student_id)
    } else {
        format!("Sertifikat {}_{} - {} - {}.pdf", program, period, name, student_id)
    }
}

/// Cuts a student's page out of the role's combined certificate document.
///
/// The page is located through the student's row in the pass list (regular
/// students) or the assistant list (assistants).
pub struct CertificateResolver {
    config: Arc<PortalConfig>,
    fetcher: Arc<dyn ResourceFetcher>,
}

impl CertificateResolver {
    pub fn new(config: Arc<PortalConfig>, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self { config, fetcher }
    }

    #[instrument(level = "info", skip(self))]
    pub async fn resolve(
        &self,
        student_id: &str,
        program: ProgramType,
        period: Period,
        role: Role,
    ) -> PortalResult<CertificateArtifact> {
        let paths = self.config.paths(program, period)?;
        let (list, document) = match role {
            Role::Regular => (&paths.pass_list, &paths.certificates.regular),
            Role::Assistant => (&paths.assistant_list, &paths.certificates.assistant),
        };

        // 1) locate the row that numbers the page
        let rows = load_table(self.fetcher.as_ref(), list).await?;
        let row = find_student(&rows, student_id).ok_or_else(|| PortalError::StudentNotFound {
            student_id: student_id.trim().to_string(),
        })?;
        let index = row.page_index();

        // 2) fetch the combined document
        let combined = self.fetcher.fetch(document).await?;
        if combined.is_empty() {
            return Err(PortalError::EmptyArtifact {
                location: document.clone(),
            });
        }

        // 3) cut the page off the async runtime
        let location = document.clone();
        let bytes = tokio::task::spawn_blocking(move || pdf::extract_page(&combined, index, &location))
            .await
            .context("page extraction task")??;

        let filename = certificate_filename(program, period, &row.name, row.student_id.trim());
        info!(page = index, size = bytes.len(), %filename, "certificate ready");
        Ok(CertificateArtifact { bytes, filename })
    }
}
