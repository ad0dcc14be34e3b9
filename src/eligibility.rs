// src/eligibility.rs

use serde::Serialize;
use std::{fmt, sync::Arc};
use tracing::{debug, instrument, warn};

use crate::config::{Period, PortalConfig, ProgramType};
use crate::error::PortalResult;
use crate::fetch::ResourceFetcher;
use crate::roster::{find_student, load_table};

/// Which certificate a student receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Regular,
    Assistant,
}

impl Role {
    pub fn from_assistant(is_assistant: bool) -> Self {
        if is_assistant {
            Role::Assistant
        } else {
            Role::Regular
        }
    }
}

/// Outcome of an eligibility lookup for an enrolled student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityResult {
    pub student_id: String,
    pub name: String,
    pub passed: bool,
    pub is_assistant: bool,
    pub program: ProgramType,
    pub period: Period,
}

impl EligibilityResult {
    /// Passed students and lab assistants may download a certificate.
    pub fn is_eligible(&self) -> bool {
        self.passed || self.is_assistant
    }

    /// Assistant status supersedes pass/fail.
    pub fn role(&self) -> Role {
        Role::from_assistant(self.is_assistant)
    }

    pub fn status_label(&self) -> StatusLabel {
        if self.is_assistant {
            StatusLabel::Assistant
        } else if self.passed {
            StatusLabel::Passed
        } else {
            StatusLabel::NotPassed
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Nama tidak ditemukan"
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLabel {
    Assistant,
    Passed,
    NotPassed,
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusLabel::Assistant => "Asisten Laboratorium",
            StatusLabel::Passed => "Lulus",
            StatusLabel::NotPassed => "Tidak Lulus",
        })
    }
}

/// Answers "is this student enrolled, did they pass, are they an assistant".
pub struct EligibilityResolver {
    config: Arc<PortalConfig>,
    fetcher: Arc<dyn ResourceFetcher>,
}

impl EligibilityResolver {
    pub fn new(config: Arc<PortalConfig>, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// `Ok(None)` means the pair is offered but the student is not on its roster.
    ///
    /// Roster failures propagate; pass-list and assistant-list failures are
    /// logged and read as `false`.
    #[instrument(level = "info", skip(self))]
    pub async fn resolve(
        &self,
        student_id: &str,
        program: ProgramType,
        period: Period,
    ) -> PortalResult<Option<EligibilityResult>> {
        // 1) configured at all?
        let paths = self.config.paths(program, period)?;

        // 2) enrolled?
        let roster = load_table(self.fetcher.as_ref(), &paths.roster).await?;
        let student = match find_student(&roster, student_id) {
            Some(row) => row,
            None => {
                debug!(rows = roster.len(), "not on roster");
                return Ok(None);
            }
        };

        // 3) + 4) secondary lists, independently
        let (passed, is_assistant) = tokio::join!(
            self.listed_in(&paths.pass_list, student_id, "pass list"),
            self.listed_in(&paths.assistant_list, student_id, "assistant list"),
        );

        // 5) compose
        let matched_id = student.student_id.trim();
        let result = EligibilityResult {
            student_id: if matched_id.is_empty() {
                student_id.trim().to_string()
            } else {
                matched_id.to_string()
            },
            name: student.name.trim().to_string(),
            passed,
            is_assistant,
            program,
            period,
        };
        debug!(passed, is_assistant, "resolved");
        Ok(Some(result))
    }

    async fn listed_in(&self, location: &str, student_id: &str, what: &str) -> bool {
        match load_table(self.fetcher.as_ref(), location).await {
            Ok(rows) => find_student(&rows, student_id).is_some(),
            Err(e) => {
                warn!(location, error = %e, "{} unavailable; treating as not listed", what);
                false
            }
        }
    }
}
