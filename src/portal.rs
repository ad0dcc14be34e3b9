// src/portal.rs

use std::{collections::BTreeSet, sync::Arc};
use tracing::{error, info};

use crate::certificate::{CertificateArtifact, CertificateResolver};
use crate::config::{Period, PortalConfig, ProgramType, SourceConfig};
use crate::eligibility::{EligibilityResolver, EligibilityResult, Role};
use crate::error::{PortalError, PortalResult};
use crate::fetch::{CachingFetcher, DirFetcher, HttpFetcher, ResourceFetcher};

/// Entry points a UI calls: status lookup, certificate download, period listing.
pub struct Portal {
    config: Arc<PortalConfig>,
    eligibility: EligibilityResolver,
    certificates: CertificateResolver,
}

impl Portal {
    pub fn new(config: PortalConfig, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        let config = Arc::new(config);
        Self {
            eligibility: EligibilityResolver::new(config.clone(), fetcher.clone()),
            certificates: CertificateResolver::new(config.clone(), fetcher),
            config,
        }
    }

    /// Build the fetcher stack the config describes and wrap it in a portal.
    pub fn from_config(config: PortalConfig) -> PortalResult<Self> {
        let source: Arc<dyn ResourceFetcher> = match &config.source {
            SourceConfig::Http { base_url } => {
                Arc::new(HttpFetcher::new(base_url, config.fetch_timeout())?)
            }
            SourceConfig::Dir { root } => Arc::new(DirFetcher::new(root.clone())),
        };
        let fetcher: Arc<dyn ResourceFetcher> = match config.cache_ttl() {
            Some(ttl) => {
                info!(?ttl, "fetch cache enabled");
                Arc::new(CachingFetcher::new(source, ttl).uncached(config.status_lists()))
            }
            None => source,
        };
        Ok(Self::new(config, fetcher))
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Enrollment and pass status; `StudentNotFound` when not on the roster.
    pub async fn resolve_eligibility(
        &self,
        student_id: &str,
        program: ProgramType,
        period: Period,
    ) -> PortalResult<EligibilityResult> {
        let result = self
            .eligibility
            .resolve(student_id, program, period)
            .await
            .and_then(|found| {
                found.ok_or_else(|| PortalError::StudentNotFound {
                    student_id: student_id.trim().to_string(),
                })
            });
        log_unknown(result)
    }

    pub async fn resolve_certificate(
        &self,
        student_id: &str,
        program: ProgramType,
        period: Period,
        is_assistant: bool,
    ) -> PortalResult<CertificateArtifact> {
        let result = self
            .certificates
            .resolve(student_id, program, period, Role::from_assistant(is_assistant))
            .await
            .and_then(|artifact| {
                if artifact.bytes.is_empty() {
                    Err(PortalError::EmptyArtifact {
                        location: artifact.filename,
                    })
                } else {
                    Ok(artifact)
                }
            });
        log_unknown(result)
    }

    pub fn list_available_periods(&self, program: ProgramType) -> BTreeSet<Period> {
        self.config.available_periods(program)
    }

    /// Period preselected in the UI.
    pub fn current_period(&self) -> Period {
        self.config.current_period
    }
}

fn log_unknown<T>(result: PortalResult<T>) -> PortalResult<T> {
    if let Err(PortalError::Unknown(e)) = &result {
        error!(error = ?e, "unexpected failure");
    }
    result
}
