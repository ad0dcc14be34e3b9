// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use crate::error::{PortalError, PortalResult};

/// Practicum subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProgramType {
    #[serde(rename = "PBO")]
    Pbo,
    #[serde(rename = "Basis Data")]
    BasisData,
}

impl ProgramType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramType::Pbo => "PBO",
            ProgramType::BasisData => "Basis Data",
        }
    }
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgramType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "pbo" => Ok(ProgramType::Pbo),
            "basisdata" | "bd" => Ok(ProgramType::BasisData),
            _ => Err(format!("unknown practicum `{}` (expected PBO or Basis Data)", s)),
        }
    }
}

/// Practicum term, ordered chronologically.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Period {
    X,
    XI,
    XII,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::X => "X",
            Period::XI => "XI",
            Period::XII => "XII",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "X" => Ok(Period::X),
            "XI" => Ok(Period::XI),
            "XII" => Ok(Period::XII),
            _ => Err(format!("unknown period `{}` (expected X, XI or XII)", s)),
        }
    }
}

/// Combined certificate documents, one per role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificatePaths {
    pub regular: String,
    pub assistant: String,
}

/// Resource locations for one offered (program, period).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramPeriodPaths {
    pub roster: String,
    pub pass_list: String,
    pub assistant_list: String,
    pub certificates: CertificatePaths,
}

/// Where resource locations are resolved against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Http { base_url: String },
    Dir { root: PathBuf },
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_current_period() -> Period {
    Period::X
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
    pub source: SourceConfig,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Zero disables the fetch cache.
    #[serde(default)]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_current_period")]
    pub current_period: Period,
    #[serde(default)]
    pub programs: BTreeMap<ProgramType, BTreeMap<Period, ProgramPeriodPaths>>,
}

impl PortalConfig {
    /// Read and parse a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: PortalConfig = serde_yaml::from_str(text)?;
        Ok(config)
    }

    /// Tables and documents for `(program, period)`, or `ProgramPeriodNotOffered`.
    pub fn paths(&self, program: ProgramType, period: Period) -> PortalResult<&ProgramPeriodPaths> {
        self.programs
            .get(&program)
            .and_then(|periods| periods.get(&period))
            .ok_or(PortalError::ProgramPeriodNotOffered { program, period })
    }

    pub fn available_periods(&self, program: ProgramType) -> BTreeSet<Period> {
        self.programs
            .get(&program)
            .map(|periods| periods.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Pass lists and assistant lists of every offered pair.
    ///
    /// These can be republished while the portal runs and must never be served stale.
    pub fn status_lists(&self) -> BTreeSet<&str> {
        self.programs
            .values()
            .flat_map(|periods| periods.values())
            .flat_map(|paths| [paths.pass_list.as_str(), paths.assistant_list.as_str()])
            .collect()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}

impl Default for PortalConfig {
    /// Stock deployment: PBO and Basis Data offered in period X, files under `./data`.
    fn default() -> Self {
        let entry = |dir: &str, stem: &str| ProgramPeriodPaths {
            roster: format!("data/{}/{}.xlsx", dir, stem),
            pass_list: format!("data/{}/{}_l.xlsx", dir, stem),
            assistant_list: format!("data/{}/{}_a.xlsx", dir, stem),
            certificates: CertificatePaths {
                regular: "data/cert/c3rt_p.pdf".to_string(),
                assistant: "data/cert/c3rt_a.pdf".to_string(),
            },
        };

        let mut programs = BTreeMap::new();
        programs.insert(
            ProgramType::Pbo,
            BTreeMap::from([(Period::X, entry("p1", "d4t4_x1"))]),
        );
        programs.insert(
            ProgramType::BasisData,
            BTreeMap::from([(Period::X, entry("p2", "d4t4_x2"))]),
        );

        Self {
            source: SourceConfig::Dir {
                root: PathBuf::from("."),
            },
            fetch_timeout_secs: default_fetch_timeout_secs(),
            cache_ttl_secs: 0,
            current_period: default_current_period(),
            programs,
        }
    }
}
