use crate::adapters::http::DEFAULT_USER_AGENT;
use crate::adapters::sink::OutputFormat;
use crate::core::deadline::AcademicCycle;
use crate::domain::model::SourceListing;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 500;
const DEFAULT_CONCURRENT_REQUESTS: usize = 1;

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub pipeline: PipelineConfig,
    pub cycle: Option<CycleConfig>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub sources: Vec<SourceListing>,
    pub discovery: Option<DiscoveryConfig>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Calendar year in which the academic cycle's September falls.
    pub start_year: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub concurrent_requests: Option<usize>,
    pub user_agent: Option<String>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    pub seed_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

fn default_formats() -> Vec<String> {
    OutputFormat::ALL.iter().map(|f| f.to_string()).collect()
}

impl IngestConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses the configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` placeholders (e.g. `${OLIMPIADA_BASE}`) with environment
    /// values; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_PLACEHOLDER
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;

        if self.sources.is_empty() && self.discovery.is_none() {
            return Err(EtlError::MissingConfigError {
                field: "sources".to_string(),
            });
        }

        for (index, source) in self.sources.iter().enumerate() {
            validation::validate_non_empty_string(&format!("sources[{}].name", index), &source.name)?;
            validation::validate_url(&format!("sources[{}].url", index), &source.url)?;
        }

        if let Some(discovery) = &self.discovery {
            validation::validate_url("discovery.seed_url", &discovery.seed_url)?;
        }

        if let Some(year) = self.cycle.as_ref().and_then(|c| c.start_year) {
            validation::validate_range("cycle.start_year", year, 2000, 2100)?;
        }

        if let Some(concurrent) = self.fetch.concurrent_requests {
            validation::validate_positive_number("fetch.concurrent_requests", concurrent, 1)?;
        }

        if let Some(timeout) = self.fetch.timeout_seconds {
            validation::validate_range("fetch.timeout_seconds", timeout, 1, 600)?;
        }

        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_choices("output.formats", &self.output.formats, &OutputFormat::ALL)?;

        Ok(())
    }

    /// The configured cycle, or the one today falls in.
    pub fn academic_cycle(&self) -> AcademicCycle {
        self.cycle_start_year()
            .map(AcademicCycle::new)
            .unwrap_or_else(AcademicCycle::current)
    }

    pub fn output_formats(&self) -> Result<Vec<OutputFormat>> {
        self.output.formats.iter().map(|f| f.parse()).collect()
    }

    pub fn user_agent(&self) -> &str {
        self.fetch.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn headers(&self) -> HashMap<String, String> {
        self.fetch.headers.clone().unwrap_or_default()
    }

    pub fn discovery_seed(&self) -> Option<&str> {
        self.discovery.as_ref().map(|d| d.seed_url.as_str())
    }
}

impl ConfigProvider for IngestConfig {
    fn sources(&self) -> &[SourceListing] {
        &self.sources
    }

    fn cycle_start_year(&self) -> Option<i32> {
        self.cycle.as_ref().and_then(|c| c.start_year)
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    fn retry_attempts(&self) -> u32 {
        self.fetch.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS)
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.fetch.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS))
    }

    fn concurrent_requests(&self) -> usize {
        self.fetch
            .concurrent_requests
            .unwrap_or(DEFAULT_CONCURRENT_REQUESTS)
    }
}

impl Validate for IngestConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
