use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_MAX_TOKENS: u32 = 10;

/// Contents of the local secrets file: `{"openai_api": "<key>"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub openai_api: String,
}

impl Credentials {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Credentials(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            Error::Credentials(format!("Malformed secrets file {}: {}", path.display(), e))
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub concurrency_limit: usize,
    pub requests_per_minute: Option<u32>,
    pub request_timeout: Option<Duration>,
    pub checkpoint_path: Option<PathBuf>,
}

impl Config {
    /// Loads the API key from `credentials_path` (or `OPENAI_CREDENTIALS`)
    /// and everything else from the environment.
    pub fn from_env(credentials_path: Option<&Path>) -> Result<Self> {
        let credentials_path = credentials_path
            .map(Path::to_path_buf)
            .or_else(|| env::var("OPENAI_CREDENTIALS").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("openai.json"));

        let credentials = Credentials::load(&credentials_path)?;
        if credentials.openai_api.trim().is_empty() {
            return Err(Error::Credentials(format!(
                "openai_api is empty in {}",
                credentials_path.display()
            )));
        }

        let base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let model = env::var("OPENAI_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let concurrency_limit = env::var("CONCURRENCY_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        let requests_per_minute = env::var("REQUESTS_PER_MINUTE")
            .ok()
            .and_then(|v| v.parse().ok());

        let request_timeout = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs);

        let checkpoint_path = env::var("CHECKPOINT_PATH").ok().map(PathBuf::from);

        Ok(Self {
            api_key: credentials.openai_api,
            base_url,
            model,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            concurrency_limit,
            requests_per_minute,
            request_timeout,
            checkpoint_path,
        })
    }
}

/// What to do with rows whose developer cell is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    /// Send the raw cell text to the model anyway.
    #[default]
    Classify,
    /// Leave the output cell empty without issuing a request.
    Skip,
    /// Remove the row from the output table.
    Drop,
}

impl FromStr for MissingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "classify" => Ok(MissingPolicy::Classify),
            "skip" => Ok(MissingPolicy::Skip),
            "drop" => Ok(MissingPolicy::Drop),
            other => Err(Error::Config(format!(
                "unknown missing-value policy '{}' (expected classify, skip or drop)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingPolicy::Classify => write!(f, "classify"),
            MissingPolicy::Skip => write!(f, "skip"),
            MissingPolicy::Drop => write!(f, "drop"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub column: String,
    pub output_column: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub concurrency_limit: usize,
    pub missing_policy: MissingPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data/cleaned_game.csv"),
            output_path: PathBuf::from("data/developer_category.csv"),
            column: "developer".to_string(),
            output_column: "developer_category".to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            concurrency_limit: 1,
            missing_policy: MissingPolicy::default(),
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            concurrency_limit: config.concurrency_limit,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_credentials() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"openai_api": "sk-test", "other": 1}}"#).unwrap();

        let credentials = Credentials::load(file.path()).unwrap();
        assert_eq!(credentials.openai_api, "sk-test");
    }

    #[test]
    fn test_load_credentials_missing_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"anthropic": "nope"}}"#).unwrap();

        let err = Credentials::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::Credentials(_)));
    }

    #[test]
    fn test_load_credentials_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Credentials::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::Credentials(_)));
    }

    #[test]
    fn test_missing_policy_parse() {
        assert_eq!("skip".parse::<MissingPolicy>().unwrap(), MissingPolicy::Skip);
        assert_eq!("DROP".parse::<MissingPolicy>().unwrap(), MissingPolicy::Drop);
        assert!("ignore".parse::<MissingPolicy>().is_err());
        assert_eq!(MissingPolicy::default(), MissingPolicy::Classify);
    }

    #[test]
    fn test_pipeline_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, 0.5);
        assert_eq!(config.max_tokens, 10);
        assert_eq!(config.concurrency_limit, 1);
        assert_eq!(config.output_column, "developer_category");
    }
}
