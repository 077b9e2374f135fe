use std::{env, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::serde_as;
use tokio::fs;

const CONFIG_PATH: &str = "Config.toml";

pub async fn load_config() -> anyhow::Result<Config> {
    let path = env::var("CONFIG_PATH").unwrap_or_else(|_| CONFIG_PATH.to_string());
    let contents = fs::read_to_string(&path).await?;
    let config = toml::from_str(&contents)?;
    Ok(config)
}

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    pub bind: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
}

/// Credentials come from the named profile; region and endpoint fall back to
/// the SDK's own resolution when unset.
#[derive(Clone, Debug, Deserialize)]
pub struct AwsConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            region: None,
            endpoint_url: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_filter() }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("frontend")
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_profile() -> String {
    String::from("default")
}

fn default_filter() -> String {
    String::from("info")
}
