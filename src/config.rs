use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::app::lead_manager_use_case::LeadManagementConfig;
use crate::constants;
use crate::error::{ProspectorError, Result};
use crate::infra::notification_channels::{ChatConfig, NotificationsConfig, WebhookConfig};
use crate::pipeline::pipeline_config::PipelineConfig;
use crate::pipeline::processing::filter::FilterConfig;
use crate::pipeline::processing::scoring::{AutoQualifyOnScore, ScorerConfig, ScoringCriteria};

/// File configuration; every section is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub scoring: ScoringSection,
    #[serde(default)]
    pub manager: LeadManagementConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Processing order; names that are not supported are skipped at run time
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            sources: default_sources(),
        }
    }
}

fn default_sources() -> Vec<String> {
    constants::get_supported_sources()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSection {
    /// Defaults to on when any criterion is configured
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub criteria: ScoringCriteria,
    #[serde(default)]
    pub auto_qualify: Option<AutoQualifyOnScore>,
}

impl ScoringSection {
    pub fn scorer_config(&self) -> Option<ScorerConfig> {
        let has_criteria = !self.criteria.configured_weights().is_empty();
        if self.enabled.unwrap_or(has_criteria) {
            Some(ScorerConfig {
                criteria: self.criteria.clone(),
                auto_qualify: self.auto_qualify.clone(),
            })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    constants::DEFAULT_HTTP_TIMEOUT_SECS
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
        }
    }
}

fn default_log_level() -> String {
    constants::DEFAULT_LOG_LEVEL.to_string()
}

fn default_log_dir() -> String {
    constants::DEFAULT_LOG_DIR.to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus scrape port; no exporter when absent
    #[serde(default)]
    pub port: Option<u16>,
}

impl FromStr for Config {
    type Err = ProspectorError;

    fn from_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_content = fs::read_to_string(path).map_err(|e| {
            ProspectorError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config_content.parse()
    }

    /// Like [`Config::load`], but a missing file yields the defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `PROSPECTOR_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("PROSPECTOR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(dir) = lookup("PROSPECTOR_LOG_DIR") {
            self.logging.dir = dir;
        }
        if let Some(port) = lookup("PROSPECTOR_METRICS_PORT") {
            let port = port.trim().parse::<u16>().map_err(|e| {
                ProspectorError::Config(format!(
                    "Invalid PROSPECTOR_METRICS_PORT '{}': {}",
                    port, e
                ))
            })?;
            self.metrics.port = Some(port);
        }
        if let Some(timeout) = lookup("PROSPECTOR_HTTP_TIMEOUT_SECS") {
            self.http.timeout_seconds = timeout.trim().parse::<u64>().map_err(|e| {
                ProspectorError::Config(format!(
                    "Invalid PROSPECTOR_HTTP_TIMEOUT_SECS '{}': {}",
                    timeout, e
                ))
            })?;
        }
        if let Some(url) = lookup("PROSPECTOR_WEBHOOK_URL") {
            match self.notifications.webhook.as_mut() {
                Some(webhook) => webhook.url = url,
                None => {
                    self.notifications.webhook = Some(WebhookConfig {
                        url,
                        headers: Default::default(),
                    })
                }
            }
        }
        if let Some(url) = lookup("PROSPECTOR_CHAT_WEBHOOK_URL") {
            match self.notifications.chat.as_mut() {
                Some(chat) => chat.webhook_url = url,
                None => {
                    self.notifications.chat = Some(ChatConfig {
                        webhook_url: url,
                        channel: None,
                        username: None,
                    })
                }
            }
        }
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            sources: self.pipeline.sources.clone(),
            filter: self.filter.clone(),
            scorer: self.scoring.scorer_config(),
            manager: self.manager.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LeadStatus;
    use std::collections::HashMap;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config.pipeline.sources, vec!["sedo", "opensea", "godaddy"]);
        assert_eq!(config.http.timeout_seconds, 10);
        assert_eq!(config.logging.level, "info");
        assert!(config.metrics.port.is_none());
        assert!(config.scoring.scorer_config().is_none());
        assert!(config.notifications.email.is_none());
    }

    #[test]
    fn test_full_config_parses() {
        let config: Config = r##"
            [pipeline]
            sources = ["godaddy", "sedo"]

            [filter]
            min_portfolio_size = 5
            exclude_categories = ["Adult"]

            [scoring.criteria.domain_length]
            min = 5
            max = 15
            weight = 2

            [scoring.criteria.category_match]
            values = ["Technology"]
            weight = 1

            [scoring.auto_qualify]
            min_score = 0.7
            status = "qualified"

            [manager]
            default_status = "contacted"

            [manager.auto_qualify]
            min_portfolio_size = 10
            categories = ["Technology"]

            [notifications.chat]
            webhook_url = "https://hooks.example.com/abc"
            channel = "#sales"

            [http]
            timeout_seconds = 3
        "##
        .parse()
        .unwrap();

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.sources, vec!["godaddy", "sedo"]);
        assert_eq!(pipeline.filter.min_portfolio_size, Some(5));
        let scorer = pipeline.scorer.expect("scoring enabled by criteria");
        assert_eq!(scorer.criteria.max_possible_score(), 3.0);
        assert_eq!(scorer.auto_qualify.unwrap().status, LeadStatus::Qualified);
        assert_eq!(pipeline.manager.default_status, Some(LeadStatus::Contacted));
        assert_eq!(
            pipeline.manager.auto_qualify.unwrap().min_portfolio_size,
            Some(10)
        );
        assert_eq!(config.notifications.chat.unwrap().channel.as_deref(), Some("#sales"));
        assert_eq!(config.http.timeout_seconds, 3);
    }

    #[test]
    fn test_scoring_can_be_disabled_explicitly() {
        let config: Config = r#"
            [scoring]
            enabled = false

            [scoring.criteria.market_demand]
            weight = 1
        "#
        .parse()
        .unwrap();
        assert!(config.scoring.scorer_config().is_none());
    }

    #[test]
    fn test_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PROSPECTOR_LOG_LEVEL", "debug"),
            ("PROSPECTOR_METRICS_PORT", "9100"),
            ("PROSPECTOR_WEBHOOK_URL", "https://crm.example.com/hook"),
        ]);
        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.metrics.port, Some(9100));
        assert_eq!(
            config.notifications.webhook.unwrap().url,
            "https://crm.example.com/hook"
        );
    }

    #[test]
    fn test_invalid_override_is_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|key| {
                (key == "PROSPECTOR_METRICS_PORT").then(|| "not-a-port".to_string())
            })
            .unwrap_err();
        assert!(matches!(err, ProspectorError::Config(_)));
    }

    #[test]
    fn test_unreadable_file_is_config_error() {
        let err = Config::load("/definitely/not/here/config.toml").unwrap_err();
        assert!(matches!(err, ProspectorError::Config(_)));
        assert!(Config::load_or_default("/definitely/not/here/config.toml").is_ok());
    }
}
