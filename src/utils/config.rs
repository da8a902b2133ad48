use serde::{Deserialize, Serialize};

use crate::utils::errors::{PipelineError, Result};

/// Per-run configuration, persisted as `config.json` inside the checkpoint
/// directory. The on-disk copy is the single source of truth for resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub target_lang: String,
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
    pub max_workers: usize,
    pub per_request: usize,
    pub translate_columns: Vec<String>,
    pub keep_columns: Vec<String>,
    pub last_completed_batch: Option<usize>,
}

fn default_source_lang() -> String {
    "en".to_string()
}

impl RunConfig {
    pub fn new(
        target_lang: impl Into<String>,
        max_workers: usize,
        per_request: usize,
        translate_columns: Vec<String>,
        keep_columns: Vec<String>,
    ) -> Self {
        Self {
            target_lang: target_lang.into(),
            source_lang: default_source_lang(),
            max_workers,
            per_request,
            translate_columns,
            keep_columns,
            last_completed_batch: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_lang.is_empty() {
            return Err(PipelineError::Config("target_lang is empty".to_string()));
        }
        if self.translate_columns.is_empty() {
            return Err(PipelineError::Config(
                "translate_columns is empty".to_string(),
            ));
        }
        if self.max_workers == 0 {
            return Err(PipelineError::Config(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.per_request == 0 {
            return Err(PipelineError::Config(
                "per_request must be at least 1".to_string(),
            ));
        }
        // A column may hold only one role per run.
        for col in &self.translate_columns {
            if self.keep_columns.contains(col) {
                return Err(PipelineError::Config(format!(
                    "column `{col}` appears in both translate_columns and keep_columns"
                )));
            }
        }
        Ok(())
    }

    pub fn is_translate_column(&self, name: &str) -> bool {
        self.translate_columns.iter().any(|c| c == name)
    }

    pub fn is_keep_column(&self, name: &str) -> bool {
        self.keep_columns.iter().any(|c| c == name)
    }
}

/// Application-level defaults loaded from an optional TOML file. These never
/// override a persisted `RunConfig`; they only seed new runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub api: ApiSettings,
    pub pipeline: PipelineDefaults,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefaults {
    pub batch_size: usize,
    pub max_workers: usize,
    pub per_request: usize,
    pub batch_pause_seconds: u64,
    pub retry_base_delay_ms: u64,
    /// None retries transient backend errors indefinitely.
    pub retry_max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            api: ApiSettings {
                endpoint: "https://translate.example.com/translate".to_string(),
                api_key: None,
                timeout_seconds: 120,
            },
            pipeline: PipelineDefaults {
                batch_size: 1000,
                max_workers: 10,
                per_request: 10,
                batch_pause_seconds: 20,
                retry_base_delay_ms: 2000,
                retry_max_attempts: None,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl PipelineSettings {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        toml::from_str(&content).map_err(|e| PipelineError::Config(e.to_string()))
    }

    pub fn load_or_default(path: Option<&str>) -> Self {
        if let Some(p) = path {
            Self::load_from_file(p).unwrap_or_default()
        } else {
            Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> RunConfig {
        RunConfig::new("de", 2, 2, vec!["text".to_string()], vec!["id".to_string()])
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn empty_translate_columns_rejected() {
        let mut cfg = base_config();
        cfg.translate_columns.clear();
        assert!(matches!(
            cfg.validate(),
            Err(PipelineError::Config(msg)) if msg.contains("translate_columns")
        ));
    }

    #[test]
    fn overlapping_roles_rejected() {
        let mut cfg = base_config();
        cfg.keep_columns.push("text".to_string());
        assert!(matches!(cfg.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn zero_workers_rejected() {
        let mut cfg = base_config();
        cfg.max_workers = 0;
        assert!(matches!(cfg.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn source_lang_defaults_on_deserialize() {
        let json = r#"{
            "target_lang": "de",
            "max_workers": 2,
            "per_request": 2,
            "translate_columns": ["text"],
            "keep_columns": [],
            "last_completed_batch": null
        }"#;
        let cfg: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.source_lang, "en");
    }
}
