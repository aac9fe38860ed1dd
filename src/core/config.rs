use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default = "default_export")]
    pub export_folder: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String, // "perplexity" or "openai"
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,
    #[serde(default = "default_script_temperature")]
    pub script_temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_data")]
    pub data_folder: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

fn default_export() -> String {
    "output".to_string()
}
fn default_provider() -> String {
    "perplexity".to_string()
}
fn default_model() -> String {
    "sonar".to_string()
}
fn default_summary_temperature() -> f32 {
    0.8
}
fn default_script_temperature() -> f32 {
    0.7
}
fn default_data() -> String {
    "data".to_string()
}
fn default_bucket() -> String {
    "bd_gen_saved_stories".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            model: default_model(),
            base_url: None,
            summary_temperature: default_summary_temperature(),
            script_temperature: default_script_temperature(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_folder: default_data(),
            bucket: default_bucket(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            storage: StorageConfig::default(),
            export_folder: default_export(),
        }
    }
}

impl LlmConfig {
    pub fn default_base_url(&self) -> &'static str {
        match self.provider.as_str() {
            "openai" => "https://api.openai.com/v1",
            _ => "https://api.perplexity.ai",
        }
    }

    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(self.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// Configured key, or the environment variable when the file leaves it blank.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.yml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!("{} not found, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let base_url = self.llm.resolved_base_url();
        url::Url::parse(&base_url).with_context(|| format!("Invalid llm.base_url: {}", base_url))?;
        for (name, t) in [
            ("summary_temperature", self.llm.summary_temperature),
            ("script_temperature", self.llm.script_temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                anyhow::bail!("llm.{} must be between 0 and 2, got {}", name, t);
            }
        }
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.storage.data_folder)?;
        fs::create_dir_all(&self.export_folder)?;
        Ok(())
    }
}
