//! Configuration loading for Vendra.
//! Reads vendra.toml from the current directory or path in VENDRA_CONFIG env var.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vendra_common::VendraError;
use vendra_guardrails::policy::DenyPattern;
use vendra_guardrails::GuardrailsPolicy;
use vendra_llm::backend::{OllamaBackend, OpenAiBackend, OpenAiCompatibleBackend};
use vendra_llm::LlmBackend;


#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub guardrails: GuardrailsConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String { "data/vendra.db".to_string() }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" | "ollama" | "openai_compatible"
    #[serde(default = "default_llm_backend")]
    pub backend: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Used by the ollama and openai_compatible backends.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Falls back to VENDRA_OPENAI_API_KEY when empty.
    #[serde(default)]
    pub api_key: String,
}

fn default_llm_backend() -> String { "openai".to_string() }
fn default_llm_model()   -> String { "gpt-4o".to_string() }
fn default_base_url()    -> String { "http://localhost:11434".to_string() }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: default_llm_backend(),
            model: default_llm_model(),
            base_url: default_base_url(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GuardrailsConfig {
    /// Override for the user-facing blocked message.
    #[serde(default)]
    pub blocked_message: Option<String>,
    /// Deny patterns appended after the built-in rule set.
    #[serde(default)]
    pub extra_deny_patterns: Vec<ExtraPattern>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraPattern {
    pub pattern: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
}

fn default_csv_path() -> String { "data/Amazon Sale Report.csv".to_string() }

impl Default for DatasetConfig {
    fn default() -> Self {
        Self { csv_path: default_csv_path() }
    }
}

impl Config {
    /// Checks VENDRA_CONFIG env var first, then the current directory.
    /// A missing file yields the compiled-in defaults.
    pub fn load() -> vendra_common::Result<Self> {
        let path = std::env::var("VENDRA_CONFIG").unwrap_or_else(|_| "vendra.toml".to_string());

        if !Path::new(&path).exists() {
            tracing::warn!(path = %path, "no config file found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| VendraError::Config(format!("{path}: {e}")))?;
        Ok(config)
    }

    /// API key from config, falling back to the environment.
    pub fn resolved_api_key(&self) -> String {
        if self.llm.api_key.is_empty() {
            std::env::var("VENDRA_OPENAI_API_KEY").unwrap_or_default()
        } else {
            self.llm.api_key.clone()
        }
    }

    /// Gate policy: built-in rule set plus configured extras.
    pub fn guardrails_policy(&self) -> GuardrailsPolicy {
        let extra = self
            .guardrails
            .extra_deny_patterns
            .iter()
            .map(|p| DenyPattern::new(&p.pattern, &p.reason))
            .collect();
        let mut policy = GuardrailsPolicy::default().with_extra_patterns(extra);
        if let Some(ref message) = self.guardrails.blocked_message {
            policy = policy.with_blocked_message(message.clone());
        }
        policy
    }

    /// Construct the configured chat backend.
    pub fn build_backend(&self) -> vendra_common::Result<Arc<dyn LlmBackend>> {
        match self.llm.backend.as_str() {
            "ollama" => Ok(Arc::new(OllamaBackend::new(&self.llm.base_url, &self.llm.model))),
            "openai" => {
                let key = self.resolved_api_key();
                if key.is_empty() {
                    return Err(VendraError::Config(
                        "OpenAI backend selected but no API key found \
                         (set llm.api_key or VENDRA_OPENAI_API_KEY)"
                            .to_string(),
                    ));
                }
                Ok(Arc::new(OpenAiBackend::new(key, &self.llm.model)))
            }
            "openai_compatible" => {
                let key = self.resolved_api_key();
                let key = if key.is_empty() { None } else { Some(key) };
                Ok(Arc::new(OpenAiCompatibleBackend::new(
                    &self.llm.base_url,
                    &self.llm.model,
                    key,
                )))
            }
            other => Err(VendraError::Config(format!("unknown llm backend: {other}"))),
        }
    }
}
