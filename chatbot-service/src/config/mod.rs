use crate::services::providers::gemini::{GeminiConfig, GEMINI_API_BASE};
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Persona and formatting rules sent with every conversation.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a helpful and compassionate AI assistant for breast cancer patients. \
Your role is to provide mental health guidance, suggest healthy diet options, and recommend daily routine activities.\n\n\
FORMATTING RULES:\n\
1. **DO NOT USE TABLES**. Do not use pipes `|` or dashes `---` to create visual tables. Instead, use clear headers and bulleted lists.\n\
2. Use standard bullet points (• or -) for lists.\n\
3. Use bold text (**Title**) for section headings.\n\
4. Keep the layout clean and easy to read on mobile devices.\n\
5. Avoid using special symbols or complex Markdown that might not render well.\n\
6. Be supportive and gentle.\n\n\
IMPORTANT: You are an AI, not a doctor. Do not give medical diagnosis or prescribe medication. \
Always advise consulting with their healthcare provider for medical decisions.";

#[derive(Debug, Clone)]
pub struct ChatbotConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub cors: CorsSettings,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// Absent keys are not a startup error; chat requests answer 500 instead.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub api_base: String,
    pub system_instruction: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CorsSettings {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl ChatbotConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the service settings from an arbitrary variable source.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let timeout_secs = match lookup("GEMINI_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "GEMINI_TIMEOUT_SECS must be a whole number of seconds, got '{}': {}",
                    raw,
                    e
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GEMINI_TIMEOUT_SECS must be at least 1 second"
            )));
        }

        Ok(ChatbotConfig {
            common,
            gemini: GeminiSettings {
                api_key: lookup("GEMINI_API_KEY")
                    .filter(|key| !key.trim().is_empty())
                    .map(Secret::new),
                model: get("GEMINI_MODEL", DEFAULT_MODEL),
                api_base: get("GEMINI_API_BASE", GEMINI_API_BASE),
                system_instruction: get("CHATBOT_SYSTEM_INSTRUCTION", DEFAULT_SYSTEM_INSTRUCTION),
                timeout_secs,
            },
            cors: CorsSettings {
                allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                    .map(|raw| {
                        raw.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        })
    }

    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.gemini.api_key.clone(),
            model: self.gemini.model.clone(),
            api_base: self.gemini.api_base.clone(),
            system_instruction: self.gemini.system_instruction.clone(),
            timeout: Duration::from_secs(self.gemini.timeout_secs),
        }
    }
}
