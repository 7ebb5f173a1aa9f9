//! Configuration for a single invocation.
//!
//! Values are merged from built-in defaults, the optional
//! `~/.gptifier/gptifier.toml` file, and `GPT_`-prefixed environment
//! variables (nested keys separated by `__`, e.g. `GPT_OLLAMA__PORT=11500`).
//! API credentials come from `OPENAI_API_KEY` and `OPENAI_ADMIN_KEY` and are
//! handed to the clients explicitly.

use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::BaseDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::errors::GptError;

pub const DATA_DIR_NAME: &str = ".gptifier";
pub const CONFIG_FILE_NAME: &str = "gptifier.toml";
pub const COMPLETIONS_FILE_NAME: &str = "completions.gpt";
pub const EMBEDDINGS_FILE_NAME: &str = "embeddings.gpt";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

const ENV_API_KEY: &str = "OPENAI_API_KEY";
const ENV_ADMIN_KEY: &str = "OPENAI_ADMIN_KEY";
const ENV_PREFIX: &str = "GPT_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(skip)]
    pub credentials: Credentials,
}

/// Hosted backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model_run: Option<String>,
    pub model_short: Option<String>,
    pub model_embed: Option<String>,
    pub model_edit: Option<String>,
    pub model_img: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model_run: None,
            model_short: None,
            model_embed: None,
            model_edit: None,
            model_img: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

/// Local backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub host: String,
    pub port: u16,
    pub model_run: Option<String>,
    pub model_short: Option<String>,
    pub model_embed: Option<String>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 11434,
            model_run: None,
            model_short: None,
            model_embed: None,
        }
    }
}

impl OllamaConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/api", self.host, self.port)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout. `None` waits as long as the server does.
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Bearer tokens, kept out of the serialized configuration.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub admin_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var(ENV_API_KEY).ok(),
            admin_key: env::var(ENV_ADMIN_KEY).ok(),
        }
    }

    pub fn api_key(&self) -> Result<&str, GptError> {
        self.api_key
            .as_deref()
            .ok_or(GptError::MissingCredential { name: ENV_API_KEY })
    }

    pub fn admin_key(&self) -> Result<&str, GptError> {
        self.admin_key
            .as_deref()
            .ok_or(GptError::MissingCredential {
                name: ENV_ADMIN_KEY,
            })
    }
}

/// What a model is being picked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelPurpose {
    Run,
    Short,
    Embed,
    Edit,
}

impl Config {
    /// Load configuration from the data directory and the environment.
    pub fn load() -> Result<Self, GptError> {
        let file = data_dir().ok().map(|dir| dir.join(CONFIG_FILE_NAME));
        Self::load_from(file.as_deref())
    }

    /// Load configuration using `file` as the TOML layer, if it exists.
    pub fn load_from(file: Option<&Path>) -> Result<Self, GptError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if let Some(file) = file.filter(|f| f.exists()) {
            tracing::debug!("Reading configuration from {}", file.display());
            figment = figment.merge(Toml::file(file));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: Config = figment
            .extract()
            .map_err(|e| GptError::Config(e.to_string()))?;
        config.credentials = Credentials::from_env();
        Ok(config)
    }

    /// The configured model for `purpose` on the selected backend.
    pub fn model_for(&self, purpose: ModelPurpose, use_local: bool) -> Option<&str> {
        let model = match (purpose, use_local) {
            (ModelPurpose::Run, false) => &self.openai.model_run,
            (ModelPurpose::Short, false) => &self.openai.model_short,
            (ModelPurpose::Embed, false) => &self.openai.model_embed,
            (ModelPurpose::Edit, false) => &self.openai.model_edit,
            (ModelPurpose::Run, true) => &self.ollama.model_run,
            (ModelPurpose::Short, true) => &self.ollama.model_short,
            (ModelPurpose::Embed, true) => &self.ollama.model_embed,
            (ModelPurpose::Edit, true) => return None,
        };
        model.as_deref()
    }

    /// Pick the model from the command line, falling back to configuration.
    pub fn resolve_model(
        &self,
        flag: Option<&str>,
        purpose: ModelPurpose,
        use_local: bool,
    ) -> Result<String, GptError> {
        match flag {
            Some("") => Err(GptError::validation("Model is empty")),
            Some(model) => Ok(model.to_string()),
            None => self
                .model_for(purpose, use_local)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .ok_or(GptError::NoModel),
        }
    }
}

/// `~/.gptifier`, whether or not it exists yet
pub fn data_dir() -> Result<PathBuf, GptError> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(DATA_DIR_NAME))
        .ok_or_else(|| GptError::Config("Could not locate user home directory!".to_string()))
}
