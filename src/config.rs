//! Settings for the Gemini generation and embedding endpoints

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str
  = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 240;
pub const DEFAULT_BACKOFF_SECS: u64 = 60;
pub const DEFAULT_MAX_RETRIES: usize = 3;

pub const DEFAULT_EMBEDDING_MODEL: &str
  = "models/embedding-001";
/// Stand-in for API keys in debug output
const REDACTED: &str = "***";

/// Environment variable consulted when no embedding key is given
pub const EMBEDDING_API_KEY_ENV: &str = "gemini_api_key";

/// Connection settings for one generation client.
/// Read-only once handed to a client.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiSettings
{   /// Google Gemini API key
    pub api_key: String
  , /// Gemini model name
    pub model: String
  , /// Maximum context size of the model. Informational only,
    /// nothing in this crate trims or enforces it.
    #[serde(default)]
    pub context_size: usize
  , /// Base URL of the Gemini API
    #[serde(default = "default_api_url")]
    pub api_url: String
  , /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64
  , /// Wait in seconds after a rate-limit response
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64
  , /// Attempts allowed per call
    #[serde(default = "default_max_retries")]
    pub max_retries: usize
}

fn default_api_url() -> String
{   DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64
{   DEFAULT_TIMEOUT_SECS
}

fn default_backoff_secs() -> u64
{   DEFAULT_BACKOFF_SECS
}

fn default_max_retries() -> usize
{   DEFAULT_MAX_RETRIES
}

impl Default for GeminiSettings
{   fn default() -> Self
    {   GeminiSettings
        {   api_key: String::new()
          , model: String::new()
          , context_size: 0
          , api_url: default_api_url()
          , timeout_secs: DEFAULT_TIMEOUT_SECS
          , backoff_secs: DEFAULT_BACKOFF_SECS
          , max_retries: DEFAULT_MAX_RETRIES
        }
    }
}

impl fmt::Debug for GeminiSettings
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("GeminiSettings")
          .field("api_key", &REDACTED)
          .field("model", &self.model)
          .field("context_size", &self.context_size)
          .field("api_url", &self.api_url)
          .field("timeout_secs", &self.timeout_secs)
          .field("backoff_secs", &self.backoff_secs)
          .field("max_retries", &self.max_retries)
          .finish()
    }
}

impl GeminiSettings
{   /// Settings for an arbitrary model with default
    /// connection parameters
    pub fn new(
      api_key: impl Into<String>
    , model: impl Into<String>
    , context_size: usize
    ) -> Self
    {   GeminiSettings
        {   api_key: api_key.into()
          , model: model.into()
          , context_size
          , ..GeminiSettings::default()
        }
    }

    /// Settings for a named preset, e.g. `gemini/gemini-1.5-pro`
    pub fn preset(
      name: &str
    , api_key: impl Into<String>
    ) -> Result<Self, crate::error::Error>
    {   let preset = presets()
          .remove(name)
          .ok_or_else(|| {
            crate::error::Error::InvalidConfiguration(
              format!("Unknown Gemini preset: {}", name)
            )
          })?;
        debug!("Using preset {} ({})", name, preset.model);
        Ok(GeminiSettings::new(
          api_key,
          preset.model,
          preset.context_size
        ))
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>)
      -> Self
    {   self.api_url = api_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self
    {   self.timeout_secs = secs;
        self
    }

    pub fn with_backoff_secs(mut self, secs: u64) -> Self
    {   self.backoff_secs = secs;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize)
      -> Self
    {   self.max_retries = max_retries;
        self
    }

    pub fn timeout(&self) -> Duration
    {   Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration
    {   Duration::from_secs(self.backoff_secs)
    }
}

/// A named model with its context size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPreset
{   pub model: &'static str
  , pub context_size: usize
}

/// Registry of known model presets keyed by preset name
pub fn presets() -> HashMap<&'static str, ModelPreset>
{   HashMap::from([
      ( "gemini/gemini-pro"
      , ModelPreset
        {   model: "gemini-pro"
          , context_size: 30_720
        }
      )
    , ( "gemini/gemini-1.5-pro"
      , ModelPreset
        {   model: "gemini-1.5-pro"
          , context_size: 2_097_152
        }
      )
    , ( "gemini/gemini-1.5-flash"
      , ModelPreset
        {   model: "gemini-1.5-flash"
          , context_size: 1_048_576
        }
      )
    ])
}

/// Load generation settings from a JSON file
pub fn load_settings(path: impl AsRef<Path>)
  -> Result<GeminiSettings, crate::error::Error>
{   let path = path.as_ref();
    debug!("Loading settings from {}", path.display());
    let raw = std::fs::read_to_string(path).map_err(|e| {
      crate::error::Error::InvalidConfiguration(
        format!("{}: {}", path.display(), e)
      )
    })?;
    serde_json::from_str(&raw).map_err(|e| {
      crate::error::Error::InvalidConfiguration(
        format!("{}: {}", path.display(), e)
      )
    })
}

/// Embedding endpoint configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings
{   /// Embedding model, including the `models/` prefix
    #[serde(default = "default_embedding_model")]
    pub model: String
  , /// Explicit API key; falls back to `gemini_api_key`
    #[serde(default)]
    pub api_key: Option<String>
  , #[serde(default = "default_api_url")]
    pub api_url: String
  , #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64
}

fn default_embedding_model() -> String
{   DEFAULT_EMBEDDING_MODEL.to_string()
}

impl Default for EmbeddingSettings
{   fn default() -> Self
    {   EmbeddingSettings
        {   model: default_embedding_model()
          , api_key: None
          , api_url: default_api_url()
          , timeout_secs: DEFAULT_TIMEOUT_SECS
        }
    }
}

impl fmt::Debug for EmbeddingSettings
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("EmbeddingSettings")
          .field("model", &self.model)
          .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
          .field("api_url", &self.api_url)
          .field("timeout_secs", &self.timeout_secs)
          .finish()
    }
}

impl EmbeddingSettings
{   /// Resolve the API key: explicit first, then the
    /// `gemini_api_key` environment variable
    pub fn resolve_api_key(&self)
      -> Result<String, crate::error::Error>
    {   self.resolve_api_key_with(|name| {
          std::env::var(name).ok()
        })
    }

    /// Same as `resolve_api_key` with a custom variable lookup
    pub fn resolve_api_key_with<F>(&self, lookup: F)
      -> Result<String, crate::error::Error>
    where
      F: Fn(&str) -> Option<String>
    {   if let Some(key) = &self.api_key
        {   debug!("Using explicit embedding API key");
            return Ok(key.clone());
        }
        if let Some(key) = lookup(EMBEDDING_API_KEY_ENV)
        {   debug!(
              "Using embedding API key from {}",
              EMBEDDING_API_KEY_ENV
            );
            return Ok(key);
        }
        Err(crate::error::Error::InvalidConfiguration(
          format!(
            "No Gemini API key given and '{}' is not set",
            EMBEDDING_API_KEY_ENV
          )
        ))
    }

    pub fn timeout(&self) -> Duration
    {   Duration::from_secs(self.timeout_secs)
    }
}
