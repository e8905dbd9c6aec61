//! Prompt, wire and result types for the generation endpoint

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Variables handed to a template prompt
pub type Vars = HashMap<String, String>;

// ===== Prompt =====

/// Anything that can turn itself into prompt text
pub trait Render: Send + Sync
{   fn render(&self, vars: &Vars) -> String;
}

/// Text sent to the model: either ready to go or a template
/// rendered against the caller's variables
pub enum Prompt
{   Rendered(String)
  , Template(Box<dyn Render>)
}

impl Prompt
{   pub fn template(template: impl Render + 'static) -> Self
    {   Prompt::Template(Box::new(template))
    }

    pub fn render(&self, vars: &Vars) -> String
    {   match self
        {   Prompt::Rendered(text) => text.clone()
          , Prompt::Template(template) => template.render(vars)
        }
    }
}

impl fmt::Debug for Prompt
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   match self
        {   Prompt::Rendered(text) => {
              f.debug_tuple("Rendered").field(text).finish()
            }
          , Prompt::Template(_) => {
              f.write_str("Template(..)")
            }
        }
    }
}

impl From<String> for Prompt
{   fn from(s: String) -> Self
    {   Prompt::Rendered(s)
    }
}

impl From<&str> for Prompt
{   fn from(s: &str) -> Self
    {   Prompt::Rendered(s.to_string())
    }
}

/// `${name}` substitution. Placeholders without a matching
/// variable are left in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template
{   source: String
}

impl Template
{   pub fn new(source: impl Into<String>) -> Self
    {   Template { source: source.into() }
    }
}

impl Render for Template
{   fn render(&self, vars: &Vars) -> String
    {   let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();
        while let Some(start) = rest.find("${")
        {   out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}')
            {   Some(end) => {
                  let name = &after[..end];
                  match vars.get(name)
                  {   Some(value) => out.push_str(value)
                    , None => out.push_str(&rest[start..start + end + 3])
                  }
                  rest = &after[end + 1..];
                }
              , None => {
                  out.push_str(&rest[start..]);
                  rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

// ===== Wire Types =====

pub const TEMPERATURE: f64 = 0.7;
pub const TOP_K: u32 = 40;
pub const TOP_P: f64 = 0.95;
pub const MAX_OUTPUT_TOKENS: u32 = 8192;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content
{   #[serde(default)]
    pub parts: Vec<Part>
}

impl Content
{   pub fn text(text: impl Into<String>) -> Self
    {   Content
        {   parts: vec![Part { text: Some(text.into()) }]
        }
    }
}

/// Sampling parameters; fixed for every request this crate sends
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig
{   pub temperature: f64
  , pub top_k: u32
  , pub top_p: f64
  , pub max_output_tokens: u32
}

impl Default for GenerationConfig
{   fn default() -> Self
    {   GenerationConfig
        {   temperature: TEMPERATURE
          , top_k: TOP_K
          , top_p: TOP_P
          , max_output_tokens: MAX_OUTPUT_TOKENS
        }
    }
}

/// Body of a `generateContent` call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest
{   pub contents: Vec<Content>
  , pub generation_config: GenerationConfig
}

impl GenerationRequest
{   pub fn new(prompt: &str) -> Self
    {   GenerationRequest
        {   contents: vec![Content::text(prompt)]
          , generation_config: GenerationConfig::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate
{   #[serde(default)]
    pub content: Option<Content>
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata
{   #[serde(default)]
    pub prompt_token_count: u64
  , #[serde(default)]
    pub candidates_token_count: u64
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse
{   #[serde(default)]
    pub candidates: Option<Vec<Candidate>>
  , #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>
}

/// Structured error payload returned with non-200 responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope
{   pub error: ErrorDetail
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail
{   #[serde(default)]
    pub code: Option<u16>
  , #[serde(default)]
    pub message: String
  , #[serde(default)]
    pub status: Option<String>
}

// ===== Result =====

/// Normalized outcome of one successful `generate` call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult
{   /// Text extracted from the first candidate
    pub answer: String
  , /// The rendered prompt exactly as sent
    pub prompt: String
  , /// Text as the provider returned it
    pub raw_response: String
  , /// Wall clock of the successful attempt
    pub duration: Duration
  , pub prompt_tokens: u64
  , pub completion_tokens: u64
  , /// Attempt number that succeeded; for a fresh call this is
    /// the number of retries taken
    pub retries: usize
}
