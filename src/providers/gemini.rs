use std::sync::Arc;
use std::time::Instant;
use log::{debug, error, info, trace, warn};

use crate::config::GeminiSettings;
use crate::error::Error;
use crate::request::{
  ErrorEnvelope, GenerationRequest, GenerationResponse,
  GenerationResult, Prompt, Vars,
};
use crate::retry::{RetryPolicy, Transient};
use crate::transport::{
  redact_key, HttpTransport, RawResponse, Transport,
  TransportError,
};

/// Approximate characters per token for Gemini models
const CHARS_PER_TOKEN: usize = 4;

// ===== Gemini Client =====

/// Client for the Gemini `generateContent` endpoint.
///
/// Rate limits, refused connections and timeouts are retried
/// under one shared budget; every other failure ends the call.
pub struct GeminiClient
{   settings: GeminiSettings
  , policy: RetryPolicy
  , transport: Arc<dyn Transport>
}

impl GeminiClient
{   pub fn new(settings: GeminiSettings) -> Self
    {   let transport = HttpTransport::with_connect_timeout(
          settings.timeout()
        );
        GeminiClient::with_transport(settings, Arc::new(transport))
    }

    pub fn with_transport(
      settings: GeminiSettings
    , transport: Arc<dyn Transport>
    ) -> Self
    {   debug!("Creating GeminiClient for: {}", settings.model);
        let policy = RetryPolicy::from_settings(&settings);
        GeminiClient
        {   settings
          , policy
          , transport
        }
    }

    pub fn settings(&self) -> &GeminiSettings
    {   &self.settings
    }

    fn endpoint(&self) -> String
    {   format!(
          "{}/v1beta/models/{}:generateContent?key={}",
          self.settings.api_url,
          self.settings.model,
          self.settings.api_key
        )
    }

    /// Get a completion for `prompt`
    pub async fn generate(
      &self
    , prompt: impl Into<Prompt>
    ) -> Result<GenerationResult, Error>
    {   self.generate_at(&prompt.into(), &Vars::new(), 0).await
    }

    /// Get a completion for a template prompt rendered with `vars`
    pub async fn generate_with(
      &self
    , prompt: &Prompt
    , vars: &Vars
    ) -> Result<GenerationResult, Error>
    {   self.generate_at(prompt, vars, 0).await
    }

    /// Get a completion starting from attempt number `attempt`.
    /// The prompt is rendered once; every retry sends the same
    /// body.
    pub async fn generate_at(
      &self
    , prompt: &Prompt
    , vars: &Vars
    , attempt: usize
    ) -> Result<GenerationResult, Error>
    {   self.policy.check(attempt)?;

        let prompt = prompt.render(vars);
        let body = serde_json::to_value(
            GenerationRequest::new(&prompt)
          )
          .map_err(|e| Error::ParseError(e.to_string()))?;
        let url = self.endpoint();
        trace!("Gemini request: {}", body);

        let mut attempt = attempt;
        loop
        {   self.policy.check(attempt)?;
            debug!(
              "Sending prompt to {} (attempt {})",
              redact_key(&url), attempt
            );

            let tic = Instant::now();
            let sent = self.transport
              .post_json(&url, &body, self.settings.timeout())
              .await;

            let failure = match sent
            {   Ok(response) if response.status == 429 => {
                  warn!(
                    "Rate limited by Gemini, retrying in {} seconds",
                    self.settings.backoff_secs
                  );
                  Transient::RateLimited
                }
              , Ok(response) if response.status != 200 => {
                  return Err(rejection(response));
                }
              , Ok(response) => {
                  let result = unwrap_response(
                    &response.body, &prompt, tic, attempt
                  )?;
                  info!(
                    "Gemini answered in {:?} ({} + {} tokens)",
                    result.duration,
                    result.prompt_tokens,
                    result.completion_tokens
                  );
                  return Ok(result);
                }
              , Err(TransportError::Connect(msg)) => {
                  warn!(
                    "Could not reach Gemini, retrying in {} seconds: {}",
                    self.policy.connect_delay.as_secs(), msg
                  );
                  Transient::ConnectionFailed
                }
              , Err(TransportError::Timeout) => {
                  warn!("Gemini request timed out, retrying");
                  Transient::TimedOut
                }
              , Err(TransportError::Other(msg)) => {
                  error!("Gemini request failed: {}", msg);
                  return Err(Error::HttpError(msg));
                }
            };

            if let Some(delay) = self.policy.delay_for(failure)
            {   tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }

    /// Rough token count for `text`, about four characters per
    /// token. Approximate only: not a tokenizer, do not use it for
    /// billing or to enforce the context size.
    pub fn estimate_token_count(&self, text: &str) -> usize
    {   estimate_token_count(text)
    }
}

/// See [`GeminiClient::estimate_token_count`]
pub fn estimate_token_count(text: &str) -> usize
{   text.chars().count() / CHARS_PER_TOKEN
}

fn rejection(response: RawResponse) -> Error
{   let message = match serde_json::from_str::<ErrorEnvelope>(
      &response.body
    )
    {   Ok(envelope) => {
          error!(
            "Gemini rejected request: {:?}",
            envelope.error
          );
          envelope.error.message
        }
      , Err(_) => {
          error!(
            "Gemini rejected request ({}): {}",
            response.status, response.body
          );
          response.body
        }
    };
    Error::Provider
    {   status: response.status
      , message
    }
}

fn malformed(reason: &str, body: &str) -> Error
{   error!("Unreadable Gemini response ({}): {}", reason, body);
    Error::MalformedResponse
    {   reason: reason.to_string()
      , body: body.to_string()
    }
}

fn unwrap_response(
  body: &str
, prompt: &str
, tic: Instant
, retries: usize
) -> Result<GenerationResult, Error>
{   let parsed: GenerationResponse = serde_json::from_str(body)
      .map_err(|e| malformed(&e.to_string(), body))?;

    let candidate = parsed.candidates
      .as_ref()
      .and_then(|c| c.first())
      .ok_or_else(|| {
        malformed("response has no candidates", body)
      })?;

    let text = candidate.content
      .as_ref()
      .and_then(|content| content.parts.first())
      .and_then(|part| part.text.clone())
      .ok_or_else(|| {
        malformed("first candidate has no text part", body)
      })?;

    let usage = parsed.usage_metadata.unwrap_or_default();
    let duration = tic.elapsed();

    Ok(GenerationResult
    {   answer: text.clone()
      , prompt: prompt.to_string()
      , raw_response: text
      , duration
      , prompt_tokens: usage.prompt_token_count
      , completion_tokens: usage.candidates_token_count
      , retries
    })
}
