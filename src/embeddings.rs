//! Gemini embeddings with a zero-vector fallback.
//!
//! Every input gets exactly one remote call. A failed call is
//! logged and replaced by a zero vector, so a batch always comes
//! back with one vector per input, in input order.

use std::sync::Arc;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingSettings;
use crate::error::Error;
use crate::request::Content;
use crate::transport::{HttpTransport, Transport};

/// Dimension of the fallback vector
pub const EMBEDDING_DIMENSION: usize = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType
{   RetrievalDocument
  , RetrievalQuery
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a>
{   model: &'a str
  , content: Content
  , task_type: TaskType
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse
{   embedding: EmbeddingValues
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingValues
{   values: Vec<f32>
}

pub struct GeminiEmbeddings
{   settings: EmbeddingSettings
  , api_key: String
  , transport: Arc<dyn Transport>
}

impl GeminiEmbeddings
{   /// Fails when no API key is configured or set in the
    /// environment
    pub fn new(settings: EmbeddingSettings) -> Result<Self, Error>
    {   let transport = HttpTransport::with_connect_timeout(
          settings.timeout()
        );
        GeminiEmbeddings::with_transport(settings, Arc::new(transport))
    }

    pub fn with_transport(
      settings: EmbeddingSettings
    , transport: Arc<dyn Transport>
    ) -> Result<Self, Error>
    {   let api_key = settings.resolve_api_key()?;
        Ok(GeminiEmbeddings::with_key(settings, api_key, transport))
    }

    /// Skip key resolution, `api_key` is used as given
    pub fn with_key(
      settings: EmbeddingSettings
    , api_key: impl Into<String>
    , transport: Arc<dyn Transport>
    ) -> Self
    {   debug!("Creating GeminiEmbeddings for: {}", settings.model);
        GeminiEmbeddings
        {   settings
          , api_key: api_key.into()
          , transport
        }
    }

    pub async fn embed_documents(&self, texts: &[String])
      -> Vec<Vec<f32>>
    {   debug!("Embedding {} documents", texts.len());
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts
        {   match self.embed(text, TaskType::RetrievalDocument).await
            {   Ok(values) => embeddings.push(values)
              , Err(e) => {
                  error!("Error embedding document: {}", e);
                  embeddings.push(zero_vector());
                }
            }
        }
        embeddings
    }

    pub async fn embed_query(&self, text: &str) -> Vec<f32>
    {   match self.embed(text, TaskType::RetrievalQuery).await
        {   Ok(values) => values
          , Err(e) => {
              error!("Error embedding query: {}", e);
              zero_vector()
            }
        }
    }

    async fn embed(&self, text: &str, task_type: TaskType)
      -> Result<Vec<f32>, Error>
    {   let url = format!(
          "{}/v1beta/{}:embedContent?key={}",
          self.settings.api_url,
          self.settings.model,
          self.api_key
        );
        let body = serde_json::to_value(EmbedRequest
          {   model: &self.settings.model
            , content: Content::text(text)
            , task_type
          })
          .map_err(|e| Error::ParseError(e.to_string()))?;

        let response = self.transport
          .post_json(&url, &body, self.settings.timeout())
          .await
          .map_err(|e| Error::HttpError(e.to_string()))?;

        if response.status != 200
        {   return Err(Error::Provider
            {   status: response.status
              , message: response.body
            });
        }

        let parsed: EmbedResponse
          = serde_json::from_str(&response.body).map_err(|e| {
            Error::MalformedResponse
            {   reason: e.to_string()
              , body: response.body.clone()
            }
          })?;
        Ok(parsed.embedding.values)
    }
}

fn zero_vector() -> Vec<f32>
{   vec![0.0; EMBEDDING_DIMENSION]
}
