//! Outbound HTTP seam shared by the generation and embedding
//! clients

use std::fmt;
use std::time::Duration;
use async_trait::async_trait;
use log::{error, trace};

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse
{   pub status: u16
  , pub body: String
}

/// Why an exchange did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError
{   /// Could not reach the endpoint
    Connect(String)
  , /// Exceeded the request timeout
    Timeout
  , /// Anything else: building the request, decoding the body
    Other(String)
}

impl fmt::Display for TransportError
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   match self
        {   TransportError::Connect(msg) => {
              write!(f, "Connection error: {}", msg)
            }
          , TransportError::Timeout => {
              write!(f, "Request timed out")
            }
          , TransportError::Other(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// POST a JSON body and hand back whatever came back
#[async_trait]
pub trait Transport: Send + Sync
{   async fn post_json(
      &self
    , url: &str
    , body: &serde_json::Value
    , timeout: Duration
    ) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone, Default)]
pub struct HttpTransport
{   http_client: reqwest::Client
}

impl HttpTransport
{   pub fn new() -> Self
    {   HttpTransport
        {   http_client: reqwest::Client::new()
        }
    }

    /// Transport whose connect phase gives up after
    /// `connect_timeout`; such failures count as connection errors
    pub fn with_connect_timeout(connect_timeout: Duration) -> Self
    {   let http_client = reqwest::Client::builder()
          .connect_timeout(connect_timeout)
          .build()
          .unwrap_or_else(|e| {
            error!(
              "Could not build HTTP client, using defaults: {}",
              e.without_url()
            );
            reqwest::Client::new()
          });
        HttpTransport { http_client }
    }
}

/// Error text safe to log: no URL, no key
fn describe(e: reqwest::Error) -> String
{   redact_key(&e.without_url().to_string())
}

/// Request building and body decoding are local failures;
/// any other failure to exchange data is a connection failure.
fn classify(e: reqwest::Error) -> TransportError
{   if e.is_connect()
    {   TransportError::Connect(describe(e))
    } else if e.is_timeout()
    {   TransportError::Timeout
    } else if e.is_builder() || e.is_decode()
    {   let msg = describe(e);
        error!("HTTP error: {}", msg);
        TransportError::Other(msg)
    } else
    {   TransportError::Connect(describe(e))
    }
}

#[async_trait]
impl Transport for HttpTransport
{   async fn post_json(
      &self
    , url: &str
    , body: &serde_json::Value
    , timeout: Duration
    ) -> Result<RawResponse, TransportError>
    {   let response = self.http_client
          .post(url)
          .header("Content-Type", "application/json")
          .json(body)
          .timeout(timeout)
          .send()
          .await
          .map_err(classify)?;

        let status = response.status().as_u16();
        trace!("Response status: {}", status);

        let body = response.text().await.map_err(classify)?;
        Ok(RawResponse { status, body })
    }
}

/// Strip the `key` query parameter so URLs can be logged
pub fn redact_key(url: &str) -> String
{   match url.find("key=")
    {   Some(pos) => {
          let tail = &url[pos + 4..];
          let end = tail.find('&').unwrap_or(tail.len());
          format!("{}key=***{}", &url[..pos], &tail[end..])
        }
      , None => url.to_string()
    }
}
