use std::fmt;

/// Error type for Gemini client operations
/// Implements Clone so results can be handed across tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Retry budget consumed by rate limits, connection
    /// failures or timeouts
    RetriesExhausted
    {   attempts: usize
    }
  , /// Provider rejected the request (any non-200, non-429)
    Provider
    {   status: u16
      , message: String
    }
  , /// 200 response whose shape could not be interpreted
    MalformedResponse
    {   reason: String
      , body: String
    }
  , /// Transport failure that is neither a connect error
    /// nor a timeout
    HttpError(String)
  , /// Missing API key, unknown preset, unreadable settings
    InvalidConfiguration(String)
  , /// Failed to serialize a request locally
    ParseError(String)
}

impl Error
{   /// Whether the provider rejected the request outright
    pub fn is_provider_rejection(&self) -> bool
    {   matches!(self, Error::Provider { .. })
    }

    /// HTTP status attached to a provider rejection
    pub fn status(&self) -> Option<u16>
    {   match self
        {   Error::Provider { status, .. } => Some(*status)
          , _ => None
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::RetriesExhausted { attempts } => {
              write!(f,
                "Gave up on Gemini after {} attempts",
                attempts
              )
            }
          , Error::Provider { status, message } => {
              write!(f,
                "Gemini rejected request ({}): {}",
                status, message
              )
            }
          , Error::MalformedResponse { reason, .. } => {
              write!(f,
                "Malformed Gemini response: {}",
                reason
              )
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}
