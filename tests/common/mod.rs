#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use gemini_llm::transport::{RawResponse, Transport, TransportError};

pub fn init_logging()
{   let _ = env_logger::builder().is_test(true).try_init();
}

/// One request the transport has seen
#[derive(Debug, Clone)]
pub struct SentRequest
{   pub url: String
  , pub body: serde_json::Value
  , pub timeout: Duration
}

/// Transport that replays canned outcomes in order
#[derive(Default)]
pub struct ScriptedTransport
{   script: Mutex<VecDeque<Result<RawResponse, TransportError>>>
  , sent: Mutex<Vec<SentRequest>>
}

impl ScriptedTransport
{   pub fn new() -> Arc<Self>
    {   Arc::new(ScriptedTransport::default())
    }

    pub fn respond(self: &Arc<Self>, status: u16, body: &str)
      -> Arc<Self>
    {   self.script.lock().unwrap().push_back(Ok(RawResponse
        {   status
          , body: body.to_string()
        }));
        Arc::clone(self)
    }

    pub fn fail(self: &Arc<Self>, error: TransportError)
      -> Arc<Self>
    {   self.script.lock().unwrap().push_back(Err(error));
        Arc::clone(self)
    }

    pub fn calls(&self) -> usize
    {   self.sent.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<SentRequest>
    {   self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport
{   async fn post_json(
      &self
    , url: &str
    , body: &serde_json::Value
    , timeout: Duration
    ) -> Result<RawResponse, TransportError>
    {   self.sent.lock().unwrap().push(SentRequest
        {   url: url.to_string()
          , body: body.clone()
          , timeout
        });
        self.script.lock().unwrap()
          .pop_front()
          .unwrap_or_else(|| {
            Err(TransportError::Other("script exhausted".to_string()))
          })
    }
}

pub fn answer_body(text: &str) -> String
{   serde_json::json!({
      "candidates": [
        { "content": { "parts": [ { "text": text } ], "role": "model" } }
      ]
    }).to_string()
}

pub fn answer_with_usage(text: &str, prompt: u64, completion: u64)
  -> String
{   serde_json::json!({
      "candidates": [
        { "content": { "parts": [ { "text": text } ] } }
      ],
      "usageMetadata": {
        "promptTokenCount": prompt,
        "candidatesTokenCount": completion,
        "totalTokenCount": prompt + completion
      }
    }).to_string()
}
