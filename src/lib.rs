pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod retry;
pub mod transport;
pub mod embeddings;

/*

gemini-llm: an async client for the Google Gemini REST API.
one call in, one normalized answer out; rate limits, refused
connections and timeouts are retried behind the caller's back,
everything else is reported as is.

gemini-llm/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports
│   ├── error.rs        # Error type
│   ├── config.rs       # Settings, presets, settings files
│   ├── request.rs      # Prompts, wire types, GenerationResult
│   ├── retry.rs        # Retry budget and delays
│   ├── transport.rs    # HTTP seam (reqwest)
│   ├── embeddings.rs   # embedContent with zero-vector fallback
│   └── providers/
│       ├── mod.rs
│       └── gemini.rs   # generateContent client
└── tests/

*/

pub use config::{EmbeddingSettings, GeminiSettings};
pub use embeddings::GeminiEmbeddings;
pub use error::Error;
pub use providers::gemini::{estimate_token_count, GeminiClient};
pub use request::{GenerationResult, Prompt, Render, Template, Vars};
