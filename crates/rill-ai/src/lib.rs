//! rill-ai: Streaming chat endpoint client
//!
//! This crate provides the request types, the model registry, the `data: `
//! frame decoder and the HTTP endpoint that a chat session streams from.

pub mod endpoint;
pub mod error;
pub mod models;
pub mod stream;
pub mod types;

pub use endpoint::{EndpointConfig, HttpEndpoint, InferenceEndpoint};
pub use error::{Error, Result};
pub use models::{ModelInfo, ModelSelector};
pub use stream::{ByteStream, Frame, FrameStream};
pub use types::*;
