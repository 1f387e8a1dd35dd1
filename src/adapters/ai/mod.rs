//! Text generation adapters.
//!
//! - `HttpTextGenerator` - the real generation service over HTTP
//! - `MockTextGenerator` - scripted replies for tests

mod http_text_generator;
mod mock_text_generator;

pub use http_text_generator::{GenerationServiceConfig, HttpTextGenerator};
pub use mock_text_generator::{MockReply, MockTextGenerator};
