//! Push delivery adapters.
//!
//! - `HttpPushSender` - delivery through a push gateway
//! - `MockPushSender` - scripted outcomes for tests

mod http_push_sender;
mod mock_push_sender;

pub use http_push_sender::{HttpPushSender, PushGatewayConfig};
pub use mock_push_sender::MockPushSender;
