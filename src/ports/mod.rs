//! Ports - interfaces for the three external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the core and the outside world. Adapters implement these ports.
//!
//! - `DocumentStore` - versioned read/write access to the record store
//! - `TextGenerator` - the text generation service
//! - `PushSender` - per-subscriber push delivery

mod document_store;
mod push_sender;
mod text_generator;

pub use document_store::{documents, Document, DocumentStore, DocumentVersion, StoreError};
pub use push_sender::{PushError, PushPayload, PushSender};
pub use text_generator::{GenerationError, GenerationRequest, TextGenerator};
