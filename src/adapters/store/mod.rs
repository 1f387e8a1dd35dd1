//! Record store adapters.
//!
//! - `HttpDocumentStore` - the versioned document API over HTTP
//! - `InMemoryDocumentStore` - HashMap-backed double for tests

mod http_document_store;
mod in_memory_document_store;

pub use http_document_store::{HttpDocumentStore, HttpStoreConfig};
pub use in_memory_document_store::InMemoryDocumentStore;
