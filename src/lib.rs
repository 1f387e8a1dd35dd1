//! Cycle Companion - daily cycle-tracking notification scheduler.
//!
//! Decides once per day whether a notification is due, synthesizes
//! persona-styled text with strict validation and a deterministic fallback,
//! and deduplicates sends across scheduler restarts through an append-only
//! ledger.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
