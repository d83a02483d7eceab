//! Chat Module
//! Mission: Persisted chat history relayed to an external completions API

pub mod api;
pub mod client;
pub mod models;
pub mod store;

pub use client::ChatClient;
pub use store::MessageStore;
