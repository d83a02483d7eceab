//! Storage Module
//! Mission: Delegate file uploads to Azure Blob Storage

pub mod api;
pub mod azure;

pub use azure::SasGenerator;
