//! HTTP middleware shared across routers.

pub mod logging;

pub use logging::request_logging;
