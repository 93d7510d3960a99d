//! Request handling module
//!
//! Dispatches each HTTP request to the static file serving logic.

pub mod listing;
pub mod router;
pub mod static_files;

pub use router::handle_request;
