//! HTTP transport layer
//!
//! Routes for uploading, serving and converting mesh files.

pub mod handlers;
