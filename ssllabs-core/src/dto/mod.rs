//! Data Transfer Objects for the SSL Labs API
//!
//! Requests going out ([`api::ApiCall`]) and typed views of the JSON that
//! the single-shot endpoints return.

pub mod api;
pub mod info;
pub mod status_codes;
