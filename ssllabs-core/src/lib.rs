//! SSL Labs Core
//!
//! Core types shared by the SSL Labs client and CLI.
//!
//! This crate contains:
//! - Domain types: assessment requests, statuses and completed reports
//! - DTOs: API calls and the payloads of the single-shot endpoints

pub mod domain;
pub mod dto;
