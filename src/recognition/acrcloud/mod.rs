//! ACRCloud identify API integration
//!
//! Audio fingerprint recognition over a signed HTTP POST.
//! API docs: https://docs.acrcloud.com/reference/identification-api

mod adapter;
mod client;
pub mod dto;
pub mod signature;

pub use client::{AcrCloudClient, AcrCloudConfig};
