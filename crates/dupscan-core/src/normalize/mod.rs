//! Token normalization: configuration policy, upstream filtering, and the
//! normalizer that turns raw tokens into the normalized unit stream.

pub mod config;
pub mod debug;
pub mod filter;
pub mod normalizer;
pub mod provider;
pub mod regions;
pub mod table;
