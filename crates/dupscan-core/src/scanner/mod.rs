//! Raw token production: file discovery, lexical scanning, token caching.

pub mod cache;
pub mod filesystem;
pub mod lexer;
