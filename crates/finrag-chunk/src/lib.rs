//! Document text cleaning and chunking.
//!
//! Chunking is token-based when a tokenizer is available and falls back to
//! character windows with sentence-boundary preference otherwise. Cleaning
//! always precedes chunking.

pub mod chars;
pub mod clean;
pub mod token;

pub use clean::clean_text;
pub use token::Chunker;
