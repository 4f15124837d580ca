//! # sentinel-gemini
//!
//! Message classification backed by Google's Gemini `generateContent` API.
//!
//! [`GeminiClassifier`] implements [`sentinel_core::Classifier`]: it renders
//! the triage prompt, asks the model for a JSON verdict and parses it with
//! [`sentinel_core::Classification::from_model_output`].
//!
//! ```ignore
//! use sentinel_gemini::GeminiClassifier;
//!
//! let classifier = GeminiClassifier::new(api_key).with_model("gemini-2.5-flash");
//! let verdict = classifier.classify("boss@company.com", "Server down", "Fix it now").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
pub mod prompt;

pub use client::{DEFAULT_API_BASE, DEFAULT_MODEL, GeminiClassifier};
pub use error::{Error, Result};
