//! Caption suggestions for uploaded images.
//!
//! A [`CaptionService`] turns raw image bytes into up to three
//! ready-to-post captions by asking a hosted vision-language model.
//! The model sits behind the [`VisionModel`] trait; [`OpenAiVision`]
//! is the production implementation.

mod error;
mod model;
mod openai;
mod service;

pub use error::CaptionError;
pub use model::VisionModel;
pub use openai::{DEFAULT_MODEL, OpenAiVision};
pub use service::{CaptionService, MAX_CAPTIONS, extract_hashtags, parse_captions};
