//! Single-page PDF rendering for priced quotes.

use std::path::PathBuf;

use mspquote_core::errors::ApplicationError;
use thiserror::Error;

pub mod logo;
pub mod metrics;
pub mod money;
pub mod render;

pub use money::{format_money, format_percent};
pub use render::{DocumentRenderer, PAGE_HEIGHT, PAGE_WIDTH};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("could not write quote document to `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

impl From<RenderError> for ApplicationError {
    fn from(value: RenderError) -> Self {
        Self::Rendering(value.to_string())
    }
}
