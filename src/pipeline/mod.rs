//! Pipeline façade
//!
//! The single entry point the API layer calls:
//! [`Pipeline::process`] takes an [`ExtractRequest`] and returns an
//! [`ExtractionResult`] or a [`crate::PipelineError`].

mod facade;
mod request;
mod result;

pub use crate::fetch::RenderMode;
pub use facade::Pipeline;
pub use request::{ExtractOptions, ExtractRequest};
pub use result::ExtractionResult;
