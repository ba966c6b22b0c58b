//! Client for the remote style-transfer service.
//!
//! [`api`] wraps the service's HTTP endpoints; [`outcome`] defines the
//! [`Transformer`] seam the worker depends on and the tagged result it
//! returns.

pub mod api;
pub mod outcome;

pub use api::{TransformRequest, TransformResponse, TransformerApi, TransformerError};
pub use outcome::{classify, HttpTransformer, TransformOutcome, Transformer};
