//! Request handlers.
//!
//! Handlers delegate to the engine and the stores on [`AppState`] and map
//! errors via [`AppError`].
//!
//! [`AppState`]: crate::state::AppState
//! [`AppError`]: crate::error::AppError

pub mod styles;
pub mod tasks;
