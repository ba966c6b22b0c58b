//! Row types and DTOs.

pub mod style;
pub mod task;
