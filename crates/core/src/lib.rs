//! Domain building blocks for the style-transfer task pipeline.
//!
//! Shared by the store, transformer client and API crates:
//!
//! - [`task_status`] -- the task lifecycle state machine.
//! - [`error_code`] -- numeric error taxonomy pushed to clients.
//! - [`messages`] -- queue and notification wire payloads.
//! - [`imaging`] -- upload validation, compression and transport encoding.

pub mod error;
pub mod error_code;
pub mod imaging;
pub mod messages;
pub mod task_status;
pub mod types;
