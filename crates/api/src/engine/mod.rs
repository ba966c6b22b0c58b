//! Task execution engine.
//!
//! - [`submission`] -- validates uploads, creates tasks and enqueues them.
//! - [`worker`] -- the consumer pool that drives tasks through the remote
//!   transformer.
//! - [`lifecycle`] -- transitions shared by the channel, HTTP and worker
//!   paths, each paired with its client notification.

pub mod lifecycle;
pub mod submission;
pub mod worker;
