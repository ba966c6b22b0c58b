//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod style_repo;
pub mod task_message_repo;
pub mod task_repo;

pub use style_repo::StyleRepo;
pub use task_message_repo::TaskMessageRepo;
pub use task_repo::TaskRepo;
