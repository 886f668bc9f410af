//! linkpack core: collect links into tasks, then build one archive per task
//! on a bounded pool of background slots.

pub mod config;
pub mod logging;

pub mod archive;
pub mod fetch;
pub mod links;
pub mod scheduler;
pub mod service;
pub mod task;

pub use service::{LinkAdded, TaskService};
pub use task::{Task, TaskError, TaskId, TaskStatus};
