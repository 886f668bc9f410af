//! CLI command handlers.

mod print_config;
mod serve;

pub use print_config::run_print_config;
pub use serve::run_serve;
