//! Command implementations.

pub mod check;
pub mod config;
pub mod facts;
pub mod scan;

pub use self::check::{execute_check, exit_code};
pub use self::config::execute_config;
pub use self::facts::execute_facts;
pub use self::scan::execute_scan;
