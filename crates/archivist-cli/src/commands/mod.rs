//! Command implementations.

pub mod analyze;
pub mod load_test;
pub mod prepare;

pub use self::analyze::{analyze_once, execute_analyze};
pub use self::load_test::{execute_load_test, run_load_test, LoadTestReport, LoadTestSettings};
pub use self::prepare::{execute_prepare, prepare_once};
