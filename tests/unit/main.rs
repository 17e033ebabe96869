//! Unit tests for individual components

#[path = "../common/mod.rs"]
mod common;

mod builders_test;
mod config_test;
mod error_test;
mod observer_test;
mod util_test;
