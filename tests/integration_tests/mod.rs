// tests/integration_tests/mod.rs
pub mod common;
mod host_build;
mod image_layout;
