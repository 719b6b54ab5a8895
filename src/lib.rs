// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod demo;
pub mod error;
pub mod levels;
pub mod profile;
pub mod progression;
pub mod report;
pub mod runtime;
pub mod session;
pub mod store;
pub mod ui;
pub mod words;

pub use error::{Error, Result};
