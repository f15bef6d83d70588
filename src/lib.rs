// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod generator;
pub mod level;
pub mod logging;
pub mod round;
pub mod runtime;
pub mod score;
pub mod store;
pub mod timer;
pub mod ui;
pub mod util;
pub mod validator;

pub use app::{App, AppState};
