//! The application registry.
//!
//! An [`Application`] owns the identities an application presents, the TCP
//! and HTTPS transport security configurations, its descriptive metadata and
//! at most one endpoint server per transport scheme. Servers are built on
//! first request and shared by every later caller until [`Application::close`].

pub mod application;
pub mod config;
pub mod error;
pub mod slot;
pub mod snapshot;

pub use application::Application;
pub use config::{default_config_path, load_config};
pub use error::{AppError, AppResult};
