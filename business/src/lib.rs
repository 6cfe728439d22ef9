//! Business layer of the user-administration console.
//!
//! States, computes and commands live here so drivers (the CLI, tests)
//! stay thin: they read computes, call the operations in
//! [`users::panel`] and flush the command queue.

pub mod config;
pub mod http;
pub mod notify;
pub mod route;
pub mod users;

#[cfg(test)]
mod test_utils;

pub use config::{BusinessConfig, ConfigError};
pub use notify::{Notifications, Toast, ToastLevel};
pub use route::Route;
pub use users::panel::build_state_ctx;
