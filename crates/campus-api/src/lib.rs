//! Web server for the Campus school site.
//!
//! Serves the public pages, the admin JSON API and the cron endpoints.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;
