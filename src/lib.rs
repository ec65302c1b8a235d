#![doc = "The `taskvault` library crate."]
#![doc = ""]
#![doc = "Account management (signup, login, password lifecycle), the token-based"]
#![doc = "authorization pipeline, per-user task CRUD, and role-based access control"]
#![doc = "for the TaskVault REST API. The main binary (`main.rs`) uses this crate to"]
#![doc = "construct and run the application."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod notifier;
pub mod routes;
pub mod store;
