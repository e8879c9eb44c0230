//! Web server module for the report builder UI
//!
//! JSON endpoints a browser front end calls to render results and reach the
//! report server.

mod server;

pub use server::*;
