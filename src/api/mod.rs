//! # API Module
//!
//! HTTP interface over the configured collections. For every collection
//! route mounted at `{base}{path}`:
//!
//! - `GET {path}` - list (raw file, or a page when pagination is enabled)
//! - `POST {path}` - create a record
//! - `PUT {path}` - replace the record with the body's identity
//! - `PATCH {path}` - merge the body into the record with its identity
//! - `GET {path}/{id}` - fetch one record
//!
//! Raw routes serve their file verbatim on every verb except `OPTIONS`.

pub mod handlers;
pub mod server;

pub use server::{create_app, start_server};
