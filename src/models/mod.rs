//! Data models for the waterlog backend.
//!
//! Wire names follow the frontend's camelCase record shapes.

mod datastore;
mod reference;
mod report;
mod user;

pub use datastore::*;
pub use reference::*;
pub use report::*;
pub use user::*;
