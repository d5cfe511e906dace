//! Data models for the storefront admin resource manager.
//!
//! Resources are kept as loosely-typed JSON maps; the per-family shape lives
//! in [`ResourceSchema`].

mod kind;
mod resource;
mod schema;

pub use kind::*;
pub use resource::*;
pub use schema::*;
