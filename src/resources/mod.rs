//! MCP resources.
//!
//! Three fixed catalog resources (`mysql://tables`, `mysql://views`,
//! `mysql://procedures`) plus two per base table
//! (`mysql://table/<name>` and `mysql://table/<name>/schema`). The list is
//! rebuilt from the live catalog on every request.

pub mod handler;
pub mod uri;

pub use handler::{ResourceHandler, build_descriptors};
pub use uri::{RESOURCE_SCHEME, ResourceUri};
