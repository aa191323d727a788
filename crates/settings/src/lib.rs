//! JSON persistence for annotated observable containers.
//!
//! Tag fields with [`Persist`] and hand the root container to [`Settings`]:
//! the engine walks the graph, routes each value through a [`TypeAdapter`]
//! and produces a nested JSON document mirroring the container structure.
//! Loading is the mirror image and never fails on bad field values, only on
//! unreadable or unparseable files.

pub mod adapter;
pub mod adapters;
pub mod errors;
pub mod persist;
pub mod store;

pub use adapter::{AdapterError, TypeAdapter};
pub use adapters::{ArrayAdapter, DefaultAdapter, EnumAdapter, PathAdapter, VectorAdapter};
pub use errors::SettingsError;
pub use persist::Persist;
pub use store::{Document, Settings};
