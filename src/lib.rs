//! Product catalog application: modules, wiring and the HTTP entrypoint.

pub mod bootstrap;
pub mod modules;

pub use bootstrap::Catalog;
pub use modules::*;
