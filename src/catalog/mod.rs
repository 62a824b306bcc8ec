//! Source catalog
//!
//! Discovers provenance-tagged relations and renders their rows with
//! addressable cell identifiers.

mod errors;
mod relation;
mod renderer;

pub use errors::{CatalogError, CatalogIssue, CatalogResult};
pub use relation::Relation;
pub use renderer::{
    discover, render_catalog, render_table, CatalogCell, CatalogRow, CatalogTable, CatalogView,
};
