//! wherepanel - a where-provenance exploration panel
//!
//! Renders every provenance-tagged relation of a ProvSQL-enabled PostgreSQL
//! database with addressable cells, runs user queries wrapped so each row
//! carries its where-provenance annotation, and correlates every output cell
//! with the source cells it was copied from.

pub mod annotation;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod highlight;
pub mod http_server;
pub mod identifier;
pub mod observability;
pub mod query;
