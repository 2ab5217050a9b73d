//! Metadata-driven OData query building.
//!
//! A [`catalog::Catalog`] indexes a `$metadata` document, a
//! [`query::QueryBuilder`] turns entity, filter, ordering and projection
//! choices into a query URL, and [`results`] lays result payloads out as tables.

pub mod build_info;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod explorer;
pub mod filters;
pub mod model;
pub mod output;
pub mod plan;
pub mod query;
pub mod relative;
pub mod results;
