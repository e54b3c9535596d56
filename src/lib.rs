//! drugcache library
//!
//! Fetches drug, target and disease data from ChEMBL, Open Targets, the
//! `gget opentargets` view and NCATS Inxight, and caches each response as a
//! JSON (or SVG) file. The modules are exposed for use in integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod client;
pub mod graphql;
pub mod resolve;
pub mod sources;
