//! Local storage module for inventory data persistence
//!
//! This module owns the SeaORM connection and creates the schema for:
//! - Items, Locations and Categories (the persisted records)
//! - Pending changes (the sync change log)
//! - Tombstones and sync state (cursor)

pub mod db;

pub use db::LocalStorage;
