//! Inventorist - personal inventory store with multi-device sync
//!
//! This library keeps a local collection of items, locations and categories,
//! maintains a stable manual order for items, builds filtered and sorted
//! views of them, and reconciles the collection with a remote shared by all
//! of the user's devices.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`store`] - The record store: the single mutation path for local data
//! * [`ordering`] - Manual `sort_order` planning (insert, drag, repair)
//! * [`view`] - Filter/sort view builder and its event-driven cache
//! * [`selection`] - Selection set and batched deletion
//! * [`sync`] - Push/pull reconciliation with a remote backend
//! * [`inventory`] - The operations a UI calls, wired together
//! * [`config`] - Application configuration management

/// Remote backend abstraction and the bundled remotes
pub mod backend;

/// Configuration module for managing application settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// SeaORM entity models for database tables
pub mod entities;

/// Error types of the inventory core
pub mod error;

/// UI-facing facade
pub mod inventory;

/// Logging setup
pub mod logger;

/// Manual ordering engine
pub mod ordering;

/// Record kinds and payloads shared by store and sync
pub mod record;

/// Repository layer for database operations
pub mod repositories;

/// Selection and deletion coordinator
pub mod selection;

/// Database connection and schema
pub mod storage;

/// Record store
pub mod store;

/// Synchronization engine for keeping local and remote data in sync
pub mod sync;

/// Utility functions for date/time handling
pub mod utils;

/// Filter/sort view builder
pub mod view;

// Re-export entity models for convenient access
pub use entities::{category, item, location};
pub use error::{InventoryError, Result};
pub use inventory::Inventory;
pub use store::RecordStore;
pub use sync::SyncService;
