//! Repository layer for database operations.
//!
//! This module provides repository structs that encapsulate database queries
//! and operations, following the Data Mapper pattern recommended by SeaORM.
//! Repositories keep entities as pure data models while providing reusable
//! database access methods that work on a connection or a transaction alike.

pub mod category;
pub mod item;
pub mod location;
pub mod pending_change;
pub mod sync_state;
pub mod tombstone;

pub use category::CategoryRepository;
pub use item::ItemRepository;
pub use location::LocationRepository;
pub use pending_change::PendingChangeRepository;
pub use sync_state::SyncStateRepository;
pub use tombstone::TombstoneRepository;
