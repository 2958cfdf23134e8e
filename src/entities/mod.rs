pub mod category;
pub mod item;
pub mod location;
pub mod pending_change;
pub mod sync_state;
pub mod tombstone;

pub use category::Entity as Category;
pub use item::Entity as Item;
pub use location::Entity as Location;
pub use pending_change::Entity as PendingChange;
pub use sync_state::Entity as SyncState;
pub use tombstone::Entity as Tombstone;
