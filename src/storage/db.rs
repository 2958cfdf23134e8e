use anyhow::{Context, Result};
use log::info;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::entities::{category, item, location, pending_change, sync_state, tombstone};

/// Local SQLite storage holding the inventory records and sync bookkeeping
pub struct LocalStorage {
    pub conn: DatabaseConnection,
}

impl LocalStorage {
    /// Open the storage described by the configuration.
    ///
    /// An in-memory database is used when `in_memory` is set; otherwise the
    /// configured path (or the default data directory) is opened, creating the
    /// file and its parent directory when missing.
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        if config.in_memory {
            return Self::in_memory().await;
        }

        let path = config.resolve_database_path()?;
        Self::open_file(&path).await
    }

    /// Open a private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        // Named shared-cache database so every pooled connection sees the same data,
        // unique per storage so separate stores never share rows.
        let database_url = format!(
            "sqlite:file:inventorist-{}?mode=memory&cache=shared",
            Uuid::new_v4().simple()
        );
        Self::connect(&database_url).await
    }

    /// Open (or create) a database file.
    pub async fn open_file(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
            }
        }
        let database_url = format!("sqlite://{}?mode=rwc", path.display());
        info!("💾 Opening inventory database at {}", path.display());
        Self::connect(&database_url).await
    }

    async fn connect(database_url: &str) -> Result<Self> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options.min_connections(1).max_connections(4).sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .with_context(|| format!("Failed to connect to {database_url}"))?;

        let storage = LocalStorage { conn };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Create every table from its entity definition.
    async fn init_schema(&self) -> Result<()> {
        self.create_table(item::Entity).await?;
        self.create_table(location::Entity).await?;
        self.create_table(category::Entity).await?;
        self.create_table(pending_change::Entity).await?;
        self.create_table(tombstone::Entity).await?;
        self.create_table(sync_state::Entity).await?;
        Ok(())
    }

    async fn create_table<E>(&self, entity: E) -> Result<()>
    where
        E: EntityTrait,
    {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);
        let mut statement = schema.create_table_from_entity(entity);
        statement.if_not_exists();
        self.conn
            .execute(backend.build(&statement))
            .await
            .with_context(|| format!("Failed to create table {}", entity.table_name()))?;
        Ok(())
    }

    /// Check if the database holds any records
    pub async fn has_data(&self) -> Result<bool> {
        use sea_orm::PaginatorTrait;
        let items = item::Entity::find().count(&self.conn).await?;
        let locations = location::Entity::find().count(&self.conn).await?;
        let categories = category::Entity::find().count(&self.conn).await?;
        Ok(items + locations + categories > 0)
    }

    /// Clear all data from the database, sync bookkeeping included
    pub async fn clear_all_data(&self) -> Result<()> {
        item::Entity::delete_many().exec(&self.conn).await?;
        location::Entity::delete_many().exec(&self.conn).await?;
        category::Entity::delete_many().exec(&self.conn).await?;
        pending_change::Entity::delete_many().exec(&self.conn).await?;
        tombstone::Entity::delete_many().exec(&self.conn).await?;
        sync_state::Entity::delete_many().exec(&self.conn).await?;
        Ok(())
    }
}
