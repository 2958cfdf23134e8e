//! Record kinds and the kind-tagged record payload shared by the store and
//! the sync layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::entities::{category, item, location};

/// The three record kinds persisted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Item,
    Location,
    Category,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Location => "location",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Item => "Item",
            Self::Location => "Location",
            Self::Category => "Category",
        };
        f.write_str(name)
    }
}

impl FromStr for RecordKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "item" => Ok(Self::Item),
            "location" => Ok(Self::Location),
            "category" => Ok(Self::Category),
            other => anyhow::bail!("Unknown record kind '{}'", other),
        }
    }
}

/// Kind of local mutation recorded in the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    Upsert,
    Delete,
}

impl ChangeOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upsert => "upsert",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for ChangeOperation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upsert" => Ok(Self::Upsert),
            "delete" => Ok(Self::Delete),
            other => anyhow::bail!("Unknown change operation '{}'", other),
        }
    }
}

/// A full record of any kind, as exchanged with the remote backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum RecordData {
    Item(item::Model),
    Location(location::Model),
    Category(category::Model),
}

impl RecordData {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Item(_) => RecordKind::Item,
            Self::Location(_) => RecordKind::Location,
            Self::Category(_) => RecordKind::Category,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Item(item) => item.id,
            Self::Location(location) => location.id,
            Self::Category(category) => category.id,
        }
    }

    pub fn modified_date(&self) -> DateTime<Utc> {
        match self {
            Self::Item(item) => item.modified_date,
            Self::Location(location) => location.modified_date,
            Self::Category(category) => category.modified_date,
        }
    }
}
