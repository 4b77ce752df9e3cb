//! Catalog Module
//!
//! The data model shared by the ledger, the notifier and the HTTP layer.
//!
//! ## Responsibilities
//! - Item records and the ordered catalog that holds them
//! - Applying a single vote to a catalog in memory
//! - Text layout of the persisted catalog (see `codec`)
//!
//! A catalog is always handled as a whole: it is the unit of persistence
//! and the unit of broadcast. There is no per-item delta.

mod codec;

pub use codec::{decode_catalog, encode_catalog, FIELD_SEPARATOR, HEADER};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Result, VoteError};

/// A single votable item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    /// Unique identity within a catalog
    pub id: String,

    /// Number of votes cast; only ever increases
    pub votes: u64,

    /// Image shown for the item
    pub image_ref: String,
}

impl ItemRecord {
    pub fn new(id: impl Into<String>, votes: u64, image_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            votes,
            image_ref: image_ref.into(),
        }
    }
}

/// The full ordered set of item records
///
/// Serializes as a plain array of records. Deserializing goes through
/// `Catalog::new`, so duplicate ids are rejected there too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<ItemRecord>")]
pub struct Catalog {
    items: Vec<ItemRecord>,
}

impl Catalog {
    /// Build a catalog, enforcing unique ids
    pub fn new(items: Vec<ItemRecord>) -> Result<Self> {
        for (i, item) in items.iter().enumerate() {
            if items[..i].iter().any(|other| other.id == item.id) {
                return Err(VoteError::Format(format!("duplicate item id '{}'", item.id)));
            }
        }
        Ok(Self { items })
    }

    /// Look up a record by exact id
    pub fn get(&self, id: &str) -> Option<&ItemRecord> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Add exactly one vote to the record with the given id.
    ///
    /// Returns `false` when no record matches; the catalog is untouched.
    pub fn record_vote(&mut self, id: &str) -> Result<bool> {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return Ok(false);
        };

        item.votes = item.votes.checked_add(1).ok_or_else(|| {
            VoteError::Format(format!("vote count overflow for item '{}'", id))
        })?;

        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ItemRecord> {
        self.items.iter()
    }

    pub fn items(&self) -> &[ItemRecord] {
        &self.items
    }

    /// Sum of all vote counts
    pub fn total_votes(&self) -> u64 {
        self.items.iter().map(|item| item.votes).sum()
    }

    /// Highest vote count, 0 for an empty catalog
    pub fn max_votes(&self) -> u64 {
        self.items.iter().map(|item| item.votes).max().unwrap_or(0)
    }
}

impl TryFrom<Vec<ItemRecord>> for Catalog {
    type Error = VoteError;

    fn try_from(items: Vec<ItemRecord>) -> Result<Self> {
        Self::new(items)
    }
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.items)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ItemRecord;
    type IntoIter = std::slice::Iter<'a, ItemRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
