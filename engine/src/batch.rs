//! Change batches and the sync cursor.
//!
//! A pull returns a [`ChangeBatch`]: per-collection record deltas plus the
//! watermark the server reached. The [`SyncCursor`] remembers the last
//! watermark that was durably applied.

use crate::{error::Result, Car, Error, RemoteId, Version};
use serde::{Deserialize, Serialize};

/// Created, updated and deleted records of one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableChanges<T> {
    #[serde(default = "Vec::new")]
    pub created: Vec<T>,
    #[serde(default = "Vec::new")]
    pub updated: Vec<T>,
    #[serde(default)]
    pub deleted: Vec<RemoteId>,
}

impl<T> Default for TableChanges<T> {
    fn default() -> Self {
        Self {
            created: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

impl<T> TableChanges<T> {
    /// Changes consisting only of created records.
    pub fn created(records: Vec<T>) -> Self {
        Self {
            created: records,
            ..Self::default()
        }
    }

    pub fn with_updated(mut self, records: Vec<T>) -> Self {
        self.updated = records;
        self
    }

    pub fn with_deleted(mut self, ids: Vec<RemoteId>) -> Self {
        self.deleted = ids;
        self
    }

    /// Total number of deltas.
    pub fn len(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Created and updated records, in that order.
    pub fn upserts(&self) -> impl Iterator<Item = &T> {
        self.created.iter().chain(self.updated.iter())
    }
}

/// The unit of one pull: car deltas and the new watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    pub cars: TableChanges<Car>,
    pub latest_version: Version,
}

impl ChangeBatch {
    pub fn new(cars: TableChanges<Car>, latest_version: Version) -> Self {
        Self {
            cars,
            latest_version,
        }
    }

    /// A batch with no deltas that only moves the watermark.
    pub fn empty(latest_version: Version) -> Self {
        Self::new(TableChanges::default(), latest_version)
    }

    /// Check every record before anything is applied.
    pub fn validate(&self) -> Result<()> {
        for car in self.cars.upserts() {
            car.validate()?;
        }
        if self.cars.deleted.iter().any(|id| id.is_empty()) {
            return Err(Error::InvalidRecord("deleted car id is empty".into()));
        }
        Ok(())
    }
}

/// Watermark of the last successfully applied pull.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCursor {
    last_pulled_version: Version,
}

impl SyncCursor {
    pub fn new(last_pulled_version: Version) -> Self {
        Self {
            last_pulled_version,
        }
    }

    pub fn last_pulled_version(&self) -> Version {
        self.last_pulled_version
    }

    /// The cursor this one would become after applying `version`.
    ///
    /// The watermark never moves backwards.
    pub fn advanced_to(&self, version: Version) -> Result<SyncCursor> {
        if version < self.last_pulled_version {
            return Err(Error::CursorRegression {
                current: self.last_pulled_version,
                received: version,
            });
        }
        Ok(SyncCursor::new(version))
    }
}

/// What applying a batch did to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub from_version: Version,
    pub to_version: Version,
    /// Upserts of cars that were not present before
    pub created: usize,
    /// Upserts of cars that already existed
    pub updated: usize,
    /// Cars actually removed
    pub deleted: usize,
}
