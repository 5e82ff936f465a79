//! Persistence of the five shared record lists.
//!
//! Each partition is a JSON array stored under a fixed key. Writers name the
//! revision they read; a store rejects the write with
//! [`StoreError::Conflict`] if someone else saved in between.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partition {
    Users,
    Products,
    Orders,
    Messages,
    Notifications,
}

impl Partition {
    pub const ALL: [Partition; 5] = [
        Partition::Users,
        Partition::Products,
        Partition::Orders,
        Partition::Messages,
        Partition::Notifications,
    ];

    /// Storage key, shared with the browser build's local storage.
    pub fn key(self) -> &'static str {
        match self {
            Partition::Users => "b2b_users",
            Partition::Products => "b2b_products",
            Partition::Orders => "b2b_orders",
            Partition::Messages => "b2b_messages",
            Partition::Notifications => "b2b_notifications",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Raw partition contents plus the revision they were read at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revisioned {
    pub revision: u64,
    pub records: Value,
}

pub trait Store {
    /// Current contents of `partition`, or `None` if it was never written.
    fn read(&self, partition: Partition) -> Result<Option<Revisioned>, StoreError>;

    /// Replace `partition` with `records` if it is still at `expected`.
    /// Returns the new revision.
    fn write(&mut self, partition: Partition, expected: u64, records: Value) -> Result<u64, StoreError>;
}

/// Typed view of one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub revision: u64,
    pub records: Vec<T>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            revision: 0,
            records: Vec::new(),
        }
    }
}

/// Read and decode a partition. An absent partition is empty at revision 0.
pub fn load<T: DeserializeOwned, S: Store + ?Sized>(store: &S, partition: Partition) -> Result<Snapshot<T>, StoreError> {
    let Some(raw) = store.read(partition)? else {
        return Ok(Snapshot::default());
    };
    let records = match raw.records {
        Value::Null => Vec::new(),
        value => serde_json::from_value(value).map_err(|source| StoreError::Corrupt { partition, source })?,
    };
    Ok(Snapshot {
        revision: raw.revision,
        records,
    })
}

/// Write `snapshot` back, advancing its revision on success.
pub fn save<T: Serialize, S: Store + ?Sized>(
    store: &mut S,
    partition: Partition,
    snapshot: &mut Snapshot<T>,
) -> Result<(), StoreError> {
    let value =
        serde_json::to_value(&snapshot.records).map_err(|source| StoreError::Serialize { partition, source })?;
    snapshot.revision = store.write(partition, snapshot.revision, value)?;
    Ok(())
}

/// Load, let `f` edit the records, then save. Nothing is written when `f`
/// fails.
pub fn modify<T, S, R, E>(
    store: &mut S,
    partition: Partition,
    f: impl FnOnce(&mut Vec<T>) -> Result<R, E>,
) -> Result<R, E>
where
    T: Serialize + DeserializeOwned,
    S: Store + ?Sized,
    E: From<StoreError>,
{
    let mut snapshot = load::<T, S>(store, partition)?;
    let out = f(&mut snapshot.records)?;
    save(store, partition, &mut snapshot)?;
    Ok(out)
}

/// In-process store, used by tests and embedders without a disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    partitions: HashMap<Partition, Revisioned>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn read(&self, partition: Partition) -> Result<Option<Revisioned>, StoreError> {
        Ok(self.partitions.get(&partition).cloned())
    }

    fn write(&mut self, partition: Partition, expected: u64, records: Value) -> Result<u64, StoreError> {
        let found = self.partitions.get(&partition).map_or(0, |r| r.revision);
        if found != expected {
            return Err(StoreError::Conflict {
                partition,
                expected,
                found,
            });
        }
        let revision = found + 1;
        self.partitions.insert(partition, Revisioned { revision, records });
        Ok(revision)
    }
}
