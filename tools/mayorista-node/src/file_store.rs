//! One JSON file per partition under a data directory.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use mayorista_common::store::{Partition, Revisioned, Store};
use mayorista_common::StoreError;

/// On-disk layout. A bare array is what the browser build dumps from local
/// storage; it is read as revision 0.
#[derive(Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Envelope { revision: u64, records: Value },
    Bare(Vec<Value>),
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    revision: u64,
    records: &'a Value,
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, partition: Partition) -> PathBuf {
        self.dir.join(format!("{}.json", partition.key()))
    }
}

impl Store for JsonFileStore {
    fn read(&self, partition: Partition) -> Result<Option<Revisioned>, StoreError> {
        let path = self.path(partition);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { partition, source }),
        };
        let parsed: OnDisk =
            serde_json::from_str(&data).map_err(|source| StoreError::Corrupt { partition, source })?;
        Ok(Some(match parsed {
            OnDisk::Envelope { revision, records } => Revisioned { revision, records },
            OnDisk::Bare(records) => Revisioned {
                revision: 0,
                records: Value::Array(records),
            },
        }))
    }

    fn write(&mut self, partition: Partition, expected: u64, records: Value) -> Result<u64, StoreError> {
        let found = self.read(partition)?.map_or(0, |r| r.revision);
        if found != expected {
            warn!(%partition, expected, found, "stale write rejected");
            return Err(StoreError::Conflict {
                partition,
                expected,
                found,
            });
        }
        let revision = found + 1;
        let data = serde_json::to_vec_pretty(&EnvelopeRef {
            revision,
            records: &records,
        })
        .map_err(|source| StoreError::Serialize { partition, source })?;

        let io_err = |source: io::Error| StoreError::Io { partition, source };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(&data).map_err(io_err)?;
        tmp.persist(self.path(partition)).map_err(|e| io_err(e.error))?;

        debug!(%partition, revision, "partition saved");
        Ok(revision)
    }
}
