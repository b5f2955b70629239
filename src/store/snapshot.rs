//! Snapshot persistence for tile stores.
//!
//! A snapshot is the whole set of tiles and territories, written
//! synchronously. Each save atomically replaces the previous file.

use super::{MemoryStore, TileStore};
use crate::error::{ClaimError, Result};
use geoclaim_types::{Territory, Tile};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const SNAPSHOT_MAGIC: &[u8] = b"GEOCLAIM_SNAPSHOT";
const SNAPSHOT_VERSION: u8 = 1;

/// Point-in-time copy of a store's records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Unix milliseconds.
    pub taken_at: u64,
    pub tiles: Vec<Tile>,
    pub territories: Vec<Territory>,
}

impl StoreSnapshot {
    pub fn capture<S: TileStore + ?Sized>(store: &S) -> Result<Self> {
        Ok(Self {
            taken_at: now_ms(),
            tiles: store.all_tiles()?,
            territories: store.all_territories()?,
        })
    }

    pub fn into_store(self) -> MemoryStore {
        MemoryStore::from_records(self.tiles, self.territories)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotConfig {
    /// Save automatically after this many engine writes.
    pub auto_snapshot_ops: Option<usize>,
}

pub struct SnapshotFile {
    path: PathBuf,
    config: SnapshotConfig,
    ops_since_snapshot: usize,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P, config: SnapshotConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
            ops_since_snapshot: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the snapshot, or an empty one if the file is missing or empty.
    pub fn load(&self) -> Result<StoreSnapshot> {
        if !self.exists() {
            return Ok(StoreSnapshot::default());
        }

        let file = File::open(&self.path)?;
        if file.metadata()?.len() == 0 {
            return Ok(StoreSnapshot::default());
        }

        let mut reader = BufReader::new(file);

        let mut magic = vec![0u8; SNAPSHOT_MAGIC.len()];
        reader.read_exact(&mut magic)?;
        if magic != SNAPSHOT_MAGIC {
            return Err(ClaimError::InvalidFormat);
        }

        let mut version = [0u8; 1];
        reader.read_exact(&mut version)?;
        if version[0] != SNAPSHOT_VERSION {
            return Err(ClaimError::InvalidFormat);
        }

        let snapshot: StoreSnapshot = bincode::deserialize_from(&mut reader)?;
        log::debug!(
            "loaded snapshot {}: {} tiles, {} territories",
            self.path.display(),
            snapshot.tiles.len(),
            snapshot.territories.len()
        );
        Ok(snapshot)
    }

    pub fn save(&mut self, snapshot: &StoreSnapshot) -> Result<()> {
        let temp_path = self.temp_path();

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;

        let mut writer = BufWriter::new(file);
        writer.write_all(SNAPSHOT_MAGIC)?;
        writer.write_all(&[SNAPSHOT_VERSION])?;
        bincode::serialize_into(&mut writer, snapshot)?;

        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, &self.path)?;
        self.sync_parent_dir()?;

        self.ops_since_snapshot = 0;
        log::debug!(
            "saved snapshot {}: {} tiles, {} territories",
            self.path.display(),
            snapshot.tiles.len(),
            snapshot.territories.len()
        );

        Ok(())
    }

    /// Capture `store` and save it.
    pub fn save_store<S: TileStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        let snapshot = StoreSnapshot::capture(store)?;
        self.save(&snapshot)
    }

    pub fn record_operation(&mut self) {
        self.ops_since_snapshot += 1;
    }

    pub fn should_snapshot(&self) -> bool {
        self.config
            .auto_snapshot_ops
            .is_some_and(|threshold| self.ops_since_snapshot >= threshold)
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        if let Some(name) = temp.file_name() {
            let mut new_name = name.to_string_lossy().into_owned();
            new_name.push_str(".tmp");
            temp.set_file_name(new_name);
        }
        temp
    }

    fn sync_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            File::open(parent)?.sync_all()?;
        }
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
