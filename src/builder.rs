//! Engine builder
//!
//! Collects configuration, the event sink and optional snapshot persistence
//! before constructing an [`Engine`].

use crate::config::Config;
use crate::engine::{Engine, EventSink, NullSink};
use crate::error::{ClaimError, Result};
use crate::store::{MemoryStore, TileStore};
#[cfg(feature = "snapshot")]
use crate::store::{SnapshotConfig, SnapshotFile};
#[cfg(feature = "snapshot")]
use std::path::PathBuf;

/// Builder for [`Engine`].
pub struct EngineBuilder {
    config: Config,
    sink: Box<dyn EventSink>,
    #[cfg(feature = "snapshot")]
    snapshot_path: Option<PathBuf>,
    #[cfg(feature = "snapshot")]
    auto_snapshot_ops: Option<usize>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            sink: Box::new(NullSink),
            #[cfg(feature = "snapshot")]
            snapshot_path: None,
            #[cfg(feature = "snapshot")]
            auto_snapshot_ops: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Where economy and territory events are delivered.
    pub fn sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Snapshot file to load on [`Self::build`] and save to.
    #[cfg(feature = "snapshot")]
    pub fn snapshot_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Save the snapshot automatically after this many write operations.
    #[cfg(feature = "snapshot")]
    pub fn auto_snapshot_ops(mut self, ops: usize) -> Self {
        self.auto_snapshot_ops = Some(ops);
        self
    }

    /// Build over a [`MemoryStore`], restoring the snapshot if one is
    /// configured and present.
    pub fn build(self) -> Result<Engine<MemoryStore>> {
        #[cfg(feature = "snapshot")]
        if let Some(path) = &self.snapshot_path {
            let file = SnapshotFile::new(path, SnapshotConfig::default());
            let snapshot = file.load()?;
            log::info!(
                "restored {} tiles and {} territories from {}",
                snapshot.tiles.len(),
                snapshot.territories.len(),
                path.display()
            );
            return self.build_with(snapshot.into_store());
        }

        self.build_with(MemoryStore::new())
    }

    /// Build over an existing store. A configured snapshot path is only
    /// written to, never loaded.
    pub fn build_with<S: TileStore>(self, store: S) -> Result<Engine<S>> {
        self.config.validate().map_err(ClaimError::InvalidConfig)?;

        #[allow(unused_mut)]
        let mut engine = Engine::with_sink(store, self.config, self.sink);

        #[cfg(feature = "snapshot")]
        if let Some(path) = self.snapshot_path {
            engine.attach_snapshot(SnapshotFile::new(
                path,
                SnapshotConfig {
                    auto_snapshot_ops: self.auto_snapshot_ops,
                },
            ));
        }

        Ok(engine)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
