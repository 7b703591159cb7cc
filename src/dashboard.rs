//! Pinned visualization snapshots and their durable ordering.

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, StorageError};
use crate::graph::GraphModel;
use crate::pivot::{MetricKind, PivotTable};
use crate::storage::Storage;
use crate::themes::ScaleProfile;

pub const HEATMAPS_KEY: &str = "graphs";
pub const NETWORKS_KEY: &str = "networkGraphs";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Heatmap,
    Network,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Heatmap(PivotTable),
    Network(GraphModel),
}

/// How a pinned payload was being shown when it was pinned.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderParams {
    pub title: String,
    /// Active date key of a heatmap.
    pub date: String,
    pub metric: Option<MetricKind>,
    /// Heatmap columns.
    pub locations: Vec<String>,
    /// Heatmap rows, possibly reordered by hand after pinning.
    pub rows: Vec<String>,
    pub profile: ScaleProfile,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardEntry {
    pub payload: Payload,
    pub params: RenderParams,
}

impl DashboardEntry {
    pub fn kind(&self) -> EntryKind {
        match self.payload {
            Payload::Heatmap(_) => EntryKind::Heatmap,
            Payload::Network(_) => EntryKind::Network,
        }
    }
}

/// Ordered entries persisted under one storage key. Position is the only
/// identity an entry has.
pub struct DashboardStore {
    key: String,
    entries: Vec<DashboardEntry>,
    storage: Box<dyn Storage>,
}

impl std::fmt::Debug for DashboardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardStore")
            .field("key", &self.key)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl DashboardStore {
    /// Rehydrates whatever was stored under `key`. Nothing stored is an
    /// empty store; unreadable state is an error.
    pub fn open(key: impl Into<String>, storage: Box<dyn Storage>) -> Result<Self, DashboardError> {
        let mut store = Self {
            key: key.into(),
            entries: Vec::new(),
            storage,
        };
        store.reload()?;
        Ok(store)
    }

    pub fn reload(&mut self) -> Result<(), DashboardError> {
        self.entries = match self.storage.load(&self.key)? {
            Some(text) => serde_json::from_str(&text).map_err(StorageError::from)?,
            None => Vec::new(),
        };
        log::debug!("loaded {} pinned entries from `{}`", self.entries.len(), self.key);
        Ok(())
    }

    /// Stores the full candidate sequence, then adopts it. A failed write
    /// leaves the in-memory sequence as it was.
    fn commit(&mut self, candidate: Vec<DashboardEntry>) -> Result<(), DashboardError> {
        let text = serde_json::to_string(&candidate).map_err(StorageError::from)?;
        if let Err(err) = self.storage.store(&self.key, &text) {
            log::error!("failed to persist `{}`: {err}", self.key);
            return Err(err.into());
        }
        self.entries = candidate;
        Ok(())
    }

    fn check(&self, index: usize) -> Result<(), DashboardError> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(DashboardError::OutOfBounds {
                index,
                len: self.entries.len(),
            })
        }
    }

    /// Appends and returns the new entry's position.
    pub fn add(&mut self, entry: DashboardEntry) -> Result<usize, DashboardError> {
        let mut candidate = self.entries.clone();
        candidate.push(entry);
        self.commit(candidate)?;
        Ok(self.entries.len() - 1)
    }

    pub fn remove(&mut self, index: usize) -> Result<DashboardEntry, DashboardError> {
        self.check(index)?;
        let mut candidate = self.entries.clone();
        let removed = candidate.remove(index);
        self.commit(candidate)?;
        Ok(removed)
    }

    /// Splices the entry out of `from` and back in at `to`, where `to`
    /// indexes the sequence with the entry already removed.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<(), DashboardError> {
        self.check(from)?;
        self.check(to)?;
        let mut candidate = self.entries.clone();
        let moved = candidate.remove(from);
        candidate.insert(to, moved);
        self.commit(candidate)
    }

    /// Replaces the row order of a pinned heatmap.
    pub fn set_rows(&mut self, index: usize, rows: Vec<String>) -> Result<(), DashboardError> {
        self.check(index)?;
        let mut candidate = self.entries.clone();
        candidate[index].params.rows = rows;
        self.commit(candidate)
    }

    pub fn list(&self) -> &[DashboardEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&DashboardEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The two pinned sequences: heatmaps and network graphs.
#[derive(Debug)]
pub struct Dashboard {
    pub heatmaps: DashboardStore,
    pub networks: DashboardStore,
}

impl Dashboard {
    pub fn open<S: Storage + Clone + 'static>(storage: S) -> Result<Self, DashboardError> {
        Ok(Self {
            heatmaps: DashboardStore::open(HEATMAPS_KEY, Box::new(storage.clone()))?,
            networks: DashboardStore::open(NETWORKS_KEY, Box::new(storage))?,
        })
    }

    pub fn store_mut(&mut self, kind: EntryKind) -> &mut DashboardStore {
        match kind {
            EntryKind::Heatmap => &mut self.heatmaps,
            EntryKind::Network => &mut self.networks,
        }
    }

    /// Appends to the sequence matching the entry's kind.
    pub fn pin(&mut self, entry: DashboardEntry) -> Result<usize, DashboardError> {
        self.store_mut(entry.kind()).add(entry)
    }
}
