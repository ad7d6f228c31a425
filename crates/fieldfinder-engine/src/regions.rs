//! Saved regions, kept as one JSON array under a fixed key.

use std::io;

use fieldfinder_core::{Coordinate, Polygon, Region};

use crate::error::RegionError;
use crate::kv::KeyValueStore;
use crate::notice::Notice;

/// Storage key holding every saved region.
pub const REGIONS_KEY: &str = "fieldfinder.saved_regions";

/// What went wrong while decoding the stored region list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageDamage {
    /// The stored value could not be read as a list at all.
    Unreadable,
    /// The list was readable but this many records were invalid and left out.
    SkippedRecords(usize),
}

impl StorageDamage {
    #[must_use]
    pub fn notice(self) -> Notice {
        match self {
            Self::Unreadable => Notice::warning(
                "saved regions could not be read; they will be replaced on the next save",
            ),
            Self::SkippedRecords(n) => Notice::warning(format!(
                "{n} saved region(s) could not be read and were skipped"
            )),
        }
    }
}

/// Regions decoded from storage, plus any damage found along the way.
#[derive(Debug, Clone, Default)]
pub struct RegionListing {
    pub regions: Vec<Region>,
    pub damage: Option<StorageDamage>,
}

pub struct RegionStore<K: KeyValueStore> {
    store: K,
}

impl<K: KeyValueStore> RegionStore<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> K {
        self.store
    }

    /// Persist a new region built from `vertices`.
    ///
    /// # Errors
    ///
    /// - [`RegionError::Invalid`] for a blank name or fewer than three
    ///   vertices. Nothing is written in that case.
    /// - [`RegionError::Storage`] / [`RegionError::Encode`] if the updated
    ///   list cannot be written.
    pub fn save(&mut self, name: &str, vertices: &[Coordinate]) -> Result<Region, RegionError> {
        let polygon = Polygon::new(vertices.to_vec())?;
        let region = Region::new(name, polygon)?;

        let mut regions = self.read()?.regions;
        regions.push(region.clone());
        self.write(&regions)?;

        tracing::info!(
            id = %region.id,
            name = %region.name,
            vertices = region.coordinates.len(),
            "region saved"
        );
        Ok(region)
    }

    /// Every saved region in insertion order. Unreadable or corrupt storage
    /// reads as empty.
    pub fn list(&self) -> Vec<Region> {
        self.list_checked().regions
    }

    /// Like [`list`](Self::list), but reports whether anything was dropped.
    pub fn list_checked(&self) -> RegionListing {
        self.read().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read saved regions; treating as empty");
            RegionListing {
                regions: Vec::new(),
                damage: Some(StorageDamage::Unreadable),
            }
        })
    }

    pub fn get(&self, id: &str) -> Option<Region> {
        self.list().into_iter().find(|r| r.id == id)
    }

    /// The stored polygon for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::NotFound`] for an unknown id.
    pub fn load(&self, id: &str) -> Result<Polygon, RegionError> {
        self.get(id)
            .map(|r| r.coordinates)
            .ok_or_else(|| RegionError::NotFound(id.to_string()))
    }

    /// Remove the region with `id`. Returns `false` when no such region
    /// exists, in which case storage is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the updated list cannot be written.
    pub fn delete(&mut self, id: &str) -> Result<bool, RegionError> {
        let mut regions = self.read()?.regions;
        let before = regions.len();
        regions.retain(|r| r.id != id);
        if regions.len() == before {
            return Ok(false);
        }
        self.write(&regions)?;
        tracing::info!(%id, "region deleted");
        Ok(true)
    }

    /// Show or hide a saved region. Returns `false` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the updated list cannot be written.
    pub fn set_visible(&mut self, id: &str, visible: bool) -> Result<bool, RegionError> {
        let mut regions = self.read()?.regions;
        let Some(region) = regions.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        region.is_visible = visible;
        self.write(&regions)?;
        tracing::debug!(%id, visible, "region visibility changed");
        Ok(true)
    }

    /// Undecodable content is logged and left out. Other I/O failures
    /// propagate.
    fn read(&self) -> Result<RegionListing, RegionError> {
        let raw = match self.store.get(REGIONS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(RegionListing::default()),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!(
                    error = %e,
                    key = REGIONS_KEY,
                    "saved regions are not valid text; ignoring"
                );
                return Ok(unreadable());
            }
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(RegionListing::default());
        }

        let records: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, key = REGIONS_KEY, "saved regions are corrupt; ignoring");
                return Ok(unreadable());
            }
        };

        let mut regions = Vec::with_capacity(records.len());
        let mut skipped = 0usize;
        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Region>(record) {
                Ok(region) => regions.push(region),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(index, error = %e, "skipping malformed saved region");
                }
            }
        }
        let damage = (skipped > 0).then_some(StorageDamage::SkippedRecords(skipped));
        Ok(RegionListing { regions, damage })
    }

    fn write(&mut self, regions: &[Region]) -> Result<(), RegionError> {
        let encoded = serde_json::to_string(regions).map_err(RegionError::Encode)?;
        self.store.set(REGIONS_KEY, &encoded)?;
        Ok(())
    }
}

fn unreadable() -> RegionListing {
    RegionListing {
        regions: Vec::new(),
        damage: Some(StorageDamage::Unreadable),
    }
}

#[cfg(test)]
#[path = "regions_test.rs"]
mod tests;
