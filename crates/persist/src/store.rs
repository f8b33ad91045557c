//! File-backed snapshot store.
//!
//! Layout inside the store directory:
//! ```text
//! store.meta.json            - metadata and schema version
//! snapshots/
//!   000001.snapshot.txt      - text snapshots, oldest first
//! integrity/
//!   manifest.json            - SHA-256 hash chain over every snapshot
//! ```
//!
//! Reads fail closed: a schema mismatch, a broken chain or a file whose
//! hash is missing from or disagrees with the manifest is an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::snapshot::{SNAPSHOT_VERSION, Snapshot, SnapshotError};

const STORE_SCHEMA_VERSION: u32 = 1;
const META_FILE: &str = "store.meta.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("integrity check failed for {file}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        file: String,
        expected: String,
        actual: String,
    },
    #[error("{0} is not listed in the integrity manifest")]
    Unlisted(String),
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("no snapshots found")]
    NoSnapshots,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub store_schema_version: u32,
    pub snapshot_version: u32,
    pub snapshot_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub sha256: String,
    pub prev_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrityManifest {
    pub entries: Vec<ManifestEntry>,
}

impl IntegrityManifest {
    fn entry(&self, filename: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.filename == filename)
    }
}

pub struct SnapshotStore {
    root: PathBuf,
    meta: StoreMeta,
    manifest: IntegrityManifest,
}

impl SnapshotStore {
    /// Open an existing store or create an empty one at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("snapshots"))?;
        std::fs::create_dir_all(root.join("integrity"))?;

        let meta_path = root.join(META_FILE);
        let manifest_path = manifest_path(&root);

        let (meta, manifest) = if meta_path.exists() {
            let meta: StoreMeta = serde_json::from_reader(std::fs::File::open(&meta_path)?)?;
            check_version(meta.store_schema_version, STORE_SCHEMA_VERSION)?;
            check_version(meta.snapshot_version, SNAPSHOT_VERSION)?;
            let manifest = if manifest_path.exists() {
                serde_json::from_reader(std::fs::File::open(&manifest_path)?)?
            } else {
                IntegrityManifest::default()
            };
            (meta, manifest)
        } else {
            let meta = StoreMeta {
                store_schema_version: STORE_SCHEMA_VERSION,
                snapshot_version: SNAPSHOT_VERSION,
                snapshot_count: 0,
            };
            let manifest = IntegrityManifest::default();
            serde_json::to_writer_pretty(std::fs::File::create(&meta_path)?, &meta)?;
            serde_json::to_writer_pretty(std::fs::File::create(&manifest_path)?, &manifest)?;
            tracing::debug!(root = %root.display(), "created snapshot store");
            (meta, manifest)
        };

        Ok(Self {
            root,
            meta,
            manifest,
        })
    }

    /// Append a snapshot and extend the hash chain. Returns its index.
    pub fn save(&mut self, snapshot: &Snapshot) -> Result<u32, StoreError> {
        let index = self.meta.snapshot_count + 1;
        let filename = snapshot_filename(index);
        let bytes = snapshot.to_text()?.into_bytes();

        let sha256 = sha256_hex(&bytes);
        let prev_hash = self.manifest.entries.last().map(|e| e.sha256.clone());
        std::fs::write(self.root.join("snapshots").join(&filename), &bytes)?;

        self.manifest.entries.push(ManifestEntry {
            filename,
            sha256,
            prev_hash,
        });
        self.meta.snapshot_count = index;
        self.save_manifest()?;
        self.save_meta()?;
        tracing::info!(
            index,
            time = snapshot.world.time(),
            events = snapshot.events.len(),
            "snapshot saved"
        );
        Ok(index)
    }

    pub fn load(&self, index: u32) -> Result<Snapshot, StoreError> {
        let filename = snapshot_filename(index);
        let bytes = std::fs::read(self.root.join("snapshots").join(&filename))?;
        self.verify_file_hash(&filename, &bytes)?;
        Ok(Snapshot::read(bytes.as_slice())?)
    }

    pub fn load_latest(&self) -> Result<Snapshot, StoreError> {
        if self.meta.snapshot_count == 0 {
            return Err(StoreError::NoSnapshots);
        }
        self.load(self.meta.snapshot_count)
    }

    /// Walk the whole chain: links first, then every file's hash.
    pub fn verify_integrity(&self) -> Result<(), StoreError> {
        let mut prev_hash: Option<String> = None;
        for entry in &self.manifest.entries {
            if entry.prev_hash != prev_hash {
                return Err(StoreError::IntegrityMismatch {
                    file: entry.filename.clone(),
                    expected: prev_hash.unwrap_or_else(|| "None".into()),
                    actual: entry.prev_hash.clone().unwrap_or_else(|| "None".into()),
                });
            }
            let data = std::fs::read(self.root.join("snapshots").join(&entry.filename))?;
            let actual = sha256_hex(&data);
            if actual != entry.sha256 {
                return Err(StoreError::IntegrityMismatch {
                    file: entry.filename.clone(),
                    expected: entry.sha256.clone(),
                    actual,
                });
            }
            prev_hash = Some(entry.sha256.clone());
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    pub fn manifest(&self) -> &IntegrityManifest {
        &self.manifest
    }

    fn verify_file_hash(&self, filename: &str, data: &[u8]) -> Result<(), StoreError> {
        let entry = self
            .manifest
            .entry(filename)
            .ok_or_else(|| StoreError::Unlisted(filename.to_string()))?;
        let actual = sha256_hex(data);
        if entry.sha256 != actual {
            return Err(StoreError::IntegrityMismatch {
                file: filename.to_string(),
                expected: entry.sha256.clone(),
                actual,
            });
        }
        Ok(())
    }

    fn save_meta(&self) -> Result<(), StoreError> {
        let path = self.root.join(META_FILE);
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.meta)?;
        Ok(())
    }

    fn save_manifest(&self) -> Result<(), StoreError> {
        serde_json::to_writer_pretty(
            std::fs::File::create(manifest_path(&self.root))?,
            &self.manifest,
        )?;
        Ok(())
    }
}

fn check_version(file_version: u32, expected_version: u32) -> Result<(), StoreError> {
    if file_version != expected_version {
        return Err(StoreError::SchemaMismatch {
            file_version,
            expected_version,
        });
    }
    Ok(())
}

fn manifest_path(root: &Path) -> PathBuf {
    root.join("integrity").join("manifest.json")
}

fn snapshot_filename(index: u32) -> String {
    format!("{index:06}.snapshot.txt")
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetsim_common::Vec2;
    use fleetsim_kernel::{
        Customer, CustomerId, DepotCarrier, DepotNodeId, EngineOptions, Simulation, TargetRef,
        Truck, TruckId, World,
    };

    fn sample(steps: usize) -> Snapshot {
        let mut world = World::new(4, DepotCarrier::new(Vec2::ZERO, 0.0));
        world.add_customer(Customer::new(CustomerId(2), Vec2::new(3.0, 4.0), 1, 0.0));
        world.add_truck(
            Truck::new(TruckId(1), Vec2::ZERO, 4, 1.0).with_plan(vec![
                TargetRef::Customer(CustomerId(2)),
                TargetRef::Depot(DepotNodeId(1)),
            ]),
        );
        let mut sim = Simulation::new(world, EngineOptions::default());
        for _ in 0..steps {
            sim.step(1.0);
        }
        Snapshot::capture(sim.world(), sim.queue(), 42)
    }

    #[test]
    fn open_creates_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(tmp.path().join("store")).unwrap();
        assert_eq!(store.meta().snapshot_count, 0);
        assert!(store.root().join("snapshots").is_dir());
        assert!(store.root().join("integrity").is_dir());
        assert!(store.root().join(META_FILE).is_file());
        assert!(matches!(store.load_latest(), Err(StoreError::NoSnapshots)));
    }

    #[test]
    fn save_and_load_latest_after_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store");
        let first = sample(2);
        let second = sample(6);
        {
            let mut store = SnapshotStore::open(&path).unwrap();
            assert_eq!(store.save(&first).unwrap(), 1);
            assert_eq!(store.save(&second).unwrap(), 2);
        }

        let store = SnapshotStore::open(&path).unwrap();
        assert_eq!(store.meta().snapshot_count, 2);
        store.verify_integrity().unwrap();
        assert_eq!(store.load_latest().unwrap(), second);
        assert_eq!(store.load(1).unwrap(), first);
        assert_eq!(
            store.manifest().entries[1].prev_hash.as_deref(),
            Some(store.manifest().entries[0].sha256.as_str())
        );
    }

    #[test]
    fn corruption_fails_closed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store");
        let mut store = SnapshotStore::open(&path).unwrap();
        store.save(&sample(3)).unwrap();

        let file = path.join("snapshots").join(snapshot_filename(1));
        let mut data = std::fs::read(&file).unwrap();
        data.extend_from_slice(b"time=999\n");
        std::fs::write(&file, &data).unwrap();

        let store = SnapshotStore::open(&path).unwrap();
        assert!(matches!(
            store.verify_integrity(),
            Err(StoreError::IntegrityMismatch { .. })
        ));
        assert!(matches!(
            store.load_latest(),
            Err(StoreError::IntegrityMismatch { .. })
        ));
    }

    #[test]
    fn broken_chain_fails_closed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store");
        let mut store = SnapshotStore::open(&path).unwrap();
        store.save(&sample(1)).unwrap();
        store.save(&sample(2)).unwrap();

        let mut manifest = store.manifest().clone();
        manifest.entries[1].prev_hash = Some("0".repeat(64));
        serde_json::to_writer_pretty(
            std::fs::File::create(manifest_path(&path)).unwrap(),
            &manifest,
        )
        .unwrap();

        let store = SnapshotStore::open(&path).unwrap();
        assert!(store.verify_integrity().is_err());
    }

    #[test]
    fn unlisted_snapshot_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store");
        let mut store = SnapshotStore::open(&path).unwrap();
        store.save(&sample(1)).unwrap();

        serde_json::to_writer_pretty(
            std::fs::File::create(manifest_path(&path)).unwrap(),
            &IntegrityManifest::default(),
        )
        .unwrap();
        let store = SnapshotStore::open(&path).unwrap();
        assert!(matches!(store.load_latest(), Err(StoreError::Unlisted(_))));
    }

    #[test]
    fn schema_mismatch_fails_closed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store");
        let _store = SnapshotStore::open(&path).unwrap();

        let meta_path = path.join(META_FILE);
        let mut meta: StoreMeta =
            serde_json::from_reader(std::fs::File::open(&meta_path).unwrap()).unwrap();
        meta.store_schema_version = 999;
        serde_json::to_writer_pretty(std::fs::File::create(&meta_path).unwrap(), &meta).unwrap();

        match SnapshotStore::open(&path) {
            Err(StoreError::SchemaMismatch {
                file_version,
                expected_version,
            }) => {
                assert_eq!(file_version, 999);
                assert_eq!(expected_version, STORE_SCHEMA_VERSION);
            }
            Err(e) => panic!("expected SchemaMismatch, got: {e}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }
}
