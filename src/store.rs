use std::collections::BTreeSet;
use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use tracing::trace;

use crate::domain::{FieldValue, SimulationName};
use crate::error::CatalogError;
use crate::metadata::{DERIVED_FIELDS, NormalizedRecord, PhysicsMetadata};
use crate::names;

pub const SNAPSHOT_FILENAME: &str = "metadata.csv";

const LINK_COLUMNS: [&str; 7] = [
    "simulation_name",
    "metadata_link",
    "metadata_location",
    "psi4_data_link",
    "psi4_data_location",
    "waveform_data_link",
    "waveform_data_location",
];

/// On-disk cache: a directory of raw per-simulation metadata text files
/// plus one tabular snapshot, and a sibling directory for payload files.
#[derive(Debug, Clone)]
pub struct Store {
    cache_root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, CatalogError> {
        let cache_root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.home_dir().join(".cache").join("nr-catalog-manager"),
                )
                .ok()
            })
            .ok_or_else(|| {
                CatalogError::Filesystem("unable to resolve cache directory".to_string())
            })?;
        Ok(Self { cache_root })
    }

    pub fn new_with_root(cache_root: Utf8PathBuf) -> Self {
        Self { cache_root }
    }

    pub fn cache_root(&self) -> &Utf8Path {
        &self.cache_root
    }

    pub fn metadata_dir(&self) -> Utf8PathBuf {
        self.cache_root.join("metadata")
    }

    pub fn data_dir(&self) -> Utf8PathBuf {
        self.cache_root.join("data")
    }

    pub fn snapshot_path(&self) -> Utf8PathBuf {
        self.metadata_dir().join(SNAPSHOT_FILENAME)
    }

    pub fn metadata_path(&self, filename: &str) -> Utf8PathBuf {
        self.metadata_dir().join(filename)
    }

    pub fn data_path(&self, filename: &str) -> Utf8PathBuf {
        self.data_dir().join(filename)
    }

    pub fn ensure_dirs(&self) -> Result<(), CatalogError> {
        for dir in [self.metadata_dir(), self.data_dir()] {
            fs::create_dir_all(dir.as_std_path())
                .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<(), CatalogError> {
        if self.cache_root.as_std_path().exists() {
            fs::remove_dir_all(self.cache_root.as_std_path())
                .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        }
        Ok(())
    }

    /// Whether a cached payload can be reused: present and non-empty.
    pub fn has_payload(&self, filename: &str) -> bool {
        let path = self.data_path(filename);
        fs::metadata(path.as_std_path()).map(|m| m.len() > 0).unwrap_or(false)
    }

    /// Whether a raw metadata file is already cached and non-empty.
    pub fn has_raw_metadata(&self, filename: &str) -> bool {
        let path = self.metadata_path(filename);
        fs::metadata(path.as_std_path()).map(|m| m.len() > 0).unwrap_or(false)
    }

    pub fn write_raw_metadata(&self, filename: &str, text: &str) -> Result<(), CatalogError> {
        write_bytes_atomic(&self.metadata_path(filename), text.as_bytes())
    }

    pub fn read_raw_metadata(&self, filename: &str) -> Result<String, CatalogError> {
        fs::read_to_string(self.metadata_path(filename).as_std_path())
            .map_err(|err| CatalogError::Filesystem(err.to_string()))
    }

    /// Looks for a cached raw metadata file for `index`, trying the
    /// quasicircular tag before the eccentric one. Absence is a normal
    /// outcome, not an error.
    pub fn raw_metadata_for_index(
        &self,
        index: usize,
    ) -> Result<Option<(String, String)>, CatalogError> {
        let metadata_dir = self.metadata_dir();
        if !metadata_dir.as_std_path().exists() {
            return Ok(None);
        }
        let mut filenames = Vec::new();
        let entries = fs::read_dir(metadata_dir.as_std_path())
            .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|err| CatalogError::Filesystem(err.to_string()))?;
            if let Ok(name) = entry.file_name().into_string() {
                filenames.push(name);
            }
        }
        filenames.sort();

        for tag in names::sim_tags(index) {
            let matched = filenames.iter().find(|name| name.starts_with(&tag));
            if let Some(filename) = matched {
                trace!(index, %filename, "raw metadata found in cache");
                let text = self.read_raw_metadata(filename)?;
                return Ok(Some((filename.clone(), text)));
            }
        }
        Ok(None)
    }

    /// Loads the persisted snapshot. A missing or empty file yields an
    /// empty table.
    pub fn read_snapshot(&self) -> Result<CatalogTable, CatalogError> {
        let path = self.snapshot_path();
        let size = fs::metadata(path.as_std_path()).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Ok(CatalogTable::new());
        }

        let mut reader = csv::Reader::from_path(path.as_std_path())
            .map_err(|err| CatalogError::SnapshotRead(err.to_string()))?;
        let headers = reader
            .headers()
            .map_err(|err| CatalogError::SnapshotRead(err.to_string()))?
            .clone();

        let mut table = CatalogTable::new();
        for row in reader.records() {
            let row = row.map_err(|err| CatalogError::SnapshotRead(err.to_string()))?;
            let field = |column: &str| -> Option<&str> {
                headers
                    .iter()
                    .position(|header| header == column)
                    .and_then(|position| row.get(position))
            };
            let name = field("simulation_name")
                .ok_or_else(|| {
                    CatalogError::SnapshotRead("snapshot lacks simulation_name column".to_string())
                })?
                .parse::<SimulationName>()?;

            let mut physics = PhysicsMetadata::default();
            for (header, value) in headers.iter().zip(row.iter()) {
                if LINK_COLUMNS.contains(&header) {
                    continue;
                }
                if DERIVED_FIELDS.contains(&header) {
                    physics.set_derived(header, value.trim().parse().unwrap_or(0.0));
                } else if !value.trim().is_empty() {
                    physics.extra.insert(header.to_string(), FieldValue::parse(value));
                }
            }

            let column = |name: &str| field(name).unwrap_or_default().to_string();
            table.upsert(NormalizedRecord {
                simulation_name: name,
                metadata_link: column("metadata_link"),
                metadata_location: column("metadata_location"),
                psi4_data_link: column("psi4_data_link"),
                psi4_data_location: column("psi4_data_location"),
                waveform_data_link: column("waveform_data_link"),
                waveform_data_location: column("waveform_data_location"),
                physics,
            });
        }
        Ok(table)
    }

    /// Persists the full table, replacing prior content. The column set
    /// is the fixed record columns followed by the sorted union of
    /// extension-field keys across all rows.
    pub fn write_snapshot(&self, table: &CatalogTable) -> Result<(), CatalogError> {
        let extra_keys: BTreeSet<&str> = table
            .records()
            .flat_map(|record| record.physics.extra.keys())
            .map(String::as_str)
            .collect();

        let mut writer = csv::Writer::from_writer(Vec::new());
        let header: Vec<&str> = LINK_COLUMNS
            .iter()
            .chain(DERIVED_FIELDS.iter())
            .copied()
            .chain(extra_keys.iter().copied())
            .collect();
        writer
            .write_record(&header)
            .map_err(|err| CatalogError::SnapshotWrite(err.to_string()))?;

        for record in table.records() {
            let mut row: Vec<String> = vec![
                record.simulation_name.to_string(),
                record.metadata_link.clone(),
                record.metadata_location.clone(),
                record.psi4_data_link.clone(),
                record.psi4_data_location.clone(),
                record.waveform_data_link.clone(),
                record.waveform_data_location.clone(),
            ];
            for key in DERIVED_FIELDS {
                let value = record.physics.derived(key).unwrap_or(0.0);
                row.push(value.to_string());
            }
            for key in &extra_keys {
                let value = record
                    .physics
                    .extra
                    .get(*key)
                    .map(FieldValue::to_string)
                    .unwrap_or_default();
                row.push(value);
            }
            writer
                .write_record(&row)
                .map_err(|err| CatalogError::SnapshotWrite(err.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|err| CatalogError::SnapshotWrite(err.to_string()))?;
        write_bytes_atomic(&self.snapshot_path(), &bytes)
    }
}

/// In-memory catalog table: ordered records keyed by simulation name.
#[derive(Debug, Clone, Default)]
pub struct CatalogTable {
    records: Vec<NormalizedRecord>,
}

impl CatalogTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &NormalizedRecord> {
        self.records.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &SimulationName> {
        self.records.iter().map(|record| &record.simulation_name)
    }

    pub fn get(&self, name: &SimulationName) -> Option<&NormalizedRecord> {
        self.records
            .iter()
            .find(|record| &record.simulation_name == name)
    }

    /// Inserts a record, replacing any prior row with the same name.
    pub fn upsert(&mut self, record: NormalizedRecord) {
        match self
            .records
            .iter_mut()
            .find(|existing| existing.simulation_name == record.simulation_name)
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    /// Finds the record for `index` by its embedded tag, verifying that
    /// the matched name actually decodes to `index`. A mismatch means the
    /// table or the codec is corrupted and propagates as a hard error.
    pub fn find_by_index(
        &self,
        index: usize,
    ) -> Result<Option<&NormalizedRecord>, CatalogError> {
        let tags = [
            format!("{}:BBH:{index:04}", crate::domain::CATALOG_TAG),
            format!("{}:eBBH:{index:04}", crate::domain::CATALOG_TAG),
        ];
        for record in &self.records {
            let name = record.simulation_name.as_str();
            if tags.iter().any(|tag| name.contains(tag.as_str())) {
                let decoded = record.simulation_name.id()?;
                if decoded.index != index {
                    return Err(CatalogError::IndexMismatch {
                        name: name.to_string(),
                        expected: index,
                        found: decoded.index,
                    });
                }
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), CatalogError> {
    let parent = path
        .parent()
        .ok_or_else(|| CatalogError::Filesystem("invalid cache path".to_string()))?;
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("nrcat-write")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
    if path.as_std_path().exists() {
        fs::remove_file(path.as_std_path())
            .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
    }
    temp.persist(path.as_std_path())
        .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
    Ok(())
}
