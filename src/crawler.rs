use camino::Utf8PathBuf;
use tracing::{debug, info, trace};

use crate::archive::{self, ArchiveClient};
use crate::config::CrawlConfig;
use crate::domain::{PayloadKind, SimulationId, SimulationName};
use crate::error::CatalogError;
use crate::metadata::{NormalizedRecord, parse_metadata_text};
use crate::names;
use crate::store::{CatalogTable, Store};

/// The catalog engine: owns the in-memory table and the crawl
/// configuration, resolves identifiers through the disk cache, the
/// table itself, and the remote archive, in that order.
pub struct Catalog<A: ArchiveClient> {
    store: Store,
    client: A,
    config: CrawlConfig,
    table: CatalogTable,
}

impl<A: ArchiveClient> Catalog<A> {
    pub fn new(store: Store, client: A, config: CrawlConfig) -> Self {
        Self {
            store,
            client,
            config,
            table: CatalogTable::new(),
        }
    }

    pub fn table(&self) -> &CatalogTable {
        &self.table
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Loads the catalog, trusting caches in order of cost: the tabular
    /// snapshot, then a rebuild from cached raw files, then (only with
    /// the download opt-in) a full remote crawl.
    pub fn load(&mut self) -> Result<&CatalogTable, CatalogError> {
        self.store.ensure_dirs()?;
        let required = self.config.required_count();

        self.table = self.store.read_snapshot()?;
        if self.table.is_empty() {
            debug!("snapshot missing or empty, rebuilding from cached raw files");
            self.refresh_from_disk()?;
        } else if self.table.len() < required {
            debug!(
                found = self.table.len(),
                required, "snapshot incomplete, rebuilding from cached raw files"
            );
            self.refresh_from_disk()?;
        }

        if self.table.len() < required {
            if !self.config.download {
                return Err(CatalogError::CatalogIncomplete {
                    cache_dir: self.store.cache_root().as_std_path().to_path_buf(),
                    found: self.table.len(),
                    required,
                    expected: self.config.num_sims_to_crawl,
                });
            }
            info!(
                found = self.table.len(),
                required, "cache insufficient, crawling the archive"
            );
            self.crawl()?;
        }

        Ok(&self.table)
    }

    /// Discards the in-memory table and loads from scratch.
    pub fn reload(&mut self) -> Result<&CatalogTable, CatalogError> {
        self.table = CatalogTable::new();
        self.load()
    }

    /// Rebuilds the snapshot purely from cached raw metadata files over
    /// the identifier space. No network activity.
    pub fn refresh_from_disk(&mut self) -> Result<usize, CatalogError> {
        self.store.ensure_dirs()?;
        let mut table = CatalogTable::new();
        for index in 1..=self.config.num_sims_to_crawl {
            if let Some((filename, text)) = self.store.raw_metadata_for_index(index)? {
                table.upsert(self.record_from_raw(&filename, &text)?);
            }
        }
        self.table = table;
        self.store.write_snapshot(&self.table)?;
        Ok(self.table.len())
    }

    /// Crawls the identifier space `1..=N`, resolving each index through
    /// the three tiers and persisting the snapshot after every hit, so an
    /// interrupted crawl loses at most the in-flight index.
    pub fn crawl(&mut self) -> Result<&CatalogTable, CatalogError> {
        self.store.ensure_dirs()?;
        let bound = self.config.num_sims_to_crawl;
        let required = self.config.required_count();

        self.table = self.store.read_snapshot()?;
        if self.table.len() >= required {
            debug!(
                rows = self.table.len(),
                "snapshot already complete, skipping crawl"
            );
            self.table.truncate(bound);
            return Ok(&self.table);
        }

        for index in 1..=bound {
            trace!(index, "resolving");
            let resolved = self.resolve_index(index)?;
            match resolved {
                Some(record) => {
                    self.table.upsert(record);
                    self.store.write_snapshot(&self.table)?;
                }
                None => {
                    trace!(index, "no simulation found");
                }
            }
        }

        self.store.write_snapshot(&self.table)?;
        if self.table.len() < required {
            return Err(CatalogError::CatalogIncomplete {
                cache_dir: self.store.cache_root().as_std_path().to_path_buf(),
                found: self.table.len(),
                required,
                expected: bound,
            });
        }
        Ok(&self.table)
    }

    /// Looks up one record by logical simulation name.
    pub fn get(&self, name: &SimulationName) -> Result<&NormalizedRecord, CatalogError> {
        self.table
            .get(name)
            .ok_or_else(|| CatalogError::SimulationNotFound(name.to_string()))
    }

    pub fn metadata_url_for(&self, name: &SimulationName) -> Result<String, CatalogError> {
        Ok(archive::metadata_url(&names::metadata_filename(&name.id()?)))
    }

    pub fn waveform_url_for(&self, name: &SimulationName) -> Result<String, CatalogError> {
        Ok(archive::data_url(&names::waveform_filename(&name.id()?)))
    }

    pub fn psi4_url_for(&self, name: &SimulationName) -> Result<String, CatalogError> {
        Ok(archive::data_url(&names::psi4_filename(&name.id()?)))
    }

    /// Downloads one payload file, reusing a cached non-empty copy when
    /// the disk tier is enabled.
    pub fn download_payload(
        &self,
        name: &SimulationName,
        kind: PayloadKind,
    ) -> Result<Utf8PathBuf, CatalogError> {
        let id = name.id()?;
        let filename = match kind {
            PayloadKind::Waveform => names::waveform_filename(&id),
            PayloadKind::Psi4 => names::psi4_filename(&id),
        };
        let local_path = self.store.data_path(&filename);
        if self.config.use_cache && self.store.has_payload(&filename) {
            debug!(path = %local_path, "payload already cached");
            return Ok(local_path);
        }
        self.store.ensure_dirs()?;
        let url = archive::data_url(&filename);
        if !self.client.exists(&url) {
            return Err(CatalogError::PayloadNotFound(url));
        }
        self.client.download(&url, local_path.as_std_path())?;
        Ok(local_path)
    }

    /// Downloads payloads for the first `limit` catalog entries, skipping
    /// simulations whose payload is absent from the archive.
    pub fn download_payloads(
        &self,
        kind: PayloadKind,
        limit: usize,
    ) -> Result<Vec<(SimulationName, Utf8PathBuf)>, CatalogError> {
        let mut fetched = Vec::new();
        let targets: Vec<SimulationName> = self.table.names().take(limit).cloned().collect();
        for name in targets {
            match self.download_payload(&name, kind) {
                Ok(path) => fetched.push((name, path)),
                Err(CatalogError::PayloadNotFound(url)) => {
                    debug!(%name, %url, "payload absent, skipping");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(fetched)
    }

    fn resolve_index(&self, index: usize) -> Result<Option<NormalizedRecord>, CatalogError> {
        // Tier 1: raw metadata file already on disk.
        if self.config.use_cache {
            if let Some((filename, text)) = self.store.raw_metadata_for_index(index)? {
                debug!(index, %filename, "resolved from disk cache");
                return Ok(Some(self.record_from_raw(&filename, &text)?));
            }
        }

        // Tier 2: record already in the table, from this run or a prior
        // snapshot.
        if let Some(record) = self.table.find_by_index(index)? {
            debug!(index, name = %record.simulation_name, "resolved from table");
            return Ok(Some(record.clone()));
        }

        // Tier 3: probe the archive, highest resolution first. The first
        // resolution with any hit wins; lower ones are never consulted.
        for &resolution in self.config.possible_res.iter().rev() {
            for id_value in 0..self.config.max_id_in_name {
                for filename in names::metadata_file_candidates(index, resolution, id_value) {
                    let url = archive::metadata_url(&filename);
                    if !self.client.exists(&url) {
                        continue;
                    }
                    let text = if self.config.use_cache && self.store.has_raw_metadata(&filename) {
                        self.store.read_raw_metadata(&filename)?
                    } else {
                        match self.client.fetch_text(&url) {
                            Ok(text) => text,
                            // A failed fetch of an existing candidate is
                            // treated as absence; the next candidate is
                            // tried.
                            Err(_) => continue,
                        }
                    };
                    self.store.write_raw_metadata(&filename, &text)?;
                    debug!(index, resolution, id_value, %filename, "resolved from archive");
                    return Ok(Some(self.record_from_raw(&filename, &text)?));
                }
            }
        }
        Ok(None)
    }

    /// Builds the full record for a metadata file: parsed physics fields
    /// plus derived link and location columns for all three file kinds.
    fn record_from_raw(
        &self,
        filename: &str,
        text: &str,
    ) -> Result<NormalizedRecord, CatalogError> {
        let id = names::decode_metadata_filename(filename)?;
        let physics = parse_metadata_text(text);
        Ok(build_record(&self.store, &id, physics))
    }
}

fn build_record(
    store: &Store,
    id: &SimulationId,
    physics: crate::metadata::PhysicsMetadata,
) -> NormalizedRecord {
    let metadata_filename = names::metadata_filename(id);
    let psi4_filename = names::psi4_filename(id);
    let waveform_filename = names::waveform_filename(id);
    NormalizedRecord {
        simulation_name: id.logical_name(),
        metadata_link: archive::metadata_url(&metadata_filename),
        metadata_location: store.metadata_path(&metadata_filename).to_string(),
        psi4_data_link: archive::data_url(&psi4_filename),
        psi4_data_location: store.data_path(&psi4_filename).to_string(),
        waveform_data_link: archive::data_url(&waveform_filename),
        waveform_data_location: store.data_path(&waveform_filename).to_string(),
        physics,
    }
}
