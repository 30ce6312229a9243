use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("invalid simulation name: {0}")]
    InvalidSimulationName(String),

    #[error("invalid metadata filename: {0}")]
    InvalidMetadataFilename(String),

    #[error("simulation not found in catalog: {0}")]
    SimulationNotFound(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("archive request failed: {0}")]
    ArchiveHttp(String),

    #[error("archive returned status {status}: {message}")]
    ArchiveStatus { status: u16, message: String },

    #[error("payload not found on archive: {0}")]
    PayloadNotFound(String),

    #[error("failed to read catalog snapshot: {0}")]
    SnapshotRead(String),

    #[error("failed to write catalog snapshot: {0}")]
    SnapshotWrite(String),

    #[error(
        "catalog at {cache_dir} is incomplete: found {found} of {required} required simulations (crawl bound {expected})"
    )]
    #[diagnostic(help(
        "pass --download to `nrcat catalog sync`, or set \"download\": true in nrcat.json, to crawl the archive"
    ))]
    CatalogIncomplete {
        cache_dir: PathBuf,
        found: usize,
        required: usize,
        expected: usize,
    },

    #[error(
        "catalog table is corrupted: record {name} decodes to index {found} while index {expected} was expected"
    )]
    IndexMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
