use std::io::{self, Write};

use serde::Serialize;

use crate::metadata::NormalizedRecord;
use crate::store::CatalogTable;

#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    pub simulations: usize,
    pub snapshot_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    pub simulation_name: String,
    pub number_of_orbits: f64,
    pub eccentricity: f64,
    pub waveform_data_link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub simulations: Vec<ListEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub simulation_name: String,
    pub kind: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearResult {
    pub cleared: bool,
}

impl ListResult {
    pub fn from_table(table: &CatalogTable) -> Self {
        let simulations = table
            .records()
            .map(|record| ListEntry {
                simulation_name: record.simulation_name.to_string(),
                number_of_orbits: record.physics.number_of_orbits,
                eccentricity: record.physics.eccentricity,
                waveform_data_link: record.waveform_data_link.clone(),
            })
            .collect();
        Self { simulations }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_sync(result: &SyncResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_info(record: &NormalizedRecord) -> io::Result<()> {
        Self::print_json(record)
    }

    pub fn print_fetch(result: &FetchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_clear(result: &ClearResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
