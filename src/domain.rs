use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Catalog tag used in every filename and logical simulation name.
pub const CATALOG_TAG: &str = "RIT";

/// Naming scheme of a simulation. The archive publishes quasicircular
/// binaries under `BBH` names carrying a trailing id digit, and eccentric
/// binaries under `eBBH` names carrying a fixed `ecc` suffix instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    Quasicircular { id_value: u8 },
    Eccentric,
}

impl Family {
    pub fn tag(&self) -> &'static str {
        match self {
            Family::Quasicircular { .. } => "BBH",
            Family::Eccentric => "eBBH",
        }
    }

    pub fn suffix(&self) -> String {
        match self {
            Family::Quasicircular { id_value } => format!("id{id_value}"),
            Family::Eccentric => "ecc".to_string(),
        }
    }
}

/// Fully resolved identity of one simulation: its position in the
/// identifier space, the grid resolution it was published at, and the
/// naming family. Exactly one family applies per simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimulationId {
    pub index: usize,
    pub resolution: u32,
    pub family: Family,
}

impl SimulationId {
    pub fn quasicircular(index: usize, resolution: u32, id_value: u8) -> Self {
        Self {
            index,
            resolution,
            family: Family::Quasicircular { id_value },
        }
    }

    pub fn eccentric(index: usize, resolution: u32) -> Self {
        Self {
            index,
            resolution,
            family: Family::Eccentric,
        }
    }

    pub fn logical_name(&self) -> SimulationName {
        SimulationName(format!(
            "{CATALOG_TAG}:{}:{:04}-n{}-{}",
            self.family.tag(),
            self.index,
            self.resolution,
            self.family.suffix()
        ))
    }
}

/// Logical simulation name, e.g. `RIT:BBH:0193-n100-id3` or
/// `RIT:eBBH:1843-n100-ecc`. Primary key of the catalog table and the
/// form consumed by the public lookup API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationName(String);

impl SimulationName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn id(&self) -> Result<SimulationId, CatalogError> {
        parse_logical_name(&self.0)
    }
}

impl fmt::Display for SimulationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SimulationName {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let id = parse_logical_name(trimmed)?;
        // Round-trip through the id so stored names are always canonical.
        Ok(id.logical_name())
    }
}

fn parse_logical_name(value: &str) -> Result<SimulationId, CatalogError> {
    let invalid = || CatalogError::InvalidSimulationName(value.to_string());

    let mut parts = value.splitn(3, ':');
    let tag = parts.next().ok_or_else(invalid)?;
    let family_tag = parts.next().ok_or_else(invalid)?;
    let rest = parts.next().ok_or_else(invalid)?;
    if tag != CATALOG_TAG {
        return Err(invalid());
    }

    // The index occupies a fixed 4-character field.
    if rest.len() < 4 || !rest.is_char_boundary(4) {
        return Err(invalid());
    }
    let index: usize = rest[..4].parse().map_err(|_| invalid())?;
    if index == 0 {
        return Err(invalid());
    }

    let mut segments = rest[4..].split('-').filter(|s| !s.is_empty());
    let res_segment = segments.next().ok_or_else(invalid)?;
    let resolution: u32 = res_segment
        .strip_prefix('n')
        .ok_or_else(invalid)?
        .parse()
        .map_err(|_| invalid())?;
    let suffix = segments.next().ok_or_else(invalid)?;

    let family = match (family_tag, suffix) {
        ("eBBH", "ecc") => Family::Eccentric,
        ("BBH", _) => {
            let id_value: u8 = suffix
                .strip_prefix("id")
                .ok_or_else(invalid)?
                .parse()
                .map_err(|_| invalid())?;
            Family::Quasicircular { id_value }
        }
        _ => return Err(invalid()),
    };

    Ok(SimulationId {
        index,
        resolution,
        family,
    })
}

/// A metadata field value: numeric where the raw text parses as a number,
/// the trimmed string otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(number) => FieldValue::Number(number),
            Err(_) => FieldValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(number) => Some(*number),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Number(_) => None,
            FieldValue::Text(text) => Some(text),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(number) => write!(f, "{number}"),
            FieldValue::Text(text) => write!(f, "{text}"),
        }
    }
}

/// Payload kind selectable on the fetch surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    Waveform,
    Psi4,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadKind::Waveform => write!(f, "waveform"),
            PayloadKind::Psi4 => write!(f, "psi4"),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_quasicircular_name() {
        let name: SimulationName = "RIT:BBH:0193-n100-id3".parse().unwrap();
        let id = name.id().unwrap();
        assert_eq!(id.index, 193);
        assert_eq!(id.resolution, 100);
        assert_eq!(id.family, Family::Quasicircular { id_value: 3 });
    }

    #[test]
    fn parse_eccentric_name() {
        let name: SimulationName = "RIT:eBBH:1843-n100-ecc".parse().unwrap();
        let id = name.id().unwrap();
        assert_eq!(id.index, 1843);
        assert_eq!(id.family, Family::Eccentric);
    }

    #[test]
    fn parse_rejects_foreign_tag() {
        let err = "SXS:BBH:0193-n100-id3".parse::<SimulationName>().unwrap_err();
        assert_matches!(err, CatalogError::InvalidSimulationName(_));
    }

    #[test]
    fn parse_rejects_mismatched_family_suffix() {
        let err = "RIT:eBBH:1843-n100-id3".parse::<SimulationName>().unwrap_err();
        assert_matches!(err, CatalogError::InvalidSimulationName(_));
    }

    #[test]
    fn logical_name_round_trip() {
        let id = SimulationId::quasicircular(5, 120, 0);
        assert_eq!(id.logical_name().as_str(), "RIT:BBH:0005-n120-id0");
        assert_eq!(id.logical_name().id().unwrap(), id);

        let id = SimulationId::eccentric(1911, 100);
        assert_eq!(id.logical_name().as_str(), "RIT:eBBH:1911-n100-ecc");
        assert_eq!(id.logical_name().id().unwrap(), id);
    }

    #[test]
    fn field_value_parse() {
        assert_eq!(FieldValue::parse(" 0.25 "), FieldValue::Number(0.25));
        assert_eq!(
            FieldValue::parse("Aligned"),
            FieldValue::Text("Aligned".to_string())
        );
    }
}
