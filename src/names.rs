//! Filename codec for the archive's naming grammar.
//!
//! Metadata files:   `RIT-BBH-0193-n100-id3_Metadata.txt`
//!                   `RIT-eBBH-1843-n100-ecc_Metadata.txt`
//! Waveform files:   `ExtrapStrain_RIT-BBH-0193-n100.h5`
//! Psi4 files:       `RIT-BBH-0193-n100-id3_Psi4.tar.gz`
//!
//! Waveform names drop the trailing id/ecc suffix, so quasicircular and
//! eccentric simulations share the same waveform grammar once the
//! metadata suffix is stripped.

use crate::domain::{CATALOG_TAG, Family, SimulationId, SimulationName};
use crate::error::CatalogError;

pub const METADATA_SUFFIX: &str = "_Metadata.txt";
pub const PSI4_SUFFIX: &str = "_Psi4.tar.gz";
pub const WAVEFORM_PREFIX: &str = "ExtrapStrain_";

pub fn metadata_filename(id: &SimulationId) -> String {
    format!(
        "{CATALOG_TAG}-{}-{:04}-n{}-{}{METADATA_SUFFIX}",
        id.family.tag(),
        id.index,
        id.resolution,
        id.family.suffix()
    )
}

pub fn psi4_filename(id: &SimulationId) -> String {
    format!(
        "{CATALOG_TAG}-{}-{:04}-n{}-{}{PSI4_SUFFIX}",
        id.family.tag(),
        id.index,
        id.resolution,
        id.family.suffix()
    )
}

pub fn waveform_filename(id: &SimulationId) -> String {
    format!(
        "{WAVEFORM_PREFIX}{CATALOG_TAG}-{}-{:04}-n{}.h5",
        id.family.tag(),
        id.index,
        id.resolution
    )
}

/// Both family candidates for one `(index, resolution, id_value)` probe,
/// quasicircular first. The remote probe tries them in this order.
pub fn metadata_file_candidates(index: usize, resolution: u32, id_value: u8) -> [String; 2] {
    [
        metadata_filename(&SimulationId::quasicircular(index, resolution, id_value)),
        metadata_filename(&SimulationId::eccentric(index, resolution)),
    ]
}

/// Filename prefixes that any metadata file for `index` must start with,
/// one per family. Used to scan the on-disk cache without knowing the
/// resolution or id value in advance.
pub fn sim_tags(index: usize) -> [String; 2] {
    [
        format!("{CATALOG_TAG}-BBH-{index:04}"),
        format!("{CATALOG_TAG}-eBBH-{index:04}"),
    ]
}

/// Inverse of [`metadata_filename`]. An absent id-value segment is not an
/// error; it signals the eccentric family.
pub fn decode_metadata_filename(filename: &str) -> Result<SimulationId, CatalogError> {
    let invalid = || CatalogError::InvalidMetadataFilename(filename.to_string());

    let mut segments = filename.split('-');
    let tag = segments.next().ok_or_else(invalid)?;
    if tag != CATALOG_TAG {
        return Err(invalid());
    }
    let family_tag = segments.next().ok_or_else(invalid)?;
    let index_segment = segments.next().ok_or_else(invalid)?;
    let res_segment = segments.next().ok_or_else(invalid)?;
    let suffix_segment = segments.next().ok_or_else(invalid)?;

    // The index occupies a fixed 4-character field; an over-long segment
    // keeps its last four characters.
    let cut = index_segment.len().checked_sub(4).ok_or_else(invalid)?;
    if !index_segment.is_char_boundary(cut) {
        return Err(invalid());
    }
    let index: usize = index_segment[cut..].parse().map_err(|_| invalid())?;

    let resolution: u32 = res_segment
        .strip_prefix('n')
        .ok_or_else(invalid)?
        .parse()
        .map_err(|_| invalid())?;

    let suffix = suffix_segment
        .split('_')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(invalid)?;

    let family = match (family_tag, suffix.strip_prefix("id")) {
        ("BBH", Some(digits)) => {
            // The id value is a single trailing digit; never assume more
            // digits are available.
            let digit = digits.chars().next().ok_or_else(invalid)?;
            let id_value = digit.to_digit(10).ok_or_else(invalid)? as u8;
            Family::Quasicircular { id_value }
        }
        ("eBBH", None) if suffix == "ecc" => Family::Eccentric,
        _ => return Err(invalid()),
    };

    Ok(SimulationId {
        index,
        resolution,
        family,
    })
}

/// Logical name of the simulation a metadata filename belongs to, i.e.
/// the filename truncated at its metadata suffix and canonicalized.
pub fn logical_name(metadata_filename: &str) -> Result<SimulationName, CatalogError> {
    Ok(decode_metadata_filename(metadata_filename)?.logical_name())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn encode_metadata_filenames() {
        let qc = SimulationId::quasicircular(193, 100, 3);
        assert_eq!(metadata_filename(&qc), "RIT-BBH-0193-n100-id3_Metadata.txt");

        let ecc = SimulationId::eccentric(1843, 100);
        assert_eq!(
            metadata_filename(&ecc),
            "RIT-eBBH-1843-n100-ecc_Metadata.txt"
        );
    }

    #[test]
    fn encode_payload_filenames() {
        let qc = SimulationId::quasicircular(193, 100, 3);
        assert_eq!(waveform_filename(&qc), "ExtrapStrain_RIT-BBH-0193-n100.h5");
        assert_eq!(psi4_filename(&qc), "RIT-BBH-0193-n100-id3_Psi4.tar.gz");

        let ecc = SimulationId::eccentric(1911, 100);
        assert_eq!(
            waveform_filename(&ecc),
            "ExtrapStrain_RIT-eBBH-1911-n100.h5"
        );
        assert_eq!(psi4_filename(&ecc), "RIT-eBBH-1911-n100-ecc_Psi4.tar.gz");
    }

    #[test]
    fn decode_round_trips_both_families() {
        for id in [
            SimulationId::quasicircular(5, 120, 0),
            SimulationId::quasicircular(193, 100, 3),
            SimulationId::eccentric(1843, 100),
        ] {
            assert_eq!(decode_metadata_filename(&metadata_filename(&id)).unwrap(), id);
        }
    }

    #[test]
    fn decode_takes_trailing_index_field() {
        let id = decode_metadata_filename("RIT-BBH-00057-n100-id1_Metadata.txt").unwrap();
        assert_eq!(id.index, 57);
    }

    #[test]
    fn decode_takes_single_id_digit() {
        let id = decode_metadata_filename("RIT-BBH-0193-n100-id3_Metadata.txt").unwrap();
        assert_eq!(id.family, Family::Quasicircular { id_value: 3 });
    }

    #[test]
    fn decode_rejects_foreign_names() {
        let err = decode_metadata_filename("SXS-BBH-0193-n100-id3_Metadata.txt").unwrap_err();
        assert_matches!(err, CatalogError::InvalidMetadataFilename(_));

        let err = decode_metadata_filename("RIT-BBH-0193-n100-ecc_Metadata.txt").unwrap_err();
        assert_matches!(err, CatalogError::InvalidMetadataFilename(_));
    }

    #[test]
    fn logical_name_from_metadata_filename() {
        let name = logical_name("RIT-eBBH-1843-n100-ecc_Metadata.txt").unwrap();
        assert_eq!(name.as_str(), "RIT:eBBH:1843-n100-ecc");
    }

    #[test]
    fn sim_tags_cover_both_families() {
        assert_eq!(sim_tags(57), ["RIT-BBH-0057", "RIT-eBBH-0057"]);
    }
}
