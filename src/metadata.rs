use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{FieldValue, SimulationName};

/// Fields the archive sometimes leaves blank or omits entirely. The
/// parser guarantees they come out numeric, defaulting to 0.0.
pub const DERIVED_FIELDS: [&str; 8] = [
    "freq-start-22",
    "freq-start-22-Hz-1Msun",
    "number-of-cycles-22",
    "number-of-orbits",
    "peak-omega-22",
    "peak-ampl-22",
    "Msun",
    "eccentricity",
];

/// Physics metadata of one simulation: the eight derived fields as a
/// closed set, everything else the archive publishes in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PhysicsMetadata {
    pub freq_start_22: f64,
    pub freq_start_22_hz_1msun: f64,
    pub number_of_cycles_22: f64,
    pub number_of_orbits: f64,
    pub peak_omega_22: f64,
    pub peak_ampl_22: f64,
    pub msun: f64,
    pub eccentricity: f64,
    pub extra: BTreeMap<String, FieldValue>,
}

impl PhysicsMetadata {
    pub fn derived(&self, key: &str) -> Option<f64> {
        match key {
            "freq-start-22" => Some(self.freq_start_22),
            "freq-start-22-Hz-1Msun" => Some(self.freq_start_22_hz_1msun),
            "number-of-cycles-22" => Some(self.number_of_cycles_22),
            "number-of-orbits" => Some(self.number_of_orbits),
            "peak-omega-22" => Some(self.peak_omega_22),
            "peak-ampl-22" => Some(self.peak_ampl_22),
            "Msun" => Some(self.msun),
            "eccentricity" => Some(self.eccentricity),
            _ => None,
        }
    }

    pub fn set_derived(&mut self, key: &str, value: f64) -> bool {
        let slot = match key {
            "freq-start-22" => &mut self.freq_start_22,
            "freq-start-22-Hz-1Msun" => &mut self.freq_start_22_hz_1msun,
            "number-of-cycles-22" => &mut self.number_of_cycles_22,
            "number-of-orbits" => &mut self.number_of_orbits,
            "peak-omega-22" => &mut self.peak_omega_22,
            "peak-ampl-22" => &mut self.peak_ampl_22,
            "Msun" => &mut self.msun,
            "eccentricity" => &mut self.eccentricity,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// One row of the catalog table. `simulation_name` is the key; the link
/// and location columns point at the remote and cached copies of the
/// metadata, psi4 and waveform files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub simulation_name: SimulationName,
    pub metadata_link: String,
    pub metadata_location: String,
    pub psi4_data_link: String,
    pub psi4_data_location: String,
    pub waveform_data_link: String,
    pub waveform_data_location: String,
    pub physics: PhysicsMetadata,
}

/// Parses raw archive metadata text into physics fields.
///
/// Total over arbitrary input: lines not starting with an alphabetic
/// character are dropped, unparseable values degrade to string storage,
/// and every derived field comes out numeric.
pub fn parse_metadata_text(raw: &str) -> PhysicsMetadata {
    let mut fields = BTreeMap::<String, FieldValue>::new();

    for line in raw.lines() {
        let first_is_alpha = line.chars().next().is_some_and(|ch| ch.is_alphabetic());
        if !first_is_alpha {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (line.trim(), ""),
        };
        match FieldValue::parse(value) {
            FieldValue::Number(number) => {
                fields.insert(key.to_string(), FieldValue::Number(number));
            }
            FieldValue::Text(text) => {
                // A blank derived field means "not measured"; give it the
                // numeric default instead of an empty string, but only if
                // an earlier line did not already supply a value.
                let defaulted = DERIVED_FIELDS.contains(&key) && !fields.contains_key(key);
                if defaulted {
                    fields.insert(key.to_string(), FieldValue::Number(0.0));
                } else {
                    fields.insert(key.to_string(), FieldValue::Text(text));
                }
            }
        }
    }

    complete_spin_components(&mut fields, "relaxed-chi1z", &["relaxed-chi1x", "relaxed-chi1y"]);
    complete_spin_components(&mut fields, "relaxed-chi2z", &["relaxed-chi2x", "relaxed-chi2y"]);
    complete_spin_components(
        &mut fields,
        "initial-bh-chi1z",
        &["initial-bh-chi1x", "initial-bh-chi1y"],
    );
    complete_spin_components(
        &mut fields,
        "initial-bh-chi2z",
        &["initial-bh-chi2x", "initial-bh-chi2y"],
    );

    // Cycles and orbits derive from each other. Cycles-to-orbits runs
    // first so a value supplied on either side propagates exactly once.
    let cycles = fields.get("number-of-cycles-22").and_then(FieldValue::as_number);
    let orbits = fields.get("number-of-orbits").and_then(FieldValue::as_number);
    if let Some(cycles) = cycles {
        if orbits.is_none() || orbits == Some(0.0) {
            fields.insert(
                "number-of-orbits".to_string(),
                FieldValue::Number(cycles / 2.0),
            );
        }
    }
    let cycles = fields.get("number-of-cycles-22").and_then(FieldValue::as_number);
    let orbits = fields.get("number-of-orbits").and_then(FieldValue::as_number);
    if let Some(orbits) = orbits {
        if cycles.is_none() || cycles == Some(0.0) {
            fields.insert(
                "number-of-cycles-22".to_string(),
                FieldValue::Number(orbits * 2.0),
            );
        }
    }

    let mut physics = PhysicsMetadata::default();
    for (key, value) in fields {
        if DERIVED_FIELDS.contains(&key.as_str()) {
            physics.set_derived(&key, value.as_number().unwrap_or(0.0));
        } else {
            physics.extra.insert(key, value);
        }
    }
    physics
}

/// When some spin components are zero the archive drops them from the
/// metadata file entirely. Restore them for aligned and nonspinning
/// systems.
fn complete_spin_components(
    fields: &mut BTreeMap<String, FieldValue>,
    z_key: &str,
    xy_keys: &[&str],
) {
    if !fields.contains_key(z_key) {
        return;
    }
    let system_type = fields
        .get("system-type")
        .and_then(FieldValue::as_text)
        .map(str::to_lowercase);
    let applies = matches!(system_type.as_deref(), Some("aligned") | Some("nonspinning"));
    if !applies {
        return;
    }
    for key in xy_keys {
        fields
            .entry(key.to_string())
            .or_insert(FieldValue::Number(0.0));
    }
}
