use nr_catalog_manager::domain::FieldValue;
use nr_catalog_manager::metadata::{DERIVED_FIELDS, parse_metadata_text};

const FULL_SAMPLE: &str = "\
----------------------------------------
Metadata for RIT:BBH:0193
----------------------------------------
catalog-tag = RIT
resolution-tag = n100
system-type = nonSpinning
relaxed-mass1 = 0.5
relaxed-mass2 = 0.5
relaxed-chi1z = 0.0
relaxed-chi2z = 0.0
initial-bh-chi1z = 0.0
initial-bh-chi2z = 0.0
freq-start-22 = 0.0884
number-of-cycles-22 = 21.2
peak-ampl-22 = 0.391
eccentricity =
";

#[test]
fn parser_never_fails_on_arbitrary_input() {
    for raw in ["", "= = =", "\n\n\n", "1234 garbage", "key-without-value"] {
        let physics = parse_metadata_text(raw);
        for key in DERIVED_FIELDS {
            assert!(physics.derived(key).is_some(), "{key} missing for {raw:?}");
        }
    }
}

#[test]
fn full_sample_normalizes() {
    let physics = parse_metadata_text(FULL_SAMPLE);

    assert_eq!(physics.freq_start_22, 0.0884);
    assert_eq!(physics.peak_ampl_22, 0.391);
    assert_eq!(physics.number_of_cycles_22, 21.2);
    // Derived from cycles since the file does not carry orbits.
    assert_eq!(physics.number_of_orbits, 10.6);
    // Blank in the file, defaulted.
    assert_eq!(physics.eccentricity, 0.0);
    // Absent from the file entirely, defaulted.
    assert_eq!(physics.msun, 0.0);
    assert_eq!(physics.peak_omega_22, 0.0);

    // Nonspinning system: all four spin-component groups get completed.
    for key in [
        "relaxed-chi1x",
        "relaxed-chi1y",
        "relaxed-chi2x",
        "relaxed-chi2y",
        "initial-bh-chi1x",
        "initial-bh-chi1y",
        "initial-bh-chi2x",
        "initial-bh-chi2y",
    ] {
        assert_eq!(
            physics.extra.get(key),
            Some(&FieldValue::Number(0.0)),
            "missing completed component {key}"
        );
    }

    assert_eq!(
        physics.extra.get("system-type"),
        Some(&FieldValue::Text("nonSpinning".to_string()))
    );
}

#[test]
fn supplied_spin_components_are_not_overwritten() {
    let physics = parse_metadata_text(
        "system-type = aligned\nrelaxed-chi1z = 0.2\nrelaxed-chi1x = 0.1\n",
    );
    assert_eq!(
        physics.extra.get("relaxed-chi1x"),
        Some(&FieldValue::Number(0.1))
    );
    assert_eq!(
        physics.extra.get("relaxed-chi1y"),
        Some(&FieldValue::Number(0.0))
    );
}

#[test]
fn orbits_and_cycles_propagate_once_in_each_direction() {
    let from_cycles = parse_metadata_text("number-of-cycles-22 = 10\n");
    assert_eq!(from_cycles.number_of_orbits, 5.0);

    let from_orbits = parse_metadata_text("number-of-orbits = 5\n");
    assert_eq!(from_orbits.number_of_cycles_22, 10.0);

    // Both present and non-zero: nothing is rewritten.
    let both = parse_metadata_text("number-of-cycles-22 = 9\nnumber-of-orbits = 5\n");
    assert_eq!(both.number_of_cycles_22, 9.0);
    assert_eq!(both.number_of_orbits, 5.0);
}
