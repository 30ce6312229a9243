use nr_catalog_manager::domain::SimulationId;
use nr_catalog_manager::names::{decode_metadata_filename, logical_name, metadata_filename};

#[test]
fn codec_round_trips_across_the_identifier_space() {
    for index in [1, 57, 193, 1109, 1843, 9999] {
        for resolution in [100, 120, 144] {
            for id_value in 0..6 {
                let id = SimulationId::quasicircular(index, resolution, id_value);
                assert_eq!(decode_metadata_filename(&metadata_filename(&id)).unwrap(), id);
            }
            let id = SimulationId::eccentric(index, resolution);
            assert_eq!(decode_metadata_filename(&metadata_filename(&id)).unwrap(), id);
        }
    }
}

#[test]
fn logical_names_agree_with_the_lookup_grammar() {
    let id = SimulationId::quasicircular(1109, 100, 1);
    let name = logical_name(&metadata_filename(&id)).unwrap();
    assert_eq!(name.as_str(), "RIT:BBH:1109-n100-id1");
    assert_eq!(name.id().unwrap(), id);

    let id = SimulationId::eccentric(1109, 100);
    let name = logical_name(&metadata_filename(&id)).unwrap();
    assert_eq!(name.as_str(), "RIT:eBBH:1109-n100-ecc");
    assert_eq!(name.id().unwrap(), id);
}
