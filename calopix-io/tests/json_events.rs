use approx::assert_abs_diff_eq;
use calopix_io::{DatasetSummary, Error, EventFileFormat, EventFileReader};
use std::io::Write;
use tempfile::NamedTempFile;

fn json_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_read_json_events() {
    let file = json_file(
        r#"{
            "collection": "ECalBarrelCollection",
            "events": [
                {"x": [0, 10, 0, 0], "y": [0, 0, 10, 0], "z": [0, 0, 0, 10], "energy": [1, 1, 1, 1]},
                {"x": [5.5], "y": [-2], "z": [1800], "energy": [0.002]}
            ]
        }"#,
    );

    let reader = EventFileReader::open(file.path()).unwrap();
    assert_eq!(reader.format(), EventFileFormat::Json);
    let data = reader.read().unwrap();
    assert_eq!(data.num_events(), 2);
    assert_eq!(data.hits_per_event(), vec![4, 1]);

    let first = data.event(0).unwrap();
    assert_eq!(first.len(), 4);
    assert_abs_diff_eq!(first.total_energy(), 4.0);

    let summary = DatasetSummary::from_events(&data);
    assert_eq!(summary.total_hits, 5);
    assert_eq!(summary.collection, "ECalBarrelCollection");
}

#[test]
fn test_collection_defaults() {
    let file = json_file(r#"{"events": [{"x": [], "y": [], "z": [], "energy": []}]}"#);
    let data = EventFileReader::open(file.path()).unwrap().read().unwrap();
    assert_eq!(data.collection(), calopix_io::DEFAULT_COLLECTION);
    assert!(data.event(0).unwrap().is_empty());
}

#[test]
fn test_mismatched_event_is_rejected() {
    let file = json_file(
        r#"{"events": [
            {"x": [1], "y": [1], "z": [1], "energy": [0.1]},
            {"x": [1, 2], "y": [1, 2], "z": [1, 2], "energy": [0.1]}
        ]}"#,
    );
    let err = EventFileReader::open(file.path()).unwrap().read().unwrap_err();
    assert!(matches!(err, Error::InvalidEvent { index: 1, .. }));
    assert!(err.to_string().contains("shape mismatch"));
}

#[test]
fn test_malformed_json() {
    let file = json_file("{\"events\": [");
    let err = EventFileReader::open(file.path()).unwrap().read().unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[cfg(not(feature = "hdf5"))]
#[test]
fn test_hdf5_requires_feature() {
    let file = tempfile::Builder::new().suffix(".h5").tempfile().unwrap();
    let err = EventFileReader::open(file.path()).unwrap().read().unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
}
