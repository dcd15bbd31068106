// Integration tests for building place layers, writing them, and reading them back.

use std::{io::ErrorKind, path::Path};

use isoprep::{Crs, CsvColumns, GeoFormat, GeoTable, PlaceCollection};

const EPSILON: f64 = 1e-5;

fn sheffield() -> PlaceCollection {
    PlaceCollection::from_triples([
        ("Hicks Building", -1.4864929, 53.3812259),
        ("Town Hall", -1.4722871, 53.3805888),
        ("Cathedral", -1.4693460, 53.3831771),
    ])
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|e| e.downcast_ref::<std::io::Error>().is_some_and(|io| io.kind() == ErrorKind::NotFound))
}

fn assert_same_places(expected: &PlaceCollection, actual: &PlaceCollection) {
    assert_eq!(actual.len(), expected.len());
    for (want, got) in expected.iter().zip(actual.iter()) {
        assert_eq!(got.name, want.name);
        assert!((got.longitude() - want.longitude()).abs() < EPSILON, "{} longitude", want.name);
        assert!((got.latitude() - want.latitude()).abs() < EPSILON, "{} latitude", want.name);
    }
}

fn round_trip(path: &Path, format: GeoFormat) {
    let places = sheffield();
    places.write_to(path, format).unwrap();

    let table = GeoTable::read(path).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.crs(), Some(Crs::WGS84));

    let back = PlaceCollection::from_table(&table).unwrap();
    assert_eq!(back.crs(), Crs::WGS84);
    assert_same_places(&places, &back);
}

#[test]
fn geojson_round_trip_keeps_labels_points_and_crs() {
    let dir = tempfile::tempdir().unwrap();
    round_trip(&dir.path().join("sheffield.geojson"), GeoFormat::GeoJson);
}

#[test]
fn shapefile_round_trip_keeps_labels_points_and_crs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheffield.shp");
    round_trip(&path, GeoFormat::Shapefile);
    for sidecar in ["shx", "dbf", "prj"] {
        assert!(path.with_extension(sidecar).exists(), "missing .{sidecar}");
    }
}

#[test]
fn format_is_inferred_from_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("places.json");
    sheffield().write(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("FeatureCollection"));
    assert!(text.contains("urn:ogc:def:crs:EPSG::4326"));
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("places.gpkg");
    assert!(sheffield().write(&path).is_err());
    assert!(!path.exists());
}

#[test]
fn existing_file_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("places.geojson");
    sheffield().write(&path).unwrap();

    let single = PlaceCollection::from_triples([("Winter Garden", -1.4704, 53.3800)]);
    single.write(&path).unwrap();

    let back = PlaceCollection::from_table(&GeoTable::read(&path).unwrap()).unwrap();
    assert_same_places(&single, &back);
}

#[test]
fn out_of_range_coordinates_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("odd.geojson");
    let odd = PlaceCollection::from_triples([("Off the map", 200.0, -95.0)]);
    odd.write(&path).unwrap();
    let back = PlaceCollection::from_table(&GeoTable::read(&path).unwrap()).unwrap();
    assert_same_places(&odd, &back);
}

#[test]
fn empty_collection_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.geojson");
    let empty = PlaceCollection::from_triples(Vec::<(String, f64, f64)>::new());
    empty.write(&path).unwrap();
    assert!(GeoTable::read(&path).unwrap().is_empty());
}

#[test]
fn reading_a_missing_file_fails_with_not_found() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["missing.geojson", "missing.shp"] {
        let err = GeoTable::read(&dir.path().join(name)).unwrap_err();
        assert!(is_not_found(&err), "{name}: {err:#}");
    }
}

#[test]
fn reading_a_non_container_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.geojson");
    std::fs::write(&path, "this is not json").unwrap();
    assert!(GeoTable::read(&path).is_err());
}

#[test]
fn places_from_csv_fixture() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/sheffield_places.csv");
    let places = PlaceCollection::from_csv(&path, &CsvColumns::default()).unwrap();
    assert_same_places(&sheffield(), &places);
}

#[test]
fn places_from_csv_with_custom_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schools.csv");
    std::fs::write(&path, "School,Longitude,Latitude\nKing Edward VII,-1.4975,53.3775\n").unwrap();

    let columns = CsvColumns {
        name: "School".into(),
        longitude: "Longitude".into(),
        latitude: "Latitude".into(),
    };
    let places = PlaceCollection::from_csv(&path, &columns).unwrap();
    assert_eq!(places.len(), 1);
    assert_eq!(places.places()[0].name, "King Edward VII");

    assert!(PlaceCollection::from_csv(&path, &CsvColumns::default()).is_err());
}

#[test]
fn long_multibyte_labels_fit_a_shapefile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accents.shp");
    sheffield().write(&path).unwrap();

    let label = "é".repeat(200);
    PlaceCollection::from_triples([(label.as_str(), 0.0, 0.0)])
        .write_to(&path, GeoFormat::Shapefile)
        .unwrap();

    let back = PlaceCollection::from_table(&GeoTable::read(&path).unwrap()).unwrap();
    assert_eq!(back.len(), 1);
    let name = &back.places()[0].name;
    assert!(name.len() <= 254, "{} bytes", name.len());
    assert!(label.starts_with(name.as_str()));
}

#[test]
fn shapefile_without_prj_is_not_read_as_places() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("untagged.shp");
    sheffield().write(&path).unwrap();
    std::fs::remove_file(path.with_extension("prj")).unwrap();

    let table = GeoTable::read(&path).unwrap();
    assert_eq!(table.crs(), None);
    assert!(PlaceCollection::from_table(&table).is_err());
}
