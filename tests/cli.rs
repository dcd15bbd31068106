// Integration tests for argument parsing and the subcommand entry points.

use std::path::PathBuf;

use clap::Parser;
use isoprep::{
    cli::{Cli, Commands},
    commands::{convert, inspect, places},
    Crs, GeoTable, PlaceCollection,
};

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Places(args) => places::run(cli, args),
        Commands::Inspect(args) => inspect::run(cli, args),
        Commands::Convert(args) => convert::run(cli, args),
    }
}

#[test]
fn json_requires_isochrones() {
    let input = data("sheffield_isochrones.geojson");
    let input = input.to_str().unwrap();
    assert!(Cli::try_parse_from(["isoprep", "inspect", input, "--json"]).is_err());
    assert!(Cli::try_parse_from(["isoprep", "inspect", input, "--isochrones", "--json"]).is_ok());
}

#[test]
fn places_writes_into_a_new_directory() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("nested/places.shp");
    let input = data("sheffield_places.csv");

    let cli = Cli::try_parse_from([
        "isoprep", "-v", "places", input.to_str().unwrap(), "-o", output.to_str().unwrap(),
    ]).unwrap();
    assert_eq!(cli.verbose, 1);
    run(&cli).unwrap();

    let table = GeoTable::read(&output).unwrap();
    assert_eq!(table.crs(), Some(Crs::WGS84));
    assert_eq!(PlaceCollection::from_table(&table).unwrap().len(), 3);
}

#[test]
fn places_format_flag_overrides_extension() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("places.data");
    let input = data("sheffield_places.csv");

    let without = Cli::try_parse_from(["isoprep", "places", input.to_str().unwrap(), "-o", output.to_str().unwrap()]).unwrap();
    assert!(run(&without).is_err());

    let with = Cli::try_parse_from([
        "isoprep", "places", input.to_str().unwrap(), "-o", output.to_str().unwrap(), "--format", "geojson",
    ]).unwrap();
    run(&with).unwrap();
    assert!(output.exists());
}

#[test]
fn inspect_runs_on_the_isochrone_fixture() {
    let input = data("sheffield_isochrones.geojson");
    for extra in [&["--isochrones"][..], &["--isochrones", "--json"][..], &[][..]] {
        let mut argv = vec!["isoprep", "inspect", input.to_str().unwrap()];
        argv.extend_from_slice(extra);
        run(&Cli::try_parse_from(argv).unwrap()).unwrap();
    }
}

#[test]
fn inspect_isochrones_rejects_a_place_layer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("places.geojson");
    PlaceCollection::from_triples([("Town Hall", -1.4722871, 53.3805888)]).write(&path).unwrap();

    let cli = Cli::try_parse_from(["isoprep", "inspect", path.to_str().unwrap(), "--isochrones"]).unwrap();
    assert!(run(&cli).is_err());
}

#[test]
fn convert_rejects_an_unknown_crs() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.geojson");
    let input = data("sheffield_isochrones.geojson");
    let cli = Cli::try_parse_from([
        "isoprep", "convert", input.to_str().unwrap(), output.to_str().unwrap(), "--crs", "not-a-crs",
    ]).unwrap();
    assert!(run(&cli).is_err());
    assert!(!output.exists());
}
