use parkwatch::space::Polygon;
use parkwatch::storage::{available_configs, config_label, JsonSpaceStore, SpaceStore};

fn lot() -> Vec<Polygon> {
    vec![
        Polygon::from_pairs(&[(10, 10), (60, 10), (60, 90), (10, 90)]),
        Polygon::from_pairs(&[(70, 10), (120, 12), (118, 90)]),
    ]
}

#[test]
fn absent_file_loads_as_no_spaces() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonSpaceStore::new(dir.path().join("parking_spaces1.json"));
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn saved_list_loads_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parking_spaces1.json");
    let store = JsonSpaceStore::new(&path);
    store.save(&lot()).unwrap();
    assert_eq!(store.load().unwrap(), lot());

    store.save(&lot()[..1]).unwrap();
    assert_eq!(store.load().unwrap(), lot()[..1].to_vec());
}

#[test]
fn file_format_is_a_list_of_point_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parking_spaces1.json");
    std::fs::write(&path, "[[[0,0],[10,0],[10,10]],[[5,5],[6,6]]]").unwrap();

    let polygons = JsonSpaceStore::new(&path).load().unwrap();
    assert_eq!(polygons.len(), 2);
    assert_eq!(polygons[0], Polygon::from_pairs(&[(0, 0), (10, 0), (10, 10)]));
    assert!(polygons[1].is_degenerate());

    JsonSpaceStore::new(&path).save(&polygons[..1]).unwrap();
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw, serde_json::json!([[[0, 0], [10, 0], [10, 10]]]));
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parking_spaces1.json");
    std::fs::write(&path, "{\"spaces\": 3}").unwrap();
    assert!(JsonSpaceStore::new(&path).load().is_err());
}

#[test]
fn lists_numbered_configurations() {
    let dir = tempfile::tempdir().unwrap();
    for name in [
        "parking_spaces2.json",
        "parking_spaces1.json",
        "parking_spaces.json",
        "notes.json",
    ] {
        std::fs::write(dir.path().join(name), "[]").unwrap();
    }
    let configs = available_configs(dir.path()).unwrap();
    let labels: Vec<String> = configs
        .iter()
        .filter_map(|p| config_label(p))
        .collect();
    assert_eq!(labels, vec!["Live1 Config", "Live2 Config"]);
}
