use flowgate_core::gates::{DEFAULT_BORDER_COLOR, GateSet, GateUpdate, StrokeStyle};
use flowgate_core::geometry::Point2;
use flowgate_io::{GateLoader, GateSaver, IoError, JsonGateFile, gates_from_json, gates_to_json};

fn sample_gates() -> GateSet {
    let mut set = GateSet::new();
    let index = set.create_gate();
    for point in [
        Point2::new(300.0, 100.0),
        Point2::new(700.0, 100.0),
        Point2::new(500.0, 500.0),
    ] {
        set.add_vertex(index, point).unwrap();
    }
    set.close(index).unwrap();
    set.apply(index, GateUpdate::Label("CD45+".to_string()))
        .unwrap();
    set.apply(index, GateUpdate::StrokeStyle(StrokeStyle::Dashed))
        .unwrap();

    // second gate is still being drawn
    let open = set.create_gate();
    set.add_vertex(open, Point2::new(250.0, 900.0)).unwrap();
    set.apply(open, GateUpdate::Visible(false)).unwrap();
    set
}

#[test]
fn json_round_trip_preserves_every_field() {
    let original = sample_gates();
    let json = gates_to_json(&original).unwrap();
    let restored = gates_from_json(&json).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn export_uses_camel_case_field_names() {
    let json = gates_to_json(&sample_gates()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let first = &value[0];
    assert_eq!(first["label"], "CD45+");
    assert_eq!(first["borderColor"], DEFAULT_BORDER_COLOR);
    assert_eq!(first["strokeStyle"], "DASHED");
    assert_eq!(first["visible"], true);
    assert_eq!(first["closed"], true);
    assert_eq!(first["vertices"][0]["x"], 300.0);
    assert_eq!(first["vertices"][0]["y"], 100.0);

    let second = &value[1];
    assert_eq!(second["visible"], false);
    assert_eq!(second["closed"], false);
}

#[test]
fn minimal_records_fall_back_to_drawing_defaults() {
    let json = r#"[
        { "vertices": [ { "x": 0.0, "y": 0.0 }, { "x": 10.0, "y": 0.0 }, { "x": 5.0, "y": 8.0 } ] }
    ]"#;
    let set = gates_from_json(json).unwrap();
    let gate = set.gate(0).unwrap();

    assert_eq!(gate.label, "Region 1");
    assert_eq!(gate.border_color, DEFAULT_BORDER_COLOR);
    assert_eq!(gate.stroke_style, StrokeStyle::Solid);
    assert!(gate.visible);
    assert!(!gate.closed);
}

#[test]
fn closed_flag_is_inferred_from_a_terminal_vertex() {
    let json = r#"[
        { "vertices": [
            { "x": 0.0, "y": 0.0 }, { "x": 10.0, "y": 0.0 },
            { "x": 5.0, "y": 8.0 }, { "x": 0.0, "y": 0.0 }
        ] }
    ]"#;
    let set = gates_from_json(json).unwrap();
    assert!(set.gate(0).unwrap().closed);
}

#[test]
fn legacy_dash_arrays_are_accepted_for_stroke_style() {
    let json = r#"[
        { "vertices": [], "strokeStyle": [5, 5] },
        { "vertices": [], "strokeStyle": [] },
        { "vertices": [], "strokeStyle": "dashed" },
        { "vertices": [], "strokeStyle": "MYSTERY" }
    ]"#;
    let set = gates_from_json(json).unwrap();
    assert_eq!(set.gate(0).unwrap().stroke_style, StrokeStyle::Dashed);
    assert_eq!(set.gate(1).unwrap().stroke_style, StrokeStyle::Solid);
    assert_eq!(set.gate(2).unwrap().stroke_style, StrokeStyle::Dashed);
    assert_eq!(set.gate(3).unwrap().stroke_style, StrokeStyle::Solid);
}

#[test]
fn missing_vertices_field_is_an_invalid_document() {
    let json = r#"[ { "label": "no vertices here" } ]"#;
    let err = gates_from_json(json).unwrap_err();
    assert!(matches!(err, IoError::InvalidDocument(_)));
}

#[test]
fn non_finite_vertices_are_rejected() {
    let json = r#"[ { "vertices": [ { "x": 0.0, "y": 1e999 } ] } ]"#;
    let err = gates_from_json(json).unwrap_err();
    assert!(matches!(err, IoError::InvalidDocument(_)));
}

#[test]
fn malformed_json_is_an_invalid_document() {
    assert!(matches!(
        gates_from_json("{ not json"),
        Err(IoError::InvalidDocument(_))
    ));
    // a top-level object instead of an array is also rejected
    assert!(matches!(
        gates_from_json(r#"{ "vertices": [] }"#),
        Err(IoError::InvalidDocument(_))
    ));
}

#[test]
fn facade_round_trips_through_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("polygons.json");

    let facade = JsonGateFile::new();
    let original = sample_gates();
    facade.save(&original, &path).unwrap();
    let restored = facade.load(&path).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn loading_a_missing_file_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let err = JsonGateFile::new().load(&path).unwrap_err();
    match err {
        IoError::ReadError { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other:?}"),
    }
}
