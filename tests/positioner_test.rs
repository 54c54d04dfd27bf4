use object_label_placement::positioner::{
    ObjectLabelPositioner, PlacementInputs, StyleProps, default_object_label, object_height,
    tracking_stream,
};
use object_label_placement::style::{StyleParser, StyleRule, Stylesheet, XvizStyleParser};
use object_label_placement::transform::{CoordinateSystem, CoordinateTransform, TransformOverride};
use object_label_placement::types::{
    CoordinateKind, Feature, Frame, Metadata, ObjectSelection, Pose, SceneObject, StreamMetadata,
};
use serde_json::{Map, Value, json};
use std::cell::Cell;

fn center() -> Feature {
    Feature {
        center: Some([0.0, 0.0, 0.0]),
        ..Default::default()
    }
}

fn polygon() -> Feature {
    Feature {
        vertices: Some(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]),
        ..Default::default()
    }
}

fn height_rule(height: f64) -> StyleRule {
    let mut properties = Map::new();
    properties.insert("height".to_string(), json!(height));
    StyleRule {
        class: None,
        properties,
    }
}

fn lng_lat_override(
    count: &Cell<usize>,
) -> impl Fn(&Frame, Option<&StreamMetadata>) -> CoordinateTransform + '_ {
    move |_: &Frame, _: Option<&StreamMetadata>| {
        count.set(count.get() + 1);
        CoordinateTransform {
            coordinate_system: CoordinateSystem::LngLat,
            coordinate_origin: [0.0, 0.0, 0.0],
            model_matrix: None,
        }
    }
}

fn all_labels(props: &StyleProps) -> Option<String> {
    Some(format!("label {}", props.id))
}

struct CountingStyles {
    calls: Cell<usize>,
    inner: XvizStyleParser,
}

impl StyleParser for CountingStyles {
    fn get_stylesheet(&self, stream_name: &str) -> &dyn Stylesheet {
        self.calls.set(self.calls.get() + 1);
        self.inner.get_stylesheet(stream_name)
    }
}

#[test]
fn test_missing_frame_or_renderer_is_empty() {
    let metadata = Metadata::default();
    let selection = ObjectSelection::new();
    let styles = XvizStyleParser::new();
    let frame = Frame::new(0.0, [SceneObject::new("a", [0.0; 3]).with_feature("/s", center())]);
    let mut positioner = ObjectLabelPositioner::new();

    let inputs = PlacementInputs {
        frame: None,
        metadata: &metadata,
        object_selection: &selection,
        xviz_style_parser: &styles,
        transform_override: None,
    };
    assert!(positioner.place_all(&inputs, Some(all_labels)).is_empty());

    let inputs = PlacementInputs {
        frame: Some(&frame),
        ..inputs
    };
    let no_renderer: Option<fn(&StyleProps) -> Option<String>> = None;
    assert!(positioner.place_all(&inputs, no_renderer).is_empty());
    assert_eq!(positioner.cache().derivations(), 0);
}

#[test]
fn test_empty_content_skips_all_work() {
    let count = Cell::new(0);
    let derive = lng_lat_override(&count);
    let metadata = Metadata::default();
    let selection = ObjectSelection::new();
    let styles = CountingStyles {
        calls: Cell::new(0),
        inner: XvizStyleParser::new().with_rule("/s", height_rule(1.0)),
    };
    let frame = Frame::new(
        0.0,
        [
            SceneObject::new("a", [0.0; 3]).with_feature("/s", polygon()),
            SceneObject::new("b", [0.0; 3]).with_feature("/s", polygon()),
        ],
    );
    let inputs = PlacementInputs {
        frame: Some(&frame),
        metadata: &metadata,
        object_selection: &selection,
        xviz_style_parser: &styles,
        transform_override: Some(&derive as &TransformOverride),
    };
    let mut positioner = ObjectLabelPositioner::new();

    let none = positioner.place_all(&inputs, Some(|_: &StyleProps| None::<String>));
    assert!(none.is_empty());
    let blank = positioner.place_all(&inputs, Some(|_: &StyleProps| Some(String::new())));
    assert!(blank.is_empty());
    let falsy = positioner.place_all(&inputs, Some(|_: &StyleProps| Some(Value::Bool(false))));
    assert!(falsy.is_empty());

    assert_eq!(count.get(), 0);
    assert_eq!(styles.calls.get(), 0);
    assert!(positioner.cache().is_empty());
}

#[test]
fn test_default_label_only_for_selected() {
    let count = Cell::new(0);
    let derive = lng_lat_override(&count);
    let metadata = Metadata::default();
    let selection: ObjectSelection = ["b".to_string()].into_iter().collect();
    let styles = XvizStyleParser::new();
    let frame = Frame::new(
        0.0,
        [
            SceneObject::new("a", [0.0; 3]).with_feature("/s", center()),
            SceneObject::new("b", [0.0; 3]).with_feature("/s", center()),
        ],
    );
    let inputs = PlacementInputs {
        frame: Some(&frame),
        metadata: &metadata,
        object_selection: &selection,
        xviz_style_parser: &styles,
        transform_override: Some(&derive as &TransformOverride),
    };
    let records = ObjectLabelPositioner::new().place_all(&inputs, Some(default_object_label));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "b");
    assert_eq!(records[0].content, "ID: b");
    assert!(records[0].style_props.is_selected);
}

#[test]
fn test_first_match_selection_is_independent() {
    let mut metadata = Metadata::default();
    for (name, z) in [("/a", 1000.0), ("/b", 10.0), ("/c", 500.0)] {
        metadata.streams.insert(
            name.to_string(),
            StreamMetadata {
                coordinate: Some(CoordinateKind::Geographic),
                transform: None,
                pose: Some(Pose {
                    z,
                    ..Default::default()
                }),
            },
        );
    }
    let styles = XvizStyleParser::new()
        .with_rule("/a", height_rule(50.0))
        .with_rule("/b", height_rule(100.0))
        .with_rule("/c", height_rule(2.0));
    let selection = ObjectSelection::new();
    let object = SceneObject::new("obj", [1.0, 2.0, 0.0])
        .with_feature("/a", Feature::default())
        .with_feature("/b", center())
        .with_feature("/c", polygon());
    assert_eq!(tracking_stream(&object), Some("/b"));
    assert_eq!(object_height(&object, &styles), Some(2.0));

    let frame = Frame::new(0.0, [object]);
    let inputs = PlacementInputs {
        frame: Some(&frame),
        metadata: &metadata,
        object_selection: &selection,
        xviz_style_parser: &styles,
        transform_override: None,
    };
    let mut positioner = ObjectLabelPositioner::new();
    let records = positioner.place_all(&inputs, Some(all_labels));

    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert!((r.longitude - 1.0).abs() < 1e-9);
    assert!((r.latitude - 2.0).abs() < 1e-9);
    // 10 from the pose of /b, 2 from the style of /c
    assert!((r.altitude - 12.0).abs() < 1e-9);
    assert!(positioner.cache().contains("/b"));
    assert!(!positioner.cache().contains("/c"));
}

#[test]
fn test_tracking_point_is_not_overwritten() {
    let object = SceneObject::new("obj", [0.0; 3])
        .with_feature("/first", polygon())
        .with_feature("/second", center());
    assert_eq!(tracking_stream(&object), Some("/first"));

    let styles = XvizStyleParser::new()
        .with_rule("/first", height_rule(3.0))
        .with_rule("/third", height_rule(9.0));
    let object = object.with_feature("/third", polygon());
    assert_eq!(object_height(&object, &styles), Some(3.0));
}

#[test]
fn test_height_skips_streams_without_height() {
    let styles = XvizStyleParser::new().with_rule("/second", height_rule(4.0));
    let object = SceneObject::new("obj", [0.0; 3])
        .with_feature("/first", polygon())
        .with_feature("/second", polygon());
    assert_eq!(object_height(&object, &styles), Some(4.0));

    let flat = SceneObject::new("obj", [0.0; 3]).with_feature("/second", center());
    assert_eq!(object_height(&flat, &styles), None);
}

#[test]
fn test_zero_height_falls_through() {
    let styles = XvizStyleParser::new()
        .with_rule("/flat", height_rule(0.0))
        .with_rule("/box", height_rule(3.0));
    let object = SceneObject::new("obj", [0.0; 3])
        .with_feature("/flat", polygon())
        .with_feature("/box", polygon());
    assert_eq!(object_height(&object, &styles), Some(3.0));

    let only_flat = SceneObject::new("obj", [0.0; 3]).with_feature("/flat", polygon());
    assert_eq!(object_height(&only_flat, &styles), None);
}

#[test]
fn test_edited_clone_gets_fresh_anchor() {
    let metadata = Metadata::default();
    let selection = ObjectSelection::new();
    let styles = XvizStyleParser::new();
    let frame = Frame::new(
        0.0,
        [SceneObject::new("a", [0.0; 3]).with_feature("/s", center())],
    )
    .with_origin([8.0, 50.0, 0.0]);
    let mut moved = frame.clone();
    moved.origin = Some([100.0, 10.0, 0.0]);
    let mut positioner = ObjectLabelPositioner::new();

    let mut longitudes = Vec::new();
    for f in [&frame, &moved] {
        let inputs = PlacementInputs {
            frame: Some(f),
            metadata: &metadata,
            object_selection: &selection,
            xviz_style_parser: &styles,
            transform_override: None,
        };
        longitudes.push(positioner.place_all(&inputs, Some(all_labels))[0].longitude);
    }
    assert!((longitudes[0] - 8.0).abs() < 1e-9);
    assert!((longitudes[1] - 100.0).abs() < 1e-9);
    assert_eq!(positioner.cache().derivations(), 2);
}

#[test]
fn test_camera_compensation() {
    let count = Cell::new(0);
    let derive = lng_lat_override(&count);
    let metadata = Metadata::default();
    let selection = ObjectSelection::new();
    let styles = XvizStyleParser::new().with_rule("/s", height_rule(2.0));
    let frame = Frame::new(
        0.0,
        [SceneObject::new("a", [0.0, 0.0, 10.0]).with_feature("/s", polygon())],
    )
    .with_origin([0.0, 0.0, 5.0]);
    let inputs = PlacementInputs {
        frame: Some(&frame),
        metadata: &metadata,
        object_selection: &selection,
        xviz_style_parser: &styles,
        transform_override: Some(&derive as &TransformOverride),
    };
    let records = ObjectLabelPositioner::new().place_all(&inputs, Some(all_labels));
    assert_eq!(records.len(), 1);
    assert!((records[0].altitude - 7.0).abs() < 1e-9);
    assert_eq!(records[0].tracking_point(), [0.0, 0.0, records[0].altitude]);
}

#[test]
fn test_no_geometry_object_is_skipped() {
    let metadata = Metadata::default();
    let selection = ObjectSelection::new();
    let styles = XvizStyleParser::new();
    let mut ghost = SceneObject::new("ghost", [0.0; 3]).with_feature("/s", Feature::default());
    ghost.stream_names.push("/no-feature".to_string());
    let frame = Frame::new(
        0.0,
        [
            ghost,
            SceneObject::new("empty", [0.0; 3]),
            SceneObject::new("real", [0.0; 3]).with_feature("/s", center()),
        ],
    );
    let inputs = PlacementInputs {
        frame: Some(&frame),
        metadata: &metadata,
        object_selection: &selection,
        xviz_style_parser: &styles,
        transform_override: None,
    };
    let records = ObjectLabelPositioner::new().place_all(&inputs, Some(all_labels));
    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["real"]);
}

#[test]
fn test_selection_reflection() {
    let metadata = Metadata::default();
    let styles = XvizStyleParser::new();
    let frame = Frame::new(
        0.0,
        ["a", "b", "c"]
            .map(|id| SceneObject::new(id, [0.0; 3]).with_feature("/s", center())),
    );
    let selections: [&[&str]; 4] = [&[], &["a"], &["b", "c"], &["a", "b", "c", "zzz"]];
    for selected in selections {
        let selection: ObjectSelection = selected.iter().map(|s| s.to_string()).collect();
        let inputs = PlacementInputs {
            frame: Some(&frame),
            metadata: &metadata,
            object_selection: &selection,
            xviz_style_parser: &styles,
            transform_override: None,
        };
        let records = ObjectLabelPositioner::new().place_all(&inputs, Some(all_labels));
        assert_eq!(records.len(), 3);
        for r in &records {
            assert_eq!(r.style_props.is_selected, selected.contains(&r.id.as_str()));
            assert_eq!(r.style_props.id, r.id);
            assert_eq!(r.style_props.object.id, r.id);
        }
    }
}

#[test]
fn test_order_preservation() {
    let metadata = Metadata::default();
    let selection = ObjectSelection::new();
    let styles = XvizStyleParser::new();
    let ids = ["z", "m", "skip", "a", "q"];
    let frame = Frame::new(
        0.0,
        ids.map(|id| {
            let object = SceneObject::new(id, [0.0; 3]);
            if id == "skip" {
                object
            } else {
                object.with_feature("/s", center())
            }
        }),
    );
    let inputs = PlacementInputs {
        frame: Some(&frame),
        metadata: &metadata,
        object_selection: &selection,
        xviz_style_parser: &styles,
        transform_override: None,
    };
    let records = ObjectLabelPositioner::new().place_all(&inputs, Some(all_labels));
    let placed: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(placed, vec!["z", "m", "a", "q"]);
}

#[test]
fn test_shared_streams_derive_once_per_frame() {
    let count = Cell::new(0);
    let derive = lng_lat_override(&count);
    let metadata = Metadata::default();
    let selection = ObjectSelection::new();
    let styles = XvizStyleParser::new();
    let objects: Vec<_> = (0..20)
        .map(|i| {
            let stream = if i % 2 == 0 { "/even" } else { "/odd" };
            SceneObject::new(&i.to_string(), [i as f64, 0.0, 0.0]).with_feature(stream, center())
        })
        .collect();
    let first = Frame::new(0.0, objects.clone());
    let second = Frame::new(0.1, objects);
    let mut positioner = ObjectLabelPositioner::new();

    for frame in [&first, &first, &second] {
        let inputs = PlacementInputs {
            frame: Some(frame),
            metadata: &metadata,
            object_selection: &selection,
            xviz_style_parser: &styles,
            transform_override: Some(&derive as &TransformOverride),
        };
        assert_eq!(positioner.place_all(&inputs, Some(all_labels)).len(), 20);
    }
    assert_eq!(count.get(), 4);
}

#[test]
fn test_stable_for_unchanged_inputs() {
    let mut metadata = Metadata::default();
    metadata.streams.insert(
        "/s".to_string(),
        StreamMetadata {
            coordinate: Some(CoordinateKind::Identity),
            ..Default::default()
        },
    );
    let selection = ObjectSelection::new();
    let styles = XvizStyleParser::new().with_rule("/s", height_rule(1.5));
    let frame = Frame::new(
        0.0,
        [SceneObject::new("a", [12.0, -4.0, 0.5]).with_feature("/s", polygon())],
    )
    .with_origin([-122.4, 37.8, 20.0]);
    let inputs = PlacementInputs {
        frame: Some(&frame),
        metadata: &metadata,
        object_selection: &selection,
        xviz_style_parser: &styles,
        transform_override: None,
    };
    let mut positioner = ObjectLabelPositioner::new();
    let first = positioner.place_all(&inputs, Some(all_labels));
    let second = positioner.place_all(&inputs, Some(all_labels));
    assert_eq!(first[0].tracking_point(), second[0].tracking_point());
    assert_eq!(first[0].content, second[0].content);
    assert!(first[0].longitude > -122.4);
    assert!(first[0].latitude < 37.8);
    assert!((first[0].altitude - 2.0).abs() < 1e-9);
}
