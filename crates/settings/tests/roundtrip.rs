//! End-to-end persistence tests over a realistic container graph.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use observable::{reflect_container, reflect_enum, tag, NdArray, ObservableField, Vec2, Vec3, Vec4};
use settings::{Persist, Settings};
use strum_macros::{EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
enum Quality {
    Low,
    Medium,
    High,
}

reflect_enum!(Quality);

struct Device {
    address: ObservableField<String>,
    port: ObservableField<u16>,
    scratch: ObservableField<i32>,
}

reflect_container!(Device { address, port, scratch });

struct Profile {
    quality: ObservableField<Quality>,
    anchor: ObservableField<Vec2>,
    offset: ObservableField<Vec3>,
    orientation: ObservableField<Vec4>,
    workspace: ObservableField<PathBuf>,
    thumbnail: ObservableField<NdArray>,
    gain: ObservableField<f64>,
    label: ObservableField<String>,
    attempts: ObservableField<i32>,
    device: ObservableField<Arc<Device>>,
}

reflect_container!(Profile {
    quality,
    anchor,
    offset,
    orientation,
    workspace,
    thumbnail,
    gain,
    label,
    attempts,
    device,
});

fn sample() -> Profile {
    Profile {
        quality: tag(ObservableField::new(Quality::Medium), Persist::new()),
        anchor: tag(ObservableField::new(Vec2::new(0.5, -0.5)), Persist::new()),
        offset: tag(ObservableField::new(Vec3::new(1.0, 2.0, 3.0)), Persist::new()),
        orientation: tag(
            ObservableField::new(Vec4::new(0.0, 0.0, 1.0, 90.0)),
            Persist::new(),
        ),
        workspace: tag(
            ObservableField::new(PathBuf::from("/var/lib/app")),
            Persist::new(),
        ),
        thumbnail: tag(
            ObservableField::new(NdArray::of_u8(vec![2, 3], &[10, 20, 30, 40, 50, 60]).unwrap()),
            Persist::new(),
        ),
        gain: tag(ObservableField::new(0.75), Persist::new()),
        label: tag(
            ObservableField::new("studio".to_string()),
            Persist::new().named("displayName"),
        ),
        attempts: ObservableField::new(3),
        device: tag(
            ObservableField::new(Arc::new(Device {
                address: tag(ObservableField::new("10.0.0.7".to_string()), Persist::new()),
                port: tag(ObservableField::new(8089u16), Persist::new()),
                scratch: tag(ObservableField::new(99), Persist::new().hidden()),
            })),
            Persist::new(),
        ),
    }
}

#[test]
fn test_document_shape() {
    let profile = sample();
    let document = Settings::new().serialize(&profile);

    assert_eq!(document["quality"], serde_json::json!("Medium"));
    assert_eq!(document["anchor"], serde_json::json!({"x": 0.5, "y": -0.5}));
    assert_eq!(
        document["offset"],
        serde_json::json!({"x": 1.0, "y": 2.0, "z": 3.0})
    );
    assert_eq!(
        document["orientation"],
        serde_json::json!({"x": 0.0, "y": 0.0, "z": 1.0, "t": 90.0})
    );
    assert_eq!(document["workspace"], serde_json::json!("/var/lib/app"));
    assert_eq!(document["thumbnail"]["shape"], serde_json::json!([2, 3]));
    assert_eq!(document["thumbnail"]["dtype"], serde_json::json!("u8"));
    assert_eq!(document["gain"], serde_json::json!(0.75));

    // The override key replaces the attribute name.
    assert_eq!(document["displayName"], serde_json::json!("studio"));
    assert!(!document.contains_key("label"));

    // Untagged and hidden fields never appear.
    assert!(!document.contains_key("attempts"));
    assert_eq!(
        document["device"],
        serde_json::json!({"address": "10.0.0.7", "port": 8089})
    );
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");

    let engine = Settings::new();
    let original = sample();
    engine.save(&path, &original).unwrap();

    let restored = sample();
    restored.quality.set(Quality::High);
    restored.anchor.set(Vec2::default());
    restored.offset.set(Vec3::default());
    restored.orientation.set(Vec4::default());
    restored.workspace.set(PathBuf::from("/tmp"));
    restored.thumbnail.set(NdArray::of_u8(vec![1], &[0]).unwrap());
    restored.gain.set(0.0);
    restored.label.set(String::new());
    restored.device.get().address.set(String::new());
    engine.load(&path, &restored).unwrap();

    assert_eq!(restored.quality.get(), Quality::Medium);
    assert_eq!(restored.anchor.get(), Vec2::new(0.5, -0.5));
    assert_eq!(restored.offset.get(), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(restored.orientation.get(), Vec4::new(0.0, 0.0, 1.0, 90.0));
    assert_eq!(restored.workspace.get(), PathBuf::from("/var/lib/app"));
    assert_eq!(
        restored.thumbnail.get(),
        NdArray::of_u8(vec![2, 3], &[10, 20, 30, 40, 50, 60]).unwrap()
    );
    assert_eq!(restored.gain.get(), 0.75);
    assert_eq!(restored.label.get(), "studio");
    assert_eq!(restored.device.get().address.get(), "10.0.0.7");
    assert_eq!(restored.device.get().port.get(), 8089);

    // Hidden fields are not loaded either.
    assert_eq!(restored.device.get().scratch.get(), 99);
}

struct Ordered {
    third: ObservableField<i32>,
    first: ObservableField<i32>,
    second: ObservableField<i32>,
}

reflect_container!(Ordered { third, first, second });

fn ordered() -> Ordered {
    Ordered {
        third: tag(
            ObservableField::new(3),
            Persist::new().save_order(5).load_order(5),
        ),
        first: tag(ObservableField::new(1), Persist::new()),
        second: tag(
            ObservableField::new(2),
            Persist::new().save_order(1).load_order(1),
        ),
    }
}

#[test]
fn test_save_order_sorts_keys() {
    let document = Settings::new().serialize(&ordered());
    let keys: Vec<&String> = document.keys().collect();
    assert_eq!(keys, ["first", "second", "third"]);
}

#[test]
fn test_load_order_sorts_writes() {
    let root = ordered();
    let log = Arc::new(Mutex::new(Vec::new()));
    for (name, field) in [("third", &root.third), ("first", &root.first), ("second", &root.second)] {
        let log = Arc::clone(&log);
        field.subscribe(move |_| log.lock().unwrap().push(name));
    }

    Settings::new()
        .load_json(r#"{"first": 10, "second": 20, "third": 30}"#, &root)
        .unwrap();

    assert_eq!(*log.lock().unwrap(), ["first", "second", "third"]);
    assert_eq!(root.third.get(), 30);
}

#[test]
fn test_missing_keys_leave_fields_untouched() {
    let profile = sample();
    Settings::new()
        .load_json(r#"{"gain": 0.25}"#, &profile)
        .unwrap();

    assert_eq!(profile.gain.get(), 0.25);
    assert_eq!(profile.quality.get(), Quality::Medium);
    assert_eq!(profile.label.get(), "studio");
}

#[test]
fn test_malformed_values_are_skipped() {
    let profile = sample();
    Settings::new()
        .load_json(
            r#"{
                "quality": "Telepathic",
                "offset": {"x": 9.0},
                "thumbnail": {"shape": [4], "dtype": "u8", "data": "AA=="},
                "device": 7,
                "gain": 0.5
            }"#,
            &profile,
        )
        .unwrap();

    // Bad values are dropped field by field; good ones still land.
    assert_eq!(profile.quality.get(), Quality::Medium);
    assert_eq!(profile.offset.get(), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(
        profile.thumbnail.get(),
        NdArray::of_u8(vec![2, 3], &[10, 20, 30, 40, 50, 60]).unwrap()
    );
    assert_eq!(profile.device.get().address.get(), "10.0.0.7");
    assert_eq!(profile.gain.get(), 0.5);
}

#[test]
fn test_non_object_document_is_ignored() {
    let profile = sample();
    Settings::new().load_json("42", &profile).unwrap();
    assert_eq!(profile.gain.get(), 0.75);

    assert!(Settings::new().load_json("not json", &profile).is_err());
}

struct Node {
    label: ObservableField<String>,
    partner: ObservableField<Option<Arc<Node>>>,
}

reflect_container!(Node { label, partner });

#[test]
fn test_cyclic_graph_serializes_each_object_once() {
    let a = Arc::new(Node {
        label: tag(ObservableField::new("a".to_string()), Persist::new()),
        partner: tag(ObservableField::new(None), Persist::new()),
    });
    let b = Arc::new(Node {
        label: tag(ObservableField::new("b".to_string()), Persist::new()),
        partner: tag(ObservableField::new(Some(Arc::clone(&a))), Persist::new()),
    });
    a.partner.set(Some(Arc::clone(&b)));

    let document = Settings::new().serialize(&*a);
    assert_eq!(document["label"], serde_json::json!("a"));
    // The back-reference to the root is dropped instead of recursing forever.
    assert_eq!(
        document["partner"],
        serde_json::json!({"label": "b"})
    );
}

#[test]
fn test_load_fires_change_events_only_on_change() {
    let profile = sample();
    let hits = Arc::new(Mutex::new(0));
    {
        let hits = Arc::clone(&hits);
        profile.gain.subscribe(move |_| *hits.lock().unwrap() += 1);
    }

    let engine = Settings::new();
    engine.load_json(r#"{"gain": 0.75}"#, &profile).unwrap();
    assert_eq!(*hits.lock().unwrap(), 0);

    engine.load_json(r#"{"gain": 0.5}"#, &profile).unwrap();
    assert_eq!(*hits.lock().unwrap(), 1);
}
