//! Applying resolved configurations onto live property sets

use super::test_utils::{controller_model, controller_store, names, yaml};
use taskconf::apply::{conf_as_value, PropertySet};
use taskconf::error::ConfigError;
use taskconf::registry::ConfigurationManager;
use taskconf::value::{LiveValue, Scalar};

fn scalar_int(v: i64) -> LiveValue {
    LiveValue::Scalar(Scalar::Int(v))
}

fn scalar_float(v: f64) -> LiveValue {
    LiveValue::Scalar(Scalar::Float(v))
}

fn full_property_set() -> PropertySet {
    PropertySet::from_model(
        &controller_model(),
        &[
            "threshold",
            "speed",
            "max_velocity",
            "label",
            "pid",
            "window",
            "waypoints",
        ],
    )
}

#[test]
fn test_apply_touches_only_configured_properties() {
    let mut store = controller_store();
    store.add("default", &yaml("threshold: 20"), false).unwrap();
    store.add("fast", &yaml("speed: 10"), false).unwrap();

    let mut task = full_property_set()
        .with_value("max_velocity", scalar_float(3.5))
        .with_value("label", LiveValue::Scalar(Scalar::Text("keep".into())));

    store
        .apply(&mut task, &names(&["default", "fast"]), false)
        .unwrap();

    assert_eq!(task.get("threshold"), Some(&scalar_int(20)));
    assert_eq!(task.get("speed"), Some(&scalar_int(10)));
    // properties outside the configuration keep their live values
    assert_eq!(task.get("max_velocity"), Some(&scalar_float(3.5)));
    assert_eq!(
        task.get("label"),
        Some(&LiveValue::Scalar(Scalar::Text("keep".into())))
    );
}

#[test]
fn test_apply_partial_compound_and_sequence() {
    let mut store = controller_store();
    store
        .add(
            "default",
            &yaml("pid: {p: 2.0}\nwindow: [1.0, ~, 3.0]"),
            false,
        )
        .unwrap();

    let mut task = full_property_set().with_value(
        "pid",
        LiveValue::Struct(
            [
                ("p".to_string(), scalar_float(0.1)),
                ("i".to_string(), scalar_float(0.2)),
                ("d".to_string(), scalar_float(0.3)),
            ]
            .into(),
        ),
    );

    store.apply(&mut task, &names(&["default"]), false).unwrap();

    let LiveValue::Struct(pid) = task.get("pid").unwrap() else {
        panic!("expected a struct");
    };
    assert_eq!(pid.get("p"), Some(&scalar_float(2.0)));
    // fields the configuration does not mention are untouched
    assert_eq!(pid.get("i"), Some(&scalar_float(0.2)));
    assert_eq!(pid.get("d"), Some(&scalar_float(0.3)));

    // the hole at index 1 keeps the zero-initialized element
    assert_eq!(
        task.get("window"),
        Some(&LiveValue::Sequence(vec![
            scalar_float(1.0),
            scalar_float(0.0),
            scalar_float(3.0),
        ]))
    );
}

#[test]
fn test_apply_grows_dynamic_containers() {
    let mut store = controller_store();
    store
        .add(
            "default",
            &yaml("waypoints: [{x: 1.0, y: 2.0}, {x: 3.0, y: 4.0}]"),
            false,
        )
        .unwrap();

    let mut task = full_property_set();
    store.apply(&mut task, &names(&["default"]), false).unwrap();

    let LiveValue::Sequence(waypoints) = task.get("waypoints").unwrap() else {
        panic!("expected a sequence");
    };
    assert_eq!(waypoints.len(), 2);
    let LiveValue::Struct(last) = &waypoints[1] else {
        panic!("expected a struct element");
    };
    assert_eq!(last.get("x"), Some(&scalar_float(3.0)));
    assert_eq!(last.get("y"), Some(&scalar_float(4.0)));
}

#[test]
fn test_fixed_array_overflow_is_rejected_with_path() {
    let mut store = controller_store();
    let err = store
        .add("default", &yaml("window: [1.0, 2.0, 3.0, 4.0]"), false)
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::ArrayTooLarge {
            ref path,
            got: 4,
            max: 3,
        } if path == ".window"
    ));
}

#[test]
fn test_extract_round_trips_through_a_section() {
    let mut store = controller_store();
    let task = full_property_set()
        .with_value("threshold", scalar_int(42))
        .with_value(
            "pid",
            LiveValue::Struct(
                [
                    ("p".to_string(), scalar_float(1.5)),
                    ("i".to_string(), scalar_float(0.0)),
                    ("d".to_string(), scalar_float(0.0)),
                ]
                .into(),
            ),
        );

    store.extract("snapshot", &task, false).unwrap();

    let mut restored = full_property_set();
    store
        .apply(&mut restored, &names(&["snapshot"]), false)
        .unwrap();
    assert_eq!(restored.get("threshold"), Some(&scalar_int(42)));
    let LiveValue::Struct(pid) = restored.get("pid").unwrap() else {
        panic!("expected a struct");
    };
    assert_eq!(pid.get("p"), Some(&scalar_float(1.5)));
}

#[test]
fn test_conf_as_value_fills_unset_fields_with_zeros() {
    let mut store = controller_store();
    store.add("default", &yaml("pid: {p: 2.0}"), false).unwrap();

    let conf = store.conf(&names(&["default"]), false).unwrap();
    let values = conf_as_value(&conf, store.model()).unwrap();

    let LiveValue::Struct(pid) = values.get("pid").unwrap() else {
        panic!("expected a struct");
    };
    assert_eq!(pid.get("p"), Some(&scalar_float(2.0)));
    assert_eq!(pid.get("i"), Some(&scalar_float(0.0)));
    assert_eq!(pid.get("d"), Some(&scalar_float(0.0)));
}

#[test]
fn test_registry_apply_reports_whether_anything_ran() {
    let mut manager = ConfigurationManager::new();
    manager.add_model(controller_model());
    manager
        .store_mut("motion::Controller")
        .unwrap()
        .add("default", &yaml("threshold: 7"), false)
        .unwrap();

    let mut task = full_property_set();
    let applied = manager
        .apply("motion::Controller", &mut task, &[], false)
        .unwrap();
    assert!(applied);
    assert_eq!(task.get("threshold"), Some(&scalar_int(7)));

    // default request against an unknown model is skipped
    let applied = manager.apply("missing::Task", &mut task, &[], false).unwrap();
    assert!(!applied);

    // a named request against an unknown model is an error
    let err = manager
        .apply("missing::Task", &mut task, &names(&["fast"]), false)
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownModel(_)));
}
