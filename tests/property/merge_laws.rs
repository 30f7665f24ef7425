//! Property-based tests for the merge laws

use proptest::prelude::*;
use proptest::test_runner::TestRunner;
use taskconf::merge::{merge_conf, merge_sequence};
use taskconf::value::{ConfMapping, ConfValue, Scalar};

/// Arbitrary canonical values: scalars, mappings and sequences with holes.
///
/// Floats are generated from integers so structural equality stays exact
/// under cloning and re-merging.
fn conf_value_strategy() -> impl Strategy<Value = ConfValue> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(|v| ConfValue::Leaf(Scalar::Bool(v))),
        any::<i64>().prop_map(|v| ConfValue::Leaf(Scalar::Int(v))),
        any::<i32>().prop_map(|v| ConfValue::Leaf(Scalar::Float(v as f64))),
        "[a-z]{0,6}".prop_map(|v| ConfValue::Leaf(Scalar::Text(v))),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::btree_map("[a-z]{1,3}", inner.clone(), 0..4)
                .prop_map(ConfValue::Mapping),
            prop::collection::vec(prop::option::of(inner), 0..4).prop_map(ConfValue::Sequence),
        ]
    })
}

fn conf_mapping_strategy() -> impl Strategy<Value = ConfMapping> {
    prop::collection::btree_map("[a-z]{1,3}", conf_value_strategy(), 0..4)
}

/// Merging a section with itself changes nothing, under either discipline.
#[test]
fn test_merge_is_idempotent() {
    let mut runner = TestRunner::default();

    runner
        .run(&conf_mapping_strategy(), |conf| {
            let strict = merge_conf(&conf, &conf, false).unwrap();
            prop_assert_eq!(&strict, &conf);
            let permissive = merge_conf(&conf, &conf, true).unwrap();
            prop_assert_eq!(&permissive, &conf);
            Ok(())
        })
        .unwrap();
}

/// Strict merge is symmetric: both orders succeed with the same result, or
/// both orders conflict.
#[test]
fn test_strict_merge_is_commutative() {
    let mut runner = TestRunner::default();

    runner
        .run(
            &(conf_mapping_strategy(), conf_mapping_strategy()),
            |(a, b)| {
                match (merge_conf(&a, &b, false), merge_conf(&b, &a, false)) {
                    (Ok(left), Ok(right)) => prop_assert_eq!(left, right),
                    (Err(_), Err(_)) => {}
                    (left, right) => prop_assert!(
                        false,
                        "asymmetric outcome: {:?} vs {:?}",
                        left,
                        right
                    ),
                }
                Ok(())
            },
        )
        .unwrap();
}

/// Override merge never fails, and re-applying the right-hand side onto the
/// result is a no-op.
#[test]
fn test_override_merge_absorbs_reapplication() {
    let mut runner = TestRunner::default();

    runner
        .run(
            &(conf_mapping_strategy(), conf_mapping_strategy()),
            |(a, b)| {
                let merged = merge_conf(&a, &b, true).unwrap();
                let again = merge_conf(&merged, &b, true).unwrap();
                prop_assert_eq!(merged, again);
                Ok(())
            },
        )
        .unwrap();
}

/// An all-hole sequence is the identity of sequence merge, on either side.
#[test]
fn test_holes_are_merge_identity() {
    let mut runner = TestRunner::default();

    runner
        .run(
            &prop::collection::vec(prop::option::of(conf_value_strategy()), 0..6),
            |elements| {
                let holes = vec![None; elements.len()];
                let merged = merge_sequence(&holes, &elements, false).unwrap();
                prop_assert_eq!(&merged, &elements);
                let merged = merge_sequence(&elements, &holes, false).unwrap();
                prop_assert_eq!(&merged, &elements);
                Ok(())
            },
        )
        .unwrap();
}

/// Keys present on only one side always survive the merge untouched.
#[test]
fn test_disjoint_keys_pass_through() {
    let mut runner = TestRunner::default();

    runner
        .run(
            &(conf_mapping_strategy(), conf_mapping_strategy()),
            |(a, b)| {
                prop_assume!(a.keys().all(|k| !b.contains_key(k)));
                let merged = merge_conf(&a, &b, false).unwrap();
                prop_assert_eq!(merged.len(), a.len() + b.len());
                for (key, value) in a.iter().chain(b.iter()) {
                    prop_assert_eq!(merged.get(key), Some(value));
                }
                Ok(())
            },
        )
        .unwrap();
}
