//! Round-trip: every data field survives serialize → store → materialize

use super::test_utils::*;
use proptest::collection::{btree_map, hash_map, vec};
use proptest::prelude::*;
use recmap::{Key, StoreClient, Value};

fn arb_profile() -> impl Strategy<Value = Profile> {
    (
        (
            "[a-z0-9]{1,16}",
            "\\PC{0,24}",
            any::<i64>(),
            any::<i32>(),
            any::<i16>(),
            any::<i8>(),
            any::<u8>(),
            any::<u16>(),
            any::<u32>(),
        ),
        (
            -1.0e12f64..1.0e12,
            -1.0e6f32..1.0e6,
            any::<bool>(),
            vec("[a-z]{0,8}", 0..5),
            vec(any::<u8>(), 0..32),
            proptest::option::of("[A-Za-z]{1,12}"),
            hash_map("[a-z]{1,6}", any::<i64>(), 0..4),
            btree_map("[a-z]{1,6}", -1.0e9f64..1.0e9, 0..4),
        ),
    )
        .prop_map(
            |(
                (id, name, score, rank, level, tiny, shade, port, visits),
                (ratio, weight, active, tags, avatar, nickname, attrs, ranks),
            )| Profile {
                id,
                name,
                score,
                rank,
                level,
                tiny,
                shade,
                port,
                visits,
                ratio,
                weight,
                active,
                tags,
                avatar,
                nickname,
                attrs,
                ranks,
                expires_at: -1,
                generation: 0,
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn round_trip_preserves_every_data_field(original in arb_profile()) {
        let f = Fixture::new(0);
        let mut written = original.clone();
        let key = f.session.update(&mut written).unwrap();

        let loaded: Profile = f.session.load(&key).unwrap().unwrap();
        prop_assert!(loaded.same_data(&original), "{:?} != {:?}", loaded, original);
        prop_assert_eq!(loaded.id, original.id);
        prop_assert_eq!(loaded.generation, 1);
        prop_assert_eq!(loaded.expires_at, -1);
    }
}

#[test]
fn test_byte_vectors_are_stored_as_bytes() {
    let f = Fixture::new(0);
    let mut p = Profile::new("bytes");
    p.avatar = vec![0, 1, 254, 255];
    p.tags = vec!["a".into(), "b".into()];
    let key = f.session.insert(&mut p).unwrap();

    let record = f.store.get(&key).unwrap().unwrap();
    assert_eq!(record.bin("avatar"), Some(&Value::Bytes(vec![0, 1, 254, 255])));
    assert_eq!(
        record.bin("tags"),
        Some(&Value::List(vec![
            Value::String("a".into()),
            Value::String("b".into())
        ]))
    );
}

#[test]
fn test_role_fields_are_not_bins() {
    let f = Fixture::new(0);
    let key = f.session.insert(&mut Profile::new("roles")).unwrap();

    let record = f.store.get(&key).unwrap().unwrap();
    assert!(record.bin("id").is_none());
    assert!(record.bin("expires_at").is_none());
    assert!(record.bin("generation").is_none());
    assert!(record.bin("nick").is_none(), "null option is not written");
    assert!(record.bin("nickname").is_none());
}

#[test]
fn test_renamed_bin_round_trips() {
    let f = Fixture::new(0);
    let mut p = Profile::new("nick");
    p.nickname = Some("Amazing".into());
    let key = f.session.insert(&mut p).unwrap();

    let record = f.store.get(&key).unwrap().unwrap();
    assert_eq!(record.bin("nick"), Some(&Value::String("Amazing".into())));
    let loaded: Profile = f.session.load(&key).unwrap().unwrap();
    assert_eq!(loaded.nickname.as_deref(), Some("Amazing"));
}

#[test]
fn test_missing_bins_keep_constructor_defaults() {
    let f = Fixture::new(0);
    let key = Key::new("test", "profiles", "sparse");
    f.store
        .put(
            &key,
            &[recmap::Bin::new("name", "Sparse")],
            &recmap::WritePolicy::default(),
        )
        .unwrap();

    let loaded: Profile = f.session.load(&key).unwrap().unwrap();
    assert_eq!(loaded.name, "Sparse");
    assert_eq!(loaded.id, "sparse");
    assert_eq!(loaded.score, 0);
    assert!(loaded.tags.is_empty());
    assert_eq!(loaded.generation, 1);
}

#[test]
fn test_out_of_range_bin_is_mapping_error() {
    let f = Fixture::new(0);
    let key = Key::new("test", "profiles", "wide");
    f.store
        .put(
            &key,
            &[recmap::Bin::new("shade", Value::Int(300))],
            &recmap::WritePolicy::default(),
        )
        .unwrap();

    let err = f.session.load::<Profile>(&key).unwrap_err();
    assert!(err.is_mapping(), "{}", err);
    assert!(err.to_string().contains("shade"));
}

#[test]
fn test_integer_key_round_trips() {
    let f = Fixture::new(0);
    let mut c = Counter {
        id: 42,
        hits: 7,
        generation: 0,
    };
    let key = f.session.insert(&mut c).unwrap();
    assert_eq!(key, Key::new("test", "counters", 42i64));

    let loaded: Counter = f.session.load_by(42i64).unwrap().unwrap();
    assert_eq!(loaded, c);
}
