//! Descriptor rejection happens before any store interaction

use super::test_utils::*;
use recmap::{descriptor, DescriptorBuilder, Entity, Error, FieldRole, Key};

#[derive(Debug, Default)]
struct TwoKeys {
    a: String,
    b: String,
}

impl Entity for TwoKeys {
    fn describe(b: &mut DescriptorBuilder<Self>) {
        b.set_name("twokeys");
        b.field("a", |t| &t.a, |t| &mut t.a).key();
        b.field("b", |t| &t.b, |t| &mut t.b).key();
        b.default_constructor();
    }
}

#[derive(Debug, Default)]
struct ShortExpiration {
    id: i64,
    expires_at: i32,
}

impl Entity for ShortExpiration {
    fn describe(b: &mut DescriptorBuilder<Self>) {
        b.set_name("shortexp");
        b.field("id", |t| &t.id, |t| &mut t.id).key();
        b.field("expires_at", |t| &t.expires_at, |t| &mut t.expires_at)
            .expiration();
        b.default_constructor();
    }
}

#[derive(Debug, Default)]
struct NarrowGeneration {
    id: i64,
    generation: u16,
}

impl Entity for NarrowGeneration {
    fn describe(b: &mut DescriptorBuilder<Self>) {
        b.set_name("narrowgen");
        b.field("id", |t| &t.id, |t| &mut t.id).key();
        b.field("generation", |t| &t.generation, |t| &mut t.generation)
            .generation();
        b.default_constructor();
    }
}

#[derive(Debug, Default)]
struct SignedGeneration {
    id: String,
    generation: i32,
}

impl Entity for SignedGeneration {
    fn describe(b: &mut DescriptorBuilder<Self>) {
        b.set_name("signedgen");
        b.field("id", |t| &t.id, |t| &mut t.id).key();
        b.field("generation", |t| &t.generation, |t| &mut t.generation)
            .generation();
        b.default_constructor();
    }
}

#[derive(Debug, Default)]
struct FloatKey {
    id: f64,
}

impl Entity for FloatKey {
    fn describe(b: &mut DescriptorBuilder<Self>) {
        b.set_name("floatkey");
        b.field("id", |t| &t.id, |t| &mut t.id).key();
        b.default_constructor();
    }
}

#[derive(Debug, Default)]
struct SharedBin {
    first: String,
    second: String,
}

impl Entity for SharedBin {
    fn describe(b: &mut DescriptorBuilder<Self>) {
        b.set_name("sharedbin");
        b.field("first", |t| &t.first, |t| &mut t.first).bin("same");
        b.field("second", |t| &t.second, |t| &mut t.second).bin("same");
        b.default_constructor();
    }
}

#[derive(Debug)]
struct NoConstructor {
    id: String,
}

impl Entity for NoConstructor {
    fn describe(b: &mut DescriptorBuilder<Self>) {
        b.set_name("noctor");
        b.field("id", |t| &t.id, |t| &mut t.id).key();
    }
}

#[test]
fn test_two_key_fields_rejected_before_store() {
    let f = Fixture::new(0);

    let err = descriptor::<TwoKeys>().unwrap_err();
    assert!(err.is_mapping());
    assert!(err.to_string().contains("both claim the key role"), "{}", err);

    let mut obj = TwoKeys {
        a: "x".into(),
        b: "y".into(),
    };
    assert!(f.session.insert(&mut obj).unwrap_err().is_mapping());
    assert!(f
        .session
        .load::<TwoKeys>(&Key::new("test", "twokeys", "x"))
        .unwrap_err()
        .is_mapping());
    assert!(f
        .session
        .transact(5, |ctx| ctx.put(&mut TwoKeys::default()))
        .unwrap_err()
        .is_mapping());
    assert!(f.store.is_empty());
}

#[test]
fn test_rejection_is_repeated_on_every_use() {
    assert!(descriptor::<TwoKeys>().is_err());
    assert!(descriptor::<TwoKeys>().is_err());
    assert!(!recmap_mapper::registry::is_registered::<TwoKeys>());
}

#[test]
fn test_expiration_field_must_be_64_bit() {
    let err = descriptor::<ShortExpiration>().unwrap_err();
    assert!(matches!(err, Error::Mapping { .. }));
    assert!(err.to_string().contains("expires_at"), "{}", err);
}

#[test]
fn test_generation_field_must_hold_u32() {
    let err = descriptor::<NarrowGeneration>().unwrap_err();
    assert!(err.is_mapping());
    assert!(err.to_string().contains("generation"), "{}", err);

    // i32 would overflow once the store passes generation i32::MAX
    let err = descriptor::<SignedGeneration>().unwrap_err();
    assert!(err.to_string().contains("expected u32 or i64"), "{}", err);
}

#[test]
fn test_narrow_generation_never_reaches_store() {
    let f = Fixture::new(0);
    let mut obj = SignedGeneration {
        id: unique_id("gen"),
        generation: 0,
    };
    assert!(f.session.insert(&mut obj).unwrap_err().is_mapping());
    assert!(f.store.is_empty());
}

#[test]
fn test_key_field_must_be_key_compatible() {
    assert!(descriptor::<FloatKey>().unwrap_err().is_mapping());
}

#[test]
fn test_bin_names_must_be_unique() {
    let err = descriptor::<SharedBin>().unwrap_err();
    assert!(err.to_string().contains("same"), "{}", err);
}

#[test]
fn test_missing_constructor_rejected() {
    let err = descriptor::<NoConstructor>().unwrap_err();
    assert!(err.is_mapping());
}

#[test]
fn test_valid_descriptor_is_cached_and_ordered() {
    let first = descriptor::<Profile>().unwrap();
    let second = descriptor::<Profile>().unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    assert_eq!(first.set_name(), "profiles");
    assert_eq!(first.key_field().map(|f| f.name()), Some("id"));
    assert_eq!(first.expiration_field().map(|f| f.role()), Some(FieldRole::Expiration));
    assert!(first.has_generation());
    assert_eq!(first.field("nickname").map(|f| f.bin()), Some("nick"));

    let names: Vec<_> = first.data_fields().map(|f| f.name()).collect();
    assert_eq!(names.first(), Some(&"name"));
    assert_eq!(names.last(), Some(&"ranks"));
}
