//! Whole-object session operations and configuration

use super::test_utils::*;
use recmap::{
    DescriptorBuilder, Entity, Error, MemoryStore, NamespaceConfig, Session, SessionConfig,
    CONFIG_FILE_NAME,
};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug, Default, Clone, PartialEq)]
struct Ticket {
    id: Option<i32>,
    title: String,
}

impl Entity for Ticket {
    fn describe(b: &mut DescriptorBuilder<Self>) {
        b.set_name("tickets");
        b.field("id", |t| &t.id, |t| &mut t.id).key();
        b.field("title", |t| &t.title, |t| &mut t.title);
        b.default_constructor();
    }
}

// ============================================================================
// Insert / update / delete
// ============================================================================

mod writes {
    use super::*;

    #[test]
    fn test_insert_is_create_only() {
        let f = Fixture::new(0);
        let mut p = Profile::new("once");
        f.session.insert(&mut p).unwrap();
        assert_eq!(p.generation, 1);

        let err = f.session.insert(&mut Profile::new("once")).unwrap_err();
        assert!(matches!(err, Error::RecordExists { .. }));
    }

    #[test]
    fn test_stale_update_conflicts_and_leaves_record() {
        let f = Fixture::new(0);
        let mut p = Profile::new("shared");
        f.session.insert(&mut p).unwrap();

        let mut a = p.clone();
        let mut b = p.clone();
        a.score = 1;
        f.session.update(&mut a).unwrap();
        assert_eq!(a.generation, 2);

        b.score = 2;
        let err = f.session.update(&mut b).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(b.generation, 1, "failed write leaves the object untouched");

        let stored: Profile = f.session.load_by("shared").unwrap().unwrap();
        assert_eq!(stored.score, 1);
    }

    #[test]
    fn test_generated_key_written_back() {
        let f = Fixture::new(0);
        let mut t = Ticket {
            id: None,
            title: "printer on fire".into(),
        };
        let key = f.session.insert(&mut t).unwrap();

        let id = t.id.expect("key generated");
        assert!(id > 0);
        assert_eq!(key.user_key, recmap::UserKey::Int(i64::from(id)));
        let loaded: Ticket = f.session.load(&key).unwrap().unwrap();
        assert_eq!(loaded, t);
    }

    #[test]
    fn test_delete_honours_generation() {
        let f = Fixture::new(0);
        let mut p = Profile::new(unique_id("del"));
        f.session.insert(&mut p).unwrap();

        let stale = p.clone();
        p.score = 10;
        f.session.update(&mut p).unwrap();

        assert!(f.session.delete(&stale).unwrap_err().is_conflict());
        assert!(f.session.delete(&p).unwrap());
        assert!(f.session.load_by::<Profile>(p.id.as_str()).unwrap().is_none());
    }

    #[test]
    fn test_delete_key_is_unconditional() {
        let f = Fixture::new(0);
        let key = f.session.insert(&mut Profile::new("gone")).unwrap();
        assert!(f.session.delete_key(&key).unwrap());
        assert!(!f.session.delete_key(&key).unwrap());
    }

    #[test]
    fn test_unknown_namespace_is_store_failure() {
        let store = Arc::new(
            MemoryStore::builder()
                .namespace("cache", NamespaceConfig::default())
                .build(),
        );
        let session = Session::builder(store).build().unwrap();
        let err = session.insert(&mut Profile::new("nowhere")).unwrap_err();
        assert!(err.is_store_failure());
        assert!(!err.is_mapping());
    }
}

// ============================================================================
// Configuration
// ============================================================================

mod config {
    use super::*;

    #[test]
    fn test_session_from_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "default_namespace = \"cache\"\nmax_retries = 1\nretry_base_delay_ms = 0\nretry_max_delay_ms = 0\n",
        )
        .unwrap();

        let store = Arc::new(
            MemoryStore::builder()
                .namespace("cache", NamespaceConfig::with_default_ttl(120))
                .build(),
        );
        let session = Session::builder(store)
            .config_file(&path)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(session.default_namespace(), "cache");
        assert_eq!(session.config().max_retries, 1);
        let key = session.insert(&mut Profile::new("cfg")).unwrap();
        assert_eq!(key.namespace, "cache");
        assert_eq!(session.namespace_default_ttl("cache").unwrap(), 120);
    }

    #[test]
    fn test_default_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        SessionConfig::write_default_if_missing(&path).unwrap();

        let config = SessionConfig::from_file(&path).unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "max_retries = \"many\"").unwrap();

        let store: Arc<dyn recmap::StoreClient> = Arc::new(MemoryStore::new());
        let err = Session::builder(store).config_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
