//! Shared entities and fixtures

use recmap::limits::STORE_EPOCH_SECS;
use recmap::{
    Clock, DescriptorBuilder, Entity, ManualClock, MemoryStore, NamespaceConfig, Session,
    Timestamp,
};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Start of every test clock: mid-2022, on a whole second
pub const START_SECS: i64 = STORE_EPOCH_SECS + 400_000_000;

pub const SECOND_MS: i64 = 1_000;
pub const DAY_MS: i64 = 86_400 * SECOND_MS;
pub const YEAR_MS: i64 = 365 * DAY_MS;

/// Random user key
pub fn unique_id(prefix: &str) -> String {
    let n: u64 = rand::thread_rng().gen();
    format!("{}_{:016x}", prefix, n)
}

/// Session over a fresh store whose "test" namespace has `default_ttl_secs`
pub struct Fixture {
    pub session: Session,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new(default_ttl_secs: u32) -> Self {
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(START_SECS)));
        let store = Arc::new(
            MemoryStore::builder()
                .namespace("test", NamespaceConfig::with_default_ttl(default_ttl_secs))
                .clock(clock.clone())
                .build(),
        );
        let session = Session::builder(store.clone())
            .clock(clock.clone())
            .build()
            .unwrap();
        Self {
            session,
            store,
            clock,
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now().as_millis()
    }
}

// ============================================================================
// Entities
// ============================================================================

/// One field of every supported shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub score: i64,
    pub rank: i32,
    pub level: i16,
    pub tiny: i8,
    pub shade: u8,
    pub port: u16,
    pub visits: u32,
    pub ratio: f64,
    pub weight: f32,
    pub active: bool,
    pub tags: Vec<String>,
    pub avatar: Vec<u8>,
    pub nickname: Option<String>,
    pub attrs: HashMap<String, i64>,
    pub ranks: BTreeMap<String, f64>,
    pub expires_at: i64,
    pub generation: u32,
}

impl Entity for Profile {
    fn describe(b: &mut DescriptorBuilder<Self>) {
        b.set_name("profiles");
        b.field("id", |p| &p.id, |p| &mut p.id).key();
        b.field("name", |p| &p.name, |p| &mut p.name);
        b.field("score", |p| &p.score, |p| &mut p.score);
        b.field("rank", |p| &p.rank, |p| &mut p.rank);
        b.field("level", |p| &p.level, |p| &mut p.level);
        b.field("tiny", |p| &p.tiny, |p| &mut p.tiny);
        b.field("shade", |p| &p.shade, |p| &mut p.shade);
        b.field("port", |p| &p.port, |p| &mut p.port);
        b.field("visits", |p| &p.visits, |p| &mut p.visits);
        b.field("ratio", |p| &p.ratio, |p| &mut p.ratio);
        b.field("weight", |p| &p.weight, |p| &mut p.weight);
        b.field("active", |p| &p.active, |p| &mut p.active);
        b.field("tags", |p| &p.tags, |p| &mut p.tags);
        b.field("avatar", |p| &p.avatar, |p| &mut p.avatar);
        b.field("nickname", |p| &p.nickname, |p| &mut p.nickname)
            .bin("nick");
        b.field("attrs", |p| &p.attrs, |p| &mut p.attrs);
        b.field("ranks", |p| &p.ranks, |p| &mut p.ranks);
        b.field("expires_at", |p| &p.expires_at, |p| &mut p.expires_at)
            .expiration();
        b.field("generation", |p| &p.generation, |p| &mut p.generation)
            .generation();
        b.default_constructor();
    }
}

impl Profile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: "Grace".to_string(),
            expires_at: -1,
            ..Self::default()
        }
    }

    /// Data fields only; key, expiration and generation are compared apart
    pub fn same_data(&self, other: &Profile) -> bool {
        Profile {
            expires_at: 0,
            generation: 0,
            ..self.clone()
        } == Profile {
            expires_at: 0,
            generation: 0,
            ..other.clone()
        }
    }
}

/// Integer-keyed counter used by the transaction tests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Counter {
    pub id: i64,
    pub hits: i64,
    pub generation: i64,
}

impl Entity for Counter {
    fn describe(b: &mut DescriptorBuilder<Self>) {
        b.set_name("counters");
        b.field("id", |c| &c.id, |c| &mut c.id).key();
        b.field("hits", |c| &c.hits, |c| &mut c.hits);
        b.field("generation", |c| &c.generation, |c| &mut c.generation)
            .generation();
        b.default_constructor();
    }
}

/// Entity with no expiration field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Note {
    pub id: String,
    pub body: String,
}

impl Entity for Note {
    fn describe(b: &mut DescriptorBuilder<Self>) {
        b.set_name("notes");
        b.field("id", |n| &n.id, |n| &mut n.id).key();
        b.field("body", |n| &n.body, |n| &mut n.body);
        b.default_constructor();
    }
}
