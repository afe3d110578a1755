mod common;

use std::collections::HashMap;

use common::{Article, article};
use herald_core::{CacheKey, CachePredicate, Entity, TypedCacheStore};

#[derive(Debug, Clone, PartialEq)]
struct Channel {
    id: String,
}

impl Entity for Channel {
    fn object_id(&self) -> &str {
        &self.id
    }
}

/// Small deterministic generator so the sequence test needs no extra crates.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

#[test]
fn test_operation_sequences_match_model() {
    let store = TypedCacheStore::new();
    let mut articles: HashMap<String, Article> = HashMap::new();
    let mut channels: HashMap<String, Channel> = HashMap::new();
    let mut rng = Lcg(7);

    for step in 0..2_000 {
        let id = format!("k{}", rng.next() % 32);
        match rng.next() % 4 {
            0 => {
                let mut item = article(&id);
                item.title = format!("v{step}");
                store.set(&CacheKey::new(id.clone()), item.clone());
                articles.insert(id.clone(), item);
            }
            1 => {
                let item = Channel { id: id.clone() };
                store.insert(item.clone());
                channels.insert(id.clone(), item);
            }
            2 => {
                let removed = store.remove(&CacheKey::<Article>::new(id.clone()));
                assert_eq!(removed, articles.remove(&id));
            }
            _ => {
                let removed = store.remove(&CacheKey::<Channel>::new(id.clone()));
                assert_eq!(removed, channels.remove(&id));
            }
        }

        let key = CacheKey::<Article>::new(id.clone());
        assert_eq!(store.get(&key).as_ref(), articles.get(&id));
        assert_eq!(store.contains(&key), articles.contains_key(&id));
        assert_eq!(
            store.contains(&CacheKey::<Channel>::new(id.clone())),
            channels.contains_key(&id)
        );
    }

    assert_eq!(store.len::<Article>(), articles.len());
    assert_eq!(store.len::<Channel>(), channels.len());
}

#[test]
fn test_predicate_read_distinguishes_absent_bucket() {
    let store = TypedCacheStore::new();
    let nothing = CachePredicate::<Channel>::new(|c| c.id == "none");

    assert!(store.find(&nothing).is_none());

    store.insert(Channel { id: "c1".into() });
    let found = store.find(&nothing);
    assert!(found.is_some_and(|items| items.is_empty()));
}

#[test]
fn test_get_many_preserves_key_order() {
    let store = TypedCacheStore::new();
    for id in ["a", "b", "c"] {
        store.insert(article(id));
    }

    let keys: Vec<CacheKey<Article>> = ["c", "x", "a"].into_iter().map(CacheKey::new).collect();
    let ids: Vec<String> = store.get_many(&keys).into_iter().map(|a| a.id).collect();

    assert_eq!(ids, vec!["c", "a"]);
}
