//! Index maintenance coverage: accumulation, resolution and the lookups.

use std::sync::Arc;

use intent_catalog::{CapabilityNode, CAPABILITY_COLLECTION};
use intent_lexicon::{WordIndexEntry, TERM_COLLECTION};
use intent_store::{DocumentStore, MemoryStore};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn associations_accumulate_into_one_record() {
    let store = MemoryStore::new();
    let lights = CapabilityNode::new("lights");
    let mut entry = WordIndexEntry::new("fox");

    entry.add_usage(&store, &lights, 10.0).await.unwrap();
    entry.add_usage(&store, &lights, 12.0).await.unwrap();
    entry.add_usage(&store, &lights, 15.0).await.unwrap();

    let document = store
        .get(TERM_COLLECTION, &entry.identity())
        .await
        .unwrap()
        .expect("term document");
    let usages = document["usages"].as_array().unwrap();
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0]["weight"].as_f64().unwrap(), 37.0);
    assert_eq!(usages[0]["node"], lights.identity().as_str());

    // The cache follows the same accumulate rule.
    assert_eq!(entry.usages()[&lights.identity()], 37.0);
}

#[tokio::test]
async fn add_usage_persists_a_transient_node() {
    let store = MemoryStore::new();
    let service = CapabilityNode::new("climate");
    let method = CapabilityNode::new("set_temperature");
    assert!(service.attach(&method));

    let mut entry = WordIndexEntry::new("warmer");
    entry.add_usage(&store, &method, 4.0).await.unwrap();

    assert!(method.is_persisted());
    assert!(service.is_persisted());
    assert_eq!(store.len(CAPABILITY_COLLECTION).await, 2);
    assert_eq!(store.len(TERM_COLLECTION).await, 1);
}

#[tokio::test]
async fn get_usages_resolves_live_nodes() {
    let store = MemoryStore::new();
    let service = CapabilityNode::new("media");
    let play = CapabilityNode::new("play");
    assert!(service.attach(&play));
    let stop = CapabilityNode::new("stop");

    let mut entry = WordIndexEntry::new("music");
    entry.add_usage(&store, &play, 6.0).await.unwrap();
    entry.add_usage(&store, &stop, 2.0).await.unwrap();

    let mut resolved = entry.get_usages(&store).await.unwrap();
    resolved.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved[0].0.name(), "play");
    assert_eq!(resolved[0].1, 6.0);
    assert_eq!(resolved[0].0.depth(), 1);
    assert_eq!(
        resolved[0].0.parent().expect("service resolves").name(),
        "media"
    );
    assert_eq!(resolved[1].0.name(), "stop");
    assert_eq!(resolved[1].0.depth(), 0);
}

#[tokio::test]
async fn get_usages_skips_dangling_references() {
    let store = MemoryStore::new();
    let kept = CapabilityNode::new("kept");
    let dropped = CapabilityNode::new("dropped");

    let mut entry = WordIndexEntry::new("toggle");
    entry.add_usage(&store, &kept, 3.0).await.unwrap();
    entry.add_usage(&store, &dropped, 5.0).await.unwrap();
    assert!(store
        .delete(CAPABILITY_COLLECTION, &dropped.identity())
        .await
        .unwrap());

    let resolved = entry.get_usages(&store).await.unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].0.name(), "kept");

    // No repair: the stored document keeps the dangling reference.
    let document = store
        .get(TERM_COLLECTION, &entry.identity())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(document["usages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn transient_entry_has_no_usages() {
    let store = MemoryStore::new();
    let mut entry = WordIndexEntry::new("nothing");
    assert!(entry.get_usages(&store).await.unwrap().is_empty());
    assert!(!entry.is_persisted());
}

#[tokio::test]
async fn find_by_name_returns_stored_or_transient() {
    let store = MemoryStore::new();
    let lights = CapabilityNode::new("lights");
    let mut entry = WordIndexEntry::new("fox");
    entry.add_usage(&store, &lights, 10.0).await.unwrap();

    let found = WordIndexEntry::find_by_name(&store, "fox").await.unwrap();
    assert!(found.is_persisted());
    assert_eq!(found.usages()[&lights.identity()], 10.0);

    let fresh = WordIndexEntry::find_by_name(&store, "quick").await.unwrap();
    assert!(!fresh.is_persisted());
    assert_eq!(fresh.name(), "quick");
    assert!(fresh.usages().is_empty());
}

#[tokio::test]
async fn find_by_identity_misses_cleanly() {
    let store = MemoryStore::new();
    assert!(WordIndexEntry::find_by_identity(&store, "nope")
        .await
        .unwrap()
        .is_none());

    let mut entry = WordIndexEntry::new("fox");
    entry.persist(&store).await.unwrap();
    let found = WordIndexEntry::find_by_identity(&store, &entry.identity())
        .await
        .unwrap()
        .expect("entry stored");
    assert_eq!(found.name(), "fox");
}

#[tokio::test]
async fn find_by_sentence_matches_fuzzily() {
    let store = MemoryStore::new();
    let lights = CapabilityNode::new("lights");
    for (term, weight) in [("fox", 10.0), ("quick", 5.0), ("zebra", 7.0)] {
        let mut entry = WordIndexEntry::new(term);
        entry.add_usage(&store, &lights, weight).await.unwrap();
    }

    let matches =
        WordIndexEntry::find_by_sentence(&store, "the quick brown fox jumps over the lazy dog")
            .await
            .unwrap();

    let mut names: Vec<&str> = matches.iter().map(|(entry, _)| entry.name()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["fox", "quick"]);
    for (entry, relevance) in &matches {
        assert_eq!(*relevance, 1.0);
        assert_eq!(entry.usages()[&lights.identity()], entry_weight(entry.name()));
    }
}

fn entry_weight(term: &str) -> f64 {
    match term {
        "fox" => 10.0,
        "quick" => 5.0,
        other => panic!("unexpected term {other}"),
    }
}

#[tokio::test]
async fn find_by_node_pairs_entries_with_weights() {
    let store = MemoryStore::new();
    let lights = CapabilityNode::new("lights");
    let heating = CapabilityNode::new("heating");

    let mut fox = WordIndexEntry::new("fox");
    fox.add_usage(&store, &lights, 10.0).await.unwrap();
    fox.add_usage(&store, &heating, 1.0).await.unwrap();
    let mut quick = WordIndexEntry::new("quick");
    quick.add_usage(&store, &lights, 5.0).await.unwrap();

    let mut matches = WordIndexEntry::find_by_node(&store, &lights).await.unwrap();
    matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].0.name(), "fox");
    assert_eq!(matches[0].1, 10.0);
    assert_eq!(matches[1].0.name(), "quick");
    assert_eq!(matches[1].1, 5.0);

    let transient = CapabilityNode::new("fans");
    assert!(WordIndexEntry::find_by_node(&store, &transient)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn persist_adopts_existing_usages() {
    let store = MemoryStore::new();
    let lights = CapabilityNode::new("lights");
    let mut original = WordIndexEntry::new("fox");
    original.add_usage(&store, &lights, 10.0).await.unwrap();

    let mut rebuilt = WordIndexEntry::new("fox");
    rebuilt.persist(&store).await.unwrap();

    assert!(rebuilt.is_persisted());
    assert_eq!(rebuilt.usages()[&lights.identity()], 10.0);
    let document = store
        .get(TERM_COLLECTION, &rebuilt.identity())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(document["usages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_associations_are_lossless() {
    let store = Arc::new(MemoryStore::new());
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            // Equal names converge on the same documents regardless of the
            // task that created them.
            let lights = CapabilityNode::new("lights");
            let mut entry = WordIndexEntry::new("fox");
            for _ in 0..4 {
                entry.add_usage(&*store, &lights, 1.0).await?;
            }
            Ok::<(), intent_lexicon::LexiconError>(())
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let identity = WordIndexEntry::new("fox").identity();
    let document = store
        .get(TERM_COLLECTION, &identity)
        .await
        .unwrap()
        .expect("term document");
    let usages = document["usages"].as_array().unwrap();
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0]["weight"].as_f64().unwrap(), 32.0);
    assert_eq!(store.len(CAPABILITY_COLLECTION).await, 1);
}

#[tokio::test]
async fn erase_removes_the_entry_only() {
    let store = MemoryStore::new();
    let lights = CapabilityNode::new("lights");
    let mut entry = WordIndexEntry::new("fox");
    entry.add_usage(&store, &lights, 10.0).await.unwrap();

    assert!(entry.erase(&store).await.unwrap());
    assert!(!entry.is_persisted());
    assert!(entry.usages().is_empty());
    assert!(store.is_empty(TERM_COLLECTION).await);
    assert_eq!(store.len(CAPABILITY_COLLECTION).await, 1);

    let mut transient = WordIndexEntry::new("quick");
    assert!(!transient.erase(&store).await.unwrap());
}
