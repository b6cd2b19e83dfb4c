//! Cache subsystem tests

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::error::CorpusError;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Record {
        id: i64,
        title: String,
    }

    fn record(id: i64, title: &str) -> Record {
        Record {
            id,
            title: title.to_string(),
        }
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();

        store.set("document:1", json!({"id": 1})).unwrap();
        assert!(store.has("document:1"));
        assert_eq!(store.get("document:1").unwrap(), Some(json!({"id": 1})));

        // unknown keys are absent, not errors
        assert_eq!(store.get("document:2").unwrap(), None);
        assert!(!store.has("document:2"));

        store.delete("document:1").unwrap();
        assert_eq!(store.get("document:1").unwrap(), None);

        // delete is a no-op when absent
        store.delete("document:1").unwrap();
    }

    #[test]
    fn memory_store_last_write_wins() {
        let store = MemoryStore::new();
        store.set("k", json!(1)).unwrap();
        store.set("k", json!({"shape": "changed"})).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(json!({"shape": "changed"})));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_store_clear_and_values() {
        let store = MemoryStore::new();
        store.set("a", json!(1)).unwrap();
        store.set("b", json!(2)).unwrap();

        let values: Vec<_> = store.values().collect::<Result<_, _>>().unwrap();
        assert_eq!(values, vec![json!(1), json!(2)]);

        store.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.values().count(), 0);
    }

    #[test]
    fn domain_views_do_not_collide() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let projects: DomainView<Record> = DomainView::new(Arc::clone(&store), Domain::Project);
        let documents: DomainView<Record> = DomainView::new(Arc::clone(&store), Domain::Document);

        projects.set("7", &record(7, "alpha")).unwrap();

        assert!(!documents.has("7").unwrap());
        assert_eq!(documents.get("7").unwrap(), None);
        assert_eq!(projects.get("7").unwrap(), Some(record(7, "alpha")));
    }

    #[test]
    fn domain_view_round_trip() {
        let view: DomainView<Record> =
            DomainView::new(Arc::new(MemoryStore::new()), Domain::Document);
        let doc = record(42, "stale reads considered useful");

        view.set("42", &doc).unwrap();
        assert_eq!(view.get("42").unwrap(), Some(doc));

        view.delete("42").unwrap();
        assert_eq!(view.get("42").unwrap(), None);
    }

    #[test]
    fn interchangeable_views_observe_each_other() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let first: DomainView<Record> = DomainView::new(Arc::clone(&store), Domain::Chunk);
        let second: DomainView<Record> = DomainView::new(Arc::clone(&store), Domain::Chunk);

        first.set("1", &record(1, "written by first")).unwrap();
        assert_eq!(second.get("1").unwrap(), Some(record(1, "written by first")));
    }

    #[test]
    fn domain_values_use_tagged_keys_not_value_shape() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        // plain strings carry no marker field; the tagged-key index still
        // attributes them to the right domain
        let chunks: DomainView<String> = DomainView::new(Arc::clone(&store), Domain::Chunk);
        let documents: DomainView<Record> = DomainView::new(Arc::clone(&store), Domain::Document);

        chunks.set("1", &"alpha".to_string()).unwrap();
        chunks.set("2", &"beta".to_string()).unwrap();
        documents.set("1", &record(1, "doc")).unwrap();

        let mut chunk_values = chunks.values().unwrap();
        chunk_values.sort();
        assert_eq!(chunk_values, vec!["alpha".to_string(), "beta".to_string()]);

        assert_eq!(documents.values().unwrap(), vec![record(1, "doc")]);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store.set("document:1", json!({"id": 1, "title": "d1"})).unwrap();
        assert!(store.has("document:1"));
        assert_eq!(
            store.get("document:1").unwrap(),
            Some(json!({"id": 1, "title": "d1"}))
        );

        store.delete("document:1").unwrap();
        assert_eq!(store.get("document:1").unwrap(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::new(dir.path()).unwrap();
            store.set("project:9", json!({"id": 9, "name": "p9"})).unwrap();
        }

        let reopened = FileStore::new(dir.path()).unwrap();
        assert!(reopened.has("project:9"));
        assert_eq!(
            reopened.get("project:9").unwrap(),
            Some(json!({"id": 9, "name": "p9"}))
        );
        assert_eq!(reopened.keys(), vec!["project:9".to_string()]);
    }

    #[test]
    fn file_store_typed_round_trip_through_view() {
        let dir = tempfile::tempdir().unwrap();
        let store: SharedStore = Arc::new(FileStore::new(dir.path()).unwrap());
        let view: DomainView<Record> = DomainView::new(store, Domain::Document);

        let doc = record(5, "persisted");
        view.set("5", &doc).unwrap();
        assert_eq!(view.get("5").unwrap(), Some(doc));
    }

    #[test]
    fn file_store_surfaces_decode_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("p_k.json"), "not json at all").unwrap();

        let store = FileStore::with_prefix(dir.path(), "p_").unwrap();
        let err = store.get("k").unwrap_err();
        assert!(matches!(err, CorpusError::Decode { .. }), "got {err:?}");

        // the malformed file is left in place for inspection
        assert!(dir.path().join("p_k.json").exists());
    }

    #[test]
    fn file_store_missing_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_prefix(dir.path(), "p_").unwrap();
        store.set("k", json!(1)).unwrap();

        std::fs::remove_file(dir.path().join("p_k.json")).unwrap();

        assert_eq!(store.get("k").unwrap(), None);
        assert!(!store.has("k"));
    }

    #[test]
    fn file_store_clear_is_scoped_to_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "unrelated").unwrap();

        let ours = FileStore::with_prefix(dir.path(), "p_").unwrap();
        ours.set("a", json!(1)).unwrap();
        ours.set("b", json!(2)).unwrap();

        let theirs = FileStore::with_prefix(dir.path(), "q_").unwrap();
        theirs.set("a", json!(3)).unwrap();

        ours.clear().unwrap();

        let remaining: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(!remaining.iter().any(|name| name.starts_with("p_")));
        assert!(remaining.iter().any(|name| name == "notes.txt"));

        assert!(ours.keys().is_empty());
        assert_eq!(theirs.get("a").unwrap(), Some(json!(3)));
    }

    #[test]
    fn file_store_values_are_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        store.set("a", json!("one")).unwrap();
        store.set("b", json!("two")).unwrap();

        let values: Vec<_> = store.values().collect::<Result<_, _>>().unwrap();
        assert_eq!(values, vec![json!("one"), json!("two")]);

        // restartable by calling again
        assert_eq!(store.values().count(), 2);
    }

    #[tokio::test]
    async fn refresh_queue_drains_spawned_tasks() {
        let queue = RefreshQueue::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            queue.spawn(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(queue.len(), 3);

        queue.drain().await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn refresh_queue_prunes_finished_handles_on_spawn() {
        let queue = RefreshQueue::new();

        for _ in 0..100 {
            queue.spawn(async {});
            // let the just-spawned no-op task run to completion
            tokio::task::yield_now().await;
        }

        // one more spawn sweeps out everything already finished, so the
        // registry stays bounded by the number of in-flight tasks
        queue.spawn(async {});
        assert!(queue.len() <= 2, "queue held {} handles", queue.len());

        queue.drain().await;
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn refresh_queue_absorbs_panicked_tasks() {
        let queue = RefreshQueue::new();
        queue.spawn(async {
            panic!("refresh blew up");
        });
        queue.drain().await;
        assert!(queue.is_empty());
    }
}
