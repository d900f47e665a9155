//! Backend storage tests: SQLite store, JSON file documents, composites.

use plugboard::models::Memento;
use plugboard::source::{
    CompositeBackend, FileBackend, MementoBackend, MemoryBackend, SqliteStore,
};
use serde_json::json;

/// Helper to create a migrated in-memory store.
fn setup_store() -> SqliteStore {
    let store = SqliteStore::open_memory().expect("Failed to create store");
    store.migrate().expect("Failed to migrate");
    store
}

mod sqlite_store {
    use super::*;

    #[test]
    fn round_trips_a_memento_through_a_family() {
        let store = setup_store();
        let memento = Memento::concrete("primary")
            .plugged("auth.SqlCredentialStore")
            .with_property("timeout", 30)
            .with_child("cache", Memento::reference("shared-cache"));

        store
            .insert_memento("auth.CredentialStore", &memento)
            .expect("insert failed");

        let found = store
            .get_memento("auth.CredentialStore", "primary")
            .expect("query failed")
            .expect("row missing");
        assert_eq!(found, memento);
    }

    #[test]
    fn returns_none_for_an_unknown_key() {
        let store = setup_store();
        let found = store
            .get_memento("auth.CredentialStore", "missing")
            .expect("query failed");
        assert!(found.is_none());
    }

    #[test]
    fn keeps_families_separate() {
        let store = setup_store();
        store
            .insert_memento("auth.CredentialStore", &Memento::concrete("shared-key"))
            .expect("insert failed");

        assert!(store
            .get_memento("cache.Cache", "shared-key")
            .expect("query failed")
            .is_none());
    }

    #[test]
    fn insert_replaces_an_existing_row() {
        let store = setup_store();
        store
            .insert_memento("cache.Cache", &Memento::concrete("a").with_property("v", 1))
            .expect("insert failed");
        store
            .insert_memento("cache.Cache", &Memento::concrete("a").with_property("v", 2))
            .expect("insert failed");

        let found = store
            .get_memento("cache.Cache", "a")
            .expect("query failed")
            .expect("row missing");
        assert_eq!(found.property("v"), Some(&json!(2)));

        let all = store.list_mementos("cache.Cache").expect("list failed");
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn rejects_anonymous_mementos() {
        let store = setup_store();
        let result = store.insert_memento("cache.Cache", &Memento::anonymous());
        assert!(result.is_err());
    }

    #[test]
    fn lists_mementos_ordered_by_key() {
        let store = setup_store();
        store
            .insert_memento("cache.Cache", &Memento::concrete("zebra"))
            .expect("insert failed");
        store
            .insert_memento("cache.Cache", &Memento::concrete("alpha"))
            .expect("insert failed");

        let all = store.list_mementos("cache.Cache").expect("list failed");
        let keys: Vec<_> = all.iter().filter_map(Memento::instance_key).collect();
        assert_eq!(keys, ["alpha", "zebra"]);
    }

    #[test]
    fn remove_reports_whether_a_row_existed() {
        let store = setup_store();
        store
            .insert_memento("cache.Cache", &Memento::concrete("a"))
            .expect("insert failed");

        assert!(store.remove_memento("cache.Cache", "a").expect("remove failed"));
        assert!(!store.remove_memento("cache.Cache", "a").expect("remove failed"));
    }

    #[test]
    fn backend_view_is_scoped_to_its_family() {
        let store = setup_store();
        store
            .insert_memento("auth.CredentialStore", &Memento::concrete("primary"))
            .expect("insert failed");

        let auth = store.backend("auth.CredentialStore");
        let cache = store.backend("cache.Cache");

        assert!(auth.contains_key("primary"));
        assert!(!cache.contains_key("primary"));
        assert_eq!(auth.fetch_internal().expect("fetch failed").len(), 1);
        assert!(cache.fetch_internal().expect("fetch failed").is_empty());

        let retrieved = auth.retrieve("primary").expect("retrieve failed");
        assert_eq!(retrieved.instance_key(), Some("primary"));
    }
}

mod file_backend {
    use super::*;
    use std::io::Write;

    const DOCUMENT: &str = r#"{
        "plugin_type": "auth.CredentialStore",
        "default_instance": "primary",
        "instances": [
            {
                "key": "primary",
                "kind": "concrete",
                "plugged_type": "auth.SqlCredentialStore",
                "properties": { "timeout": 30 }
            },
            { "key": "fallback", "kind": "reference", "reference_key": "primary" }
        ]
    }"#;

    fn write_document(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(contents.as_bytes()).expect("Failed to write");
        file
    }

    #[test]
    fn loads_instances_and_document_metadata() {
        let file = write_document(DOCUMENT);
        let backend = FileBackend::open(file.path()).expect("open failed");

        assert_eq!(
            backend.plugin_type().map(|t| t.full_name()),
            Some("auth.CredentialStore")
        );
        assert_eq!(backend.default_key(), Some("primary"));
        assert_eq!(backend.fetch_internal().expect("fetch failed").len(), 2);
    }

    #[test]
    fn retrieves_instances_by_key() {
        let file = write_document(DOCUMENT);
        let backend = FileBackend::open(file.path()).expect("open failed");

        assert!(backend.contains_key("primary"));
        assert!(!backend.contains_key("missing"));

        let primary = backend.retrieve("primary").expect("retrieve failed");
        assert_eq!(primary.property("timeout"), Some(&json!(30)));

        let fallback = backend.retrieve("fallback").expect("retrieve failed");
        assert!(fallback.is_reference());
        assert_eq!(fallback.reference_key(), Some("primary"));
    }

    #[test]
    fn rejects_a_malformed_document() {
        let file = write_document("{ not json");
        assert!(FileBackend::open(file.path()).is_err());
    }
}

mod composite_backend {
    use super::*;

    fn layered() -> CompositeBackend {
        let near = MemoryBackend::new()
            .with(Memento::concrete("shared").with_property("from", "near"))
            .with(Memento::concrete("near-only"));
        let far = MemoryBackend::new()
            .with(Memento::concrete("shared").with_property("from", "far"))
            .with(Memento::concrete("far-only"));
        CompositeBackend::new(vec![Box::new(near), Box::new(far)])
    }

    #[test]
    fn first_backend_containing_a_key_wins() {
        let composite = layered();
        let shared = composite.retrieve("shared").expect("retrieve failed");
        assert_eq!(shared.property("from"), Some(&json!("near")));
    }

    #[test]
    fn falls_through_to_later_backends() {
        let composite = layered();
        assert!(composite.contains_key("far-only"));
        assert!(composite.retrieve("far-only").is_ok());
    }

    #[test]
    fn enumeration_is_the_first_wins_union() {
        let composite = layered();
        let all = composite.fetch_internal().expect("fetch failed");
        assert_eq!(all.len(), 3);

        let shared = all
            .iter()
            .find(|memento| memento.instance_key() == Some("shared"))
            .expect("shared plan missing");
        assert_eq!(shared.property("from"), Some(&json!("near")));
    }
}
