use plugboard::error::ResolutionError;
use plugboard::models::Memento;
use plugboard::source::{MementoBackend, MementoSource, MemoryBackend};
use serde_json::json;
use speculate2::speculate;

/// Backend whose retrievals always fail with a generic error.
struct BrokenBackend;

impl MementoBackend for BrokenBackend {
    fn description(&self) -> String {
        "broken backend".to_string()
    }

    fn contains_key(&self, _instance_key: &str) -> bool {
        true
    }

    fn retrieve(&self, instance_key: &str) -> anyhow::Result<Memento> {
        anyhow::bail!("storage failure while reading \"{instance_key}\"")
    }

    fn fetch_internal(&self) -> anyhow::Result<Vec<Memento>> {
        anyhow::bail!("storage failure during enumeration")
    }
}

/// Backend whose retrievals raise a domain error directly.
struct DomainErrorBackend;

impl MementoBackend for DomainErrorBackend {
    fn description(&self) -> String {
        "domain-error backend".to_string()
    }

    fn contains_key(&self, _instance_key: &str) -> bool {
        true
    }

    fn retrieve(&self, _instance_key: &str) -> anyhow::Result<Memento> {
        Err(ResolutionError::MissingReference {
            key: "inner".to_string(),
            plugin_type: "inner.Type".to_string(),
        }
        .into())
    }

    fn fetch_internal(&self) -> anyhow::Result<Vec<Memento>> {
        Ok(Vec::new())
    }
}

fn seeded_source() -> MementoSource {
    let backend = MemoryBackend::new()
        .with(Memento::concrete("internal").with_property("from", "backend"))
        .with(Memento::concrete("shared").with_property("from", "backend"));
    MementoSource::new(Box::new(backend))
}

speculate! {
    describe "get_memento" {
        it "returns None for an unregistered key" {
            let source = seeded_source();
            let found = source.get_memento("missing").expect("lookup failed");
            assert!(found.is_none());
        }

        it "returns the backend plan by key" {
            let source = seeded_source();
            let found = source.get_memento("internal").expect("lookup failed");
            assert_eq!(found.expect("plan missing").instance_key(), Some("internal"));
        }

        it "prefers an external plan over a backend plan with the same key" {
            let mut source = seeded_source();
            source.add_external_memento(
                Memento::concrete("shared").with_property("from", "external"),
            );

            let found = source
                .get_memento("shared")
                .expect("lookup failed")
                .expect("plan missing");
            assert_eq!(found.property("from"), Some(&json!("external")));
        }

        it "wraps a generic backend failure with the offending key" {
            let broken = MementoSource::new(Box::new(BrokenBackend));
            let err = broken.get_memento("bad").expect_err("lookup should fail");

            assert_eq!(err.code(), 203);
            match err {
                ResolutionError::Retrieval { key, .. } => assert_eq!(key, "bad"),
                other => panic!("unexpected error: {other}"),
            }
        }

        it "passes a domain error from the backend through unwrapped" {
            let source = MementoSource::new(Box::new(DomainErrorBackend));
            let err = source.get_memento("any").expect_err("lookup should fail");

            match err {
                ResolutionError::MissingReference { key, .. } => assert_eq!(key, "inner"),
                other => panic!("error was re-wrapped: {other}"),
            }
        }
    }

    describe "add_external_memento" {
        it "takes effect for subsequent lookups" {
            let mut source = seeded_source();
            assert!(source.get_memento("late").expect("lookup failed").is_none());

            source.add_external_memento(Memento::concrete("late"));
            assert!(source.get_memento("late").expect("lookup failed").is_some());
        }

        it "ignores anonymous plans" {
            let mut source = seeded_source();
            source.add_external_memento(Memento::anonymous());
            assert_eq!(source.get_all_mementos().expect("enumeration failed").len(), 2);
        }
    }

    describe "set_default" {
        it "stores the plan resolved from the key" {
            let mut source = seeded_source();
            source.set_default("internal").expect("set_default failed");
            assert!(source.default_memento().is_some());
        }

        it "stores nothing when the key does not resolve" {
            let mut source = seeded_source();
            source.set_default("missing").expect("set_default failed");
            assert!(source.default_memento().is_none());
        }

        it "surfaces the unresolved key only at first use of the default" {
            let mut source = seeded_source();
            source.set_default("missing").expect("set_default failed");

            let err = source
                .resolve_memento(&Memento::default_instance())
                .expect_err("resolve should fail");
            assert_eq!(err.code(), 202);
        }
    }

    describe "resolve_memento" {
        it "returns a concrete plan unchanged" {
            let source = seeded_source();
            let concrete = Memento::concrete("anything").with_property("n", 7);

            let resolved = source.resolve_memento(&concrete).expect("resolve failed");
            assert_eq!(resolved, concrete);
        }

        it "resolves a default plan to the stored default" {
            let mut source = seeded_source();
            source.set_default("internal").expect("set_default failed");

            let resolved = source
                .resolve_memento(&Memento::default_instance())
                .expect("resolve failed");
            assert_eq!(resolved.instance_key(), Some("internal"));
        }

        it "fails with the family type name when no default is set" {
            let source = seeded_source();
            let err = source
                .resolve_memento(&Memento::default_instance())
                .expect_err("resolve should fail");

            assert_eq!(err.code(), 202);
            match err {
                ResolutionError::MissingDefault { plugin_type } => {
                    assert_eq!(plugin_type, "UNKNOWN");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        it "resolves a reference plan through the layered lookup" {
            let mut source = seeded_source();
            source.add_external_memento(Memento::concrete("x").with_property("value", 42));

            let resolved = source
                .resolve_memento(&Memento::reference("x"))
                .expect("resolve failed");
            assert_eq!(resolved.property("value"), Some(&json!(42)));
        }

        it "fails with the missing key when a reference does not resolve" {
            let source = seeded_source();
            let err = source
                .resolve_memento(&Memento::reference("nowhere"))
                .expect_err("resolve should fail");

            assert_eq!(err.code(), 200);
            match err {
                ResolutionError::MissingReference { key, .. } => assert_eq!(key, "nowhere"),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    describe "get_all_mementos" {
        it "returns the union of backend and external plans" {
            let mut source = seeded_source();
            source.add_external_memento(Memento::concrete("extra"));

            let all = source.get_all_mementos().expect("enumeration failed");
            assert_eq!(all.len(), 3);
        }

        it "does not duplicate a key present in both layers, external wins" {
            let mut source = seeded_source();
            source.add_external_memento(
                Memento::concrete("shared").with_property("from", "external"),
            );

            let all = source.get_all_mementos().expect("enumeration failed");
            assert_eq!(all.len(), 2);

            let shared = all
                .iter()
                .find(|memento| memento.instance_key() == Some("shared"))
                .expect("shared plan missing");
            assert_eq!(shared.property("from"), Some(&json!("external")));
        }

        it "reports the source description when enumeration fails" {
            let broken = MementoSource::new(Box::new(BrokenBackend));
            let err = broken.get_all_mementos().expect_err("enumeration should fail");

            assert_eq!(err.code(), 203);
            match err {
                ResolutionError::Enumeration { description, .. } => {
                    assert_eq!(description, "broken backend");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }
}
