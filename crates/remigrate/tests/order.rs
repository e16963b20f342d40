//! Declared table order changes the output order, never the outcome.

use proptest::prelude::*;
use remigrate::{DesiredState, MemoryBackend, Reconciler, Reconciliation, TableSpec};

fn tables() -> Vec<TableSpec> {
    vec![
        TableSpec::new("robots")
            .primary_key("serial_num")
            .index("version")
            .index("model"),
        TableSpec::new("parts").index("supplier"),
        TableSpec::new("owners").primary_key("email"),
        TableSpec::new("sites").index("region").index("zone"),
    ]
}

/// Seed a backend where the tables flagged in `existing` are already there,
/// each with its first declared index.
fn seeded(existing: &[bool]) -> MemoryBackend {
    let mut backend = MemoryBackend::new().with_database("machines");
    for (table, exists) in tables().iter().zip(existing) {
        if *exists {
            backend = backend.with_table("machines", &table.name, table.declared_primary_key());
            if let Some(index) = table.secondary_indexes.first() {
                backend = backend.with_index("machines", &table.name, index);
            }
        }
    }
    backend
}

fn reconcile(backend: &mut MemoryBackend, desired: &DesiredState) -> Reconciliation {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(Reconciler::new(backend).run(desired))
        .unwrap()
}

fn sorted_lines(outcome: &Reconciliation) -> Vec<String> {
    let mut lines: Vec<String> = outcome.lines.iter().map(ToString::to_string).collect();
    lines.sort();
    lines
}

proptest! {
    #[test]
    fn test_permuted_tables_reach_the_same_state(
        shuffled in Just(tables()).prop_shuffle(),
        existing in proptest::collection::vec(any::<bool>(), 4),
    ) {
        let declared = DesiredState { database: "machines".into(), tables: tables() };
        let permuted = DesiredState { database: "machines".into(), tables: shuffled };

        let mut a = seeded(&existing);
        let mut b = seeded(&existing);
        let outcome_a = reconcile(&mut a, &declared);
        let outcome_b = reconcile(&mut b, &permuted);

        prop_assert_eq!(a.state(), b.state());
        prop_assert_eq!(outcome_a.counters, outcome_b.counters);
        prop_assert_eq!(sorted_lines(&outcome_a), sorted_lines(&outcome_b));

        // the database line always comes first
        prop_assert_eq!(&outcome_a.lines[0], &outcome_b.lines[0]);
    }

    #[test]
    fn test_second_run_is_always_a_no_op(existing in proptest::collection::vec(any::<bool>(), 4)) {
        let declared = DesiredState { database: "machines".into(), tables: tables() };
        let mut backend = seeded(&existing);

        reconcile(&mut backend, &declared);
        let after_first = backend.state().clone();
        let second = reconcile(&mut backend, &declared);

        prop_assert!(second.counters.is_zero());
        prop_assert_eq!(second.created().count(), 0);
        prop_assert_eq!(backend.state(), &after_first);
    }
}
