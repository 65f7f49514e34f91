//! Edge case tests for roster-engine
//!
//! These tests cover boundary conditions and unusual inputs.

use roster_engine::{
    DuplicatePolicy, ImportError, ImportOptions, Record, RowRejection, Store, SyncEngine,
};

fn import(store: &mut Store, csv: &str, options: &ImportOptions) -> roster_engine::ImportOutcome {
    SyncEngine::new(store).import_from(csv.as_bytes(), options)
}

// ============================================================================
// String Edge Cases
// ============================================================================

#[test]
fn unicode_names_round_trip() {
    let mut store = Store::in_memory();
    let names = ["日本語テスト", "Привет мир", "مرحبا بالعالم", "🎉🚀💯", "Ωçå"];
    for (i, name) in names.iter().enumerate() {
        store.add(Record::new(i as u64 + 1, *name, "X", 50.0)).unwrap();
    }

    let mut out = Vec::new();
    SyncEngine::new(&mut store).export_to(&mut out).unwrap();

    let mut fresh = Store::in_memory();
    let outcome =
        SyncEngine::new(&mut fresh).import_from(out.as_slice(), &ImportOptions::default());
    assert_eq!(outcome.imported, names.len());
    for (i, name) in names.iter().enumerate() {
        assert_eq!(fresh.find(i as u64 + 1).unwrap().name, *name);
    }
}

#[test]
fn embedded_newline_keeps_line_numbers_honest() {
    let mut store = Store::in_memory();
    let csv = "key,name,group,score\n1,\"Two\nLines\",X,10\nbad,C,X,3\n";
    let outcome = import(&mut store, csv, &ImportOptions::default());

    assert_eq!(outcome.read_rows, 2);
    assert_eq!(store.find(1).unwrap().name, "Two\nLines");
    // The bad row starts on the fourth physical line.
    assert_eq!(outcome.errors[0].line(), Some(4));
}

#[test]
fn whitespace_only_group_is_rejected() {
    let mut store = Store::in_memory();
    let outcome = import(
        &mut store,
        "key,name,group,score\n1,Name,   ,10\n",
        &ImportOptions::default(),
    );

    assert_eq!(
        outcome.errors,
        vec![ImportError::Row {
            line: 2,
            reason: RowRejection::EmptyGroup
        }]
    );
}

#[test]
fn blank_lines_are_not_rows() {
    let mut store = Store::in_memory();
    let csv = "key,name,group,score\n\n1,A,X,10\n\n";
    let outcome = import(&mut store, csv, &ImportOptions::default());

    assert_eq!(outcome.read_rows, 1);
    assert_eq!(outcome.imported, 1);
}

#[test]
fn header_only_source() {
    let mut store = Store::in_memory();
    let outcome = import(&mut store, "key,name,group,score\n", &ImportOptions::default());

    assert_eq!(outcome.read_rows, 0);
    assert!(outcome.errors.is_empty());
}

// ============================================================================
// Numeric Edge Cases
// ============================================================================

#[test]
fn key_boundaries() {
    let mut store = Store::in_memory();
    let csv = format!(
        "key,name,group,score\n0,Zero,X,1\n{},Max,X,1\n{}0,Overflow,X,1\n",
        u64::MAX,
        u64::MAX
    );
    let outcome = import(&mut store, &csv, &ImportOptions::default());

    assert_eq!(outcome.imported, 2);
    assert_eq!(outcome.invalid_rows, 1);
    assert!(store.find(0).is_some());
    assert!(store.find(u64::MAX).is_some());
}

#[test]
fn reassign_with_exhausted_keyspace() {
    let mut store = Store::in_memory();
    store.add(Record::new(u64::MAX, "Top", "X", 1.0)).unwrap();

    let csv = format!("key,name,group,score\n{},Clash,X,1\n", u64::MAX);
    let outcome = import(&mut store, &csv, &ImportOptions::new(DuplicatePolicy::Reassign));

    assert_eq!(outcome.reassigned, 0);
    assert_eq!(outcome.invalid_rows, 1);
    assert!(outcome.is_consistent());
    assert_eq!(store.len(), 1);
}

#[test]
fn score_range_edges() {
    let mut store = Store::in_memory();
    let csv = "key,name,group,score\n1,A,X,0\n2,B,X,100\n3,C,X,-0.0001\n4,D,X,100.0001\n";
    let outcome = import(&mut store, csv, &ImportOptions::default());

    assert_eq!(outcome.imported, 2);
    assert_eq!(outcome.invalid_rows, 2);
}

#[test]
fn negative_score_allowed_without_range_check() {
    let mut store = Store::in_memory();
    let options = ImportOptions::default().with_validate_range(false);
    let outcome = import(&mut store, "key,name,group,score\n1,A,X,-5\n", &options);

    assert_eq!(outcome.imported, 1);
    assert_eq!(store.find(1).unwrap().score, -5.0);
}

// ============================================================================
// Policy Edge Cases
// ============================================================================

#[test]
fn duplicate_keys_within_one_source() {
    let mut store = Store::in_memory();
    let csv = "key,name,group,score\n1,First,X,10\n1,Second,X,20\n";

    let outcome = import(&mut store, csv, &ImportOptions::new("skip"));
    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.skipped_duplicates, 1);
    assert_eq!(store.find(1).unwrap().name, "First");

    let mut store = Store::in_memory();
    let outcome = import(&mut store, csv, &ImportOptions::new("overwrite"));
    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.overwritten, 1);
    assert_eq!(store.find(1).unwrap().name, "Second");
}

#[test]
fn deleted_key_can_be_reused() {
    let mut store = Store::in_memory();
    store.add(Record::new(4, "Gone", "X", 1.0)).unwrap();
    store.delete(4).unwrap();

    let csv = "key,name,group,score\n4,Back,X,2\n";
    let outcome = import(&mut store, csv, &ImportOptions::default());
    assert_eq!(outcome.imported, 1);
    assert_eq!(store.find(4).unwrap().name, "Back");
}
