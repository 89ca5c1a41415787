//! Persisting and reloading generated runs.

use casedesk_core::{
    config::PipelineConfig,
    error::PipelineError,
    pipeline::CasePipeline,
    store::{CaseStore, RunCounts},
};

fn store() -> CaseStore {
    let store = CaseStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

#[test]
fn raw_tables_round_trip_through_sqlite() {
    let config = PipelineConfig::default_test();
    let output = CasePipeline::new(config.clone()).run().unwrap();

    let store = store();
    let run_id = CaseStore::new_run_id();
    store.insert_run(&run_id, &config, "0.1.0-test").unwrap();
    let written = store.insert_raw_tables(&run_id, &output.raw).unwrap();

    assert_eq!(
        written,
        RunCounts {
            clients: 50,
            cases: 200,
            notes: 400
        }
    );
    assert_eq!(store.counts(&run_id).unwrap(), written);
    assert_eq!(store.load_raw_tables(&run_id).unwrap(), output.raw);
}

#[test]
fn reloaded_run_engineers_identically() {
    let config = PipelineConfig::default_test();
    let pipeline = CasePipeline::new(config.clone());
    let original = pipeline.run().unwrap();

    let store = store();
    let run_id = CaseStore::new_run_id();
    store.insert_run(&run_id, &config, "0.1.0-test").unwrap();
    store.insert_raw_tables(&run_id, &original.raw).unwrap();

    let reloaded = pipeline.run_on(store.load_raw_tables(&run_id).unwrap()).unwrap();
    assert_eq!(reloaded.train, original.train);
    assert_eq!(reloaded.test, original.test);
}

#[test]
fn runs_are_isolated_by_id() {
    let config = PipelineConfig::default_test();
    let output = CasePipeline::new(config.clone()).run().unwrap();
    let store = store();

    let a = CaseStore::new_run_id();
    let b = CaseStore::new_run_id();
    assert_ne!(a, b);
    store.insert_run(&a, &config, "test").unwrap();
    store.insert_raw_tables(&a, &output.raw).unwrap();

    assert_eq!(
        store.counts(&b).unwrap(),
        RunCounts {
            clients: 0,
            cases: 0,
            notes: 0
        }
    );
    let case_zero_notes = output.raw.notes.iter().filter(|n| n.case_id == 0).count();
    assert_eq!(store.note_count_for_case(&a, 0).unwrap(), case_zero_notes as i64);
}

#[test]
fn unknown_stored_labels_are_rejected() {
    const URI: &str = "file:store_label_check?mode=memory&cache=shared";
    let config = PipelineConfig::default_test();
    let output = CasePipeline::new(config.clone()).run().unwrap();

    let store = CaseStore::open(URI).unwrap();
    store.migrate().unwrap();
    let run_id = CaseStore::new_run_id();
    store.insert_run(&run_id, &config, "test").unwrap();
    store.insert_raw_tables(&run_id, &output.raw).unwrap();

    let raw = rusqlite::Connection::open(URI).unwrap();
    raw.execute(
        "UPDATE legal_case SET status = 'Lost' WHERE run_id = ?1 AND case_id = 3",
        [&run_id],
    )
    .unwrap();

    let err = store.load_raw_tables(&run_id).unwrap_err();
    assert!(matches!(err, PipelineError::UnknownLabel { field: "status", .. }));
}
