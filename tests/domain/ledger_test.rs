use callscribe::domain::{
    CALL_ID_COLUMN, CLASSIFICATION_COLUMN, CallId, CallRecord, Ledger, TRANSCRIPT_COLUMN,
    UpsertOutcome,
};

fn record(id: &str, transcript: &str, label: &str) -> CallRecord {
    CallRecord::new(CallId::new(id), transcript.to_string(), label.to_string())
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn given_empty_ledger_when_created_then_required_columns_exist_in_order() {
    let ledger = Ledger::empty();

    assert!(ledger.is_empty());
    assert_eq!(
        ledger.headers(),
        &strings(&[CALL_ID_COLUMN, TRANSCRIPT_COLUMN, CLASSIFICATION_COLUMN])[..]
    );
}

#[test]
fn given_unknown_call_when_upserting_then_row_is_appended() {
    let mut ledger = Ledger::empty();

    let outcome = ledger.upsert(&record("100", "hello", "Query"));

    assert_eq!(outcome, UpsertOutcome::Inserted);
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.get(&CallId::new("100")), Some(record("100", "hello", "Query")));
}

#[test]
fn given_known_call_when_upserting_then_row_is_replaced_in_place() {
    let mut ledger = Ledger::empty();
    ledger.upsert(&record("100", "first", "Query"));
    ledger.upsert(&record("101", "other", "Complaint"));

    let outcome = ledger.upsert(&record("100", "second", "Exchange"));

    assert_eq!(outcome, UpsertOutcome::Updated);
    assert_eq!(ledger.len(), 2);
    let records: Vec<CallRecord> = ledger.records().collect();
    assert_eq!(records[0], record("100", "second", "Exchange"));
    assert_eq!(records[1], record("101", "other", "Complaint"));
}

#[test]
fn given_same_record_twice_when_upserting_then_ledger_is_unchanged() {
    let mut ledger = Ledger::empty();
    ledger.upsert(&record("100", "hello", "Query"));
    let before = ledger.clone();

    ledger.upsert(&record("100", "hello", "Query"));

    assert_eq!(ledger, before);
}

#[test]
fn given_table_with_extra_columns_when_upserting_then_extra_cells_are_preserved() {
    let headers = strings(&["Agent", CALL_ID_COLUMN, TRANSCRIPT_COLUMN, CLASSIFICATION_COLUMN]);
    let rows = vec![strings(&["alice", "100", "old", "Query"])];
    let mut ledger = Ledger::from_table(headers.clone(), rows);

    ledger.upsert(&record("100", "new", "Complaint"));
    ledger.upsert(&record("101", "fresh", "Other"));

    assert_eq!(ledger.headers(), &headers[..]);
    assert_eq!(ledger.rows()[0], strings(&["alice", "100", "new", "Complaint"]));
    assert_eq!(ledger.rows()[1], strings(&["", "101", "fresh", "Other"]));
}

#[test]
fn given_table_missing_required_columns_when_loading_then_they_are_appended() {
    let headers = strings(&[CALL_ID_COLUMN, "Notes"]);
    let rows = vec![strings(&["100", "callback requested"])];

    let ledger = Ledger::from_table(headers, rows);

    assert_eq!(
        ledger.headers(),
        &strings(&[CALL_ID_COLUMN, "Notes", TRANSCRIPT_COLUMN, CLASSIFICATION_COLUMN])[..]
    );
    assert_eq!(ledger.rows()[0], strings(&["100", "callback requested", "", ""]));
}

#[test]
fn given_duplicate_ids_in_table_when_upserting_then_every_copy_is_rewritten() {
    let headers = strings(&[CALL_ID_COLUMN, TRANSCRIPT_COLUMN, CLASSIFICATION_COLUMN]);
    let rows = vec![
        strings(&["100", "a", "Query"]),
        strings(&["100", "b", "Other"]),
    ];
    let mut ledger = Ledger::from_table(headers, rows);
    assert_eq!(ledger.duplicate_ids(), 1);

    let outcome = ledger.upsert(&record("100", "c", "Complaint"));

    assert_eq!(outcome, UpsertOutcome::Updated);
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.rows()[0], strings(&["100", "c", "Complaint"]));
    assert_eq!(ledger.rows()[1], strings(&["100", "c", "Complaint"]));
    assert_eq!(
        ledger.get(&CallId::new("100")).unwrap().transcript,
        "c"
    );
}

#[test]
fn given_error_label_when_checking_record_then_it_is_flagged() {
    assert!(record("100", "t", "Error").is_classification_error());
    assert!(!record("100", "t", "Query").is_classification_error());
}
