use super::*;

#[test]
fn known_statuses_follow_the_table() {
    let table = [
        ("SUCCESS", CommitState::Success, "Everything looks good!"),
        ("FAILURE", CommitState::Failed, "Did not work as expected."),
        ("ABORTED", CommitState::Failed, "Aborted mid-flight"),
        ("RUNNING", CommitState::Pending, "Testing your code..."),
        ("QUEUED", CommitState::Pending, "Looking for a place to park..."),
    ];
    for (raw, state, description) in table {
        let report = map_build_status(&BuildStatus::from(raw));
        assert_eq!(report.state, state, "status {raw}");
        assert_eq!(report.description, description, "status {raw}");
    }
}

#[test]
fn unknown_statuses_never_map_to_success() {
    for raw in ["", "PASSED", "success?", "SKIPPED", "unknown"] {
        let status = BuildStatus::from(raw);
        assert!(matches!(status, BuildStatus::Other(_)), "status {raw:?}");
        assert_eq!(map_build_status(&status).state, CommitState::Failed);
    }
}

#[test]
fn parsing_ignores_case() {
    assert_eq!(BuildStatus::from("success"), BuildStatus::Success);
    assert_eq!(BuildStatus::from("Queued"), BuildStatus::Queued);
}

#[test]
fn other_keeps_raw_value() {
    let status = BuildStatus::from("WEIRD");
    assert_eq!(status.as_str(), "WEIRD");
    assert_eq!(status.to_string(), "WEIRD");
}

#[test]
fn commit_state_wire_values() {
    assert_eq!(CommitState::Pending.as_str(), "pending");
    assert_eq!(CommitState::Success.as_str(), "success");
    assert_eq!(CommitState::Failed.as_str(), "failed");
    assert_eq!(
        serde_json::to_value(CommitState::Failed).unwrap(),
        serde_json::json!("failed")
    );
}

#[test]
fn build_status_deserialises_leniently() {
    let status: BuildStatus = serde_json::from_str("\"RUNNING\"").unwrap();
    assert_eq!(status, BuildStatus::Running);
    let status: BuildStatus = serde_json::from_str("\"BOGUS\"").unwrap();
    assert_eq!(status, BuildStatus::Other("BOGUS".into()));
}
