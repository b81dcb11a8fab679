use rtdb_race::AssertionError;
use rtdb_race::Client;
use rtdb_race::DbPath;
use rtdb_race::Error;
use rtdb_race::UserRecord;
use serde_json::json;

use crate::commons::prepare_harness;
use crate::commons::with_runner;
use crate::commons::SEED_CALLS;
use crate::enable_logger;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reset_then_race_across_separate_clients() {
    enable_logger();
    let harness = prepare_harness();

    // Reset and race run with their own client, sharing only the database.
    let seeded = with_runner(&harness.settings, |runner| async move { runner.reset().await })
        .await
        .expect("reset should seed the user");
    assert_eq!(
        seeded.child("calls/history").unwrap().children_count(),
        SEED_CALLS
    );

    let report = with_runner(&harness.settings, |runner| async move { runner.race().await })
        .await
        .expect("seeded calls should survive the race");
    assert_eq!(report.completions.len(), 3);

    let user: UserRecord = report.snapshot.deserialize().unwrap().unwrap();
    assert_eq!(user.name, "test user");
    assert!(user.last_updated.is_some());
    assert_eq!(user.calls.history.len(), SEED_CALLS + 1);
    assert_eq!(user.calls.history[&report.call_id].id, "updated");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reset_twice_leaves_same_state() {
    enable_logger();
    let harness = prepare_harness();

    let first = with_runner(&harness.settings, |runner| async move { runner.reset().await })
        .await
        .unwrap();
    let second = with_runner(&harness.settings, |runner| async move { runner.reset().await })
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.value(),
        Some(&json!({
            "name": "test user",
            "calls": { "history": {
                "c1": { "id": "c1", "phoneNumber": "9999999" },
                "c2": { "id": "c2", "phoneNumber": "9999999" },
                "c3": { "id": "c3", "phoneNumber": "9999999" },
                "c4": { "id": "c4", "phoneNumber": "9999999" },
                "c5": { "id": "c5", "phoneNumber": "9999999" },
                "c6": { "id": "c6", "phoneNumber": "9999999" },
                "c7": { "id": "c7", "phoneNumber": "9999999" },
                "c8": { "id": "c8", "phoneNumber": "9999999" },
                "c9": { "id": "c9", "phoneNumber": "9999999" },
                "c10": { "id": "c10", "phoneNumber": "9999999" },
            } },
        }))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn race_without_reset_is_not_a_reproduction() {
    enable_logger();
    let harness = prepare_harness();

    let err = with_runner(&harness.settings, |runner| async move { runner.race().await })
        .await
        .unwrap_err();
    assert!(!err.is_reproduction());
    assert!(matches!(
        err,
        Error::Assertion(AssertionError::NotSeeded { ref missing, .. }) if missing.len() == SEED_CALLS
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn probe_counts_no_reproduction_under_isolation() {
    enable_logger();
    let harness = prepare_harness();

    let report = with_runner(&harness.settings, |runner| async move { runner.probe(5).await })
        .await
        .unwrap();
    assert_eq!(report.iterations, 5);
    assert_eq!(report.reproduced, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn race_leaves_data_visible_to_other_clients() {
    enable_logger();
    let harness = prepare_harness();

    with_runner(&harness.settings, |runner| async move {
        runner.reset().await?;
        runner.race().await
    })
    .await
    .unwrap();

    let observer = Client::connect(&harness.settings).await.unwrap();
    let history = DbPath::parse("/test/users/u1/calls/history").unwrap();
    let snapshot = observer.database().read_once(&history).await.unwrap();
    assert_eq!(snapshot.children_count(), SEED_CALLS + 1);
    observer.shutdown();
}
