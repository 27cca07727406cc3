//! Dispatch-layer behaviour against a scripted storage engine.
//!
//! Gated databases hold each query until the test hands out a permit, which
//! makes mailbox backpressure and cross-database independence observable.


use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use roamdb::server::Registry;
use server_test_support::{ScriptedOpener, TestServer};

const SETTLE: Duration = Duration::from_millis(50);

#[tokio::test(flavor = "multi_thread")]
async fn test_full_mailbox_blocks_without_loss_or_reordering() {
    let opener = ScriptedOpener::new();
    let permits = opener.gate("slow");
    let log = opener.log();
    let registry = Arc::new(Registry::new(opener, 1));
    let ctx = registry.resolve("slow").await.unwrap();

    // q0 is picked up by the worker and held, q1 fills the mailbox, the rest wait
    let mut tasks = Vec::new();
    for i in 0..4 {
        let ctx = Arc::clone(&ctx);
        tasks.push(tokio::spawn(async move {
            ctx.execute(format!("q{i}"), vec![]).await
        }));
        tokio::time::sleep(SETTLE).await;
    }

    assert_eq!(ctx.available_slots(), 0);
    assert!(tasks.iter().all(|task| !task.is_finished()));
    assert!(log.lock().unwrap().is_empty());

    for _ in 0..4 {
        permits.send(()).unwrap();
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let response = task.await.unwrap().unwrap();
        assert_eq!(response.rows[0]["sql"], json!(format!("q{i}")));
    }

    let order: Vec<String> = log.lock().unwrap().iter().map(|(_, sql)| sql.clone()).collect();
    assert_eq!(order, vec!["q0", "q1", "q2", "q3"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_blocked_database_does_not_stall_others() {
    let opener = ScriptedOpener::new();
    let permits = opener.gate("stuck");
    let server = TestServer::start_with(opener, 4).await;

    let mut stuck = server.client("stuck").await;
    let pending = tokio::spawn(async move { stuck.query("held", vec![]).await });
    tokio::time::sleep(SETTLE).await;
    assert!(!pending.is_finished());

    let mut other = server.client("free").await;
    let response = tokio::time::timeout(Duration::from_secs(2), other.query("quick", vec![]))
        .await
        .expect("an unrelated database must not wait on a stuck one")
        .unwrap();
    assert_eq!(response.rows[0]["sql"], json!("quick"));

    permits.send(()).unwrap();
    let released = pending.await.unwrap().unwrap();
    assert_eq!(released.rows[0]["sql"], json!("held"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_waits_for_each_reply() {
    let opener = ScriptedOpener::new();
    let permits = opener.gate("lockstep");
    let log = opener.log();
    let server = TestServer::start_with(opener, 8).await;

    let mut client = server.client("lockstep").await;
    let task = tokio::spawn(async move {
        let first = client.query("first", vec![]).await.unwrap();
        let second = client.query("second", vec![json!(2)]).await.unwrap();
        (first, second)
    });

    permits.send(()).unwrap();
    tokio::time::sleep(SETTLE).await;
    // Only the first request has reached the engine
    assert_eq!(log.lock().unwrap().len(), 1);

    permits.send(()).unwrap();
    let (first, second) = task.await.unwrap();
    assert_eq!(first.rows[0]["sql"], json!("first"));
    assert_eq!(second.columns, vec!["sql", "p0"]);
    assert_eq!(second.rows[0]["p0"], json!(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_engine_failure_is_error_only_response() {
    let server = TestServer::start_with(ScriptedOpener::new(), 8).await;
    let mut client = server.client("scripted").await;

    let failed = client.query("FAIL", vec![]).await.unwrap();
    assert_eq!(failed.error.as_deref(), Some("scripted failure"));
    assert!(failed.columns.is_empty());
    assert!(failed.rows.is_empty());

    let ok = client.query("after", vec![]).await.unwrap();
    assert!(ok.error.is_none());
    assert_eq!(ok.rows[0]["sql"], json!("after"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_per_name_order_across_connections() {
    let server = TestServer::start_with(ScriptedOpener::new(), 2).await;
    let log = server.registry().opener().log();

    let mut tasks = Vec::new();
    for conn in 0..3 {
        let mut client = server.client("shared").await;
        tasks.push(tokio::spawn(async move {
            for n in 0..10 {
                let sql = format!("c{conn}-{n}");
                let response = client.query(&sql, vec![]).await.unwrap();
                assert_eq!(response.rows[0]["sql"], json!(sql));
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 30);
    for conn in 0..3 {
        let prefix = format!("c{conn}-");
        let seen: Vec<String> = log
            .iter()
            .filter(|(db, sql)| db == "shared" && sql.starts_with(&prefix))
            .map(|(_, sql)| sql.clone())
            .collect();
        let expected: Vec<String> = (0..10).map(|n| format!("{prefix}{n}")).collect();
        assert_eq!(seen, expected);
    }
}
