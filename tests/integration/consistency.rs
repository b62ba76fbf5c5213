//! Reads and consistency checks across a fresh passel

use super::test_utils::start_passel;
use serde_json::json;

#[tokio::test(flavor = "multi_thread")]
async fn test_fresh_passel_is_consistent() {
    let passel = start_passel(3).await;

    let (status, body) = passel.get(0, "/v1/passel_state_consistency").await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["consistent"], json!(true));
    assert!(body.get("error").is_none());

    let snapshots = body["passel_states"].as_array().unwrap();
    assert_eq!(snapshots.len(), 3);
    for snapshot in snapshots {
        for url in passel.urls() {
            assert_eq!(snapshot[url.as_str()], json!("alive"));
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_state_reads() {
    let passel = start_passel(2).await;

    let (status, body) = passel.get(1, "/v1/state").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"state": "alive"}));

    let (status, body) = passel.get(1, "/v1/passel_state").await;
    assert_eq!(status, 200);
    let states = body["possum_states"].as_object().unwrap();
    assert_eq!(states.len(), 2);
    assert!(states.values().all(|s| s == "alive"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reads_carry_cors_header() {
    let passel = start_passel(1).await;

    let (status, headers) = passel.get_with_headers(0, "/v1/state").await;
    assert_eq!(status, 200);
    assert_eq!(
        headers
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
