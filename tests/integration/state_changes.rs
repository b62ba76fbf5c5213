//! Single-node and passel-wide writes

use super::test_utils::start_passel;
use possum::guard::overlay;
use possum::types::PasselState;
use serde_json::json;

#[tokio::test(flavor = "multi_thread")]
async fn test_local_write_then_inconsistency_then_forced_repair() {
    let passel = start_passel(3).await;
    let victim = passel.url(1).to_string();

    // Kill possum 1 on node 0 only
    let (status, body) = passel
        .post(0, "/v1/state", json!({ victim.as_str(): "dead" }))
        .await;
    assert_eq!(status, 202, "{}", body);
    assert_eq!(body["possum_states"][victim.as_str()], json!("dead"));
    assert_eq!(body["possum_states"][passel.url(0)], json!("alive"));

    // The passel now disagrees
    let (status, body) = passel.get(2, "/v1/passel_state_consistency").await;
    assert_eq!(status, 500);
    assert_eq!(body["consistent"], json!(false));
    assert_eq!(body["error"], json!("State was inconsistent"));
    let snapshots = body["passel_states"].as_array().unwrap();
    assert_eq!(snapshots[0][victim.as_str()], json!("dead"));
    assert_eq!(snapshots[1][victim.as_str()], json!("alive"));

    // An unforced passel write refuses to start
    let (status, body) = passel
        .post(
            2,
            "/v1/passel_state",
            json!({"possum_states": { victim.as_str(): "alive" }}),
        )
        .await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], json!("State was inconsistent before update"));

    // A forced one brings every node back in line
    let (_, prior) = passel.get(2, "/v1/passel_state").await;
    let prior: PasselState = serde_json::from_value(prior["possum_states"].clone()).unwrap();
    let desired = json!({ victim.as_str(): "alive", passel.url(0): "dead" });
    let (status, body) = passel
        .post(
            2,
            "/v1/passel_state",
            json!({"possum_states": desired.clone(), "force": true}),
        )
        .await;
    assert_eq!(status, 202, "{}", body);
    assert_eq!(body["consistent"], json!(true));

    let desired: PasselState = serde_json::from_value(desired).unwrap();
    let expected = overlay(&desired, &prior);
    assert_eq!(expected.len(), 3);
    for index in 0..3 {
        let (status, body) = passel.get(index, "/v1/passel_state").await;
        assert_eq!(status, 200);
        let states: PasselState =
            serde_json::from_value(body["possum_states"].clone()).unwrap();
        assert_eq!(states, expected, "node {}", index);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_passel_write_reaches_every_node() {
    let passel = start_passel(3).await;
    let victim = passel.url(2).to_string();

    let (status, body) = passel
        .post(
            0,
            "/v1/passel_state",
            json!({"possum_states": { victim.as_str(): "dead" }}),
        )
        .await;
    assert_eq!(status, 202, "{}", body);
    assert_eq!(body["passel_states"].as_array().unwrap().len(), 3);

    for index in 0..3 {
        let (_, body) = passel.get(index, "/v1/passel_state").await;
        assert_eq!(body["possum_states"][victim.as_str()], json!("dead"));
    }

    // The dead possum still reports its own state
    let (status, body) = passel.get(2, "/v1/state").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"state": "dead"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_repeating_a_write_changes_nothing() {
    let passel = start_passel(2).await;
    let target = passel.url(1).to_string();

    let (status, once) = passel
        .post(0, "/v1/state", json!({ target.as_str(): "dead" }))
        .await;
    assert_eq!(status, 202);
    let (status, twice) = passel
        .post(0, "/v1/state", json!({ target.as_str(): "dead" }))
        .await;
    assert_eq!(status, 202);
    assert_eq!(once, twice);
}
