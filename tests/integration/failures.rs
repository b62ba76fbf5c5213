//! Rejected writes and misconfigured or unreachable nodes

use super::test_utils::{start_passel, start_passel_with, unused_url};
use serde_json::json;

#[tokio::test(flavor = "multi_thread")]
async fn test_killing_everyone_is_refused() {
    let passel = start_passel(2).await;
    let all_dead = json!({"possum_states": {
        passel.url(0): "dead",
        passel.url(1): "dead"
    }});

    let (status, body) = passel.post(0, "/v1/passel_state", all_dead).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], json!("Would have killed all possums"));

    let (_, body) = passel.get(1, "/v1/passel_state").await;
    assert!(body["possum_states"]
        .as_object()
        .unwrap()
        .values()
        .all(|s| s == "alive"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_possum_is_rejected() {
    let passel = start_passel(2).await;
    let stranger = unused_url();

    let (status, body) = passel
        .post(0, "/v1/passel_state", json!({"possum_states": { stranger.as_str(): "dead" }}))
        .await;
    assert_eq!(status, 500);
    assert_eq!(
        body["error"],
        json!(format!("Possum {} is not part of my passel", stranger))
    );

    let (status, body) = passel
        .post(0, "/v1/state", json!({ stranger.as_str(): "dead" }))
        .await;
    assert_eq!(status, 500);
    assert_eq!(
        body["error"],
        json!(format!("Possum {} is not part of my passel", stranger))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bad_state_value_is_rejected() {
    let passel = start_passel(1).await;
    let target = passel.url(0).to_string();

    let (status, body) = passel
        .post(0, "/v1/state", json!({ target.as_str(): "sleeping" }))
        .await;
    assert_eq!(status, 500);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains(r#"The state should have been "alive" or "dead" not "sleeping""#));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_member_fails_consistency() {
    let missing = unused_url();
    let extra = missing.clone();
    let passel = start_passel_with(1, move |_, config| {
        config.passel.members.push(extra.clone());
        config.peer.connect_timeout_secs = 1;
    })
    .await;

    let (status, body) = passel.get(0, "/v1/passel_state_consistency").await;
    assert_eq!(status, 500);
    let error = body["error"].as_str().unwrap();
    assert!(
        error.starts_with(&format!("Could not reach possum {}", missing)),
        "{}",
        error
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unmatched_identity_is_gone() {
    let passel = start_passel_with(1, |_, config| {
        config.identity.application_uris = vec!["elsewhere.example.com".to_string()];
    })
    .await;

    let (status, body) = passel.get(0, "/v1/state").await;
    assert_eq!(status, 410);
    assert_eq!(body, json!({"error": "Could not match any possum in db"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_passel_is_gone() {
    let passel = start_passel_with(1, |_, config| {
        config.passel.members.clear();
    })
    .await;

    let (status, body) = passel.get(0, "/v1/passel_state").await;
    assert_eq!(status, 410);
    assert_eq!(body["error"], json!("Passel had 0 members"));

    let (status, body) = passel.get(0, "/v1/passel_state_consistency").await;
    assert_eq!(status, 410);
    assert_eq!(body["error"], json!("Passel had 0 members"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_passel_wins_over_malformed_body() {
    let passel = start_passel_with(1, |_, config| {
        config.passel.members.clear();
    })
    .await;

    for path in ["/v1/state", "/v1/passel_state"] {
        let (status, body) = passel.post_raw(0, path, "{bad").await;
        assert_eq!(status, 410, "{}", path);
        assert_eq!(body, json!({"error": "Passel had 0 members"}));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unmatched_identity_wins_over_malformed_body() {
    let passel = start_passel_with(1, |_, config| {
        config.identity.application_uris = vec!["elsewhere.example.com".to_string()];
    })
    .await;

    let (status, body) = passel.post_raw(0, "/v1/state", "{bad").await;
    assert_eq!(status, 410);
    assert_eq!(body, json!({"error": "Could not match any possum in db"}));

    // Relaying needs only the passel, so the body is parsed and rejected
    let (status, body) = passel.post_raw(0, "/v1/passel_state", "{bad").await;
    assert_eq!(status, 500);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}
