mod support;

use std::time::Duration;

use biogas_client::{ClientError, RefreshFailure};
use serde_json::json;
use support::{Harness, REFRESH_PATH, sensor_json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

const SENSORS_PATH: &str = "/api/dashboard/sensors/";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_expired_requests_share_one_refresh() {
    let harness = Harness::start().await;
    harness.sign_in("A1", Some("R1"));

    Mock::given(method("GET"))
        .and(path(SENSORS_PATH))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Given token not valid for any token type",
            "code": "token_not_valid"
        })))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path(SENSORS_PATH))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([sensor_json(1)])))
        .expect(5)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({"refresh": "R1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "A2"}))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(1)
        .mount(&harness.server)
        .await;

    let mut tasks = Vec::new();
    for _ in 0..5 {
        let client = harness.client.clone();
        tasks.push(tokio::spawn(async move { client.sensors().await }));
    }
    for task in tasks {
        let sensors = task
            .await
            .expect("request task should not panic")
            .expect("replayed request should succeed");
        assert_eq!(sensors.len(), 1);
    }

    assert_eq!(
        harness.session.access_token().expect("read token").as_deref(),
        Some("A2")
    );
    assert_eq!(
        harness
            .session
            .refresh_token()
            .expect("read refresh")
            .as_deref(),
        Some("R1")
    );
    assert!(harness.observer.reasons().is_empty());
    assert!(!harness.client.refresh_coordinator().is_refreshing());
    harness.server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rejected_refresh_fails_every_waiter_and_clears_once() {
    let harness = Harness::start().await;
    harness.sign_in("A1", Some("R1"));
    harness
        .session
        .set_institution("unal")
        .expect("store institution");

    Mock::given(method("GET"))
        .and(path(SENSORS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({
                    "detail": "Token is invalid or expired",
                    "code": "token_not_valid"
                }))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(1)
        .mount(&harness.server)
        .await;

    let mut tasks = Vec::new();
    for _ in 0..3 {
        let client = harness.client.clone();
        tasks.push(tokio::spawn(async move { client.sensors().await }));
    }
    for task in tasks {
        let err = task
            .await
            .expect("request task should not panic")
            .expect_err("refresh failure must reach every caller");
        assert!(err.is_session_expired(), "{err}");
        assert!(matches!(
            err,
            ClientError::RefreshRejected { status: 401, ref message }
                if message == "Token is invalid or expired"
        ));
    }

    let snapshot = harness.session.snapshot().expect("snapshot");
    assert!(snapshot.access_token.is_none());
    assert!(snapshot.refresh_token.is_none());
    assert_eq!(
        harness.session.institution().expect("institution").as_deref(),
        Some("unal")
    );
    assert_eq!(
        harness.observer.reasons(),
        vec![RefreshFailure::Rejected {
            status: 401,
            message: "Token is invalid or expired".to_owned(),
        }]
    );
    harness.server.verify().await;
}

#[tokio::test]
async fn replay_rejected_again_is_retry_exhausted() {
    let harness = Harness::start().await;
    harness.sign_in("A1", Some("R1"));

    Mock::given(method("GET"))
        .and(path(SENSORS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "nope"})))
        .expect(2)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&harness.server)
        .await;

    let err = harness
        .client
        .sensors()
        .await
        .expect_err("second 401 must not be retried");
    assert!(matches!(
        err,
        ClientError::RetryExhausted { status: 401, ref message } if message == "nope"
    ));
    assert!(!err.is_session_expired());

    let attempts = harness.requests_to(SENSORS_PATH).await;
    let sent: Vec<_> = attempts
        .iter()
        .map(|request| {
            request
                .headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(ToOwned::to_owned)
        })
        .collect();
    assert_eq!(
        sent,
        vec![Some("Bearer A1".to_owned()), Some("Bearer A2".to_owned())]
    );

    assert_eq!(
        harness.session.access_token().expect("token").as_deref(),
        Some("A2")
    );
    assert!(harness.observer.reasons().is_empty());
    harness.server.verify().await;
}

#[tokio::test]
async fn successful_request_never_refreshes() {
    let harness = Harness::start().await;
    harness.sign_in("A1", Some("R1"));

    Mock::given(method("GET"))
        .and(path(SENSORS_PATH))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(0)
        .mount(&harness.server)
        .await;

    let sensors = harness.client.sensors().await.expect("sensors");
    assert!(sensors.is_empty());
    harness.server.verify().await;
}

#[tokio::test]
async fn missing_refresh_token_expires_without_calling_backend() {
    let harness = Harness::start().await;
    harness.sign_in("A1", None);

    Mock::given(method("GET"))
        .and(path(SENSORS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(0)
        .mount(&harness.server)
        .await;

    let err = harness.client.sensors().await.expect_err("no refresh token");
    assert!(matches!(err, ClientError::NoRefreshToken));
    assert!(!harness.session.is_authenticated().expect("auth check"));
    assert_eq!(
        harness.observer.reasons(),
        vec![RefreshFailure::NoRefreshToken]
    );
    harness.server.verify().await;
}

#[tokio::test]
async fn other_error_statuses_pass_through_untouched() {
    let harness = Harness::start().await;
    harness.sign_in("A1", Some("R1"));

    Mock::given(method("GET"))
        .and(path(SENSORS_PATH))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({"detail": "No tiene permiso para realizar esta acción."})),
        )
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/alerts/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>boom</html>"))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(0)
        .mount(&harness.server)
        .await;

    let forbidden = harness.client.sensors().await.expect_err("403");
    assert!(matches!(
        forbidden,
        ClientError::Http { status: 403, ref message, .. }
            if message == "No tiene permiso para realizar esta acción."
    ));

    let broken = harness.client.alerts().await.expect_err("500");
    assert!(matches!(
        broken,
        ClientError::Http { status: 500, ref message, .. } if message == "Internal Server Error"
    ));

    assert_eq!(
        harness.session.access_token().expect("token").as_deref(),
        Some("A1")
    );
    harness.server.verify().await;
}

#[tokio::test]
async fn rotated_refresh_token_is_used_for_the_next_refresh() {
    let harness = Harness::start().await;
    harness.sign_in("A1", Some("R1"));

    Mock::given(method("GET"))
        .and(path("/api/dashboard/alerts/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/alerts/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({"refresh": "R1"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "A2", "refresh": "R2"})),
        )
        .expect(1)
        .mount(&harness.server)
        .await;

    harness.client.alerts().await.expect("alerts after refresh");
    assert_eq!(
        harness
            .session
            .refresh_token()
            .expect("refresh token")
            .as_deref(),
        Some("R2")
    );
    harness.server.verify().await;
}

#[tokio::test]
async fn foreign_origin_never_sees_the_token_or_triggers_refresh() {
    let harness = Harness::start().await;
    harness.sign_in("A1", Some("R1"));
    let files = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/media/r1.pdf"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&files)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/own.pdf"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-own".to_vec()))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(0)
        .mount(&harness.server)
        .await;

    let err = harness
        .client
        .download(&format!("{}/media/r1.pdf", files.uri()))
        .await
        .expect_err("foreign 401 is an ordinary error");
    assert!(matches!(err, ClientError::Http { status: 401, .. }));
    assert!(!err.is_session_expired());

    let foreign = files.received_requests().await.unwrap_or_default();
    assert_eq!(foreign.len(), 1);
    assert!(foreign[0].headers.get("authorization").is_none());

    let own = harness
        .client
        .download(&format!("{}/media/own.pdf", harness.server.uri()))
        .await
        .expect("same-origin absolute url keeps credentials");
    assert_eq!(&own[..], b"%PDF-own");

    assert!(harness.session.is_authenticated().expect("auth check"));
    assert!(harness.observer.reasons().is_empty());
    files.verify().await;
    harness.server.verify().await;
}

async fn assert_unusable_refresh_ends_session(refresh_answer: ResponseTemplate) {
    let harness = Harness::start_with_timeout(Some(Duration::from_millis(300))).await;
    harness.sign_in("A1", Some("R1"));

    Mock::given(method("GET"))
        .and(path(SENSORS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(refresh_answer)
        .expect(1)
        .mount(&harness.server)
        .await;

    let err = harness
        .client
        .sensors()
        .await
        .expect_err("unusable refresh answer");
    assert!(matches!(err, ClientError::RefreshFailed(_)), "{err}");
    assert!(err.is_session_expired());

    let snapshot = harness.session.snapshot().expect("snapshot");
    assert!(snapshot.access_token.is_none());
    assert!(snapshot.refresh_token.is_none());

    let reasons = harness.observer.reasons();
    assert_eq!(reasons.len(), 1);
    assert!(matches!(reasons[0], RefreshFailure::Failed(_)));
    harness.server.verify().await;
}

#[tokio::test]
async fn refresh_answer_without_access_token_ends_session() {
    assert_unusable_refresh_ends_session(ResponseTemplate::new(200).set_body_json(json!({}))).await;
}

#[tokio::test]
async fn refresh_answer_with_empty_access_token_ends_session() {
    assert_unusable_refresh_ends_session(
        ResponseTemplate::new(200).set_body_json(json!({"access": ""})),
    )
    .await;
}

#[tokio::test]
async fn refresh_answer_that_is_not_json_ends_session() {
    assert_unusable_refresh_ends_session(
        ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
    )
    .await;
}

#[tokio::test]
async fn timed_out_refresh_ends_session() {
    assert_unusable_refresh_ends_session(
        ResponseTemplate::new(200)
            .set_body_json(json!({"access": "A2"}))
            .set_delay(Duration::from_secs(3)),
    )
    .await;
}
