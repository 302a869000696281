//! Session lifecycle: reconnect races, disconnect processing, expiry
//! enforcement, and pipeline boundary protection.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use common::{TestProfiles, build_gateway, cert_der, gateway_config, mint_token, rsa_keypair};
use vehiclehub::{
    AppResult, ConnectOutcome, ConnectRequest, ProfileSource, RejectReason, TlsInfo,
    VehicleProfile,
};

fn tls_request(client_id: &str, user_name: &str, cn: &str) -> ConnectRequest {
    ConnectRequest {
        client_id: client_id.to_string(),
        user_name: user_name.to_string(),
        password: None,
        tls: Some(TlsInfo {
            client_certificate_der: Some(cert_der(cn)),
        }),
        internal_listener: false,
    }
}

#[tokio::test]
async fn test_overlapping_connects_and_disconnects() {
    let gateway = build_gateway(
        gateway_config(""),
        TestProfiles::with_device("vin100", "vin100", None),
    );
    let request = tls_request("vin100", "oem vin100", "vin100");

    // Two connects for the same clientId raise the counter to 2.
    assert!(gateway.pipeline.handle_connect(request.clone()).await.is_accepted());
    assert!(gateway.pipeline.handle_connect(request.clone()).await.is_accepted());
    assert_eq!(
        gateway.pipeline.registry().get("vin100").unwrap().connection_counter,
        2
    );

    // One disconnect leaves the entry intact; the cached permissions of
    // the still-live connection survive.
    gateway.pipeline.authorize("vin100", "oem vin100");
    gateway.pipeline.handle_disconnect("vin100").await;
    let entry = gateway.pipeline.registry().get("vin100").unwrap();
    assert_eq!(entry.connection_counter, 1);

    // No offline event yet.
    let offline_count = |events: &Vec<(String, String)>| {
        events.iter().filter(|(_, p)| p.contains("Offline")).count()
    };
    assert_eq!(offline_count(&gateway.sink.events.lock().unwrap()), 0);

    // The matching disconnect removes the entry and fires offline once.
    gateway.pipeline.handle_disconnect("vin100").await;
    assert!(gateway.pipeline.registry().get("vin100").is_none());
    assert_eq!(offline_count(&gateway.sink.events.lock().unwrap()), 1);

    // A late duplicate disconnect is a no-op.
    gateway.pipeline.handle_disconnect("vin100").await;
    assert_eq!(offline_count(&gateway.sink.events.lock().unwrap()), 1);
}

#[tokio::test]
async fn test_subscription_bookkeeping() {
    let gateway = build_gateway(
        gateway_config(""),
        TestProfiles::with_device("vin100", "vin100", None),
    );
    gateway
        .pipeline
        .handle_connect(tls_request("vin100", "oem vin100", "vin100"))
        .await;

    gateway
        .pipeline
        .handle_subscribe("vin100", "oem/vehicles/vin100/2d/commands");
    let entry = gateway.pipeline.registry().get("vin100").unwrap();
    assert!(
        entry
            .subscribed_topics
            .contains("oem/vehicles/vin100/2d/commands")
    );

    gateway
        .pipeline
        .handle_unsubscribe("vin100", "oem/vehicles/vin100/2d/commands");
    let entry = gateway.pipeline.registry().get("vin100").unwrap();
    assert!(entry.subscribed_topics.is_empty());
}

#[tokio::test]
async fn test_forced_invalidation_drops_all_session_state() {
    let gateway = build_gateway(
        gateway_config(""),
        TestProfiles::with_device("vin100", "vin100", None),
    );
    let request = tls_request("vin100", "oem vin100", "vin100");
    gateway.pipeline.handle_connect(request.clone()).await;
    gateway.pipeline.handle_connect(request).await;
    let cached = gateway.pipeline.authorize("vin100", "oem vin100");

    // ECU swap: the entry goes even with two live connections.
    let removed = gateway.pipeline.force_invalidate("vin100").unwrap();
    assert_eq!(removed.connection_counter, 2);
    assert!(gateway.pipeline.registry().get("vin100").is_none());

    // A fresh authorization recomputes rather than serving stale state.
    let recomputed = gateway.pipeline.authorize("vin100", "oem vin100");
    assert!(!Arc::ptr_eq(&cached, &recomputed));

    assert!(gateway.pipeline.force_invalidate("ghost").is_none());
}

#[tokio::test]
async fn test_expired_credential_forces_disconnect() {
    let (key, public_pem) = rsa_keypair();
    let gateway = build_gateway(
        gateway_config(&public_pem),
        TestProfiles::with_device("vin100", "vin100", None),
    );

    // A token that is valid now but expires in a few seconds.
    let token = mint_token(
        &key,
        serde_json::json!({
            "azp": "vin100",
            "exp": Utc::now().timestamp() + 3,
            "scope": "mqtt.connect"
        }),
    );
    let outcome = gateway
        .pipeline
        .handle_connect(ConnectRequest::basic("vin100", "oem vin100", Some(token)))
        .await;
    assert_eq!(outcome, ConnectOutcome::Accepted);

    // Not yet expired: validation is a no-op.
    assert!(!gateway.pipeline.validate_token_expiration("vin100").await);

    tokio::time::sleep(std::time::Duration::from_millis(3500)).await;
    assert!(gateway.pipeline.validate_token_expiration("vin100").await);
    assert!(!gateway.pipeline.expiry_tracker().contains("vin100"));
    assert_eq!(
        gateway.control.disconnected.lock().unwrap().as_slice(),
        &[("vin100".to_string(), false)]
    );
}

/// Profile source that never answers within the auth timeout.
#[derive(Debug)]
struct StalledProfiles;

#[async_trait]
impl ProfileSource for StalledProfiles {
    async fn lookup(&self, _client_id: &str) -> AppResult<Option<VehicleProfile>> {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        Ok(None)
    }
}

#[tokio::test]
async fn test_stalled_authentication_times_out_as_not_authorized() {
    let mut config = gateway_config("");
    config.auth.auth_timeout_seconds = 1;

    let sink = Arc::new(common::TestSink::default());
    let pipeline = vehiclehub::GatewayPipeline::new(
        &config,
        common::config_store(),
        Arc::new(StalledProfiles),
        sink as Arc<dyn vehiclehub::EventSink>,
    )
    .expect("pipeline");

    let outcome = pipeline
        .handle_connect(tls_request("vin100", "oem vin100", "vin100"))
        .await;
    assert_eq!(
        outcome,
        ConnectOutcome::Rejected(RejectReason::NotAuthorized)
    );

    // A timed-out authentication must not block the disconnect path.
    pipeline.handle_disconnect("vin100").await;
    assert!(pipeline.registry().get("vin100").is_none());
}

/// Profile source that panics, standing in for an unexpected bug.
#[derive(Debug)]
struct PanickingProfiles;

#[async_trait]
impl ProfileSource for PanickingProfiles {
    async fn lookup(&self, _client_id: &str) -> AppResult<Option<VehicleProfile>> {
        panic!("bug in profile handling");
    }
}

#[tokio::test]
async fn test_panic_converts_to_not_authorized() {
    let sink = Arc::new(common::TestSink::default());
    let pipeline = vehiclehub::GatewayPipeline::new(
        &gateway_config(""),
        common::config_store(),
        Arc::new(PanickingProfiles),
        sink as Arc<dyn vehiclehub::EventSink>,
    )
    .expect("pipeline");

    let outcome = pipeline
        .handle_connect(tls_request("vin100", "oem vin100", "vin100"))
        .await;
    assert_eq!(
        outcome,
        ConnectOutcome::Rejected(RejectReason::NotAuthorized)
    );
}

#[tokio::test]
async fn test_whitelisted_users_bypass_profile_resolution() {
    // Even a panicking source never runs for whitelisted users.
    let sink = Arc::new(common::TestSink::default());
    let pipeline = vehiclehub::GatewayPipeline::new(
        &gateway_config(""),
        common::config_store(),
        Arc::new(PanickingProfiles),
        sink as Arc<dyn vehiclehub::EventSink>,
    )
    .expect("pipeline");

    let outcome = pipeline
        .handle_connect(ConnectRequest::basic(
            "svc-1",
            "haa_api",
            Some("s3cr3t".to_string()),
        ))
        .await;
    assert_eq!(outcome, ConnectOutcome::Accepted);
}
