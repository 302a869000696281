//! Shared test helpers for integration tests.
//!
//! Builds a full gateway pipeline over in-memory collaborators and
//! provides key/certificate generation for credential tests.

// Not all test files use all helpers; silence dead_code warnings.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use vehiclehub::{
    AppError, AppResult, ConfigStore, EventSink, GatewayConfig, GatewayPipeline, ProfileSource,
    SessionControl, SinkTopic, VehicleProfile,
};

/// Records everything forwarded to the platform sink.
#[derive(Debug, Default)]
pub struct TestSink {
    pub events: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl EventSink for TestSink {
    async fn send_to_sink(&self, key: &str, payload: &str, _topic: SinkTopic) -> AppResult<()> {
        self.events
            .lock()
            .unwrap()
            .push((key.to_string(), payload.to_string()));
        Ok(())
    }
}

/// In-memory vehicle profile source.
#[derive(Debug, Default)]
pub struct TestProfiles {
    pub profiles: HashMap<String, VehicleProfile>,
    pub fail: bool,
}

impl TestProfiles {
    pub fn with_device(client_id: &str, vehicle_id: &str, device_type: Option<&str>) -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(
            client_id.to_string(),
            VehicleProfile {
                vehicle_id: Some(vehicle_id.to_string()),
                device_type: device_type.map(str::to_string),
                connected_platform: Some("gen2".to_string()),
            },
        );
        Self {
            profiles,
            fail: false,
        }
    }
}

#[async_trait]
impl ProfileSource for TestProfiles {
    async fn lookup(&self, client_id: &str) -> AppResult<Option<VehicleProfile>> {
        if self.fail {
            return Err(AppError::external_service("profile lookup unavailable"));
        }
        Ok(self.profiles.get(client_id).cloned())
    }
}

/// Records forced disconnects issued through the broker session control.
#[derive(Debug, Default)]
pub struct TestControl {
    pub disconnected: Mutex<Vec<(String, bool)>>,
}

#[async_trait]
impl SessionControl for TestControl {
    async fn disconnect_client(
        &self,
        client_id: &str,
        suppress_last_will: bool,
    ) -> AppResult<bool> {
        self.disconnected
            .lock()
            .unwrap()
            .push((client_id.to_string(), suppress_last_will));
        Ok(true)
    }

    async fn is_client_connected(&self, _client_id: &str) -> AppResult<bool> {
        Ok(true)
    }
}

/// A fully wired pipeline plus handles on its mock collaborators.
pub struct TestGateway {
    pub pipeline: GatewayPipeline,
    pub sink: Arc<TestSink>,
    pub control: Arc<TestControl>,
}

/// Gateway configuration used across the integration tests.
pub fn gateway_config(token_public_key_pem: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.whitelisted_users = vec!["haa_api".to_string()];
    config.auth.static_password = "s3cr3t".to_string();
    config.auth.token_public_key_pem = token_public_key_pem.to_string();
    config.auth.valid_scopes = vec!["mqtt.connect".to_string()];
    config.auth.service_cn_prefix = "SER-".to_string();
    config.auth.whitelisted_service_cns = vec!["RO".to_string()];
    config.topics.topic_prefix = "oem/vehicles/".to_string();
    config.topics.portal_topics = vec!["notifications".to_string()];
    config
}

/// Flat store carrying the per-device-type topic lists.
pub fn config_store() -> ConfigStore {
    let mut store = ConfigStore::empty();
    store.insert("device.mqtt.publish.topics", "telemetry,events");
    store.insert("device.mqtt.subscribe.topics", "commands");
    store.insert("tcu.device.mqtt.publish.topics", "telemetry/engine");
    store.insert("tcu.device.mqtt.subscribe.topics", "commands/engine");
    store
}

/// Builds the pipeline over the given profile source.
pub fn build_gateway(config: GatewayConfig, profiles: TestProfiles) -> TestGateway {
    let sink = Arc::new(TestSink::default());
    let control = Arc::new(TestControl::default());
    let pipeline = GatewayPipeline::new(
        &config,
        config_store(),
        Arc::new(profiles),
        sink.clone() as Arc<dyn EventSink>,
    )
    .expect("pipeline");
    pipeline.attach_session_control(control.clone() as Arc<dyn SessionControl>);
    TestGateway {
        pipeline,
        sink,
        control,
    }
}

/// Generates an RSA keypair; returns the private key and the public PEM.
pub fn rsa_keypair() -> (RsaPrivateKey, String) {
    let key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("key");
    let public_pem = RsaPublicKey::from(&key)
        .to_pkcs1_pem(Default::default())
        .expect("public pem");
    (key, public_pem)
}

/// Mints an RS256 token over the given claims.
pub fn mint_token(key: &RsaPrivateKey, claims: serde_json::Value) -> String {
    let pem = key.to_pkcs1_pem(Default::default()).expect("private pem");
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_rsa_pem(pem.as_bytes()).expect("enc"),
    )
    .expect("token")
}

/// Self-signed certificate DER with the given CN.
pub fn cert_der(cn: &str) -> Vec<u8> {
    let key = rcgen::KeyPair::generate().expect("key");
    let mut params = rcgen::CertificateParams::default();
    params.distinguished_name = rcgen::DistinguishedName::new();
    params
        .distinguished_name
        .push(rcgen::DnType::CommonName, cn);
    params.self_signed(&key).expect("cert").der().to_vec()
}
