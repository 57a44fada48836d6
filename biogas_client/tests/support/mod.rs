#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use biogas_client::{
    ApiClient, ClientConfig, LoginTokens, MemoryTokenStore, RefreshFailure, SessionContext,
    SessionObserver,
};
use serde_json::{Value, json};
use wiremock::MockServer;

pub const REFRESH_PATH: &str = "/api/refrescar-token/";

pub fn init_logging() {
    let _ = pretty_env_logger::formatted_builder()
        .is_test(true)
        .try_init();
}

#[derive(Default)]
pub struct RecordingObserver {
    reasons: Mutex<Vec<RefreshFailure>>,
}

impl RecordingObserver {
    pub fn reasons(&self) -> Vec<RefreshFailure> {
        self.reasons.lock().expect("observer lock").clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_session_expired(&self, reason: &RefreshFailure) {
        self.reasons.lock().expect("observer lock").push(reason.clone());
    }
}

pub struct Harness {
    pub server: MockServer,
    pub client: ApiClient,
    pub session: SessionContext,
    pub observer: Arc<RecordingObserver>,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with_timeout(Some(Duration::from_secs(30))).await
    }

    pub async fn start_with_timeout(timeout: Option<Duration>) -> Self {
        init_logging();
        let server = MockServer::start().await;
        let session = SessionContext::from_store(MemoryTokenStore::new());
        let observer = Arc::new(RecordingObserver::default());
        let mut config = ClientConfig::new(server.uri());
        config.timeout = timeout;
        let client = ApiClient::with_observer(&config, session.clone(), observer.clone())
        .expect("client should build against the mock server");

        Self {
            server,
            client,
            session,
            observer,
        }
    }

    pub fn sign_in(&self, access: &str, refresh: Option<&str>) {
        self.session
            .begin(&LoginTokens {
                access: access.to_owned(),
                refresh: refresh.map(ToOwned::to_owned),
                user: None,
            })
            .expect("seeding the session should succeed");
    }

    pub async fn requests_to(&self, path: &str) -> Vec<wiremock::Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == path)
            .collect()
    }
}

pub fn user_json(id: u64, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.org"),
        "first_name": "Ana",
        "last_name": "Rojas",
        "perfil": {
            "aprobado": true,
            "rol": "ADMIN",
            "permisos": {"VerDashboard": true, "AprobarUsuarios": true}
        }
    })
}

pub fn sensor_json(id: u64) -> Value {
    json!({
        "id": id,
        "name": "Presión",
        "topic": "biodigestor/presion",
        "unit": "hPa",
        "threshold_min": null,
        "threshold_max": 1200.0,
        "color": "#00aa00",
        "icon": "gauge",
        "room": "Planta",
        "is_active": true,
        "created_at": "2025-01-10T08:00:00Z",
        "updated_at": "2025-01-10T08:00:00Z"
    })
}
