#![allow(dead_code)]

use auth_service::{
    build_router,
    config::{AuthConfig, Environment, JwtConfig, MongoConfig, RoutingConfig, SecurityConfig},
    middleware::PathPolicy,
    models::{BankDetails, ShipmentBankRecord},
    services::{
        AuditService, AuthService, JwtService, MockAuditStore, MockCredentialStore,
        MockRefreshTokenStore, MockRevocationStore, MockShipmentDirectory, TokenResponse,
    },
    AppState,
};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

/// Hermetic test rig: the real router and services over in-memory stores.
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub users: Arc<MockCredentialStore>,
    pub refresh_tokens: Arc<MockRefreshTokenStore>,
    pub revocations: Arc<MockRevocationStore>,
    pub audit_store: Arc<MockAuditStore>,
    pub shipments: Arc<MockShipmentDirectory>,
    pub jwt: JwtService,
}

pub fn test_config(base_path: Option<&str>) -> AuthConfig {
    AuthConfig {
        common: service_core::config::Config { port: 8080 },
        environment: Environment::Dev,
        service_name: "auth-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "unused_in_tests".to_string(),
        },
        jwt: JwtConfig {
            signing_secret: "0123456789abcdef0123456789abcdef".to_string(),
            access_token_expiry_minutes: 1440,
            refresh_token_expiry_days: 30,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        routing: RoutingConfig {
            base_path: base_path.map(|b| b.to_string()),
            public_paths: vec![
                "/health".to_string(),
                "/auth/login".to_string(),
                "/auth/register".to_string(),
                "/auth/refresh".to_string(),
                "/auth/introspect".to_string(),
                "/.well-known/*".to_string(),
            ],
        },
        store_timeout_ms: 5000,
    }
}

pub fn spawn_app(base_path: Option<&str>) -> TestApp {
    let config = test_config(base_path);

    let users = Arc::new(MockCredentialStore::new());
    let refresh_tokens = Arc::new(MockRefreshTokenStore::new());
    let revocations = Arc::new(MockRevocationStore::new());
    let audit_store = Arc::new(MockAuditStore::new());
    let shipments = Arc::new(MockShipmentDirectory::new());

    let audit = AuditService::new(audit_store.clone());
    let jwt = JwtService::new(&config.jwt);
    let auth_service = AuthService::new(
        users.clone(),
        refresh_tokens.clone(),
        revocations.clone(),
        audit.clone(),
        jwt.clone(),
        config.jwt.refresh_token_expiry_days,
    );
    let path_policy = PathPolicy::from_config(&config.routing);

    let state = AppState {
        config,
        jwt: jwt.clone(),
        auth_service,
        audit,
        users: users.clone(),
        refresh_tokens: refresh_tokens.clone(),
        revocations: revocations.clone(),
        shipments: shipments.clone(),
        path_policy,
    };

    let app = build_router(state.clone()).expect("router should build");

    TestApp {
        app,
        state,
        users,
        refresh_tokens,
        revocations,
        audit_store,
        shipments,
        jwt,
    }
}

impl TestApp {
    /// Register a user and log in, returning the issued token pair.
    pub async fn signed_in_user(&self, email: &str, password: &str) -> TokenResponse {
        let (status, _) = self
            .request(
                Method::POST,
                "/auth/register",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        self.state
            .auth_service
            .login(
                serde_json::from_value(
                    serde_json::json!({ "email": email, "password": password }),
                )
                .unwrap(),
                None,
            )
            .await
            .expect("login should succeed")
    }

    pub fn seed_shipment(&self, id: &str, account: &str, ifsc: &str) {
        self.shipments.insert(ShipmentBankRecord {
            id: id.to_string(),
            buyer_bank: BankDetails {
                bank_account: account.to_string(),
                bank_ifsc: ifsc.to_string(),
            },
        });
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
