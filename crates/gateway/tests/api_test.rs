//! End-to-end HTTP tests against the full router and an in-memory database.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;

use common::{DatabaseConfig, JwtConfig};
use domain::UserRole;
use gateway_lib::config::GatewayConfig;
use gateway_lib::routes::create_router;
use gateway_lib::state::AppState;
use workshop_service_lib::config::{SweepConfig, WorkshopServiceConfig};
use workshop_service_lib::infra::Database;
use workshop_service_lib::repository::{UserRepository, UserStore};

const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

struct TestApp {
    state: AppState,
    db: Database,
}

impl TestApp {
    async fn new() -> Self {
        let database = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        };
        let db = Database::connect(&database).await.unwrap();
        let workshop = WorkshopServiceConfig {
            database,
            jwt: JwtConfig::new(SECRET, 1).unwrap(),
            sweep: SweepConfig::default(),
        };
        let state = gateway_lib::build_state(db.clone(), &workshop, GatewayConfig::default());

        Self { state, db }
    }

    fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn register(&self, name: &str, phone: Option<&str>) -> (String, Value) {
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/auth/register",
                None,
                json!({
                    "name": name,
                    "email": format!("{}@example.com", name.to_lowercase()),
                    "password": "SecurePass123!",
                    "phone": phone,
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (body["token"].as_str().unwrap().to_string(), body["user"].clone())
    }

    /// Register, promote to admin, and sign in again for a token with the new role.
    async fn operator(&self, name: &str) -> String {
        let (_, user) = self.register(name, None).await;
        let id = user["id"].as_str().unwrap().parse().unwrap();
        UserStore::new(self.db.get_connection())
            .update_role(id, UserRole::Admin)
            .await
            .unwrap();

        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/auth/login",
                None,
                json!({
                    "email": format!("{}@example.com", name.to_lowercase()),
                    "password": "SecurePass123!",
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn vehicle(&self, token: &str, plate: &str) -> Value {
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/vehicles",
                Some(token),
                json!({ "make": "Honda", "model": "Civic", "year": 2019, "licensePlate": plate }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_database_and_subscribers() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["database"]["status"], "healthy");
    assert_eq!(body["subscribers"], 0);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new().await;

    for uri in ["/services", "/vehicles", "/auth/me"] {
        let (status, body) = app
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let app = TestApp::new().await;
    let (status, _) = app.send(get("/services", "not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let app = TestApp::new().await;
    let (token, user) = app.register("Jane", Some("555-0100")).await;
    assert_eq!(user["role"], "user");
    assert_eq!(user["phone"], "555-0100");

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/auth/login",
            None,
            json!({ "email": "JANE@example.com", "password": "SecurePass123!" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "Bearer");

    let (status, body) = app.send(get("/auth/me", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "jane@example.com");
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.register("Jane", None).await;

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/auth/login",
            None,
            json!({ "email": "jane@example.com", "password": "wrong-password" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    app.register("Jane", None).await;

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/auth/register",
            None,
            json!({ "name": "Jane", "email": "jane@example.com", "password": "SecurePass123!" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_validation_error_shape() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/auth/register",
            None,
            json!({ "name": "Jane", "email": "not-an-email", "password": "short" }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_legacy_token_header_is_accepted() {
    let app = TestApp::new().await;
    let (token, _) = app.register("Jane", None).await;

    let request = Request::builder()
        .uri("/vehicles")
        .header("x-auth-token", token)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_customer_books_own_vehicle() {
    let app = TestApp::new().await;
    let (token, user) = app.register("Jane", Some("555-0100")).await;
    let vehicle = app.vehicle(&token, "ka01ab1234").await;
    assert_eq!(vehicle["licensePlate"], "KA01AB1234");

    let (status, record) = app
        .send(json_request(
            Method::POST,
            "/services",
            Some(&token),
            json!({ "vehicleId": vehicle["id"], "description": "Oil change", "estimatedCost": 80.0 }),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{record}");
    assert_eq!(record["status"], "pending");
    assert_eq!(record["ownerUserId"], user["id"]);
    assert_eq!(record["customerName"], "Jane");
    assert_eq!(record["customerContact"], "555-0100");
    assert_eq!(record["vehicle"]["licensePlate"], "KA01AB1234");

    let (status, list) = app.send(get("/services", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_customer_cannot_book_foreign_vehicle() {
    let app = TestApp::new().await;
    let (owner, _) = app.register("Jane", None).await;
    let (other, _) = app.register("Bob", None).await;
    let vehicle = app.vehicle(&owner, "KA01AB1234").await;

    let (status, _) = app
        .send(json_request(
            Method::POST,
            "/services",
            Some(&other),
            json!({ "vehicleId": vehicle["id"] }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_customer_cannot_assign_by_plate() {
    let app = TestApp::new().await;
    let (token, _) = app.register("Jane", None).await;

    let (status, _) = app
        .send(json_request(
            Method::POST,
            "/services",
            Some(&token),
            json!({ "licensePlate": "KA01AB1234", "make": "Honda", "model": "Civic" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_operator_assigns_known_plate_to_owner() {
    let app = TestApp::new().await;
    let (customer, user) = app.register("Jane", Some("555-0100")).await;
    app.vehicle(&customer, "KA01AB1234").await;
    let operator = app.operator("Ops").await;

    let (status, record) = app
        .send(json_request(
            Method::POST,
            "/services",
            Some(&operator),
            json!({
                "licensePlate": "ka01ab1234",
                "make": "Honda",
                "model": "Civic",
                "customerName": "Walk-in",
                "customerContact": "555-9999",
                "type": "in-progress"
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED, "{record}");
    assert_eq!(record["ownerUserId"], user["id"]);
    assert_eq!(record["customerName"], "Jane");
    assert_eq!(record["status"], "in-progress");
}

#[tokio::test]
async fn test_operator_assignment_requires_plate_fields() {
    let app = TestApp::new().await;
    let operator = app.operator("Ops").await;

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/services",
            Some(&operator),
            json!({ "licensePlate": "KA01AB1234" }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("make"), "{message}");
}

#[tokio::test]
async fn test_status_change_is_operator_only() {
    let app = TestApp::new().await;
    let (customer, _) = app.register("Jane", None).await;
    let vehicle = app.vehicle(&customer, "KA01AB1234").await;
    let (_, record) = app
        .send(json_request(
            Method::POST,
            "/services",
            Some(&customer),
            json!({ "vehicleId": vehicle["id"] }),
        ))
        .await;
    let uri = format!("/services/{}/status", record["id"].as_str().unwrap());

    let (status, _) = app
        .send(json_request(
            Method::PATCH,
            &uri,
            Some(&customer),
            json!({ "status": "ready-for-pickup" }),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let operator = app.operator("Ops").await;
    let (status, updated) = app
        .send(json_request(
            Method::PATCH,
            &uri,
            Some(&operator),
            json!({ "status": "ready-for-pickup" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "ready-for-pickup");

    let (status, _) = app
        .send(json_request(
            Method::PATCH,
            &uri,
            Some(&operator),
            json!({ "status": "bogus" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_operator_update_and_worklist_filters() {
    let app = TestApp::new().await;
    let (customer, _) = app.register("Jane", None).await;
    let vehicle = app.vehicle(&customer, "KA01AB1234").await;
    let operator = app.operator("Ops").await;

    let mut ids = Vec::new();
    for _ in 0..2 {
        let (_, record) = app
            .send(json_request(
                Method::POST,
                "/services",
                Some(&customer),
                json!({ "vehicleId": vehicle["id"] }),
            ))
            .await;
        ids.push(record["id"].as_str().unwrap().to_string());
    }

    let (status, updated) = app
        .send(json_request(
            Method::PUT,
            &format!("/services/{}", ids[0]),
            Some(&operator),
            json!({
                "status": "picked-up",
                "partsUsed": [{ "partName": "Brake pad", "quantity": 2, "unitCost": 25.5 }],
                "totalBill": 51.0
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["partsUsed"][0]["partName"], "Brake pad");

    let (_, default_view) = app.send(get("/services", &operator)).await;
    assert_eq!(default_view.as_array().unwrap().len(), 1);

    let (_, everything) = app
        .send(get("/services?includePickedUp=true", &operator))
        .await;
    assert_eq!(everything.as_array().unwrap().len(), 2);

    let (_, worklist) = app
        .send(get("/services?forAdminCurrentView=true", &operator))
        .await;
    assert_eq!(worklist.as_array().unwrap().len(), 1);
    assert_eq!(worklist[0]["id"], ids[1].as_str());
}

#[tokio::test]
async fn test_update_unknown_record_is_not_found() {
    let app = TestApp::new().await;
    let operator = app.operator("Ops").await;

    let (status, body) = app
        .send(json_request(
            Method::PUT,
            &format!("/services/{}", uuid::Uuid::new_v4()),
            Some(&operator),
            json!({ "description": "Anything" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_vehicle_delete_by_non_owner_is_forbidden() {
    let app = TestApp::new().await;
    let (owner, _) = app.register("Jane", None).await;
    let (other, _) = app.register("Bob", None).await;
    let vehicle = app.vehicle(&owner, "KA01AB1234").await;
    let uri = format!("/vehicles/{}", vehicle["id"].as_str().unwrap());

    let request = |token: &str| {
        Request::builder()
            .method(Method::DELETE)
            .uri(&uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = app.send(request(&other)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(request(&owner)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_service_writes_reach_event_subscribers() {
    let app = TestApp::new().await;
    let mut events = app.state.hub.subscribe();
    let (token, _) = app.register("Jane", None).await;
    let vehicle = app.vehicle(&token, "KA01AB1234").await;

    let (_, record) = app
        .send(json_request(
            Method::POST,
            "/services",
            Some(&token),
            json!({ "vehicleId": vehicle["id"] }),
        ))
        .await;

    let event = assert_ok!(events.try_recv());
    assert_eq!(event.event, "serviceUpdate");
    assert_eq!(event.data.id.to_string(), record["id"].as_str().unwrap());
    assert_err!(events.try_recv());
}

#[tokio::test]
async fn test_event_stream_requires_token() {
    let app = TestApp::new().await;
    let (status, _) = app
        .send(Request::builder().uri("/events").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/services"].is_object());
}
