// Integration tests for Helpdesk Assist
//
// The HTTP surface is exercised end to end; the data backend is a mockito server.

use actix_web::{http::StatusCode, test, web, App};
use helpdesk_assist::core::{Assistant, Matcher};
use helpdesk_assist::routes::{self, AppState, RouteOptions};
use helpdesk_assist::services::{
    AuthClient, BackendClient, BackendTables, ChatClient, Claims, EmailClient, KnowledgeCache,
    TokenVerifier,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use mockito::{Matcher as BodyMatcher, Server, ServerGuard};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const JWT_SECRET: &str = "integration-secret";
const STAFF_EMAIL: &str = "staff@example.com";

const CATEGORIES: &str = r#"[{"id":1,"name":"Netzwerk"},{"id":2,"name":"Drucker"}]"#;
const ENTRIES: &str = r#"[
    {"id":1,"description":"Passwort vergessen","solution":"Über 'Passwort vergessen' zurücksetzen","category_id":1},
    {"id":2,"description":"Login Fehler Passwort","solution":"Feststelltaste prüfen","category_id":1},
    {"id":3,"description":"Drucker offline","solution":"Drucker neu starten","category_id":2}
]"#;

fn create_state(url: &str, chat_key: Option<&str>, options: RouteOptions) -> AppState {
    let backend = BackendClient::new(url.to_string(), "service-key".to_string(), BackendTables::default())
        .unwrap();
    let auth = AuthClient::new(url.to_string(), "service-key".to_string()).unwrap();
    let email = EmailClient::new(url.to_string(), None, "Helpdesk <noreply@test>".to_string()).unwrap();
    let chat = ChatClient::new(
        url.to_string(),
        chat_key.map(str::to_string),
        "gpt-3.5-turbo".to_string(),
        Duration::from_secs(5),
    )
    .unwrap();

    AppState {
        backend: Arc::new(backend),
        auth: Arc::new(auth),
        verifier: Arc::new(TokenVerifier::new(JWT_SECRET, "authenticated")),
        email: Arc::new(email),
        chat: Arc::new(chat),
        cache: Arc::new(KnowledgeCache::new(60)),
        matcher: Matcher::default(),
        assistant: Assistant::default(),
        options,
    }
}

fn staff_token() -> String {
    token_with_email(Some(STAFF_EMAIL))
}

fn token_with_email(email: Option<&str>) -> String {
    let claims = Claims {
        sub: "user-1".to_string(),
        email: email.map(str::to_string),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        aud: Some("authenticated".to_string()),
        role: Some("authenticated".to_string()),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
}

fn ticket_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "name": "Anna Muster",
        "email": "anna@example.com",
        "phone": "0301234567",
        "error_description": "VPN bricht ab",
        "image_url": null,
        "is_read": false,
        "status": status,
        "assigned_to": null
    })
}

async fn mock_knowledge_base(server: &mut ServerGuard) {
    server
        .mock("GET", "/rest/v1/categories")
        .match_query(BodyMatcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(CATEGORIES)
        .create_async()
        .await;
    server
        .mock("GET", "/rest/v1/errors")
        .match_query(BodyMatcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ENTRIES)
        .create_async()
        .await;
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
                .configure(routes::configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health_check() {
    let mut server = Server::new_async().await;
    mock_knowledge_base(&mut server).await;
    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_search_ranks_entries() {
    let mut server = Server::new_async().await;
    mock_knowledge_base(&mut server).await;
    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/search")
        .set_json(json!({ "query": "Passwort" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let entries = body["entries"].as_array().unwrap();

    assert!(body["categories"].as_array().unwrap().is_empty());
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], 1);
    assert_eq!(entries[0]["score"], 3);
    assert_eq!(entries[1]["id"], 2);
    assert_eq!(body["totalCandidates"], 5);
}

#[actix_web::test]
async fn test_search_reports_categories() {
    let mut server = Server::new_async().await;
    mock_knowledge_base(&mut server).await;
    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/search")
        .set_json(json!({ "query": "netzwrk" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["categories"], json!([{ "id": 1, "name": "Netzwerk" }]));
}

#[actix_web::test]
async fn test_search_rejects_blank_query() {
    let server = Server::new_async().await;
    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/search")
        .set_json(json!({ "query": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_malformed_json_is_json_error() {
    let server = Server::new_async().await;
    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/search")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"query\":")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
    assert_eq!(body["status_code"], 400);
}

#[actix_web::test]
async fn test_assistant_conversation() {
    let mut server = Server::new_async().await;
    mock_knowledge_base(&mut server).await;
    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    // Turn 1: greeting
    let req = test::TestRequest::post()
        .uri("/api/v1/assistant/message")
        .set_json(json!({ "message": "Hallo" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["kind"], "greeting");
    assert_eq!(body["state"]["turns"], 1);

    // Turn 2: an entry matches, the assistant offers its solution
    let req = test::TestRequest::post()
        .uri("/api/v1/assistant/message")
        .set_json(json!({ "message": "passwort", "state": body["state"] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["kind"], "solution_offer");
    assert_eq!(body["state"]["awaitingConfirmation"], true);
    assert_eq!(body["state"]["currentError"], "Passwort vergessen");

    // Turn 3: confirmation reveals the solution
    let req = test::TestRequest::post()
        .uri("/api/v1/assistant/message")
        .set_json(json!({ "message": "Ja, bitte", "state": body["state"] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["kind"], "solution_reveal");
    assert!(body["reply"].as_str().unwrap().contains("Über 'Passwort vergessen' zurücksetzen"));
    assert_eq!(body["state"]["awaitingConfirmation"], false);
}

#[actix_web::test]
async fn test_assistant_category_takes_precedence() {
    let mut server = Server::new_async().await;
    mock_knowledge_base(&mut server).await;
    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    // "drucker" matches both the category and entry 3
    let req = test::TestRequest::post()
        .uri("/api/v1/assistant/message")
        .set_json(json!({ "message": "drucker", "state": { "turns": 1 } }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["kind"], "category_clarification");
    assert_eq!(body["state"]["currentCategory"], "Drucker");
}

#[actix_web::test]
async fn test_assistant_llm_fallback() {
    let mut server = Server::new_async().await;
    mock_knowledge_base(&mut server).await;
    let completion = server
        .mock("POST", "/chat/completions")
        .match_body(BodyMatcher::Regex(r#""content":"xyzzy""#.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Antwort vom Modell"}}]}"#)
        .create_async()
        .await;

    let options = RouteOptions {
        llm_fallback: true,
        ..RouteOptions::default()
    };
    let app = init_app!(create_state(&server.url(), Some("sk-test"), options));

    let req = test::TestRequest::post()
        .uri("/api/v1/assistant/message")
        .set_json(json!({ "message": "xyzzy", "state": { "turns": 1 } }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    completion.assert_async().await;
    assert_eq!(body["kind"], "fallback");
    assert_eq!(body["reply"], "Antwort vom Modell");
}

#[actix_web::test]
async fn test_assistant_fallback_without_llm() {
    let mut server = Server::new_async().await;
    mock_knowledge_base(&mut server).await;
    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/assistant/message")
        .set_json(json!({ "message": "konto gesperrt", "state": { "turns": 1 } }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["kind"], "fallback");
    assert_eq!(
        body["reply"],
        "Für Fragen zu Ihrem Konto wenden Sie sich bitte an unseren Support."
    );
}

#[actix_web::test]
async fn test_chat_not_configured() {
    let server = Server::new_async().await;
    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/chat")
        .set_json(json!({ "messages": [{ "role": "user", "content": "Hallo" }] }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn test_staff_routes_require_token() {
    let server = Server::new_async().await;
    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::get().uri("/api/v1/tickets").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/tickets")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_create_ticket() {
    let mut server = Server::new_async().await;
    let insert = server
        .mock("POST", "/rest/v1/support_tickets")
        .match_body(BodyMatcher::PartialJsonString(
            r#"{"error_description":"VPN bricht ab","image_url":"https://cdn.test/a.png,https://cdn.test/b.png"}"#
                .to_string(),
        ))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!([ticket_json(7, "new")]).to_string())
        .create_async()
        .await;
    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/tickets")
        .set_json(json!({
            "name": "Anna Muster",
            "email": "anna@example.com",
            "phone": "030 123 4567",
            "description": "VPN bricht ab",
            "imageUrls": ["https://cdn.test/a.png", "https://cdn.test/b.png"]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    insert.assert_async().await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn test_create_ticket_rejects_short_phone() {
    let server = Server::new_async().await;
    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/tickets")
        .set_json(json!({
            "name": "Anna Muster",
            "email": "anna@example.com",
            "phone": "12-34",
            "description": "VPN bricht ab"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_take_over_ticket() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/support_tickets")
        .match_query(BodyMatcher::UrlEncoded("id".into(), "eq.7".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([ticket_json(7, "new")]).to_string())
        .create_async()
        .await;

    let mut updated = ticket_json(7, "inProgress");
    updated["assigned_to"] = json!(STAFF_EMAIL);
    let patch = server
        .mock("PATCH", "/rest/v1/support_tickets")
        .match_query(BodyMatcher::UrlEncoded("id".into(), "eq.7".into()))
        .match_body(BodyMatcher::PartialJsonString(
            r#"{"status":"inProgress","assigned_to":"staff@example.com"}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([updated]).to_string())
        .create_async()
        .await;

    let comment = server
        .mock("POST", "/rest/v1/ticket_comments")
        .match_body(BodyMatcher::PartialJsonString(
            r#"{"ticket_id":7,"text":"Ticket übernommen von staff@example.com"}"#.to_string(),
        ))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{
                "id": 1,
                "ticket_id": 7,
                "text": "Ticket übernommen von staff@example.com",
                "author": STAFF_EMAIL
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/tickets/7/take-over")
        .insert_header(("Authorization", format!("Bearer {}", staff_token())))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;

    patch.assert_async().await;
    comment.assert_async().await;
    assert_eq!(body["ticket"]["status"], "inProgress");
    assert_eq!(body["comment"]["author"], STAFF_EMAIL);
    // No email API key in tests: the notification fails without failing the request
    assert_eq!(body["emailSent"], false);
    assert_eq!(body["emailError"], "Email sending is not configured");
}

#[actix_web::test]
async fn test_completed_ticket_cannot_be_taken_over() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/support_tickets")
        .match_query(BodyMatcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([ticket_json(7, "completed")]).to_string())
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", "/rest/v1/support_tickets")
        .match_query(BodyMatcher::Any)
        .expect(0)
        .create_async()
        .await;

    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    for action in ["take-over", "complete"] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/tickets/7/{}", action))
            .insert_header(("Authorization", format!("Bearer {}", staff_token())))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT, "{}", action);
    }

    patch.assert_async().await;
}

#[actix_web::test]
async fn test_missing_ticket_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/support_tickets")
        .match_query(BodyMatcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/tickets/99/complete")
        .insert_header(("Authorization", format!("Bearer {}", staff_token())))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_entry_feedback_bumps_counter() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/errors")
        .match_query(BodyMatcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id":3,"description":"Drucker offline","solution":"Neu starten","helpful_count":4,"not_helpful_count":1}]"#)
        .create_async()
        .await;
    let vote = server
        .mock("POST", "/rest/v1/error_feedback")
        .match_body(BodyMatcher::PartialJsonString(r#"{"error_id":3,"is_helpful":true}"#.to_string()))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"error_id":3,"is_helpful":true}]"#)
        .create_async()
        .await;
    let counter = server
        .mock("PATCH", "/rest/v1/errors")
        .match_query(BodyMatcher::UrlEncoded("id".into(), "eq.3".into()))
        .match_body(BodyMatcher::PartialJsonString(r#"{"helpful_count":5}"#.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id":3,"description":"Drucker offline","solution":"Neu starten","helpful_count":5,"not_helpful_count":1}]"#)
        .create_async()
        .await;

    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/entries/3/feedback")
        .set_json(json!({ "helpful": true }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    vote.assert_async().await;
    counter.assert_async().await;
    assert_eq!(body["helpful_count"], 5);
}

#[actix_web::test]
async fn test_entry_photo_upload_size_limit() {
    let server = Server::new_async().await;
    let options = RouteOptions {
        max_upload_bytes: 8,
        ..RouteOptions::default()
    };
    let app = init_app!(create_state(&server.url(), None, options));

    let req = test::TestRequest::post()
        .uri("/api/v1/entries/3/photos?filename=screenshot.png")
        .insert_header(("Authorization", format!("Bearer {}", staff_token())))
        .insert_header(("content-type", "image/png"))
        .set_payload(vec![0u8; 16])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[actix_web::test]
async fn test_create_evaluation_rejects_rating_out_of_range() {
    let server = Server::new_async().await;
    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/evaluations")
        .insert_header(("Authorization", format!("Bearer {}", staff_token())))
        .set_json(json!({
            "agentId": 4,
            "evaluatedAt": "2024-05-02",
            "results": [{ "criteriaId": 1, "isOk": false, "rating": 9 }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_token_without_email_is_rejected() {
    let mut server = Server::new_async().await;
    let lookup = server
        .mock("GET", "/rest/v1/support_tickets")
        .match_query(BodyMatcher::Any)
        .expect(0)
        .create_async()
        .await;

    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/tickets/7/take-over")
        .insert_header(("Authorization", format!("Bearer {}", token_with_email(None))))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    lookup.assert_async().await;
}

#[actix_web::test]
async fn test_delete_category_with_entries_is_conflict() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/errors")
        .match_query(BodyMatcher::UrlEncoded("category_id".into(), "eq.1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("content-range", "0-0/2")
        .with_body(r#"[{"id":1}]"#)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/rest/v1/categories")
        .match_query(BodyMatcher::Any)
        .expect(0)
        .create_async()
        .await;

    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::delete()
        .uri("/api/v1/categories/1")
        .insert_header(("Authorization", format!("Bearer {}", staff_token())))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    delete.assert_async().await;
}

#[actix_web::test]
async fn test_delete_empty_category_refreshes_search() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/errors")
        .match_query(BodyMatcher::UrlEncoded("category_id".into(), "eq.2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("content-range", "*/0")
        .with_body("[]")
        .create_async()
        .await;
    server
        .mock("GET", "/rest/v1/errors")
        .match_query(BodyMatcher::UrlEncoded("order".into(), "id.asc".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ENTRIES)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/rest/v1/categories")
        .match_query(BodyMatcher::UrlEncoded("id".into(), "eq.2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id":2,"name":"Drucker"}]"#)
        .create_async()
        .await;
    let categories = server
        .mock("GET", "/rest/v1/categories")
        .match_query(BodyMatcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(CATEGORIES)
        .expect(2)
        .create_async()
        .await;

    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let list = || test::TestRequest::get().uri("/api/v1/categories").to_request();
    let _: Value = test::call_and_read_body_json(&app, list()).await;

    let req = test::TestRequest::delete()
        .uri("/api/v1/categories/2")
        .insert_header(("Authorization", format!("Bearer {}", staff_token())))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let _: Value = test::call_and_read_body_json(&app, list()).await;

    delete.assert_async().await;
    categories.assert_async().await;
}

#[actix_web::test]
async fn test_rename_category() {
    let mut server = Server::new_async().await;
    let patch = server
        .mock("PATCH", "/rest/v1/categories")
        .match_query(BodyMatcher::UrlEncoded("id".into(), "eq.2".into()))
        .match_body(BodyMatcher::PartialJson(json!({
            "name": "Drucker & Scanner",
            "last_edited_by": STAFF_EMAIL
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id":2,"name":"Drucker & Scanner"}]"#)
        .create_async()
        .await;

    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::patch()
        .uri("/api/v1/categories/2")
        .insert_header(("Authorization", format!("Bearer {}", staff_token())))
        .set_json(json!({ "name": "  Drucker & Scanner " }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    patch.assert_async().await;
    assert_eq!(body["name"], "Drucker & Scanner");
}

#[actix_web::test]
async fn test_agent_lifecycle() {
    let mut server = Server::new_async().await;
    let agent = r#"[{"id":4,"first_name":"Max","last_name":"Muster","email":"max@example.com","agent_id":"A-17"}]"#;
    let create = server
        .mock("POST", "/rest/v1/agents")
        .match_body(BodyMatcher::PartialJson(json!({ "agent_id": "A-17", "first_name": "Max" })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(agent)
        .create_async()
        .await;
    let update = server
        .mock("PATCH", "/rest/v1/agents")
        .match_query(BodyMatcher::UrlEncoded("id".into(), "eq.4".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(agent)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/rest/v1/agents")
        .match_query(BodyMatcher::UrlEncoded("id".into(), "eq.4".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(agent)
        .create_async()
        .await;

    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));
    let body = json!({
        "firstName": "Max",
        "lastName": "Muster",
        "email": "max@example.com",
        "agentId": "A-17"
    });

    let req = test::TestRequest::post()
        .uri("/api/v1/agents")
        .insert_header(("Authorization", format!("Bearer {}", staff_token())))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::patch()
        .uri("/api/v1/agents/4")
        .insert_header(("Authorization", format!("Bearer {}", staff_token())))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::delete()
        .uri("/api/v1/agents/4")
        .insert_header(("Authorization", format!("Bearer {}", staff_token())))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    create.assert_async().await;
    update.assert_async().await;
    delete.assert_async().await;
}

#[actix_web::test]
async fn test_create_agent_rejects_invalid_email() {
    let server = Server::new_async().await;
    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/agents")
        .insert_header(("Authorization", format!("Bearer {}", staff_token())))
        .set_json(json!({
            "firstName": "Max",
            "lastName": "Muster",
            "email": "max.example.com",
            "agentId": "A-17"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_list_evaluations_newest_first() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/rest/v1/evaluations")
        .match_query(BodyMatcher::UrlEncoded("order".into(), "evaluated_at.desc".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[
                {"id":9,"agent_id":4,"evaluated_at":"2024-05-02","evaluator":"lead@example.com",
                 "agents":{"first_name":"Max","last_name":"Muster","agent_id":"A-17"}},
                {"id":3,"agent_id":5,"evaluated_at":"2024-04-11","evaluator":"lead@example.com",
                 "agents":null}
            ]"#,
        )
        .create_async()
        .await;

    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::get()
        .uri("/api/v1/evaluations")
        .insert_header(("Authorization", format!("Bearer {}", staff_token())))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    list.assert_async().await;
    assert_eq!(body[0]["id"], 9);
    assert_eq!(body[0]["agent"]["agent_id"], "A-17");
    assert!(body[1]["agent"].is_null());
}

#[actix_web::test]
async fn test_evaluation_detail_joins_criteria() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/evaluations")
        .match_query(BodyMatcher::UrlEncoded("id".into(), "eq.9".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r##"[{"id":9,"agent_id":4,"evaluated_at":"2024-05-02","evaluator":"lead@example.com",
                 "agents":{"first_name":"Max","last_name":"Muster","agent_id":"A-17"},
                 "evaluation_results":[
                    {"criteria_id":1,"is_ok":true,"rating":4,"notes":null,
                     "evaluation_criteria":{"name":"Begrüßung","category":"Gespräch","background_color":"#e0f2fe"}}
                 ]}]"##,
        )
        .create_async()
        .await;

    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::get()
        .uri("/api/v1/evaluations/9")
        .insert_header(("Authorization", format!("Bearer {}", staff_token())))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["id"], 9);
    assert_eq!(body["agent"]["last_name"], "Muster");
    assert_eq!(body["results"][0]["rating"], 4);
    assert_eq!(body["results"][0]["criteria"]["name"], "Begrüßung");
}

#[actix_web::test]
async fn test_ticket_counts() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/support_tickets")
        .match_query(BodyMatcher::UrlEncoded("is_read".into(), "eq.false".into()))
        .match_header("prefer", "count=exact")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("content-range", "0-0/3")
        .with_body(r#"[{"id":1}]"#)
        .create_async()
        .await;
    server
        .mock("GET", "/rest/v1/support_tickets")
        .match_query(BodyMatcher::UrlEncoded("status".into(), "eq.new".into()))
        .match_header("prefer", "count=exact")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("content-range", "0-0/2")
        .with_body(r#"[{"id":1}]"#)
        .create_async()
        .await;

    let app = init_app!(create_state(&server.url(), None, RouteOptions::default()));

    let req = test::TestRequest::get()
        .uri("/api/v1/tickets/counts")
        .insert_header(("Authorization", format!("Bearer {}", staff_token())))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!({ "unread": 3, "new": 2 }));
}
