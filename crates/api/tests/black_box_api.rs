use std::sync::Arc;

use quizdesk_core::RecordId;
use quizdesk_infra::{InMemoryStore, PaginationConfig, Store};
use quizdesk_schema::{Answer, Question};
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
    // Questions have no collection route; tests seed them here.
    store: Arc<dyn Store>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(PaginationConfig::default()).await
    }

    async fn spawn_with(pagination: PaginationConfig) -> Self {
        // Same router as prod, in-memory store, ephemeral port.
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let app = quizdesk_api::app::build_app(store.clone(), pagination)
            .expect("route table must compile");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            handle,
            store,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn post(client: &reqwest::Client, url: String, body: Value) -> (StatusCode, Value) {
    let res = client.post(url).json(&body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap_or(Value::Null))
}

async fn get(client: &reqwest::Client, url: String) -> (StatusCode, Value) {
    let res = client.get(url).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap_or(Value::Null))
}

async fn create(client: &reqwest::Client, srv: &TestServer, plural: &str, singular: &str, body: Value) -> Value {
    let (status, created) = post(client, srv.url(&format!("/api/v1/{plural}")), body).await;
    assert_eq!(status, StatusCode::CREATED, "create {plural}: {created}");
    created[format!("new_{singular}")].clone()
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

fn record_id(value: &Value) -> RecordId {
    id_of(value).parse().unwrap()
}

async fn seed_question(srv: &TestServer, subject: &Value, text: &str) -> Question {
    srv.store
        .insert_model(Question::new(text, record_id(subject)).unwrap())
        .await
        .unwrap()
}

async fn seed_answer(srv: &TestServer, question: &Question, text: &str, is_correct: bool) -> Answer {
    srv.store
        .insert_model(Answer::new(text, is_correct, question.id))
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn student_create_list_and_rename() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/v1/students"))
        .json(&json!({ "name": "Ivanov" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res
        .headers()
        .get(reqwest::header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["new_student"]["name"], "Ivanov");
    let id = id_of(&body["new_student"]);
    // Student detail only takes PATCH, so there is nothing to point at.
    assert_eq!(location, None);

    let (status, listed) = get(&client, srv.url("/api/v1/students")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["students"][0]["name"], "Ivanov");

    let res = client
        .patch(srv.url(&format!("/api/v1/students/{id}")))
        .json(&json!({ "name": "Petrov" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["student"]["name"], "Petrov");
    assert_eq!(body["student"]["id"], id);
}

#[tokio::test]
async fn student_update_of_missing_record_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let missing = uuid::Uuid::now_v7();
    let res = client
        .patch(srv.url(&format!("/api/v1/students/{missing}")))
        .json(&json!({ "name": "Petrov" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn subject_round_trip_update_and_delete() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/v1/subjects"))
        .json(&json!({ "title": "Algebra" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res
        .headers()
        .get(reqwest::header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let body: Value = res.json().await.unwrap();
    let subject = body["new_subject"].clone();
    let id = id_of(&subject);
    assert_eq!(location.as_deref(), Some(format!("/api/v1/subjects/{id}").as_str()));
    let detail = srv.url(&format!("/api/v1/subjects/{id}"));

    let (status, fetched) = get(&client, detail.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["subject"], subject);

    let res = client
        .put(detail.clone())
        .json(&json!({ "title": "Geometry" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["subject"]["title"], "Geometry");

    // PUT requires every writable field.
    let res = client.put(detail.clone()).json(&json!({})).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.delete(detail.clone()).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(res.bytes().await.unwrap().is_empty());

    let (status, _) = get(&client, detail.clone()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let res = client.delete(detail).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_subject_cascades() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let subject = create(&client, &srv, "subjects", "subject", json!({ "title": "Physics" })).await;
    let other = create(&client, &srv, "subjects", "subject", json!({ "title": "Biology" })).await;
    let student = create(&client, &srv, "students", "student", json!({ "name": "Sidorov" })).await;

    let attempt = create(
        &client,
        &srv,
        "attempts",
        "attempt",
        json!({ "student": id_of(&student), "subject": id_of(&subject), "date": "2024-03-01", "result": 75 }),
    )
    .await;
    let kept_attempt = create(
        &client,
        &srv,
        "attempts",
        "attempt",
        json!({ "student": id_of(&student), "subject": id_of(&other), "date": "2024-03-02", "result": 90 }),
    )
    .await;

    let question = seed_question(&srv, &subject, "What is inertia?").await;
    let kept_question = seed_question(&srv, &other, "What is a cell?").await;
    let answer = seed_answer(&srv, &question, "Resistance to change of motion", true).await;
    seed_answer(&srv, &kept_question, "The unit of life", true).await;

    let testing = create(
        &client,
        &srv,
        "testings",
        "testing",
        json!({ "attempt": id_of(&attempt), "question": question.id.to_string(), "answer": answer.id.to_string() }),
    )
    .await;

    let res = client
        .delete(srv.url(&format!("/api/v1/subjects/{}", id_of(&subject))))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let (_, attempts) = get(&client, srv.url("/api/v1/attempts")).await;
    assert_eq!(attempts["count"], 1);
    assert_eq!(attempts["attempts"][0]["id"], id_of(&kept_attempt));

    let (status, _) = get(&client, srv.url(&format!("/api/v1/questions/{}", question.id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&client, srv.url(&format!("/api/v1/questions/{}", kept_question.id))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, answers) = get(&client, srv.url("/api/v1/answers")).await;
    assert_eq!(answers["count"], 1);
    assert_eq!(answers["answers"][0]["text"], "The unit of life");

    let (status, _) = get(&client, srv.url(&format!("/api/v1/testings/{}", id_of(&testing)))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The student itself is untouched.
    let (_, students) = get(&client, srv.url("/api/v1/students")).await;
    assert_eq!(students["count"], 1);
}

#[tokio::test]
async fn question_partial_update_keeps_other_fields() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let subject = create(&client, &srv, "subjects", "subject", json!({ "title": "Logic" })).await;
    let question = seed_question(&srv, &subject, "Is this statement false?").await;

    let res = client
        .patch(srv.url(&format!("/api/v1/questions/{}", question.id)))
        .json(&json!({ "text": "Is this statement true?", "id": "ignored" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["question"]["text"], "Is this statement true?");
    assert_eq!(body["question"]["subject"], id_of(&subject));
    assert_eq!(body["question"]["id"], question.id.to_string());
}

#[tokio::test]
async fn list_is_paginated() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for i in 0..10 {
        create(&client, &srv, "subjects", "subject", json!({ "title": format!("Subject {i}") })).await;
    }

    let (status, page) = get(&client, srv.url("/api/v1/subjects?page_size=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 10);
    assert_eq!(page["num_pages"], 4);
    assert_eq!(page["next"], 2);
    assert_eq!(page["previous"], Value::Null);
    assert_eq!(page["subjects"].as_array().unwrap().len(), 3);
    assert_eq!(page["subjects"][0]["title"], "Subject 0");

    let (_, last) = get(&client, srv.url("/api/v1/subjects?page_size=3&page=4")).await;
    assert_eq!(last["subjects"].as_array().unwrap().len(), 1);
    assert_eq!(last["subjects"][0]["title"], "Subject 9");

    let (status, body) = get(&client, srv.url("/api/v1/subjects?page=99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Invalid page.");

    // Default page size.
    let (_, first) = get(&client, srv.url("/api/v1/subjects")).await;
    assert_eq!(first["page_size"], 5);
    assert_eq!(first["subjects"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn configured_page_size_applies() {
    let srv = TestServer::spawn_with(PaginationConfig {
        page_size: 2,
        max_page_size: 4,
    })
    .await;
    let client = reqwest::Client::new();

    for i in 0..5 {
        create(&client, &srv, "students", "student", json!({ "name": format!("S{i}") })).await;
    }

    let (_, page) = get(&client, srv.url("/api/v1/students")).await;
    assert_eq!(page["page_size"], 2);
    assert_eq!(page["num_pages"], 3);

    let (_, capped) = get(&client, srv.url("/api/v1/students?page_size=100")).await;
    assert_eq!(capped["page_size"], 4);
}

#[tokio::test]
async fn empty_collection_has_a_first_page() {
    let srv = TestServer::spawn().await;
    let (status, page) = get(&reqwest::Client::new(), srv.url("/api/v1/answers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 0);
    assert_eq!(page["answers"], json!([]));
}

#[tokio::test]
async fn validation_errors_are_reported_per_field() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = post(&client, srv.url("/api/v1/students"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["fields"]["name"][0], "This field is required.");

    let (status, body) = post(
        &client,
        srv.url("/api/v1/subjects"),
        json!({ "title": "x".repeat(256) }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["fields"]["title"][0],
        "Ensure this field has no more than 255 characters."
    );

    let res = client
        .post(srv.url("/api/v1/students"))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{\"name\":")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Nothing was persisted.
    let (_, students) = get(&client, srv.url("/api/v1/students")).await;
    assert_eq!(students["count"], 0);
}

#[tokio::test]
async fn dangling_references_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let student = create(&client, &srv, "students", "student", json!({ "name": "Orlov" })).await;
    let ghost = uuid::Uuid::now_v7().to_string();

    let (status, body) = post(
        &client,
        srv.url("/api/v1/attempts"),
        json!({ "student": id_of(&student), "subject": ghost, "date": "2024-01-15", "result": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["fields"]["subject"][0],
        format!("Invalid pk \"{ghost}\" - object does not exist.")
    );
    assert!(body["fields"].get("student").is_none());
}

#[tokio::test]
async fn malformed_lookup_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/api/v1/subjects/42", "/api/v1/questions/not-an-id", "/api/v1/testings/1"] {
        let (status, body) = get(&client, srv.url(path)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(body["error"], "not_found");
    }
}

#[tokio::test]
async fn unsupported_verbs_are_not_routed() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/api/v1/questions")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let id = uuid::Uuid::now_v7();
    let res = client
        .get(srv.url(&format!("/api/v1/answers/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(srv.url(&format!("/api/v1/students/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn random_subject() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = get(&client, srv.url("/api/v1/subjects/random")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let a = create(&client, &srv, "subjects", "subject", json!({ "title": "History" })).await;
    let b = create(&client, &srv, "subjects", "subject", json!({ "title": "Music" })).await;

    for _ in 0..5 {
        let (status, body) = get(&client, srv.url("/api/v1/subjects/random")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["subject"] == a || body["subject"] == b, "{body}");
    }
}

#[tokio::test]
async fn testing_records_link_attempts_questions_and_answers() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let subject = create(&client, &srv, "subjects", "subject", json!({ "title": "Chemistry" })).await;
    let student = create(&client, &srv, "students", "student", json!({ "name": "Kuznetsov" })).await;
    let attempt = create(
        &client,
        &srv,
        "attempts",
        "attempt",
        json!({ "student": id_of(&student), "subject": id_of(&subject), "date": "2024-05-20", "result": 3 }),
    )
    .await;

    // No question exists yet, so the testing is refused.
    let ghost = uuid::Uuid::now_v7().to_string();
    let (status, body) = post(
        &client,
        srv.url("/api/v1/testings"),
        json!({ "attempt": id_of(&attempt), "question": ghost, "answer": ghost }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["question"].is_array());
    assert!(body["fields"]["answer"].is_array());
    assert!(body["fields"].get("attempt").is_none());
}

#[tokio::test]
async fn route_table_is_listed() {
    let srv = TestServer::spawn().await;
    let (status, body) = get(&reqwest::Client::new(), srv.url("/api/v1/routes")).await;
    assert_eq!(status, StatusCode::OK);

    let routes = body["routes"].as_array().unwrap();
    assert_eq!(routes.len(), 24);
    assert!(routes.iter().any(|r| r["name"] == "subject-random"
        && r["verb"] == "GET"
        && r["path"] == "/api/v1/subjects/random"
        && r["action"] == "random"
        && r["detail"] == false));
    assert!(routes.iter().any(|r| r["name"] == "student-detail"
        && r["verb"] == "PATCH"
        && r["action"] == "partial_update"));
}

#[tokio::test]
async fn admin_index_and_changelist() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, index) = get(&client, srv.url("/admin")).await;
    assert_eq!(status, StatusCode::OK);
    let models = index["models"].as_array().unwrap();
    assert_eq!(models.len(), 6);
    let answers = models.iter().find(|m| m["model"] == "answers").unwrap();
    assert_eq!(answers["list_display_links"], json!(["text", "question"]));
    assert_eq!(answers["readonly_fields"], json!(["text"]));
    assert_eq!(answers["list_editable"], json!(["is_correct"]));

    for title in ["Zoology", "Astronomy", "Botany"] {
        create(&client, &srv, "subjects", "subject", json!({ "title": title })).await;
    }

    let (status, page) = get(&client, srv.url("/admin/subjects?q=o")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 3);

    let (_, page) = get(&client, srv.url("/admin/subjects?q=BOT")).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["title"], "Botany");

    let (status, _) = get(&client, srv.url("/admin/grades")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_actions_on_unknown_targets_are_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, _) = post(
        &client,
        srv.url("/admin/answers/actions/delete_everything"),
        json!({ "ids": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(
        &client,
        srv.url("/admin/subjects/actions/set_correct_answer"),
        json!({ "ids": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post(
        &client,
        srv.url("/admin/answers/actions/set_correct_answer"),
        json!({ "ids": ["nope"] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["ids"].is_array());
}

#[tokio::test]
async fn admin_action_with_malformed_body_is_a_validation_error() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let url = srv.url("/admin/answers/actions/set_correct_answer");

    let (status, body) = post(&client, url.clone(), json!({ "ids": 5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["fields"]["non_field_errors"].is_array());

    // No content type, not JSON.
    let res = client.post(url).body("ids=1").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn admin_action_marks_answers() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let subject = create(&client, &srv, "subjects", "subject", json!({ "title": "Geography" })).await;
    let question = seed_question(&srv, &subject, "Largest ocean?").await;
    let pacific = seed_answer(&srv, &question, "Pacific", false).await;
    let atlantic = seed_answer(&srv, &question, "Atlantic", false).await;

    let (status, body) = post(
        &client,
        srv.url("/admin/answers/actions/set_correct_answer"),
        json!({ "ids": [pacific.id.to_string()] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let stored = srv.store.get_model::<Answer>(pacific.id).await.unwrap().unwrap();
    assert!(stored.is_correct);
    let untouched = srv.store.get_model::<Answer>(atlantic.id).await.unwrap().unwrap();
    assert!(!untouched.is_correct);

    let (_, page) = get(&client, srv.url("/admin/answers?is_correct=true")).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["question"], "Largest ocean?...");
}

#[tokio::test]
async fn admin_question_rows_show_short_info() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let subject = create(&client, &srv, "subjects", "subject", json!({ "title": "Art" })).await;
    seed_question(&srv, &subject, "Who painted it?").await;

    let (_, page) = get(&client, srv.url("/admin/questions?q=art")).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["subject"], "Art");
    assert_eq!(page["results"][0]["short_info"], "Description: 15 characters");
}
