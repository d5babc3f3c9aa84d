//! Exam routes under the open policy: validation, upstream mapping and
//! response shapes.

mod common;

use axum::http::StatusCode;
use common::{ScriptedModel, app, get_with, post_json, send, settings};
use serde_json::json;
use studyagora_kernel::gateway::AccessPolicy;
use studyagora_kernel::model::ModelError;

const FIVE_MCQS: &str = "Q1. Who founded the Maurya empire?\nA) Ashoka\nB) Chandragupta Maurya\nC) Bindusara\nD) Bimbisara\nAnswer: B\n\n\
Q2. In which year was the Battle of Plassey fought?\nA) 1757\nB) 1764\nC) 1857\nD) 1526\nAnswer: A\n\n\
Q3. Who wrote the Arthashastra?\nA) Kalidasa\nB) Banabhatta\nC) Kautilya\nD) Megasthenes\nAnswer: C\n\n\
Q4. The Harappan site Lothal is in which present-day state?\nA) Rajasthan\nB) Punjab\nC) Haryana\nD) Gujarat\nAnswer: D\n\n\
Q5. Who started the Dandi March?\nA) Mahatma Gandhi\nB) Jawaharlal Nehru\nC) Subhas Chandra Bose\nD) Sardar Patel\nAnswer: A";

fn evaluation_body() -> serde_json::Value {
    json!({
        "paper": "GS-IV",
        "subject": "Ethics",
        "marks": 10,
        "question": "What do you understand by integrity?",
        "answer": "Integrity is the alignment of values, words and action."
    })
}

const REPORT: &str = r#"{
  "structure": { "score": 6, "feedback": "Clear intro, weak conclusion." },
  "content":   { "score": 5.5, "feedback": "Relevant but thin." },
  "examples":  { "score": 4, "feedback": "Add a case study." },
  "language":  { "score": 7, "feedback": "Concise." },
  "overall":   { "score": 5.5, "remark": "Average" },
  "mentor": "Practice linking theory to administrative examples."
}"#;

#[tokio::test]
async fn root_and_health_are_always_served() {
    let app = app(settings(AccessPolicy::Open), ScriptedModel::replying([]));

    let root = send(&app, get_with("/", &[])).await;
    assert_eq!(root.status, StatusCode::OK);
    assert!(root.text.starts_with("StudyAgora Backend Running"));

    let health = send(&app, get_with("/health", &[])).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "ok");
    assert_eq!(health.body["service"], "studyagora-gateway");
    assert_eq!(health.body["policy"], "open");
}

#[tokio::test]
async fn evaluate_returns_model_text() {
    let model = ScriptedModel::replying([Ok("Structure: good. Final marks: 6/10".to_string())]);
    let app = app(settings(AccessPolicy::Open), model.clone());

    let resp = send(&app, post_json("/evaluate", &evaluation_body())).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!({ "evaluation": "Structure: good. Final marks: 6/10" }));
    assert_eq!(model.calls(), 1);

    let request = model.last_request().unwrap();
    assert!(request.prompt.contains("What do you understand by integrity?"));
    assert!(request.prompt.contains("Final marks out of 10"));
    assert_eq!(request.options.max_tokens, 1000);
    assert!((request.options.temperature - 0.4).abs() < f32::EPSILON);
}

#[tokio::test]
async fn api_prefixed_alias_reaches_the_same_handler() {
    let model = ScriptedModel::replying([]);
    let app = app(settings(AccessPolicy::Open), model.clone());

    let resp = send(&app, post_json("/api/evaluate", &evaluation_body())).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["evaluation"], "scripted reply");
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn evaluate_missing_fields_is_400_without_upstream_call() {
    let model = ScriptedModel::replying([]);
    let app = app(settings(AccessPolicy::Open), model.clone());

    for missing in ["question", "answer", "marks"] {
        let mut body = evaluation_body();
        body.as_object_mut().unwrap().remove(missing);
        let resp = send(&app, post_json("/evaluate", &body)).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "without {missing}");
        assert_eq!(resp.body["error"]["code"], "VALIDATION_ERROR");
        assert!(
            resp.body["error"]["message"]
                .as_str()
                .unwrap()
                .contains(missing)
        );
    }
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn non_positive_or_non_numeric_marks_are_400() {
    let model = ScriptedModel::replying([]);
    let app = app(settings(AccessPolicy::Open), model.clone());

    for marks in [json!(0), json!(-10), json!("lots"), json!(false)] {
        let mut body = evaluation_body();
        body["marks"] = marks.clone();
        let resp = send(&app, post_json("/evaluate", &body)).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "marks {marks}");
        assert_eq!(resp.body["error"]["code"], "VALIDATION_ERROR");
    }
    assert_eq!(model.calls(), 0);

    let mut body = evaluation_body();
    body["marks"] = json!("15");
    assert_eq!(send(&app, post_json("/evaluate", &body)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn oversized_body_is_413() {
    let model = ScriptedModel::replying([]);
    let app = app(settings(AccessPolicy::Open), model.clone());

    let mut body = evaluation_body();
    body["answer"] = json!("x".repeat(studyagora_gateway::server::BODY_LIMIT_BYTES + 1));
    let resp = send(&app, post_json("/evaluate", &body)).await;
    assert_eq!(resp.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(resp.body["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let model = ScriptedModel::replying([]);
    let app = app(settings(AccessPolicy::Open), model.clone());

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/quiz")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let resp = send(&app, request).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn upstream_shape_error_is_500() {
    let model = ScriptedModel::replying([Err(ModelError::Shape("response has no choices".into()))]);
    let app = app(settings(AccessPolicy::Open), model);

    let resp = send(&app, post_json("/evaluate", &evaluation_body())).await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body["error"]["code"], "UPSTREAM_FAILURE");
}

#[tokio::test]
async fn upstream_transport_detail_is_not_leaked() {
    let model = ScriptedModel::replying([Err(ModelError::Transport {
        status: Some(401),
        body: r#"{"error":"Invalid API Key gsk_live_secret"}"#.into(),
    })]);
    let app = app(settings(AccessPolicy::Open), model);

    let resp = send(&app, post_json("/quiz", &json!({ "subject": "Polity", "count": 3 }))).await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!resp.text.contains("gsk_live_secret"));
}

#[tokio::test]
async fn structured_evaluation_decodes_report() {
    let model = ScriptedModel::replying([Ok(REPORT.to_string())]);
    let app = app(settings(AccessPolicy::Open), model.clone());

    let mut body = evaluation_body();
    body["structured"] = json!(true);
    let resp = send(&app, post_json("/evaluate", &body)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["evaluation"]["overall"]["remark"], "Average");
    assert_eq!(resp.body["evaluation"]["content"]["score"], 5.5);

    let request = model.last_request().unwrap();
    assert_eq!(request.options.max_tokens, 1200);
    assert!(request.prompt.contains("ONLY a JSON object"));
}

#[tokio::test]
async fn structured_evaluation_with_prose_is_invalid_format() {
    let model = ScriptedModel::replying([Ok(format!("Here is your report:\n{REPORT}"))]);
    let mut s = settings(AccessPolicy::Open);
    s.structured_reports = true;
    let app = app(s, model);

    let resp = send(&app, post_json("/evaluate", &evaluation_body())).await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        resp.body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("invalid response format")
    );
}

#[tokio::test]
async fn quiz_text_is_returned_verbatim() {
    let model = ScriptedModel::replying([Ok(FIVE_MCQS.to_string())]);
    let app = app(settings(AccessPolicy::Open), model.clone());

    let resp = send(
        &app,
        post_json(
            "/quiz",
            &json!({ "subject": "History", "difficulty": "easy", "count": 5 }),
        ),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!({ "quiz": FIVE_MCQS }));

    let request = model.last_request().unwrap();
    assert!(request.prompt.contains("Create 5 multiple-choice questions"));
    assert!(request.prompt.contains("Difficulty: easy"));
    assert_eq!(request.options.max_tokens, 2000);
}

#[tokio::test]
async fn quiz_missing_or_bad_count_is_400() {
    let model = ScriptedModel::replying([]);
    let app = app(settings(AccessPolicy::Open), model.clone());

    for body in [
        json!({ "count": 5 }),
        json!({ "subject": "History" }),
        json!({ "subject": "History", "count": 0 }),
        json!({ "subject": "History", "count": "many" }),
        json!({ "subject": "History", "count": 500 }),
    ] {
        let resp = send(&app, post_json("/api/quiz", &body)).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "body {body}");
    }
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn auth_routes_are_not_mounted_outside_authenticated_policy() {
    let app = app(settings(AccessPolicy::Open), ScriptedModel::replying([]));
    let resp = send(&app, post_json("/auth/send-otp", &json!({ "phone": "9800000001" }))).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    let resp = send(&app, get_with("/me", &[])).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
