//! Exam endpoints
//!
//! POST /evaluate (alias /api/evaluate) - examiner feedback on an answer
//! POST /quiz     (alias /api/quiz)     - multiple-choice quiz generation
//!
//! Inputs are validated before the upstream model is called.

use axum::{Json, extract::State};
use serde::Serialize;
use studyagora_kernel::exam::{EvaluationReport, EvaluationRequest, QuizRequest};
use studyagora_kernel::model::ModelRequest;
use tracing::info;

use super::ApiJson;
use crate::error::ApiResult;
use crate::state::AppState;

/// Either the free-text evaluation or the decoded report.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum EvaluationBody {
    Text(String),
    Report(EvaluationReport),
}

#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub evaluation: EvaluationBody,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub quiz: String,
}

/// POST /evaluate
pub async fn evaluate(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<EvaluationRequest>,
) -> ApiResult<Json<EvaluationResponse>> {
    let evaluation = req.validate()?;
    let structured = evaluation.structured || state.settings.structured_reports;
    let generation = &state.settings.generation;

    let request = if structured {
        ModelRequest::new(
            state.prompts.structured_evaluation(&evaluation),
            generation.evaluate_structured,
        )
    } else {
        ModelRequest::new(state.prompts.evaluation(&evaluation), generation.evaluate)
    };

    let text = state.model.invoke(request).await?;
    let body = if structured {
        EvaluationBody::Report(EvaluationReport::from_model_text(&text)?)
    } else {
        EvaluationBody::Text(text)
    };

    info!(
        subject = %evaluation.subject,
        marks = %evaluation.marks,
        structured,
        "evaluation completed"
    );
    Ok(Json(EvaluationResponse { evaluation: body }))
}

/// POST /quiz
pub async fn quiz(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<QuizRequest>,
) -> ApiResult<Json<QuizResponse>> {
    let quiz = req.validate(state.settings.max_quiz_count)?;
    let request = ModelRequest::new(state.prompts.quiz(&quiz), state.settings.generation.quiz);

    let text = state.model.invoke(request).await?;

    info!(
        subject = %quiz.subject,
        difficulty = %quiz.difficulty,
        count = quiz.count,
        "quiz generated"
    );
    Ok(Json(QuizResponse { quiz: text }))
}

/// Build the exam router sub-tree (both bare and `/api` spellings)
pub fn exam_router() -> axum::Router<AppState> {
    use axum::routing::post;
    axum::Router::new()
        .route("/evaluate", post(evaluate))
        .route("/api/evaluate", post(evaluate))
        .route("/quiz", post(quiz))
        .route("/api/quiz", post(quiz))
}
