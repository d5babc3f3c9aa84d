//! Exam-domain request and response types.
//!
//! Inbound bodies are deserialized leniently (every field optional) and then
//! checked by `validate()`, so a missing field becomes a [`ValidationError`]
//! the handler can turn into a `400` *before* any upstream call is made.

use crate::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const DEFAULT_SUBJECT: &str = "General Studies";
const DEFAULT_LANGUAGE: &str = "English";
const DEFAULT_DIFFICULTY: &str = "moderate";

/// A client-supplied field is missing or malformed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn missing(fields: &[&str]) -> Self {
        Self(format!("Missing required fields: {}", fields.join(", ")))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Render a "numeric-ish" marks value: a positive JSON number, or a string
/// holding one. `None` when absent or blank.
fn positive_marks(value: Option<&Value>) -> Option<Result<String, ValidationError>> {
    let (text, parsed) = match value? {
        Value::Null => return None,
        Value::Number(n) => (n.to_string(), n.as_f64()),
        Value::String(s) => {
            let text = non_blank(Some(s))?;
            let parsed = text.parse::<f64>().ok();
            (text, parsed)
        }
        _ => (String::new(), None),
    };
    Some(match parsed {
        Some(v) if v.is_finite() && v > 0.0 => Ok(text),
        _ => Err(ValidationError("marks must be a positive number".into())),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Evaluation
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST /evaluate`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EvaluationRequest {
    pub paper: Option<String>,
    pub subject: Option<String>,
    /// Optional-subject paper name, when the candidate sat one.
    pub optional: Option<String>,
    /// Maximum marks for the question; number or numeric string.
    pub marks: Option<Value>,
    pub language: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
    /// Ask for the structured JSON report instead of free text.
    pub structured: Option<bool>,
}

/// An [`EvaluationRequest`] whose required fields are known to be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub paper: Option<String>,
    pub subject: String,
    pub optional: Option<String>,
    pub marks: String,
    pub language: String,
    pub question: String,
    pub answer: String,
    pub structured: bool,
}

impl EvaluationRequest {
    /// Check that `question`, `answer` and `marks` are present and non-empty,
    /// and that `marks` is a positive number.
    pub fn validate(&self) -> Result<Evaluation, ValidationError> {
        let question = non_blank(self.question.as_deref());
        let answer = non_blank(self.answer.as_deref());
        let marks = positive_marks(self.marks.as_ref()).transpose()?;

        let mut missing = Vec::new();
        if question.is_none() {
            missing.push("question");
        }
        if answer.is_none() {
            missing.push("answer");
        }
        if marks.is_none() {
            missing.push("marks");
        }

        match (question, answer, marks) {
            (Some(question), Some(answer), Some(marks)) => Ok(Evaluation {
                paper: non_blank(self.paper.as_deref()),
                subject: non_blank(self.subject.as_deref())
                    .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
                optional: non_blank(self.optional.as_deref()),
                marks,
                language: non_blank(self.language.as_deref())
                    .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
                question,
                answer,
                structured: self.structured.unwrap_or(false),
            }),
            _ => Err(ValidationError::missing(&missing)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Quiz
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST /quiz`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuizRequest {
    pub subject: Option<String>,
    pub difficulty: Option<String>,
    /// Number of questions; number or numeric string.
    pub count: Option<Value>,
}

/// A validated [`QuizRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    pub subject: String,
    pub difficulty: String,
    pub count: u32,
}

impl QuizRequest {
    /// Check that `subject` is present and `count` is an integer in
    /// `1..=max_count`.
    pub fn validate(&self, max_count: u32) -> Result<Quiz, ValidationError> {
        let subject = non_blank(self.subject.as_deref());
        let count = self.count.as_ref().filter(|v| !v.is_null());

        let mut missing = Vec::new();
        if subject.is_none() {
            missing.push("subject");
        }
        if count.is_none() {
            missing.push("count");
        }
        let (Some(subject), Some(count)) = (subject, count) else {
            return Err(ValidationError::missing(&missing));
        };

        let parsed = match count {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        let count = parsed
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| (1..=max_count).contains(n))
            .ok_or_else(|| {
                ValidationError(format!(
                    "count must be an integer between 1 and {max_count}"
                ))
            })?;

        Ok(Quiz {
            subject,
            difficulty: non_blank(self.difficulty.as_deref())
                .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
            count,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Structured evaluation report
// ─────────────────────────────────────────────────────────────────────────────

/// Score and feedback for one marking criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub score: f64,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallScore {
    pub score: f64,
    pub remark: String,
}

/// Machine-readable evaluation emitted by the model as a bare JSON literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub structure: CriterionScore,
    pub content: CriterionScore,
    pub examples: CriterionScore,
    pub language: CriterionScore,
    pub overall: OverallScore,
    pub mentor: String,
}

impl EvaluationReport {
    /// Decode the model's text as a report.
    ///
    /// Surrounding whitespace is ignored; anything else around the JSON
    /// object (commentary, markdown fences) is a [`ModelError::ContentParse`].
    pub fn from_model_text(text: &str) -> ModelResult<Self> {
        serde_json::from_str(text.trim()).map_err(|e| ModelError::ContentParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn evaluation(body: Value) -> EvaluationRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn evaluation_requires_question_answer_and_marks() {
        let err = evaluation(json!({ "answer": "a", "marks": 10 }))
            .validate()
            .unwrap_err();
        assert_eq!(err.0, "Missing required fields: question");

        let err = evaluation(json!({})).validate().unwrap_err();
        assert_eq!(err.0, "Missing required fields: question, answer, marks");
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let err = evaluation(json!({ "question": "  ", "answer": "a", "marks": "" }))
            .validate()
            .unwrap_err();
        assert_eq!(err.0, "Missing required fields: question, marks");
    }

    #[test]
    fn marks_accept_numbers_and_strings() {
        let ok = evaluation(json!({ "question": "q", "answer": "a", "marks": 15 }))
            .validate()
            .unwrap();
        assert_eq!(ok.marks, "15");

        let ok = evaluation(json!({ "question": "q", "answer": "a", "marks": " 10 " }))
            .validate()
            .unwrap();
        assert_eq!(ok.marks, "10");

        let ok = evaluation(json!({ "question": "q", "answer": "a", "marks": 12.5 }))
            .validate()
            .unwrap();
        assert_eq!(ok.marks, "12.5");

        for bad in [json!(true), json!(0), json!(-5), json!("0"), json!("lots"), json!("-2"), json!([10])] {
            let err = evaluation(json!({ "question": "q", "answer": "a", "marks": bad }))
                .validate()
                .unwrap_err();
            assert_eq!(err.0, "marks must be a positive number", "marks {bad}");
        }
    }

    #[test]
    fn evaluation_defaults_subject_and_language() {
        let ok = evaluation(json!({ "question": "q", "answer": "a", "marks": 10 }))
            .validate()
            .unwrap();
        assert_eq!(ok.subject, "General Studies");
        assert_eq!(ok.language, "English");
        assert!(!ok.structured);
        assert_eq!(ok.paper, None);
    }

    #[test]
    fn quiz_requires_subject_and_count() {
        let req: QuizRequest = serde_json::from_value(json!({ "difficulty": "easy" })).unwrap();
        assert_eq!(
            req.validate(50).unwrap_err().0,
            "Missing required fields: subject, count"
        );
    }

    #[test]
    fn quiz_count_must_be_positive_and_bounded() {
        for bad in [json!(0), json!(-3), json!(51), json!("many"), json!(2.5)] {
            let req: QuizRequest =
                serde_json::from_value(json!({ "subject": "History", "count": bad })).unwrap();
            assert!(req.validate(50).is_err(), "count {bad} should be rejected");
        }
    }

    #[test]
    fn quiz_defaults_difficulty() {
        let req: QuizRequest =
            serde_json::from_value(json!({ "subject": "Polity", "count": "5" })).unwrap();
        let quiz = req.validate(50).unwrap();
        assert_eq!(quiz.count, 5);
        assert_eq!(quiz.difficulty, "moderate");
    }

    #[test]
    fn report_parses_bare_json() {
        let text = json!({
            "structure": { "score": 3, "feedback": "clear intro" },
            "content":   { "score": 4.5, "feedback": "relevant" },
            "examples":  { "score": 2, "feedback": "add case studies" },
            "language":  { "score": 3, "feedback": "concise" },
            "overall":   { "score": 6.5, "remark": "above average" },
            "mentor": "Work on examples."
        })
        .to_string();
        let report = EvaluationReport::from_model_text(&format!("\n{text}\n")).unwrap();
        assert_eq!(report.content.score, 4.5);
        assert_eq!(report.overall.remark, "above average");
    }

    #[test]
    fn report_rejects_prose_wrapped_json() {
        let text = r#"Here is the evaluation: {"mentor": "x"}"#;
        assert!(matches!(
            EvaluationReport::from_model_text(text),
            Err(ModelError::ContentParse(_))
        ));
    }

    #[test]
    fn report_rejects_missing_sections() {
        let text = r#"{"overall": {"score": 5, "remark": "ok"}, "mentor": "m"}"#;
        assert!(matches!(
            EvaluationReport::from_model_text(text),
            Err(ModelError::ContentParse(_))
        ));
    }
}
