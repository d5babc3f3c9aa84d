//! Prompt rendering for the exam routes.

use studyagora_kernel::exam::{Evaluation, Quiz};

/// Renders validated requests into the single user message sent upstream.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptTemplates;

impl PromptTemplates {
    /// Free-text examiner feedback.
    pub fn evaluation(&self, e: &Evaluation) -> String {
        format!(
            "You are a strict UPSC examiner.\n\
             \n\
             {header}\
             \n\
             Question:\n{question}\n\
             \n\
             Answer:\n{answer}\n\
             \n\
             Evaluate strictly and give:\n\
             - Structure feedback\n\
             - Content relevance\n\
             - Ethics / philosophy / psychology depth\n\
             - Presentation\n\
             - Final marks out of {marks}\n",
            header = Self::header(e),
            question = e.question,
            answer = e.answer,
            marks = e.marks,
        )
    }

    /// Examiner feedback as a JSON object matching `EvaluationReport`.
    pub fn structured_evaluation(&self, e: &Evaluation) -> String {
        format!(
            "You are a strict UPSC examiner.\n\
             \n\
             {header}\
             \n\
             Question:\n{question}\n\
             \n\
             Answer:\n{answer}\n\
             \n\
             Evaluate the answer strictly. Score each criterion out of 10 and give \
             the overall score out of {marks}. Write all feedback in {language}.\n\
             \n\
             Respond with ONLY a JSON object, no prose and no code fences, using \
             exactly this layout:\n\
             {{\n  \
               \"structure\": {{ \"score\": <number>, \"feedback\": \"<text>\" }},\n  \
               \"content\": {{ \"score\": <number>, \"feedback\": \"<text>\" }},\n  \
               \"examples\": {{ \"score\": <number>, \"feedback\": \"<text>\" }},\n  \
               \"language\": {{ \"score\": <number>, \"feedback\": \"<text>\" }},\n  \
               \"overall\": {{ \"score\": <number>, \"remark\": \"<text>\" }},\n  \
               \"mentor\": \"<one paragraph of advice>\"\n\
             }}\n",
            header = Self::header(e),
            question = e.question,
            answer = e.answer,
            marks = e.marks,
            language = e.language,
        )
    }

    /// Multiple-choice quiz as plain text blocks.
    pub fn quiz(&self, q: &Quiz) -> String {
        format!(
            "Create {count} multiple-choice questions for UPSC preparation.\n\
             \n\
             Subject: {subject}\n\
             Difficulty: {difficulty}\n\
             \n\
             For each question use exactly this block format:\n\
             Q<n>. <question>\n\
             A) <option>\n\
             B) <option>\n\
             C) <option>\n\
             D) <option>\n\
             Answer: <letter>\n\
             \n\
             Separate blocks with one blank line. Do not add any other text.\n",
            count = q.count,
            subject = q.subject,
            difficulty = q.difficulty,
        )
    }

    fn header(e: &Evaluation) -> String {
        let mut header = String::new();
        if let Some(paper) = &e.paper {
            header.push_str(&format!("Paper: {paper}\n"));
        }
        header.push_str(&format!("Subject: {}\n", e.subject));
        if let Some(optional) = &e.optional {
            header.push_str(&format!("Optional: {optional}\n"));
        }
        header.push_str(&format!("Marks: {}\n", e.marks));
        header.push_str(&format!("Language: {}\n", e.language));
        header
    }
}
