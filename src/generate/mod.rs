//! Content generation
//!
//! This module assembles prompts for each artifact type and sends them to
//! a completion backend:
//! - A trait for completion providers
//! - An OpenAI-compatible HTTP backend
//! - Typed request structs per artifact (scheme, plan, notes, exam)

mod http_backend;
pub mod prompts;

pub use http_backend::*;

use crate::error::Result;
use async_trait::async_trait;
use prompts::render;
use tracing::info;

/// Trait for text completion providers
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate text for a fully assembled prompt
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Inputs for scheme-of-work generation
#[derive(Debug, Clone)]
pub struct SchemeRequest {
    pub subject: String,
    pub grade_level: String,
    pub topic: String,
    pub country: String,
    pub curriculum_context: String,
}

/// Inputs for lesson-plan generation
#[derive(Debug, Clone)]
pub struct LessonPlanRequest {
    pub subject: String,
    pub grade_level: String,
    pub topic: String,
    pub week: u32,
    pub country: String,
    pub curriculum_context: String,
    pub teaching_constraints: String,
}

/// Inputs for lesson-notes generation
#[derive(Debug, Clone)]
pub struct LessonNotesRequest {
    pub subject: String,
    pub grade_level: String,
    pub topic: String,
    pub week: u32,
    pub country: String,
    pub scheme_context: String,
    pub lesson_plan_context: String,
}

/// Inputs for exam generation
#[derive(Debug, Clone)]
pub struct ExamRequest {
    pub subject: String,
    pub grade_level: String,
    pub topic: String,
    pub country: String,
    pub exam_type: String,
    pub weeks_covered: Vec<u32>,
    pub exam_duration: String,
    pub total_marks: u32,
    pub question_types: String,
    pub num_questions: u32,
    pub assessment_focus: String,
    pub scheme_context: String,
    pub covered_topics: String,
    pub lesson_plans_context: String,
    pub lesson_notes_context: String,
}

/// Generates curriculum artifacts through a completion backend
pub struct ContentGenerator {
    backend: Box<dyn CompletionBackend>,
}

impl ContentGenerator {
    pub fn new(backend: Box<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub async fn generate_scheme(&self, req: &SchemeRequest) -> Result<String> {
        info!(
            "Generating scheme of work for {} {} ({})",
            req.subject, req.grade_level, req.topic
        );
        let prompt = render(
            prompts::SCHEME_OF_WORK,
            &[
                ("subject", &req.subject),
                ("grade_level", &req.grade_level),
                ("topic", &req.topic),
                ("curriculum_context", &req.curriculum_context),
                ("country", &title_case(&req.country)),
            ],
        );
        self.backend.complete(&prompt).await
    }

    pub async fn generate_lesson_plan(&self, req: &LessonPlanRequest) -> Result<String> {
        info!(
            "Generating lesson plan for {} week {}",
            req.subject, req.week
        );
        let week = req.week.to_string();
        let constraints = if req.teaching_constraints.is_empty() {
            "No constraints provided"
        } else {
            &req.teaching_constraints
        };
        let prompt = render(
            prompts::LESSON_PLAN,
            &[
                ("subject", &req.subject),
                ("grade_level", &req.grade_level),
                ("topic", &req.topic),
                ("week", &week),
                ("curriculum_context", &req.curriculum_context),
                ("teaching_constraints", constraints),
                ("country", &title_case(&req.country)),
            ],
        );
        self.backend.complete(&prompt).await
    }

    pub async fn generate_lesson_notes(&self, req: &LessonNotesRequest) -> Result<String> {
        info!(
            "Generating lesson notes for {} week {}",
            req.subject, req.week
        );
        let week = req.week.to_string();
        let prompt = render(
            prompts::LESSON_NOTES,
            &[
                ("subject", &req.subject),
                ("grade_level", &req.grade_level),
                ("topic", &req.topic),
                ("week", &week),
                ("scheme_context", &req.scheme_context),
                ("lesson_plan_context", &req.lesson_plan_context),
                ("country", &title_case(&req.country)),
            ],
        );
        self.backend.complete(&prompt).await
    }

    pub async fn generate_exam(&self, req: &ExamRequest) -> Result<String> {
        info!(
            "Generating exam for {} covering weeks {:?}",
            req.subject, req.weeks_covered
        );
        let weeks = req
            .weeks_covered
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let total_marks = req.total_marks.to_string();
        let num_questions = req.num_questions.to_string();
        let prompt = render(
            prompts::EXAM,
            &[
                ("subject", &req.subject),
                ("grade_level", &req.grade_level),
                ("topic", &req.topic),
                ("country", &title_case(&req.country)),
                ("exam_type", &req.exam_type),
                ("weeks_covered", &weeks),
                ("exam_duration", &req.exam_duration),
                ("total_marks", &total_marks),
                ("question_types", &req.question_types),
                ("num_questions", &num_questions),
                ("assessment_focus", &req.assessment_focus),
                ("scheme_context", &req.scheme_context),
                ("covered_topics", &req.covered_topics),
                ("lesson_plans_context", &req.lesson_plans_context),
                ("lesson_notes_context", &req.lesson_notes_context),
            ],
        );
        self.backend.complete(&prompt).await
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }
}

/// Capitalize the first letter of each word ("nigeria" -> "Nigeria")
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Backend that records the prompt and echoes a fixed response
    struct RecordingBackend {
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingBackend {
        fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
            let prompts = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    prompts: prompts.clone(),
                },
                prompts,
            )
        }
    }

    #[async_trait]
    impl CompletionBackend for RecordingBackend {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("WEEK 1\ngenerated".to_string())
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("nigeria"), "Nigeria");
        assert_eq!(title_case("south africa"), "South Africa");
        assert_eq!(title_case(""), "");
    }

    #[tokio::test]
    async fn test_scheme_prompt_carries_context() {
        let (backend, prompts) = RecordingBackend::new();
        let generator = ContentGenerator::new(Box::new(backend));

        let req = SchemeRequest {
            subject: "mathematics".to_string(),
            grade_level: "primary 4".to_string(),
            topic: "fractions".to_string(),
            country: "nigeria".to_string(),
            curriculum_context: "CURRICULUM CONTEXT HERE".to_string(),
        };
        let out = generator.generate_scheme(&req).await.unwrap();
        assert!(out.contains("WEEK 1"));

        let recorded = prompts.lock().unwrap();
        assert!(recorded[0].contains("CURRICULUM CONTEXT HERE"));
        assert!(recorded[0].contains("Nigeria"));
    }

    #[tokio::test]
    async fn test_exam_prompt_substitution() {
        let (backend, prompts) = RecordingBackend::new();
        let generator = ContentGenerator::new(Box::new(backend));
        let req = ExamRequest {
            subject: "mathematics".to_string(),
            grade_level: "primary 4".to_string(),
            topic: "fractions".to_string(),
            country: "nigeria".to_string(),
            exam_type: "quiz".to_string(),
            weeks_covered: vec![1, 3],
            exam_duration: "1 hour".to_string(),
            total_marks: 50,
            question_types: "Multiple Choice".to_string(),
            num_questions: 25,
            assessment_focus: "objectives".to_string(),
            scheme_context: "scheme".to_string(),
            covered_topics: "Week 1: Fractions".to_string(),
            lesson_plans_context: "plans".to_string(),
            lesson_notes_context: "notes".to_string(),
        };
        generator.generate_exam(&req).await.unwrap();

        let recorded = prompts.lock().unwrap();
        let prompt = &recorded[0];
        assert!(prompt.contains("Weeks covered: 1, 3"));
        assert!(prompt.contains("Total marks: 50"));
        assert!(prompt.contains("Nigeria"));
        assert!(!prompt.contains('{'), "unsubstituted marker left in prompt");
    }
}
