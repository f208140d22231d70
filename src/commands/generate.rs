//! Generation pipeline commands
//!
//! Each command mirrors one step of the content pipeline:
//! - scheme: retrieve context, store it, generate, store the scheme
//! - plan: slice the scheme by week topic, generate, store under the scheme
//! - notes: slice scheme and plan by the plan's week, generate, store
//! - exam: aggregate selected weeks' topics/plans/notes, generate, store
//!
//! A scheme is never generated without the retrieval having returned a
//! valid context; dependent steps inherit the scheme's context id.

use crate::db::{
    ContentDb, ExamPayload, ExamUpdate, LessonNotesPayload, LessonPlanPayload, MaterialsUsed,
    SchemePayload,
};
use crate::error::{Error, Result};
use crate::generate::{
    ContentGenerator, ExamRequest, LessonNotesRequest, LessonPlanRequest, SchemeRequest,
};
use crate::retrieval::{Query, RetrievalEngine, RetrievalStatus};
use crate::subject::SubjectMapper;
use crate::weeks::{extract_week_content, extract_week_topic};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Scheme generation options from the CLI
#[derive(Debug, Clone)]
pub struct SchemeOptions {
    pub subject: String,
    pub grade_level: String,
    pub topic: String,
    pub country: Option<String>,
}

/// Outcome of scheme generation
#[derive(Debug, Clone, Serialize)]
pub struct SchemeOutcome {
    pub scheme_id: String,
    pub context_id: String,
    pub content: String,
}

/// Generate and store a scheme of work
pub async fn cmd_scheme(
    db: &ContentDb,
    engine: &RetrievalEngine,
    generator: &ContentGenerator,
    subjects: &SubjectMapper,
    default_country: &str,
    options: SchemeOptions,
) -> Result<SchemeOutcome> {
    let country = options
        .country
        .clone()
        .unwrap_or_else(|| default_country.to_string())
        .to_lowercase();

    let query = Query {
        subject: options.subject.clone(),
        grade_level: options.grade_level.clone(),
        topic: options.topic.clone(),
        country: Some(country.clone()),
    };
    let result = engine.retrieve(&query, engine.default_top_k()).await;

    if result.status != RetrievalStatus::Valid {
        return Err(Error::Retrieval(
            result
                .message
                .unwrap_or_else(|| "retrieval returned no context".to_string()),
        ));
    }
    debug!("Retrieved {} characters of context", result.context.len());

    let subject = subjects.normalize(&options.subject);
    let context_id = db
        .store_context(
            &subject,
            &options.grade_level,
            &options.topic,
            &country,
            &result.context,
        )
        .await?;

    let content = generator
        .generate_scheme(&SchemeRequest {
            subject: options.subject.clone(),
            grade_level: options.grade_level.clone(),
            topic: options.topic.clone(),
            country: country.clone(),
            curriculum_context: result.context,
        })
        .await?;

    let payload = SchemePayload {
        subject: options.subject,
        grade_level: options.grade_level,
        topic: options.topic,
        country,
    };
    let scheme_id = db
        .create_scheme(&payload, &content, Some(&context_id))
        .await?;

    info!("Scheme {} generated with context {}", scheme_id, context_id);

    Ok(SchemeOutcome {
        scheme_id,
        context_id,
        content,
    })
}

/// Lesson plan options from the CLI
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub scheme_id: String,
    pub week: u32,
    pub limitations: String,
}

/// Outcome of lesson plan generation
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub scheme_id: String,
    pub lesson_plan_id: String,
    pub context_id: String,
    pub week: u32,
    pub content: String,
}

/// Generate and store a lesson plan for one week of a scheme
pub async fn cmd_plan(
    db: &ContentDb,
    generator: &ContentGenerator,
    options: PlanOptions,
) -> Result<PlanOutcome> {
    let scheme = db
        .get_scheme(&options.scheme_id)
        .await?
        .ok_or_else(|| Error::SchemeNotFound(options.scheme_id.clone()))?;

    let context_id = scheme
        .context_id
        .clone()
        .ok_or_else(|| Error::InvalidInput("Scheme has no context".to_string()))?;

    let scheme_payload = scheme.payload()?;
    let week_topic = extract_week_topic(&scheme.content, options.week);
    debug!("Week {} topic: {}", options.week, week_topic);

    let content = generator
        .generate_lesson_plan(&LessonPlanRequest {
            subject: scheme_payload.subject.clone(),
            grade_level: scheme_payload.grade_level.clone(),
            topic: week_topic.clone(),
            week: options.week,
            country: scheme_payload.country.clone(),
            curriculum_context: scheme.content.clone(),
            teaching_constraints: options.limitations.clone(),
        })
        .await?;

    let payload = LessonPlanPayload {
        subject: scheme_payload.subject,
        grade_level: scheme_payload.grade_level,
        topic: week_topic,
        limitations: options.limitations,
        week: options.week,
    };
    let lesson_plan_id = db
        .create_lesson_plan(&options.scheme_id, &payload, &content, Some(&context_id))
        .await?;

    info!(
        "Lesson plan {} generated for scheme {} week {}",
        lesson_plan_id, options.scheme_id, options.week
    );

    Ok(PlanOutcome {
        scheme_id: options.scheme_id,
        lesson_plan_id,
        context_id,
        week: options.week,
        content,
    })
}

/// Lesson notes options from the CLI
#[derive(Debug, Clone)]
pub struct NotesOptions {
    pub scheme_id: String,
    pub lesson_plan_id: String,
    pub teaching_method: String,
}

/// Outcome of lesson notes generation
#[derive(Debug, Clone, Serialize)]
pub struct NotesOutcome {
    pub scheme_id: String,
    pub lesson_plan_id: String,
    pub lesson_notes_id: String,
    pub context_id: String,
    pub week: u32,
    pub content: String,
}

/// Generate and store lesson notes for a lesson plan.
///
/// The week comes from the lesson plan, not the caller: notes always
/// cover the same week as their plan.
pub async fn cmd_notes(
    db: &ContentDb,
    generator: &ContentGenerator,
    options: NotesOptions,
) -> Result<NotesOutcome> {
    let scheme = db
        .get_scheme(&options.scheme_id)
        .await?
        .ok_or_else(|| Error::SchemeNotFound(options.scheme_id.clone()))?;
    let plan = db
        .get_lesson_plan(&options.lesson_plan_id)
        .await?
        .ok_or_else(|| Error::LessonPlanNotFound(options.lesson_plan_id.clone()))?;

    let context_id = scheme
        .context_id
        .clone()
        .ok_or_else(|| Error::InvalidInput("Scheme has no context".to_string()))?;

    let week = plan.week as u32;
    let plan_payload = plan.payload()?;
    let scheme_payload = scheme.payload()?;

    let scheme_week_content = extract_week_content(&scheme.content, week);
    let plan_week_content = extract_week_content(&plan.content, week);

    let content = generator
        .generate_lesson_notes(&LessonNotesRequest {
            subject: scheme_payload.subject,
            grade_level: scheme_payload.grade_level,
            topic: plan_payload.topic.clone(),
            week,
            country: scheme_payload.country,
            scheme_context: scheme_week_content,
            lesson_plan_context: plan_week_content,
        })
        .await?;

    let payload = LessonNotesPayload {
        teaching_method: options.teaching_method,
        topic: plan_payload.topic,
        week,
    };
    let lesson_notes_id = db
        .create_lesson_notes(
            &options.scheme_id,
            &options.lesson_plan_id,
            &payload,
            &content,
            Some(&context_id),
        )
        .await?;

    info!(
        "Lesson notes {} generated for plan {} week {}",
        lesson_notes_id, options.lesson_plan_id, week
    );

    Ok(NotesOutcome {
        scheme_id: options.scheme_id,
        lesson_plan_id: options.lesson_plan_id,
        lesson_notes_id,
        context_id,
        week,
        content,
    })
}

/// Exam generation options from the CLI
#[derive(Debug, Clone)]
pub struct ExamOptions {
    pub scheme_id: String,
    pub weeks: Vec<u32>,
    pub exam_type: String,
    pub exam_duration: String,
    pub total_marks: u32,
    pub question_types: String,
    pub num_questions: u32,
    pub assessment_focus: String,
}

impl Default for ExamOptions {
    fn default() -> Self {
        Self {
            scheme_id: String::new(),
            weeks: Vec::new(),
            exam_type: "quiz".to_string(),
            exam_duration: "1 hour".to_string(),
            total_marks: 50,
            question_types: "Multiple Choice, Short Answer, Essay".to_string(),
            num_questions: 25,
            assessment_focus: "Assess learning objectives covered in selected weeks".to_string(),
        }
    }
}

/// Outcome of exam generation
#[derive(Debug, Clone, Serialize)]
pub struct ExamOutcome {
    pub exam_id: String,
    pub weeks_covered: Vec<u32>,
    pub materials_used: MaterialsUsed,
    pub content: String,
}

/// Generate and store an exam over the selected weeks of a scheme.
///
/// Uses only the lesson plans and notes belonging to the selected weeks;
/// weeks without materials simply contribute less context.
pub async fn cmd_exam(
    db: &ContentDb,
    generator: &ContentGenerator,
    options: ExamOptions,
) -> Result<ExamOutcome> {
    if options.weeks.is_empty() {
        return Err(Error::InvalidInput(
            "At least one week must be selected".to_string(),
        ));
    }

    // De-duplicate and sort the selected weeks
    let weeks: Vec<u32> = options.weeks.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

    let scheme = db
        .get_scheme(&options.scheme_id)
        .await?
        .ok_or_else(|| Error::SchemeNotFound(options.scheme_id.clone()))?;
    let scheme_payload = scheme.payload()?;

    let all_plans = db.get_lesson_plans_by_scheme(&options.scheme_id).await?;
    let all_notes = db.get_lesson_notes_by_scheme(&options.scheme_id).await?;
    debug!(
        "Found {} lesson plans, {} lesson notes for scheme {}",
        all_plans.len(),
        all_notes.len(),
        options.scheme_id
    );

    let mut covered_topics = Vec::new();
    let mut plans_content = Vec::new();
    let mut notes_content = Vec::new();

    for &week in &weeks {
        let topic = extract_week_topic(&scheme.content, week);
        covered_topics.push(format!("Week {}: {}", week, topic));

        if let Some(plan) = all_plans.iter().find(|p| p.week as u32 == week) {
            let slice = extract_week_content(&plan.content, week);
            plans_content.push(format!("Week {} Plan:\n{}", week, slice));
        }

        if let Some(notes) = all_notes.iter().find(|n| n.week as u32 == week) {
            let slice = extract_week_content(&notes.content, week);
            notes_content.push(format!("Week {} Notes:\n{}", week, slice));
        }
    }

    let materials_used = MaterialsUsed {
        lesson_plans: plans_content.len(),
        lesson_notes: notes_content.len(),
    };

    let content = generator
        .generate_exam(&ExamRequest {
            subject: scheme_payload.subject,
            grade_level: scheme_payload.grade_level,
            topic: scheme_payload.topic,
            country: scheme_payload.country.clone(),
            exam_type: options.exam_type,
            weeks_covered: weeks.clone(),
            exam_duration: options.exam_duration.clone(),
            total_marks: options.total_marks,
            question_types: options.question_types,
            num_questions: options.num_questions,
            assessment_focus: options.assessment_focus,
            scheme_context: scheme.content.clone(),
            covered_topics: covered_topics.join("\n"),
            lesson_plans_context: if plans_content.is_empty() {
                "No lesson plans available for selected weeks".to_string()
            } else {
                plans_content.join("\n\n")
            },
            lesson_notes_context: if notes_content.is_empty() {
                "No lesson notes available for selected weeks".to_string()
            } else {
                notes_content.join("\n\n")
            },
        })
        .await?;

    let payload = ExamPayload {
        weeks_covered: weeks.clone(),
        exam_duration: options.exam_duration,
        total_marks: options.total_marks,
        country: scheme_payload.country,
        materials_used: materials_used.clone(),
    };
    let exam_id = db
        .create_exam(
            &options.scheme_id,
            None,
            None,
            &payload,
            &content,
            scheme.context_id.as_deref(),
        )
        .await?;

    info!("Exam {} generated covering weeks {:?}", exam_id, weeks);

    Ok(ExamOutcome {
        exam_id,
        weeks_covered: weeks,
        materials_used,
        content,
    })
}

/// Replace an exam's content
pub async fn cmd_exam_update(db: &ContentDb, exam_id: &str, content: String) -> Result<()> {
    let updated = db
        .update_exam(
            exam_id,
            &ExamUpdate {
                payload: None,
                content: Some(content),
            },
        )
        .await?;

    if !updated {
        return Err(Error::ExamNotFound(exam_id.to_string()));
    }
    Ok(())
}

/// Delete an exam
pub async fn cmd_exam_delete(db: &ContentDb, exam_id: &str) -> Result<()> {
    if !db.delete_exam(exam_id).await? {
        return Err(Error::ExamNotFound(exam_id.to_string()));
    }
    Ok(())
}
