//! Content storage using SQLite
//!
//! This module stores everything the generation pipeline produces:
//! - Retrieval contexts (the assembled curriculum text per request)
//! - Schemes of work
//! - Lesson plans (one per scheme + week)
//! - Lesson notes (one per scheme + plan)
//! - Exams (per scheme, optionally aggregating many weeks)
//!
//! Artifacts are written once and read by dependent generation steps;
//! only exams have update and delete paths.

mod schema;

pub use schema::*;

use crate::error::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A stored retrieval context
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ContextRecord {
    pub id: String,
    pub subject: String,
    pub grade_level: String,
    pub topic: String,
    pub country: String,
    pub context: String,
    pub created_at: String,
}

/// Originating request fields stored with a scheme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemePayload {
    pub subject: String,
    pub grade_level: String,
    pub topic: String,
    pub country: String,
}

/// A generated scheme of work
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Scheme {
    pub id: String,
    pub payload_json: String,
    pub content: String,
    pub context_id: Option<String>,
    pub created_at: String,
}

impl Scheme {
    pub fn payload(&self) -> Result<SchemePayload> {
        Ok(serde_json::from_str(&self.payload_json)?)
    }
}

/// Originating request fields stored with a lesson plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonPlanPayload {
    pub subject: String,
    pub grade_level: String,
    pub topic: String,
    #[serde(default)]
    pub limitations: String,
    pub week: u32,
}

/// A generated lesson plan
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LessonPlan {
    pub id: String,
    pub scheme_id: String,
    pub payload_json: String,
    pub content: String,
    pub week: i64,
    pub context_id: Option<String>,
    pub created_at: String,
}

impl LessonPlan {
    pub fn payload(&self) -> Result<LessonPlanPayload> {
        Ok(serde_json::from_str(&self.payload_json)?)
    }
}

/// Originating request fields stored with lesson notes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonNotesPayload {
    #[serde(default)]
    pub teaching_method: String,
    pub topic: String,
    pub week: u32,
}

/// Generated lesson notes
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LessonNotes {
    pub id: String,
    pub scheme_id: String,
    pub lesson_plan_id: String,
    pub payload_json: String,
    pub content: String,
    pub week: i64,
    pub context_id: Option<String>,
    pub created_at: String,
}

impl LessonNotes {
    pub fn payload(&self) -> Result<LessonNotesPayload> {
        Ok(serde_json::from_str(&self.payload_json)?)
    }
}

/// Counts of source materials folded into an exam
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialsUsed {
    pub lesson_plans: usize,
    pub lesson_notes: usize,
}

/// Originating request fields stored with an exam
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamPayload {
    pub weeks_covered: Vec<u32>,
    pub exam_duration: String,
    pub total_marks: u32,
    pub country: String,
    #[serde(default)]
    pub materials_used: MaterialsUsed,
}

/// A generated exam
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    pub scheme_id: String,
    pub lesson_plan_id: Option<String>,
    pub lesson_notes_id: Option<String>,
    pub payload_json: String,
    pub content: String,
    pub context_id: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl Exam {
    pub fn payload(&self) -> Result<ExamPayload> {
        Ok(serde_json::from_str(&self.payload_json)?)
    }
}

/// Fields an exam update may change
#[derive(Debug, Clone, Default)]
pub struct ExamUpdate {
    pub payload: Option<ExamPayload>,
    pub content: Option<String>,
}

/// Row counts per table, for status display
#[derive(Debug, Clone, Serialize)]
pub struct StoreCounts {
    pub contexts: i64,
    pub schemes: i64,
    pub lesson_plans: i64,
    pub lesson_notes: i64,
    pub exams: i64,
}

/// Content database handle
pub struct ContentDb {
    pool: SqlitePool,
}

impl ContentDb {
    /// Open (creating if needed) the content database and apply the schema
    pub async fn connect(db_path: &Path) -> Result<Self> {
        debug!("Opening content database at {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }

    // CONTEXT OPERATIONS

    /// Store a retrieval context, returning its generated id
    pub async fn store_context(
        &self,
        subject: &str,
        grade_level: &str,
        topic: &str,
        country: &str,
        context: &str,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        info!(
            "Storing context for {} ({}) - {} - country: {}",
            subject, grade_level, topic, country
        );

        sqlx::query(
            "INSERT INTO curriculum_contexts (id, subject, grade_level, topic, country, context, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(subject)
        .bind(grade_level)
        .bind(topic)
        .bind(country)
        .bind(context)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Fetch a context by id
    pub async fn get_context(&self, context_id: &str) -> Result<Option<ContextRecord>> {
        let row = sqlx::query_as::<_, ContextRecord>(
            "SELECT * FROM curriculum_contexts WHERE id = ?",
        )
        .bind(context_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // SCHEME OPERATIONS

    /// Create a scheme of work, returning its generated id
    pub async fn create_scheme(
        &self,
        payload: &SchemePayload,
        content: &str,
        context_id: Option<&str>,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        info!("Creating scheme {}", id);

        sqlx::query(
            "INSERT INTO schemes (id, payload_json, content, context_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(serde_json::to_string(payload)?)
        .bind(content)
        .bind(context_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn get_scheme(&self, scheme_id: &str) -> Result<Option<Scheme>> {
        let row = sqlx::query_as::<_, Scheme>("SELECT * FROM schemes WHERE id = ?")
            .bind(scheme_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_scheme_by_context(&self, context_id: &str) -> Result<Option<Scheme>> {
        let row = sqlx::query_as::<_, Scheme>("SELECT * FROM schemes WHERE context_id = ?")
            .bind(context_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    // LESSON PLAN OPERATIONS

    /// Create a lesson plan under a scheme, returning its generated id
    pub async fn create_lesson_plan(
        &self,
        scheme_id: &str,
        payload: &LessonPlanPayload,
        content: &str,
        context_id: Option<&str>,
    ) -> Result<String> {
        if scheme_id.is_empty() {
            return Err(Error::InvalidInput("Scheme ID is required".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        info!("Creating lesson plan {} for scheme {}", id, scheme_id);

        sqlx::query(
            "INSERT INTO lesson_plans (id, scheme_id, payload_json, content, week, context_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(scheme_id)
        .bind(serde_json::to_string(payload)?)
        .bind(content)
        .bind(payload.week as i64)
        .bind(context_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn get_lesson_plan(&self, plan_id: &str) -> Result<Option<LessonPlan>> {
        let row = sqlx::query_as::<_, LessonPlan>("SELECT * FROM lesson_plans WHERE id = ?")
            .bind(plan_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_lesson_plan_by_context(
        &self,
        context_id: &str,
    ) -> Result<Option<LessonPlan>> {
        let row =
            sqlx::query_as::<_, LessonPlan>("SELECT * FROM lesson_plans WHERE context_id = ?")
                .bind(context_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    pub async fn get_lesson_plans_by_scheme(&self, scheme_id: &str) -> Result<Vec<LessonPlan>> {
        let rows = sqlx::query_as::<_, LessonPlan>(
            "SELECT * FROM lesson_plans WHERE scheme_id = ? ORDER BY week",
        )
        .bind(scheme_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // LESSON NOTES OPERATIONS

    /// Create lesson notes under a scheme and lesson plan
    pub async fn create_lesson_notes(
        &self,
        scheme_id: &str,
        lesson_plan_id: &str,
        payload: &LessonNotesPayload,
        content: &str,
        context_id: Option<&str>,
    ) -> Result<String> {
        if scheme_id.is_empty() || lesson_plan_id.is_empty() {
            return Err(Error::InvalidInput(
                "Both scheme ID and lesson plan ID are required".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        info!(
            "Creating lesson notes {} for scheme {}, plan {}",
            id, scheme_id, lesson_plan_id
        );

        sqlx::query(
            "INSERT INTO lesson_notes (id, scheme_id, lesson_plan_id, payload_json, content, week, context_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(scheme_id)
        .bind(lesson_plan_id)
        .bind(serde_json::to_string(payload)?)
        .bind(content)
        .bind(payload.week as i64)
        .bind(context_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn get_lesson_notes(&self, notes_id: &str) -> Result<Option<LessonNotes>> {
        let row = sqlx::query_as::<_, LessonNotes>("SELECT * FROM lesson_notes WHERE id = ?")
            .bind(notes_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_lesson_notes_by_scheme(&self, scheme_id: &str) -> Result<Vec<LessonNotes>> {
        let rows = sqlx::query_as::<_, LessonNotes>(
            "SELECT * FROM lesson_notes WHERE scheme_id = ? ORDER BY week",
        )
        .bind(scheme_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // EXAM OPERATIONS

    /// Create an exam. Plan and notes references are optional: a
    /// multi-week exam aggregates materials via its payload instead.
    pub async fn create_exam(
        &self,
        scheme_id: &str,
        lesson_plan_id: Option<&str>,
        lesson_notes_id: Option<&str>,
        payload: &ExamPayload,
        content: &str,
        context_id: Option<&str>,
    ) -> Result<String> {
        if scheme_id.is_empty() {
            return Err(Error::InvalidInput("Scheme ID is required".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        info!("Creating exam {} for scheme {}", id, scheme_id);

        sqlx::query(
            "INSERT INTO exams (id, scheme_id, lesson_plan_id, lesson_notes_id, payload_json, content, context_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(scheme_id)
        .bind(lesson_plan_id)
        .bind(lesson_notes_id)
        .bind(serde_json::to_string(payload)?)
        .bind(content)
        .bind(context_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn get_exam(&self, exam_id: &str) -> Result<Option<Exam>> {
        let row = sqlx::query_as::<_, Exam>("SELECT * FROM exams WHERE id = ?")
            .bind(exam_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_exam_by_context(&self, context_id: &str) -> Result<Option<Exam>> {
        let row = sqlx::query_as::<_, Exam>("SELECT * FROM exams WHERE context_id = ?")
            .bind(context_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_exams_by_scheme(&self, scheme_id: &str) -> Result<Vec<Exam>> {
        let rows = sqlx::query_as::<_, Exam>(
            "SELECT * FROM exams WHERE scheme_id = ? ORDER BY created_at",
        )
        .bind(scheme_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Update an existing exam. Returns false if nothing was updated.
    pub async fn update_exam(&self, exam_id: &str, update: &ExamUpdate) -> Result<bool> {
        if update.payload.is_none() && update.content.is_none() {
            warn!("No valid fields to update for exam {}", exam_id);
            return Ok(false);
        }

        let existing = match self.get_exam(exam_id).await? {
            Some(e) => e,
            None => return Ok(false),
        };

        let payload_json = match &update.payload {
            Some(p) => serde_json::to_string(p)?,
            None => existing.payload_json.clone(),
        };
        let content = update.content.as_deref().unwrap_or(&existing.content);

        let result = sqlx::query(
            "UPDATE exams SET payload_json = ?, content = ?, updated_at = ? WHERE id = ?",
        )
        .bind(payload_json)
        .bind(content)
        .bind(Utc::now().to_rfc3339())
        .bind(exam_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an exam. Returns false if it did not exist.
    pub async fn delete_exam(&self, exam_id: &str) -> Result<bool> {
        info!("Deleting exam {}", exam_id);

        let result = sqlx::query("DELETE FROM exams WHERE id = ?")
            .bind(exam_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Row counts across all tables
    pub async fn counts(&self) -> Result<StoreCounts> {
        let contexts: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM curriculum_contexts")
                .fetch_one(&self.pool)
                .await?;
        let schemes: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schemes")
            .fetch_one(&self.pool)
            .await?;
        let plans: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM lesson_plans")
            .fetch_one(&self.pool)
            .await?;
        let notes: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM lesson_notes")
            .fetch_one(&self.pool)
            .await?;
        let exams: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM exams")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreCounts {
            contexts: contexts.0,
            schemes: schemes.0,
            lesson_plans: plans.0,
            lesson_notes: notes.0,
            exams: exams.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_db() -> (TempDir, ContentDb) {
        let tmp = TempDir::new().unwrap();
        let db = ContentDb::connect(&tmp.path().join("content.db"))
            .await
            .unwrap();
        (tmp, db)
    }

    fn scheme_payload() -> SchemePayload {
        SchemePayload {
            subject: "mathematics".to_string(),
            grade_level: "primary 4".to_string(),
            topic: "fractions".to_string(),
            country: "nigeria".to_string(),
        }
    }

    #[tokio::test]
    async fn test_context_roundtrip() {
        let (_tmp, db) = test_db().await;

        let id = db
            .store_context("mathematics", "primary 4", "fractions", "nigeria", "ctx text")
            .await
            .unwrap();

        let record = db.get_context(&id).await.unwrap().unwrap();
        assert_eq!(record.subject, "mathematics");
        assert_eq!(record.context, "ctx text");

        assert!(db.get_context("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scheme_roundtrip_and_context_link() {
        let (_tmp, db) = test_db().await;

        let context_id = db
            .store_context("mathematics", "primary 4", "fractions", "nigeria", "ctx")
            .await
            .unwrap();
        let scheme_id = db
            .create_scheme(&scheme_payload(), "| 1 | Fractions |", Some(&context_id))
            .await
            .unwrap();

        let scheme = db.get_scheme(&scheme_id).await.unwrap().unwrap();
        assert_eq!(scheme.context_id.as_deref(), Some(context_id.as_str()));
        assert_eq!(scheme.payload().unwrap().subject, "mathematics");

        let by_context = db.get_scheme_by_context(&context_id).await.unwrap().unwrap();
        assert_eq!(by_context.id, scheme_id);
    }

    #[tokio::test]
    async fn test_lesson_plan_ownership() {
        let (_tmp, db) = test_db().await;

        let scheme_id = db
            .create_scheme(&scheme_payload(), "scheme", None)
            .await
            .unwrap();

        let payload = LessonPlanPayload {
            subject: "mathematics".to_string(),
            grade_level: "primary 4".to_string(),
            topic: "Fractions".to_string(),
            limitations: String::new(),
            week: 2,
        };
        let plan_id = db
            .create_lesson_plan(&scheme_id, &payload, "WEEK 2\nplan", None)
            .await
            .unwrap();

        let plan = db.get_lesson_plan(&plan_id).await.unwrap().unwrap();
        assert_eq!(plan.scheme_id, scheme_id);
        assert_eq!(plan.week, 2);

        let plans = db.get_lesson_plans_by_scheme(&scheme_id).await.unwrap();
        assert_eq!(plans.len(), 1);

        // Empty scheme id is rejected before touching the database
        assert!(db
            .create_lesson_plan("", &payload, "content", None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_lesson_notes_require_both_parents() {
        let (_tmp, db) = test_db().await;

        let scheme_id = db
            .create_scheme(&scheme_payload(), "scheme", None)
            .await
            .unwrap();
        let plan_payload = LessonPlanPayload {
            subject: "mathematics".to_string(),
            grade_level: "primary 4".to_string(),
            topic: "Fractions".to_string(),
            limitations: String::new(),
            week: 1,
        };
        let plan_id = db
            .create_lesson_plan(&scheme_id, &plan_payload, "plan", None)
            .await
            .unwrap();

        let notes_payload = LessonNotesPayload {
            teaching_method: "discussion".to_string(),
            topic: "Fractions".to_string(),
            week: 1,
        };

        assert!(db
            .create_lesson_notes(&scheme_id, "", &notes_payload, "notes", None)
            .await
            .is_err());

        let notes_id = db
            .create_lesson_notes(&scheme_id, &plan_id, &notes_payload, "notes", None)
            .await
            .unwrap();
        let notes = db.get_lesson_notes(&notes_id).await.unwrap().unwrap();
        assert_eq!(notes.lesson_plan_id, plan_id);
    }

    #[tokio::test]
    async fn test_exam_lifecycle() {
        let (_tmp, db) = test_db().await;

        let scheme_id = db
            .create_scheme(&scheme_payload(), "scheme", None)
            .await
            .unwrap();

        let payload = ExamPayload {
            weeks_covered: vec![1, 2, 3],
            exam_duration: "1 hour".to_string(),
            total_marks: 50,
            country: "nigeria".to_string(),
            materials_used: MaterialsUsed {
                lesson_plans: 2,
                lesson_notes: 1,
            },
        };
        let exam_id = db
            .create_exam(&scheme_id, None, None, &payload, "exam content", None)
            .await
            .unwrap();

        let exam = db.get_exam(&exam_id).await.unwrap().unwrap();
        assert!(exam.lesson_plan_id.is_none());
        assert_eq!(exam.payload().unwrap().weeks_covered, vec![1, 2, 3]);
        assert!(exam.updated_at.is_none());

        // Update content only
        let updated = db
            .update_exam(
                &exam_id,
                &ExamUpdate {
                    payload: None,
                    content: Some("revised exam".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(updated);

        let exam = db.get_exam(&exam_id).await.unwrap().unwrap();
        assert_eq!(exam.content, "revised exam");
        assert!(exam.updated_at.is_some());

        // Empty update is a no-op
        assert!(!db.update_exam(&exam_id, &ExamUpdate::default()).await.unwrap());

        let exams = db.get_exams_by_scheme(&scheme_id).await.unwrap();
        assert_eq!(exams.len(), 1);

        assert!(db.delete_exam(&exam_id).await.unwrap());
        assert!(!db.delete_exam(&exam_id).await.unwrap());
        assert!(db.get_exam(&exam_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_counts() {
        let (_tmp, db) = test_db().await;

        let counts = db.counts().await.unwrap();
        assert_eq!(counts.schemes, 0);

        db.create_scheme(&scheme_payload(), "scheme", None)
            .await
            .unwrap();

        let counts = db.counts().await.unwrap();
        assert_eq!(counts.schemes, 1);
    }
}
