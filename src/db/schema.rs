//! SQLite schema definition

/// SQL schema for the content database
pub const SCHEMA_SQL: &str = r#"
-- Retrieval contexts: assembled curriculum context per generation request
CREATE TABLE IF NOT EXISTS curriculum_contexts (
    id TEXT PRIMARY KEY,
    subject TEXT NOT NULL,
    grade_level TEXT NOT NULL,
    topic TEXT NOT NULL,
    country TEXT NOT NULL,
    context TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Schemes of work
CREATE TABLE IF NOT EXISTS schemes (
    id TEXT PRIMARY KEY,
    payload_json TEXT NOT NULL,
    content TEXT NOT NULL,
    context_id TEXT REFERENCES curriculum_contexts(id),
    created_at TEXT NOT NULL
);

-- Lesson plans: one scheme, one week
CREATE TABLE IF NOT EXISTS lesson_plans (
    id TEXT PRIMARY KEY,
    scheme_id TEXT NOT NULL REFERENCES schemes(id),
    payload_json TEXT NOT NULL,
    content TEXT NOT NULL,
    week INTEGER NOT NULL DEFAULT 1,
    context_id TEXT REFERENCES curriculum_contexts(id),
    created_at TEXT NOT NULL
);

-- Lesson notes: one scheme, one lesson plan
CREATE TABLE IF NOT EXISTS lesson_notes (
    id TEXT PRIMARY KEY,
    scheme_id TEXT NOT NULL REFERENCES schemes(id),
    lesson_plan_id TEXT NOT NULL REFERENCES lesson_plans(id),
    payload_json TEXT NOT NULL,
    content TEXT NOT NULL,
    week INTEGER NOT NULL DEFAULT 1,
    context_id TEXT REFERENCES curriculum_contexts(id),
    created_at TEXT NOT NULL
);

-- Exams: one scheme; plan/notes references optional (multi-week exams
-- aggregate several weeks' materials via payload_json)
CREATE TABLE IF NOT EXISTS exams (
    id TEXT PRIMARY KEY,
    scheme_id TEXT NOT NULL REFERENCES schemes(id),
    lesson_plan_id TEXT REFERENCES lesson_plans(id),
    lesson_notes_id TEXT REFERENCES lesson_notes(id),
    payload_json TEXT NOT NULL,
    content TEXT NOT NULL,
    context_id TEXT REFERENCES curriculum_contexts(id),
    created_at TEXT NOT NULL,
    updated_at TEXT
);

-- Indexes for performance
CREATE INDEX IF NOT EXISTS idx_schemes_context ON schemes(context_id);
CREATE INDEX IF NOT EXISTS idx_plans_scheme ON lesson_plans(scheme_id);
CREATE INDEX IF NOT EXISTS idx_plans_context ON lesson_plans(context_id);
CREATE INDEX IF NOT EXISTS idx_notes_scheme ON lesson_notes(scheme_id);
CREATE INDEX IF NOT EXISTS idx_notes_plan ON lesson_notes(lesson_plan_id);
CREATE INDEX IF NOT EXISTS idx_exams_scheme ON exams(scheme_id);
CREATE INDEX IF NOT EXISTS idx_exams_context ON exams(context_id);
"#;
