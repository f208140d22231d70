//! Prompt templates for each artifact type
//!
//! Templates use `{placeholder}` markers filled by [`render`]. Generated
//! schemes and plans are asked for "WEEK N" section headings and a weekly
//! markdown table so the week extractor can slice them downstream.

/// Substitute `{key}` markers in a template
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}

pub const SCHEME_OF_WORK: &str = "\
You are an experienced {country} curriculum planner.

Produce a term scheme of work for:
- Subject: {subject}
- Grade level: {grade_level}
- Topic focus: {topic}

Ground every week strictly in this curriculum context:
{curriculum_context}

Requirements:
- Present the scheme as a markdown table with columns: Week | Topic | Learning Objectives | Activities | Resources.
- Number weeks from 1 and put only the number in the Week column.
- After the table, add one section per week headed exactly 'WEEK N' (upper case) summarising that week's focus.
- Use {country} education terminology throughout.
";

pub const LESSON_PLAN: &str = "\
You are an experienced {country} teacher preparing a single lesson plan.

Details:
- Subject: {subject}
- Grade level: {grade_level}
- Week: {week}
- Topic: {topic}
- Teaching constraints: {teaching_constraints}

Scheme of work context:
{curriculum_context}

Requirements:
- Begin the plan with a heading exactly 'WEEK {week}' (upper case).
- Include objectives, prior knowledge, materials, step-by-step delivery, assessment and assignment sections.
- Keep the plan appropriate for {grade_level} learners in {country}.
";

pub const LESSON_NOTES: &str = "\
You are an experienced {country} teacher writing detailed lesson notes.

Details:
- Subject: {subject}
- Grade level: {grade_level}
- Week: {week}
- Topic: {topic}

Scheme extract for this week:
{scheme_context}

Lesson plan for this week:
{lesson_plan_context}

Requirements:
- Begin the notes with a heading exactly 'WEEK {week}' (upper case).
- Expand each step of the lesson plan into full teaching notes a substitute teacher could deliver.
- Include worked examples and board summaries where the subject allows.
";

pub const EXAM: &str = "\
You are an experienced {country} examiner setting an assessment.

Details:
- Subject: {subject}
- Grade level: {grade_level}
- Topic focus: {topic}
- Exam type: {exam_type}
- Weeks covered: {weeks_covered}
- Duration: {exam_duration}
- Total marks: {total_marks}
- Question types: {question_types}
- Number of questions: {num_questions}
- Assessment focus: {assessment_focus}

Scheme of work:
{scheme_context}

Topics covered in the selected weeks:
{covered_topics}

Lesson plans for the selected weeks:
{lesson_plans_context}

Lesson notes for the selected weeks:
{lesson_notes_context}

Requirements:
- Set questions only on material from the selected weeks.
- Distribute marks to sum exactly to {total_marks}.
- Provide a marking guide after the questions.
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_all_markers() {
        let out = render(
            "Subject: {subject}, week {week}, again {subject}",
            &[("subject", "mathematics"), ("week", "2")],
        );
        assert_eq!(out, "Subject: mathematics, week 2, again mathematics");
    }

    #[test]
    fn test_render_leaves_unknown_markers() {
        let out = render("{subject} {missing}", &[("subject", "english")]);
        assert_eq!(out, "english {missing}");
    }

    #[test]
    fn test_templates_mention_week_markers() {
        // The week extractor depends on generated documents carrying
        // upper-case WEEK headings
        assert!(SCHEME_OF_WORK.contains("'WEEK N'"));
        assert!(LESSON_PLAN.contains("'WEEK {week}'"));
        assert!(LESSON_NOTES.contains("'WEEK {week}'"));
    }
}
