//! Column names the planner knows about.
//!
//! The backing spreadsheet may carry any number of extra columns; these are
//! only the ones the loader forces, the form offers, or the renderer reads.

pub const LESSON_SUMMARY: &str = "Lesson Summary";
pub const TERMS_VOCABULARY: &str = "Terms / Vocabulary";
pub const BELL_RINGER: &str = "GIG / Bell Ringer";

/// Always present after load, filled with "" when the file lacks them.
pub const REQUIRED_TEXT_FIELDS: [&str; 3] = [LESSON_SUMMARY, TERMS_VOCABULARY, BELL_RINGER];

pub const DATE: &str = "Date";
pub const LESSON_STATUS: &str = "Lesson Status";
pub const CONTINUOUS_DAY: &str = "Day # (Continuous)";
pub const STANDARD_CODE: &str = "NV Standard Code";
pub const STANDARD_DESCRIPTOR: &str = "NV Standard Descriptor";
pub const OBJECTIVES: &str = "Lesson Objective(s)";
pub const ESSENTIAL_QUESTION: &str = "Essential Question";
pub const STRATEGIES: &str = "Instructional Strategies and Procedures";
pub const ACCOMMODATIONS: &str = "Accommodations and Modifications Strategies";
pub const CLOSURE: &str = "Closure / Exit Ticket";
pub const MATERIALS: &str = "Materials / Resources";
pub const LEARNING_EVIDENCE: &str = "Learning Evidence";
pub const REFLECTION: &str = "Reflection / Notes";

pub const DEFAULT_WEEK_FIELD: &str = "Week";
pub const DEFAULT_WEEK_VALUE: &str = "1";
pub const DEFAULT_TITLE_FIELD: &str = "Lesson Title";
pub const DEFAULT_TITLE_VALUE: &str = "Untitled Lesson";

pub const NEW_LESSON_STATUS: &str = "Planned";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Week,
    Title,
}

/// Accepted header spellings per role, compared against the trimmed,
/// lowercased header.
pub const ROLE_CANDIDATES: &[(FieldRole, &[&str])] = &[
    (FieldRole::Week, &["week", "week #", "week number"]),
    (FieldRole::Title, &["lesson title", "title"]),
];

/// First header matching one of the role's spellings.
pub fn detect_role(headers: &[String], role: FieldRole) -> Option<usize> {
    let candidates = ROLE_CANDIDATES
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, c)| *c)
        .unwrap_or(&[]);
    headers.iter().position(|h| {
        let key = h.trim().to_lowercase();
        candidates.iter().any(|c| *c == key)
    })
}

/// Left column of the edit form. `None` stands for the resolved title field.
pub const FORM_LEFT: &[Option<&str>] = &[
    None,
    Some(DATE),
    Some(STANDARD_CODE),
    Some(STANDARD_DESCRIPTOR),
    Some(OBJECTIVES),
    Some(ESSENTIAL_QUESTION),
    Some(LESSON_SUMMARY),
    Some(STRATEGIES),
    Some(ACCOMMODATIONS),
    Some(BELL_RINGER),
    Some(CLOSURE),
];

pub const FORM_RIGHT: &[&str] = &[
    MATERIALS,
    TERMS_VOCABULARY,
    LEARNING_EVIDENCE,
    "Tiered Differentiation",
    "Tech Tools",
    "Tech Purpose",
    "Formative Check",
    "Summative Assessment",
    REFLECTION,
    LESSON_STATUS,
];
