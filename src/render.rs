use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use crate::dataset::Record;
use crate::error::LessonError;
use crate::fields;
use crate::listfmt::{format_list, ListMode, LINE_BREAK};
use crate::pdf::{Align, Document, Font, PageSetup, TextStyle};

const PAGE: PageSetup = PageSetup::letter(60.0, 60.0, 60.0, 40.0);

const NORMAL: TextStyle = TextStyle {
    font: Font::TimesRoman,
    size: 11.0,
    leading: 14.0,
    align: Align::Left,
    space_before: 0.0,
    space_after: 0.0,
};

const HEADER: TextStyle = TextStyle {
    font: Font::TimesBold,
    size: 14.0,
    leading: 17.0,
    align: Align::Center,
    space_before: 0.0,
    space_after: 12.0,
};

const SECTION: TextStyle = TextStyle {
    font: Font::TimesBold,
    size: 12.0,
    leading: 14.5,
    align: Align::Left,
    space_before: 6.0,
    space_after: 4.0,
};

#[derive(Debug, Clone, Copy)]
enum Source {
    Field(&'static str),
    /// Several fields on consecutive lines; blank only if all are blank.
    Lines(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
struct SectionSpec {
    heading: &'static str,
    source: Source,
    list: Option<ListMode>,
}

const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        heading: "NV Standards",
        source: Source::Lines(&[fields::STANDARD_CODE, fields::STANDARD_DESCRIPTOR]),
        list: None,
    },
    SectionSpec {
        heading: "Lesson Objective",
        source: Source::Field(fields::OBJECTIVES),
        list: None,
    },
    SectionSpec {
        heading: "Essential Question",
        source: Source::Field(fields::ESSENTIAL_QUESTION),
        list: None,
    },
    SectionSpec {
        heading: "Lesson Summary",
        source: Source::Field(fields::LESSON_SUMMARY),
        list: None,
    },
    SectionSpec {
        heading: "Instructional Strategies and Procedures",
        source: Source::Field(fields::STRATEGIES),
        list: Some(ListMode::Numbered),
    },
    SectionSpec {
        heading: "Accommodations and Modifications Strategies",
        source: Source::Field(fields::ACCOMMODATIONS),
        list: Some(ListMode::Bulleted),
    },
    SectionSpec {
        heading: "GIG / Bell Ringer",
        source: Source::Field(fields::BELL_RINGER),
        list: None,
    },
    SectionSpec {
        heading: "Closure / Exit Ticket",
        source: Source::Field(fields::CLOSURE),
        list: None,
    },
    SectionSpec {
        heading: "Materials / Resources",
        source: Source::Field(fields::MATERIALS),
        list: Some(ListMode::Bulleted),
    },
    SectionSpec {
        heading: "Terms / Vocabulary",
        source: Source::Field(fields::TERMS_VOCABULARY),
        list: Some(ListMode::Bulleted),
    },
    SectionSpec {
        heading: "Learning Evidence",
        source: Source::Field(fields::LEARNING_EVIDENCE),
        list: None,
    },
    SectionSpec {
        heading: "Reflection / Notes",
        source: Source::Field(fields::REFLECTION),
        list: None,
    },
];

/// Headings in document order.
#[cfg(test)]
pub fn section_headings() -> impl Iterator<Item = &'static str> {
    SECTIONS.iter().map(|s| s.heading)
}

/// Record values a lesson plan is built from.
#[derive(Debug, Clone)]
pub struct LessonPlan<'a> {
    record: Record<'a>,
    week: String,
    day: String,
    title: String,
    date: String,
}

impl<'a> LessonPlan<'a> {
    pub fn new(record: Record<'a>, week_field: &str, title_field: &str) -> Self {
        Self {
            record,
            week: record.text(week_field).trim().to_string(),
            day: record.text(fields::CONTINUOUS_DAY).trim().to_string(),
            title: record.text(title_field).trim().to_string(),
            date: record.text(fields::DATE).trim().to_string(),
        }
    }

    /// `W{week}D{day}_LessonPlan_{Mon}{DD}_{YYYY}_{Title_With_Underscores}.pdf`,
    /// dated by the generation time.
    pub fn file_name(&self, now: NaiveDateTime) -> String {
        let title = self
            .title
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");
        format!(
            "W{}D{}_LessonPlan_{}_{}_{}.pdf",
            path_safe(&self.week),
            path_safe(&self.day),
            now.format("%b%d"),
            now.format("%Y"),
            path_safe(&title)
        )
    }

    pub fn week_dir(&self, export_root: &Path) -> PathBuf {
        export_root.join(format!("Week_{}", path_safe(&self.week)))
    }

    pub fn build(&self, institution_header: &str) -> Document {
        let mut doc = Document::new(format!("Lesson Plan: {}", self.title), PAGE);
        doc.paragraph(institution_header, HEADER);
        doc.paragraph(
            format!(
                "Week {} \u{2013} Day {} | Date: {}",
                self.week, self.day, self.date
            ),
            NORMAL,
        );
        doc.spacer(12.0);
        doc.paragraph(format!("Lesson Title: {}", self.title), SECTION);
        doc.spacer(8.0);

        for spec in SECTIONS {
            let Some(value) = self.section_text(spec.source) else {
                continue;
            };
            let body = match spec.list {
                Some(mode) => format_list(&value, mode),
                None => value.replace('\n', LINE_BREAK),
            };
            doc.paragraph(spec.heading, SECTION);
            doc.paragraph(body, NORMAL);
            doc.spacer(8.0);
        }
        doc
    }

    fn section_text(&self, source: Source) -> Option<String> {
        let text = match source {
            Source::Field(field) => self.record.get(field)?.to_string(),
            Source::Lines(fields) => {
                let parts: Vec<&str> = fields.iter().map(|f| self.record.text(f)).collect();
                if parts.iter().all(|p| p.trim().is_empty()) {
                    return None;
                }
                parts.join("\n")
            }
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Builds and writes the document under `export_root/Week_{week}/`,
    /// replacing a same-named file.
    pub fn render(
        &self,
        export_root: &Path,
        institution_header: &str,
        now: NaiveDateTime,
    ) -> Result<PathBuf, LessonError> {
        let dir = self.week_dir(export_root);
        std::fs::create_dir_all(&dir).map_err(|e| {
            LessonError::Render(format!("failed to create {}: {e}", dir.display()))
        })?;
        let path = dir.join(self.file_name(now));
        let pages = self.build(institution_header).write_to(&path, now)?;
        info!(
            path = %path.display(),
            pages,
            index = self.record.index,
            "rendered lesson plan"
        );
        Ok(path)
    }
}

/// Keeps a value inside a single path component.
fn path_safe(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            c => c,
        })
        .collect()
}
