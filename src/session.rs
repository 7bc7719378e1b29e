use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use crate::config::Settings;
use crate::dataset::{self, Dataset, FileFormat, Record};
use crate::error::LessonError;
use crate::fields;
use crate::render::LessonPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Saved,
    Unchanged,
    /// The field is not a column of this dataset.
    Skipped,
}

/// One open dataset: the in-memory table, where it lives, and which columns
/// play the week and title roles. All edits go through here and are written
/// back immediately.
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    format: FileFormat,
    sheet_name: Option<String>,
    settings: Settings,
    dataset: Dataset,
    week_field: String,
    title_field: String,
}

impl Session {
    pub fn open(path: &Path, settings: Settings) -> Result<Self, LessonError> {
        let format = FileFormat::from_path(path)?;
        let loaded = dataset::load(path, format, settings.sheet.as_deref())?;
        Ok(Self {
            path: path.to_path_buf(),
            format,
            sheet_name: loaded.sheet_name,
            settings,
            dataset: loaded.dataset,
            week_field: loaded.week_field,
            title_field: loaded.title_field,
        })
    }

    /// Drops the in-memory table and reads the file again.
    pub fn reload(&mut self) -> Result<(), LessonError> {
        let loaded = dataset::load(&self.path, self.format, self.settings.sheet.as_deref())?;
        self.sheet_name = loaded.sheet_name;
        self.dataset = loaded.dataset;
        self.week_field = loaded.week_field;
        self.title_field = loaded.title_field;
        Ok(())
    }

    pub fn save(&self) -> Result<(), LessonError> {
        dataset::save(
            &self.dataset,
            &self.path,
            self.format,
            self.sheet_name.as_deref(),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn week_field(&self) -> &str {
        &self.week_field
    }

    pub fn title_field(&self) -> &str {
        &self.title_field
    }

    pub fn export_root(&self) -> PathBuf {
        self.settings.export_root(&self.path)
    }

    pub fn record(&self, index: usize) -> Result<Record<'_>, LessonError> {
        self.dataset
            .record(index)
            .ok_or(LessonError::RecordOutOfRange(index))
    }

    /// Distinct week values, numerically ordered when they are all numbers.
    pub fn weeks(&self) -> Vec<String> {
        let distinct: BTreeSet<&str> = self
            .dataset
            .records()
            .map(|r| r.text(&self.week_field).trim())
            .collect();
        let mut weeks: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        let numeric: Option<Vec<f64>> = weeks.iter().map(|w| w.trim().parse().ok()).collect();
        if let Some(nums) = numeric {
            let mut pairs: Vec<(f64, String)> = nums.into_iter().zip(weeks).collect();
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            weeks = pairs.into_iter().map(|(_, w)| w).collect();
        }
        if weeks.is_empty() {
            weeks.push(fields::DEFAULT_WEEK_VALUE.to_string());
        }
        weeks
    }

    pub fn week_records<'a>(&'a self, week: &'a str) -> impl Iterator<Item = Record<'a>> + 'a {
        self.dataset
            .records()
            .filter(move |r| r.text(&self.week_field).trim() == week.trim())
    }

    /// Distinct titles within `week`, sorted.
    pub fn titles(&self, week: &str) -> Vec<String> {
        let distinct: BTreeSet<&str> = self
            .week_records(week)
            .map(|r| r.text(&self.title_field))
            .collect();
        let mut titles: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        if titles.is_empty() {
            titles.push(fields::DEFAULT_TITLE_VALUE.to_string());
        }
        titles
    }

    /// First record of `week` carrying `title`.
    pub fn find(&self, week: &str, title: &str) -> Option<usize> {
        self.week_records(week)
            .find(|r| r.text(&self.title_field) == title)
            .map(|r| r.index)
    }

    /// Edit form fields that exist in this dataset, as (left, right) columns.
    pub fn form_fields(&self) -> (Vec<String>, Vec<String>) {
        let left = fields::FORM_LEFT
            .iter()
            .map(|f| f.unwrap_or(self.title_field.as_str()))
            .filter(|f| self.dataset.has_column(f))
            .map(str::to_string)
            .collect();
        let right = fields::FORM_RIGHT
            .iter()
            .filter(|f| self.dataset.has_column(f))
            .map(|f| f.to_string())
            .collect();
        (left, right)
    }

    /// Columns shown in the week preview table.
    pub fn preview_columns(&self) -> Vec<&str> {
        self.dataset
            .columns()
            .iter()
            .filter(|c| !self.settings.audit_columns.contains(*c))
            .map(String::as_str)
            .collect()
    }

    /// Appends a new lesson to `week` and saves. Returns its index.
    pub fn add_record(&mut self, week: &str, now: NaiveDateTime) -> Result<usize, LessonError> {
        let before = self.dataset.clone();
        self.dataset.ensure_column(fields::DATE, "");
        self.dataset.ensure_column(fields::LESSON_STATUS, "");

        let title = self.unique_title(&format!("New Lesson {}", now.format("%H%M%S")));
        let mut values = vec![
            (self.week_field.as_str(), week.to_string()),
            (fields::DATE, now.format("%B %d, %Y").to_string()),
            (self.title_field.as_str(), title.clone()),
            (fields::LESSON_STATUS, fields::NEW_LESSON_STATUS.to_string()),
        ];
        if self.dataset.has_column(fields::CONTINUOUS_DAY) {
            values.push((fields::CONTINUOUS_DAY, (self.dataset.len() + 1).to_string()));
        }

        let index = self.dataset.push_record(values);
        if let Err(e) = self.save() {
            self.dataset = before;
            return Err(e);
        }
        info!(index, week, title = %title, "added lesson");
        Ok(index)
    }

    fn unique_title(&self, base: &str) -> String {
        let taken = |t: &str| self.dataset.records().any(|r| r.text(&self.title_field) == t);
        if !taken(base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base} ({n})");
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Overwrites one cell and saves when the value actually changed.
    pub fn edit_field(
        &mut self,
        index: usize,
        field: &str,
        value: &str,
    ) -> Result<EditOutcome, LessonError> {
        if index >= self.dataset.len() {
            return Err(LessonError::RecordOutOfRange(index));
        }
        let Some(previous) = self.dataset.get(index, field).map(str::to_string) else {
            return Ok(EditOutcome::Skipped);
        };
        if previous == value {
            return Ok(EditOutcome::Unchanged);
        }
        self.dataset.set(index, field, value);
        // The table must not claim a value the file never received.
        if let Err(e) = self.save() {
            self.dataset.set(index, field, &previous);
            return Err(e);
        }
        info!(index, field, "auto-saved field");
        Ok(EditOutcome::Saved)
    }

    pub fn render(&self, index: usize, now: NaiveDateTime) -> Result<PathBuf, LessonError> {
        let record = self.record(index)?;
        LessonPlan::new(record, &self.week_field, &self.title_field).render(
            &self.export_root(),
            &self.settings.institution_header,
            now,
        )
    }
}
