use crate::model::loaded_data::LoadedData;
use crate::model::template::Template;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// A template deployed into one reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedTemplate {
    pub id: String,
    pub template: Template,
    pub period: String,
    /// Last day (inclusive) on which submissions are accepted.
    pub deadline: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub published_date: OffsetDateTime,
    /// Bumped on every write to `loaded_data`.
    pub revision: i64,
    #[serde(default)]
    pub loaded_data: Vec<LoadedData>,
}

impl PublishedTemplate {
    pub fn is_closed_on(&self, today: Date) -> bool {
        today > self.deadline
    }

    pub fn loaded_for(&self, dependency: &str) -> Option<&LoadedData> {
        self.loaded_data.iter().find(|d| d.dependency == dependency)
    }
}
