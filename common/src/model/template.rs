use crate::model::field::Field;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub fields: Vec<Field>,
    /// Dependency codes allowed to submit data. Empty means any dependency.
    #[serde(default)]
    pub producers: Vec<String>,
}

impl Template {
    pub fn accepts_producer(&self, dependency: &str) -> bool {
        self.producers.is_empty() || self.producers.iter().any(|p| p == dependency)
    }
}
