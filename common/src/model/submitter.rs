use serde::{Deserialize, Serialize};

/// Snapshot of the person who sent a submission, stored as-is with the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submitter {
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    /// Dependency the submitter sends data for.
    pub dep_code: String,
}
