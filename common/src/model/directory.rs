use serde::{Deserialize, Serialize};

/// Entry of the student directory. Students can be referenced by their
/// institutional code or by their national identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub code: String,
    pub identification: String,
}
