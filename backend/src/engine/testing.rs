use crate::engine::reference::ReferenceSource;
use common::model::field::{Datatype, Field};
use common::model::validator::{ValidatorColumn, ValidatorTable};
use serde_json::Value;

/// In-memory reference data for engine tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub tables: Vec<ValidatorTable>,
    pub members: Vec<String>,
    /// (code, identification)
    pub students: Vec<(String, String)>,
    pub unreachable: bool,
}

impl MemorySource {
    pub fn with_table(mut self, table: &str, column: &str, values: Vec<Value>) -> Self {
        self.tables.push(ValidatorTable {
            name: table.to_string(),
            columns: vec![ValidatorColumn {
                name: column.to_string(),
                datatype: Datatype::ShortText,
                is_validator: true,
                values,
            }],
        });
        self
    }

    fn reachable(&self) -> Result<(), String> {
        if self.unreachable {
            Err("directorio no disponible".to_string())
        } else {
            Ok(())
        }
    }
}

impl ReferenceSource for MemorySource {
    type Error = String;

    fn validator_table(&self, name: &str) -> Result<Option<ValidatorTable>, String> {
        self.reachable()?;
        Ok(self.tables.iter().find(|t| t.name == name).cloned())
    }

    fn member_identifications(&self) -> Result<Vec<String>, String> {
        self.reachable()?;
        Ok(self.members.clone())
    }

    fn student_codes(&self) -> Result<Vec<String>, String> {
        self.reachable()?;
        Ok(self.students.iter().map(|(code, _)| code.clone()).collect())
    }

    fn student_identifications(&self) -> Result<Vec<String>, String> {
        self.reachable()?;
        Ok(self.students.iter().map(|(_, id)| id.clone()).collect())
    }
}

pub fn field(name: &str, datatype: Datatype, required: bool, multiple: bool) -> Field {
    Field {
        name: name.to_string(),
        datatype,
        required,
        multiple,
        validate_with: None,
        comment: None,
    }
}
