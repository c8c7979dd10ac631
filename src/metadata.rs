// Metadata Cache Facade - lookup of runtime-defined tables and fields
//
// The schema store itself lives outside this crate; the engines only need
// to resolve a table (with its field list) or a single field definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineResult;

/// A runtime-defined field on a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub id: Uuid,
    pub table_id: Uuid,
    pub name: String,
}

/// A runtime-defined table and its fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDef {
    pub id: Uuid,
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl TableDef {
    /// Resolve a field by its admin-assigned name, case-insensitively.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }
}

/// Read-only access to the platform's metadata cache.
#[async_trait]
pub trait MetadataCache: Send + Sync {
    async fn table_by_id(&self, table_id: Uuid) -> EngineResult<Option<TableDef>>;
    async fn table_by_name(&self, name: &str) -> EngineResult<Option<TableDef>>;
    async fn field_by_id(&self, field_id: Uuid) -> EngineResult<Option<FieldDef>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup_is_case_insensitive() {
        let table_id = Uuid::new_v4();
        let table = TableDef {
            id: table_id,
            name: "ticket".to_string(),
            fields: vec![FieldDef {
                id: Uuid::new_v4(),
                table_id,
                name: "Priority".to_string(),
            }],
        };

        assert!(table.field_by_name("priority").is_some());
        assert!(table.field_by_name("PRIORITY").is_some());
        assert!(table.field_by_name("severity").is_none());
    }
}
