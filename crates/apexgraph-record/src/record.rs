use crate::entities::{ApexClassRecord, ScriptComponentRecord};
use serde::{Deserialize, Serialize};

/// Normalized AST record for exactly one source file
///
/// This is the bridge between a language parser and the graph: the parser
/// produces one record per file, the ingestion pipeline turns it into upserts.
/// Serialized with a `recordType` tag (`apexClass` or `scriptComponent`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "recordType", rename_all = "camelCase")]
pub enum AstRecord {
    /// An Apex class file
    ApexClass(ApexClassRecord),
    /// A Lightning Web Component script
    ScriptComponent(ScriptComponentRecord),
}

impl AstRecord {
    /// Class or component name.
    pub fn name(&self) -> &str {
        match self {
            AstRecord::ApexClass(record) => &record.name,
            AstRecord::ScriptComponent(record) => &record.name,
        }
    }

    /// The `recordType` tag value.
    pub fn record_type(&self) -> &'static str {
        match self {
            AstRecord::ApexClass(_) => "apexClass",
            AstRecord::ScriptComponent(_) => "scriptComponent",
        }
    }

    /// Number of methods (Apex methods, or script class methods plus functions).
    pub fn method_count(&self) -> usize {
        match self {
            AstRecord::ApexClass(record) => record.methods.len(),
            AstRecord::ScriptComponent(record) => {
                record.classes.iter().map(|c| c.methods.len()).sum::<usize>()
                    + record.functions.len()
            }
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        match self {
            AstRecord::ApexClass(record) => record.validate(),
            AstRecord::ScriptComponent(record) => record.validate(),
        }
    }
}

impl From<ApexClassRecord> for AstRecord {
    fn from(record: ApexClassRecord) -> Self {
        AstRecord::ApexClass(record)
    }
}

impl From<ScriptComponentRecord> for AstRecord {
    fn from(record: ScriptComponentRecord) -> Self {
        AstRecord::ScriptComponent(record)
    }
}
