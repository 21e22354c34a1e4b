mod apex;
mod script;

pub use apex::{ApexClassRecord, ApexMethodRecord, DmlOperationRecord, MethodCallRecord, SoqlQueryRecord};
pub use script::{
    ScriptClassRecord, ScriptComponentRecord, ScriptExportRecord, ScriptFunctionRecord,
    ScriptMethodRecord, ScriptPropertyRecord,
};
