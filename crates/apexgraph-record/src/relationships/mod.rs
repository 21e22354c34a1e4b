mod imports;

pub use imports::{parse_apex_import, ApexDependency, ImportRecord, APEX_IMPORT_SEGMENT};
