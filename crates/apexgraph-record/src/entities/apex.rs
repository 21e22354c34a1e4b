use serde::{Deserialize, Serialize};

/// A SOQL query found in a method body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SoqlQueryRecord {
    /// Query as written
    pub query: String,

    /// Normalized query text; empty when the parser did not supply one
    pub canonical_query: String,
}

impl SoqlQueryRecord {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            canonical_query: String::new(),
        }
    }

    pub fn with_canonical(mut self, canonical: impl Into<String>) -> Self {
        self.canonical_query = canonical.into();
        self
    }

    /// The canonical query, or the raw query when none was supplied.
    pub fn canonical_or_query(&self) -> &str {
        if self.canonical_query.is_empty() {
            &self.query
        } else {
            &self.canonical_query
        }
    }
}

/// A DML statement found in a method body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmlOperationRecord {
    /// `insert`, `update`, `delete`, `upsert`, `merge` or `undelete`, in any case
    #[serde(rename = "type")]
    pub operation_type: String,
}

impl DmlOperationRecord {
    pub fn new(operation_type: impl Into<String>) -> Self {
        Self {
            operation_type: operation_type.into(),
        }
    }

    /// Upper-case operation type as used in node ids (`INSERT`).
    pub fn normalized_type(&self) -> String {
        self.operation_type.trim().to_ascii_uppercase()
    }
}

/// A method call expression. Carried for callers; not resolved into edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MethodCallRecord {
    pub method_name: String,
    pub full_method_name: String,
}

/// A method of an Apex class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApexMethodRecord {
    /// Method name
    pub name: String,

    /// Declared return type
    pub return_type: String,

    /// Number of parameters
    pub arity: u32,

    pub public: bool,

    #[serde(rename = "static")]
    pub is_static: bool,

    pub constructor: bool,

    /// Annotation names (`AuraEnabled`, `TestVisible`, ...)
    pub annotations: Vec<String>,

    /// Queries in source order; the position is the query ordinal
    pub soql_queries: Vec<SoqlQueryRecord>,

    /// DML statements in source order; the position is the operation ordinal
    pub dml_operations: Vec<DmlOperationRecord>,

    pub method_calls: Vec<MethodCallRecord>,
}

impl ApexMethodRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: "void".to_string(),
            ..Default::default()
        }
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = return_type.into();
        self
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn with_soql(mut self, query: SoqlQueryRecord) -> Self {
        self.soql_queries.push(query);
        self
    }

    pub fn with_dml(mut self, operation: DmlOperationRecord) -> Self {
        self.dml_operations.push(operation);
        self
    }
}

/// Normalized record of one Apex class file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApexClassRecord {
    /// Class name
    pub name: String,

    pub simple_name: String,

    pub defining_type: String,

    pub public: bool,

    pub with_sharing: bool,

    /// Source file name (`Foo.cls`)
    pub file_name: String,

    /// Extended class, if any
    pub super_class_name: Option<String>,

    pub methods: Vec<ApexMethodRecord>,
}

impl ApexClassRecord {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            simple_name: name.clone(),
            file_name: format!("{name}.cls"),
            name,
            ..Default::default()
        }
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn with_sharing(mut self) -> Self {
        self.with_sharing = true;
        self
    }

    pub fn with_super_class(mut self, name: impl Into<String>) -> Self {
        self.super_class_name = Some(name.into());
        self
    }

    pub fn with_method(mut self, method: ApexMethodRecord) -> Self {
        self.methods.push(method);
        self
    }

    /// Structural checks a parser must satisfy.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Apex class record has an empty name".to_string());
        }
        for (index, method) in self.methods.iter().enumerate() {
            if method.name.trim().is_empty() {
                return Err(format!("method #{index} of {} has an empty name", self.name));
            }
            if let Some(dml) = method
                .dml_operations
                .iter()
                .find(|dml| dml.operation_type.trim().is_empty())
            {
                return Err(format!(
                    "method {}.{} has a DML operation without a type: {dml:?}",
                    self.name, method.name
                ));
            }
        }
        Ok(())
    }
}
