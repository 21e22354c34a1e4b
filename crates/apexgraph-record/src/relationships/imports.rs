use serde::{Deserialize, Serialize};

/// Path segment that marks an Apex import: `<namespace>/apex/<Class>[.<Method>]`.
pub const APEX_IMPORT_SEGMENT: &str = "/apex/";

/// Apex class (and optionally method) a component script depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApexDependency {
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
}

impl ApexDependency {
    pub fn class(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: None,
        }
    }

    pub fn method(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: Some(method_name.into()),
        }
    }
}

/// An import statement of a component script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportRecord {
    /// Module specifier (`lwc`, `@salesforce/apex/Ctrl.getData`)
    pub source: String,

    /// Imported names (local name when aliased)
    pub specifiers: Vec<String>,

    /// Apex target as resolved by the parser, if it resolved one
    pub apex_dependency: Option<ApexDependency>,
}

impl ImportRecord {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_specifiers<I, S>(mut self, specifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.specifiers = specifiers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_apex_dependency(mut self, dependency: ApexDependency) -> Self {
        self.apex_dependency = Some(dependency);
        self
    }

    /// The Apex target of this import: the parser's resolution if present,
    /// otherwise whatever the module specifier names by convention.
    pub fn apex_target(&self) -> Option<ApexDependency> {
        self.apex_dependency
            .clone()
            .filter(|dep| !dep.class_name.is_empty())
            .or_else(|| parse_apex_import(&self.source))
    }
}

/// Parse an Apex import specifier.
///
/// `@salesforce/apex/Ctrl.getData` names class `Ctrl` and method `getData`;
/// `@salesforce/apex/Ctrl` names the class only. Returns `None` for anything
/// that does not follow `<namespace>/apex/<Class>[.<Method>]`.
pub fn parse_apex_import(source: &str) -> Option<ApexDependency> {
    let (namespace, target) = source.split_once(APEX_IMPORT_SEGMENT)?;
    if namespace.is_empty() || target.is_empty() || target.contains('/') {
        return None;
    }

    let mut parts = target.split('.');
    let class_name = parts.next().filter(|name| !name.is_empty())?;
    let method_name = parts.next().filter(|name| !name.is_empty());

    Some(ApexDependency {
        class_name: class_name.to_string(),
        method_name: method_name.map(str::to_string),
    })
}
