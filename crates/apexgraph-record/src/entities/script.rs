use crate::relationships::ImportRecord;
use apexgraph::graph::JsMethodKind;
use serde::{Deserialize, Serialize};

/// An export statement of a component script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptExportRecord {
    /// Export form (`default`, `named`)
    #[serde(rename = "type")]
    pub export_type: String,

    /// Exported name; empty for anonymous default exports
    pub name: String,
}

impl ScriptExportRecord {
    /// Name to store on the component: the exported name, else the export form.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.export_type
        } else {
            &self.name
        }
    }
}

/// A class field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptPropertyRecord {
    pub name: String,
    #[serde(rename = "static")]
    pub is_static: bool,
}

/// A method of a script class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptMethodRecord {
    pub name: String,

    /// `constructor`, `method`, `get` or `set`
    pub kind: JsMethodKind,

    #[serde(rename = "async")]
    pub is_async: bool,

    #[serde(rename = "static")]
    pub is_static: bool,

    /// Parameter names
    pub parameters: Vec<String>,
}

impl ScriptMethodRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: JsMethodKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn async_method(mut self) -> Self {
        self.is_async = true;
        self
    }
}

/// A class declared in a component script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScriptClassRecord {
    pub name: String,

    /// Extended class; parsers may send an empty string for none
    pub super_class: Option<String>,

    pub properties: Vec<ScriptPropertyRecord>,

    pub methods: Vec<ScriptMethodRecord>,
}

impl ScriptClassRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_super_class(mut self, name: impl Into<String>) -> Self {
        self.super_class = Some(name.into());
        self
    }

    pub fn with_method(mut self, method: ScriptMethodRecord) -> Self {
        self.methods.push(method);
        self
    }
}

/// A top-level function of a component script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptFunctionRecord {
    pub name: String,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub parameters: Vec<String>,
}

impl ScriptFunctionRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Normalized record of one component script (`widget.js`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScriptComponentRecord {
    /// Component name, without the `.js` extension
    pub name: String,

    pub file_name: String,

    pub imports: Vec<ImportRecord>,

    pub exports: Vec<ScriptExportRecord>,

    pub classes: Vec<ScriptClassRecord>,

    pub functions: Vec<ScriptFunctionRecord>,
}

impl ScriptComponentRecord {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            file_name: format!("{name}.js"),
            name,
            ..Default::default()
        }
    }

    pub fn with_import(mut self, import: ImportRecord) -> Self {
        self.imports.push(import);
        self
    }

    pub fn with_class(mut self, class: ScriptClassRecord) -> Self {
        self.classes.push(class);
        self
    }

    pub fn with_function(mut self, function: ScriptFunctionRecord) -> Self {
        self.functions.push(function);
        self
    }

    /// Structural checks a parser must satisfy.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("script component record has an empty name".to_string());
        }
        if let Some(import) = self.imports.iter().find(|i| i.source.trim().is_empty()) {
            return Err(format!("import without a module specifier: {import:?}"));
        }
        for class in &self.classes {
            if class.name.trim().is_empty() {
                return Err(format!("class without a name in {}", self.name));
            }
            if class.methods.iter().any(|m| m.name.trim().is_empty()) {
                return Err(format!("method without a name in class {}", class.name));
            }
        }
        if self.functions.iter().any(|f| f.name.trim().is_empty()) {
            return Err(format!("function without a name in {}", self.name));
        }
        Ok(())
    }
}
