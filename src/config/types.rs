//! Schema model: collections, fields, and engine configuration.
//!
//! Declared once at process configuration time and immutable thereafter.
//! Every other component (migration, validation, SQL generation, access
//! synthesis) reads the same declaration; nothing mutates it.

use crate::hooks::CollectionHooks;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Richtext,
    Relationship,
    Select,
    Date,
    Boolean,
    Array,
}

/// Per-action predicate attached to a field or collection. The engine only
/// carries the declaration (it surfaces in admin introspection); enforcement
/// happens at the validation boundary, outside this core.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct AccessPredicates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessPredicates>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Field {
            name: name.into(),
            field_type,
            label: None,
            required: false,
            unique: false,
            default_value: None,
            access: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Field::new(name, FieldType::Text)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Field::new(name, FieldType::Number)
    }

    pub fn richtext(name: impl Into<String>) -> Self {
        Field::new(name, FieldType::Richtext)
    }

    pub fn relationship(name: impl Into<String>) -> Self {
        Field::new(name, FieldType::Relationship)
    }

    pub fn select(name: impl Into<String>) -> Self {
        Field::new(name, FieldType::Select)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Field::new(name, FieldType::Date)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Field::new(name, FieldType::Boolean)
    }

    pub fn array(name: impl Into<String>) -> Self {
        Field::new(name, FieldType::Array)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn access(mut self, access: AccessPredicates) -> Self {
        self.access = Some(access);
        self
    }
}

/// A declared content type. The slug names both the REST resource and the
/// storage relation, so it must survive the safe-identifier check.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub slug: String,
    pub fields: Vec<Field>,
    #[serde(default)]
    pub timestamps: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessPredicates>,
    #[serde(skip)]
    pub hooks: Option<Arc<dyn CollectionHooks>>,
}

impl Collection {
    pub fn new(slug: impl Into<String>) -> Self {
        Collection {
            slug: slug.into(),
            fields: Vec::new(),
            timestamps: false,
            access: None,
            hooks: None,
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }

    pub fn access(mut self, access: AccessPredicates) -> Self {
        self.access = Some(access);
        self
    }

    pub fn hooks(mut self, hooks: impl CollectionHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    pub fn field_named(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Column names addressable in filters, sorts, and lookups: the declared
    /// fields plus the engine-owned columns.
    pub fn is_queryable_column(&self, name: &str) -> bool {
        name == "id"
            || self.fields.iter().any(|f| f.name == name)
            || (self.timestamps && (name == "createdAt" || name == "updatedAt"))
    }
}

/// A declared global: a single named field group. Globals surface in admin
/// introspection only; they are neither migrated nor routed.
#[derive(Clone, Serialize, Deserialize)]
pub struct Global {
    pub slug: String,
    pub fields: Vec<Field>,
}

impl Global {
    pub fn new(slug: impl Into<String>) -> Self {
        Global {
            slug: slug.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfig {
    /// Collection holding accounts. Enables the first-admin bootstrap on
    /// create and the `__admin/setup` probe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default)]
    pub disable_admin: bool,
}

/// Grants for one custom role: resource name -> allowed actions.
pub type RoleGrants = BTreeMap<String, Vec<String>>;

/// The full engine declaration, owned by the configuration root.
#[derive(Clone, Default)]
pub struct EngineConfig {
    pub collections: Vec<Collection>,
    pub globals: Vec<Global>,
    pub admin: AdminConfig,
    pub server_url: Option<String>,
    /// Custom roles beyond the built-in `admin` and `user`.
    pub roles: BTreeMap<String, RoleGrants>,
}
