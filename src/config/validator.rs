//! Configuration validation: fail fast before any identifier reaches SQL.

use crate::access;
use crate::config::types::{Collection, EngineConfig, Field, FieldType};
use crate::error::ConfigError;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Columns the engine owns on every table.
const ENGINE_COLUMNS: &[&str] = &["id", "createdAt", "updatedAt"];

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"))
}

/// True when `name` is usable verbatim as a SQL table or column identifier.
pub fn is_safe_identifier(name: &str) -> bool {
    identifier_pattern().is_match(name)
}

pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    let mut slugs = HashSet::new();
    for collection in &config.collections {
        validate_slug(&collection.slug, "collection slug")?;
        if !slugs.insert(collection.slug.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "collection slug",
                name: collection.slug.clone(),
            });
        }
        validate_fields(collection)?;
    }

    let mut global_slugs = HashSet::new();
    for global in &config.globals {
        validate_slug(&global.slug, "global slug")?;
        if !global_slugs.insert(global.slug.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "global slug",
                name: global.slug.clone(),
            });
        }
        let mut seen = HashSet::new();
        for field in &global.fields {
            validate_field_name(&global.slug, field, &mut seen)?;
        }
    }

    validate_admin(config)?;
    Ok(())
}

fn validate_slug(slug: &str, kind: &'static str) -> Result<(), ConfigError> {
    if !is_safe_identifier(slug) {
        return Err(ConfigError::InvalidIdentifier {
            kind,
            name: slug.to_string(),
        });
    }
    if slug.starts_with("__") {
        return Err(ConfigError::Reserved {
            name: slug.to_string(),
            reason: "the '__' prefix belongs to engine routes",
        });
    }
    if access::SYSTEM_RESOURCES.contains(&slug) {
        return Err(ConfigError::Reserved {
            name: slug.to_string(),
            reason: "collides with a system access-control resource",
        });
    }
    Ok(())
}

fn validate_fields(collection: &Collection) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for field in &collection.fields {
        validate_field_name(&collection.slug, field, &mut seen)?;
        if let Some(default) = &field.default_value {
            if !default_matches_type(field.field_type, default) {
                return Err(ConfigError::DefaultTypeMismatch {
                    slug: collection.slug.clone(),
                    field: field.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_field_name<'a>(
    owner: &str,
    field: &'a Field,
    seen: &mut HashSet<&'a str>,
) -> Result<(), ConfigError> {
    if !is_safe_identifier(&field.name) {
        return Err(ConfigError::InvalidIdentifier {
            kind: "field name",
            name: format!("{}.{}", owner, field.name),
        });
    }
    if ENGINE_COLUMNS.contains(&field.name.as_str()) {
        return Err(ConfigError::Reserved {
            name: format!("{}.{}", owner, field.name),
            reason: "shadows an engine-owned column",
        });
    }
    if !seen.insert(field.name.as_str()) {
        return Err(ConfigError::Duplicate {
            kind: "field name",
            name: format!("{}.{}", owner, field.name),
        });
    }
    Ok(())
}

fn default_matches_type(field_type: FieldType, value: &Value) -> bool {
    match field_type {
        FieldType::Text | FieldType::Richtext | FieldType::Select | FieldType::Date => {
            value.is_string()
        }
        FieldType::Relationship => value.is_string() || value.as_i64().is_some(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Array => value.is_array(),
    }
}

/// When accounts are configured, the named collection must exist and carry a
/// text `role` field for the first-admin bootstrap to write into.
fn validate_admin(config: &EngineConfig) -> Result<(), ConfigError> {
    let Some(slug) = &config.admin.user_collection else {
        return Ok(());
    };
    let collection = config
        .collections
        .iter()
        .find(|c| c.slug == *slug)
        .ok_or_else(|| ConfigError::MissingReference {
            kind: "user collection",
            id: slug.clone(),
        })?;
    match collection.field_named(access::ROLE_FIELD) {
        Some(f) if f.field_type == FieldType::Text => Ok(()),
        _ => Err(ConfigError::Validation(format!(
            "user collection '{}' must declare a text field named '{}'",
            slug,
            access::ROLE_FIELD
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{AdminConfig, Field};
    use serde_json::json;

    fn config_with(collections: Vec<Collection>) -> EngineConfig {
        EngineConfig {
            collections,
            ..Default::default()
        }
    }

    #[test]
    fn accepts_a_plain_collection() {
        let config = config_with(vec![Collection::new("posts")
            .field(Field::text("title").required())
            .field(Field::number("views"))
            .timestamps()]);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn rejects_unsafe_slug() {
        let config = config_with(vec![Collection::new("posts; DROP TABLE users")]);
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn rejects_system_resource_slug() {
        let config = config_with(vec![Collection::new("session")]);
        assert!(matches!(validate(&config), Err(ConfigError::Reserved { .. })));
    }

    #[test]
    fn rejects_duplicate_field() {
        let config = config_with(vec![Collection::new("posts")
            .field(Field::text("title"))
            .field(Field::number("title"))]);
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Duplicate { kind: "field name", .. })
        ));
    }

    #[test]
    fn rejects_engine_column_shadowing() {
        let config = config_with(vec![Collection::new("posts").field(Field::number("id"))]);
        assert!(matches!(validate(&config), Err(ConfigError::Reserved { .. })));
    }

    #[test]
    fn rejects_mismatched_default() {
        let config = config_with(vec![
            Collection::new("posts").field(Field::number("views").default_value(json!("ten")))
        ]);
        assert!(matches!(
            validate(&config),
            Err(ConfigError::DefaultTypeMismatch { .. })
        ));
    }

    #[test]
    fn user_collection_needs_role_field() {
        let mut config = config_with(vec![
            Collection::new("users").field(Field::text("email").required())
        ]);
        config.admin = AdminConfig {
            user_collection: Some("users".into()),
            ..Default::default()
        };
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.collections = vec![Collection::new("users")
            .field(Field::text("email").required())
            .field(Field::text("role"))];
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn rejects_unknown_user_collection() {
        let mut config = config_with(vec![Collection::new("posts")]);
        config.admin = AdminConfig {
            user_collection: Some("users".into()),
            ..Default::default()
        };
        assert!(matches!(
            validate(&config),
            Err(ConfigError::MissingReference { .. })
        ));
    }
}
