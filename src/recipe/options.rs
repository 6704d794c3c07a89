// src/recipe/options.rs

//! Resolved option values for a recipe

use crate::error::{Error, Result};
use crate::recipe::format::{OptionSpec, OptionValue, RecipeMetadata};
use serde::Serialize;
use std::collections::BTreeMap;

/// Option values for one cook: recipe defaults overlaid with overrides
///
/// Immutable once resolved; every phase reads the same values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OptionValues {
    values: BTreeMap<String, OptionValue>,
}

impl OptionValues {
    /// Every option at its declared default
    pub fn defaults(metadata: &RecipeMetadata) -> Self {
        Self {
            values: metadata
                .options
                .iter()
                .map(|(name, spec)| (name.clone(), spec.default.clone()))
                .collect(),
        }
    }

    /// Defaults overlaid with `name=value` overrides
    ///
    /// Unknown option names and values outside the declared set are rejected.
    pub fn resolve<S: AsRef<str>>(metadata: &RecipeMetadata, overrides: &[(S, S)]) -> Result<Self> {
        let mut resolved = Self::defaults(metadata);

        for (name, raw) in overrides {
            let name = name.as_ref();
            let spec = metadata.options.get(name).ok_or_else(|| Error::InvalidOption {
                name: name.to_string(),
                reason: format!(
                    "not declared by recipe {} (known: {})",
                    metadata.package.name,
                    metadata.options.keys().cloned().collect::<Vec<_>>().join(", ")
                ),
            })?;

            let value = parse_value(spec, raw.as_ref()).ok_or_else(|| Error::InvalidOption {
                name: name.to_string(),
                reason: format!(
                    "'{}' is not one of [{}]",
                    raw.as_ref(),
                    spec.values
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })?;

            resolved.values.insert(name.to_string(), value);
        }

        Ok(resolved)
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    /// True if `name` is a boolean option set to true
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).and_then(OptionValue::as_bool).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// CMake definitions driven by options that declare a `define`
    pub fn defines(&self, metadata: &RecipeMetadata) -> BTreeMap<String, String> {
        metadata
            .options
            .iter()
            .filter_map(|(name, spec)| {
                let define = spec.define.as_ref()?;
                let value = self.values.get(name)?;
                Some((define.clone(), value.to_define()))
            })
            .collect()
    }
}

/// Split a `name=value` command-line assignment
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw.split_once('=').ok_or_else(|| Error::InvalidOption {
        name: raw.to_string(),
        reason: "expected name=value".to_string(),
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidOption {
            name: raw.to_string(),
            reason: "empty option name".to_string(),
        });
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_value(spec: &OptionSpec, raw: &str) -> Option<OptionValue> {
    let value = if spec.is_boolean() {
        match raw.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => OptionValue::Bool(true),
            "false" | "off" | "no" | "0" => OptionValue::Bool(false),
            _ => return None,
        }
    } else {
        OptionValue::Str(raw.to_string())
    };

    spec.allows(&value).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::parser::parse_recipe;

    fn metadata() -> RecipeMetadata {
        parse_recipe(
            r#"
[package]
name = "demo"
version = "1.0"

[source]
git = "https://example.com/demo.git"
revision = "v%(version)s"

[options.shared]
values = [true, false]
default = false
define = "BUILD_SHARED_LIBS"

[options.flavor]
values = ["small", "large"]
default = "small"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let values = OptionValues::defaults(&metadata());
        assert!(!values.is_enabled("shared"));
        assert_eq!(values.get("flavor"), Some(&OptionValue::Str("small".into())));
    }

    #[test]
    fn test_resolve_overrides() {
        let meta = metadata();
        let values =
            OptionValues::resolve(&meta, &[("shared", "True"), ("flavor", "large")]).unwrap();
        assert!(values.is_enabled("shared"));
        assert_eq!(values.get("flavor"), Some(&OptionValue::Str("large".into())));

        let defines = values.defines(&meta);
        assert_eq!(defines.get("BUILD_SHARED_LIBS").map(String::as_str), Some("ON"));
        assert_eq!(defines.len(), 1);
    }

    #[test]
    fn test_resolve_rejects_unknown_and_disallowed() {
        let meta = metadata();
        assert!(matches!(
            OptionValues::resolve(&meta, &[("nope", "true")]),
            Err(Error::InvalidOption { .. })
        ));
        assert!(matches!(
            OptionValues::resolve(&meta, &[("shared", "maybe")]),
            Err(Error::InvalidOption { .. })
        ));
        assert!(matches!(
            OptionValues::resolve(&meta, &[("flavor", "medium")]),
            Err(Error::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("build_schemagen=False").unwrap(),
            ("build_schemagen".to_string(), "False".to_string())
        );
        assert!(parse_assignment("build_schemagen").is_err());
        assert!(parse_assignment("=x").is_err());
    }
}
