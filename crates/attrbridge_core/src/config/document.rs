//! JSON mapping document loading.
//!
//! # Responsibility
//! - Parse declared types and type maps from a JSON document.
//! - Resolve every member reference through the catalog once, at load time.
//!
//! # Invariants
//! - A document either loads completely or fails with the first error.
//! - Explicit member entries always win over same-name auto mapping.

use crate::mapping::configuration::{MappingConfigError, MappingConfiguration};
use crate::mapping::type_map::{PropertyMap, TypeMap};
use crate::model::catalog::{CatalogError, MemberRef, TypeCatalog, TypeDescriptor, TypeRef};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Root of a mapping document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingDocument {
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
    #[serde(default)]
    pub type_maps: Vec<TypeMapDeclaration>,
}

/// One declared type map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMapDeclaration {
    pub source: TypeRef,
    pub destination: TypeRef,
    /// Maps every undeclared destination member from the same-named source
    /// member, or leaves it unmapped when the source has none.
    #[serde(default)]
    pub auto_members: bool,
    #[serde(default)]
    pub members: Vec<MemberMapDeclaration>,
}

/// One declared property map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberMapDeclaration {
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub ignored: bool,
}

/// Catalog and configuration produced from one document.
#[derive(Debug, Clone)]
pub struct LoadedMapping {
    pub catalog: TypeCatalog,
    pub configuration: Arc<MappingConfiguration>,
}

impl MappingDocument {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::Parse)
    }

    /// Registers every type, then every type map, in document order.
    pub fn build(self) -> Result<LoadedMapping, ConfigError> {
        let mut catalog = TypeCatalog::new();
        for descriptor in self.types {
            catalog.register(descriptor)?;
        }

        let mut builder = MappingConfiguration::builder();
        for declaration in &self.type_maps {
            let type_map = build_type_map(&catalog, declaration)?;
            builder.register(type_map)?;
        }
        let configuration = builder.build();

        info!(
            "event=mapping_loaded module=config status=ok types={} type_maps={}",
            catalog.len(),
            configuration.len()
        );
        Ok(LoadedMapping {
            catalog,
            configuration: Arc::new(configuration),
        })
    }
}

fn build_type_map(
    catalog: &TypeCatalog,
    declaration: &TypeMapDeclaration,
) -> Result<TypeMap, ConfigError> {
    let mut destinations = BTreeSet::new();
    for member in &declaration.members {
        if !destinations.insert(member.destination.as_str()) {
            return Err(MappingConfigError::DuplicateDestination {
                destination_type: declaration.destination.clone(),
                member: member.destination.clone(),
            }
            .into());
        }
    }

    let source_members = catalog.members(&declaration.source)?;
    let destination_members = catalog.members(&declaration.destination)?;

    let explicit = |member: &MemberMapDeclaration| -> Result<PropertyMap, CatalogError> {
        let destination = catalog
            .member(&declaration.destination, &member.destination)?
            .clone();
        let property_map = match &member.source {
            Some(source) => PropertyMap::mapped(
                catalog.member(&declaration.source, source)?.clone(),
                destination,
            ),
            None => PropertyMap::unmapped(destination),
        };
        Ok(if member.ignored {
            property_map.ignore()
        } else {
            property_map
        })
    };

    let mut type_map = TypeMap::new(declaration.source.clone(), declaration.destination.clone());
    if declaration.auto_members {
        for destination in destination_members {
            let declared = declaration
                .members
                .iter()
                .find(|member| member.destination == destination.name());
            let property_map = match declared {
                Some(member) => explicit(member)?,
                None => same_name_map(source_members, destination),
            };
            type_map = type_map.with_property_map(property_map);
        }
        // Explicit entries naming undeclared destinations still have to fail.
        for member in &declaration.members {
            catalog.member(&declaration.destination, &member.destination)?;
        }
    } else {
        for member in &declaration.members {
            type_map = type_map.with_property_map(explicit(member)?);
        }
    }
    Ok(type_map)
}

fn same_name_map(source_members: &[MemberRef], destination: &MemberRef) -> PropertyMap {
    match source_members
        .iter()
        .find(|source| source.name() == destination.name())
    {
        Some(source) => PropertyMap::mapped(source.clone(), destination.clone()),
        None => PropertyMap::unmapped(destination.clone()),
    }
}

/// Parses and builds a mapping document.
pub fn load_mapping_document(json: &str) -> Result<LoadedMapping, ConfigError> {
    MappingDocument::from_json(json)?.build()
}

/// Reads a UTF-8 JSON mapping document from disk.
pub fn load_mapping_file(path: impl AsRef<Path>) -> Result<LoadedMapping, ConfigError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_mapping_document(&json)
}

/// Mapping document loading errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Catalog(CatalogError),
    Mapping(MappingConfigError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read mapping document `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "mapping document is not valid JSON: {err}"),
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Mapping(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Catalog(err) => Some(err),
            Self::Mapping(err) => Some(err),
        }
    }
}

impl From<CatalogError> for ConfigError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<MappingConfigError> for ConfigError {
    fn from(value: MappingConfigError) -> Self {
        Self::Mapping(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{load_mapping_document, ConfigError};
    use crate::mapping::type_map::TypeMapSource;
    use crate::model::catalog::{CatalogError, TypeRef};

    const DOCUMENT: &str = r#"{
        "types": [
            { "name": "Demo.User", "members": [
                { "name": "Name", "attributes": [{ "kind": "required" }] },
                { "name": "Email", "attributes": [{ "kind": "email_address" }] },
                { "name": "Secret", "attributes": [{ "kind": "required" }] }
            ]},
            { "name": "Demo.UserViewModel", "members": [
                { "name": "Name" },
                { "name": "Email" },
                { "name": "Secret" }
            ]}
        ],
        "type_maps": [
            { "source": "Demo.UserViewModel", "destination": "Demo.User",
              "auto_members": true,
              "members": [{ "destination": "Secret", "source": "Secret", "ignored": true }] }
        ]
    }"#;

    #[test]
    fn auto_members_follow_destination_order_with_explicit_override() {
        let loaded = load_mapping_document(DOCUMENT).expect("document should load");
        let type_map = &loaded.configuration.type_maps()[0];
        let summary: Vec<_> = type_map
            .property_maps()
            .iter()
            .map(|map| {
                (
                    map.destination_member().name(),
                    map.source_member().map(|member| member.name()),
                    map.is_ignored(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Name", Some("Name"), false),
                ("Email", Some("Email"), false),
                ("Secret", Some("Secret"), true),
            ]
        );
    }

    #[test]
    fn unknown_member_in_type_map_is_missing_member() {
        let json = r#"{
            "types": [
                { "name": "A", "members": [{ "name": "Name" }] },
                { "name": "B", "members": [{ "name": "Name" }] }
            ],
            "type_maps": [
                { "source": "A", "destination": "B",
                  "members": [{ "destination": "Name", "source": "Nickname" }] }
            ]
        }"#;
        let err = load_mapping_document(json).expect_err("unknown source member");
        match err {
            ConfigError::Catalog(CatalogError::MissingMember { type_ref, member }) => {
                assert_eq!(type_ref, TypeRef::new("A"));
                assert_eq!(member, "Nickname");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn undeclared_type_is_reported() {
        let json = r#"{ "type_maps": [{ "source": "A", "destination": "B" }] }"#;
        let err = load_mapping_document(json).expect_err("no types declared");
        assert!(matches!(
            err,
            ConfigError::Catalog(CatalogError::MissingType(_))
        ));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = load_mapping_document("{ \"types\": [").expect_err("truncated document");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
