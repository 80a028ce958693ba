//! Declared type and member catalog.
//!
//! # Responsibility
//! - Hold the members each model type declares, with their attributes.
//! - Hand out `MemberRef`s whose attributes are resolved once, up front.
//!
//! # Invariants
//! - Type names are unique; member names are unique within a type.
//! - Every stored attribute passed `Attribute::validate_declaration()`.
//! - Lookups of undeclared members fail with `CatalogError::MissingMember`.

use crate::model::attribute::{Attribute, AttributeDeclarationError, AttributeKind};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Named reference to a model type, e.g. `Demo.User`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Resolved reference to one member of a declared type.
///
/// Clones share the attribute list.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRef {
    declaring_type: TypeRef,
    name: String,
    attributes: Arc<[Attribute]>,
}

impl MemberRef {
    pub fn new(
        declaring_type: TypeRef,
        name: impl Into<String>,
        attributes: impl Into<Arc<[Attribute]>>,
    ) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            attributes: attributes.into(),
        }
    }

    pub fn declaring_type(&self) -> &TypeRef {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All declared attributes in declaration order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Declared validation attributes, in declaration order.
    pub fn declared_validation_attributes(&self) -> impl Iterator<Item = &Attribute> + '_ {
        self.attributes
            .iter()
            .filter(|attribute| attribute.is_validation())
    }
}

/// One member declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }
}

/// One type declaration with its members in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: TypeRef,
    #[serde(default)]
    pub members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn member(mut self, name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        self.members.push(MemberDescriptor::new(name, attributes));
        self
    }
}

/// Registry of declared types.
#[derive(Debug, Default, Clone)]
pub struct TypeCatalog {
    types: BTreeMap<TypeRef, Vec<MemberRef>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one type after validating names and attribute declarations.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<(), CatalogError> {
        let type_ref = descriptor.name;
        if !is_valid_type_name(type_ref.name()) {
            return Err(CatalogError::InvalidName(type_ref.name().to_string()));
        }
        if self.types.contains_key(&type_ref) {
            return Err(CatalogError::DuplicateType(type_ref));
        }

        let mut members: Vec<MemberRef> = Vec::with_capacity(descriptor.members.len());
        for member in descriptor.members {
            if !is_valid_identifier(&member.name) {
                return Err(CatalogError::InvalidName(format!(
                    "{}.{}",
                    type_ref, member.name
                )));
            }
            if members.iter().any(|existing| existing.name() == member.name) {
                return Err(CatalogError::DuplicateMember {
                    type_ref,
                    member: member.name,
                });
            }
            for attribute in &member.attributes {
                attribute
                    .validate_declaration()
                    .map_err(|source| CatalogError::InvalidAttribute {
                        type_ref: type_ref.clone(),
                        member: member.name.clone(),
                        source,
                    })?;
            }
            members.push(MemberRef::new(
                type_ref.clone(),
                member.name,
                member.attributes,
            ));
        }

        debug!(
            "event=type_registered module=catalog type={} members={}",
            type_ref,
            members.len()
        );
        self.types.insert(type_ref, members);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn contains_type(&self, type_ref: &TypeRef) -> bool {
        self.types.contains_key(type_ref)
    }

    /// Members of one type in declaration order.
    pub fn members(&self, type_ref: &TypeRef) -> Result<&[MemberRef], CatalogError> {
        self.types
            .get(type_ref)
            .map(Vec::as_slice)
            .ok_or_else(|| CatalogError::MissingType(type_ref.clone()))
    }

    /// Looks up one member by name.
    pub fn member(&self, type_ref: &TypeRef, name: &str) -> Result<&MemberRef, CatalogError> {
        self.members(type_ref)?
            .iter()
            .find(|member| member.name() == name)
            .ok_or_else(|| CatalogError::MissingMember {
                type_ref: type_ref.clone(),
                member: name.to_string(),
            })
    }

    /// Returns the first attribute of `kind` declared on `type_ref.property`.
    pub fn attribute_of_kind(
        &self,
        type_ref: &TypeRef,
        property: &str,
        kind: &AttributeKind,
    ) -> Result<Option<&Attribute>, CatalogError> {
        let member = self.member(type_ref, property)?;
        Ok(member
            .attributes()
            .iter()
            .find(|attribute| &attribute.kind() == kind))
    }
}

fn is_valid_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if !first.is_alphabetic() && first != '_' {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn is_valid_type_name(value: &str) -> bool {
    !value.is_empty() && value.split('.').all(is_valid_identifier)
}

/// Catalog registration and lookup errors.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    InvalidName(String),
    DuplicateType(TypeRef),
    DuplicateMember {
        type_ref: TypeRef,
        member: String,
    },
    InvalidAttribute {
        type_ref: TypeRef,
        member: String,
        source: AttributeDeclarationError,
    },
    MissingType(TypeRef),
    MissingMember {
        type_ref: TypeRef,
        member: String,
    },
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(value) => write!(f, "type or member name is invalid: {value}"),
            Self::DuplicateType(value) => write!(f, "type already registered: {value}"),
            Self::DuplicateMember { type_ref, member } => {
                write!(f, "member declared twice: {type_ref}.{member}")
            }
            Self::InvalidAttribute {
                type_ref,
                member,
                source,
            } => write!(f, "invalid attribute on {type_ref}.{member}: {source}"),
            Self::MissingType(value) => write!(f, "type is not declared: {value}"),
            Self::MissingMember { type_ref, member } => {
                write!(f, "type {type_ref} has no member named `{member}`")
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidAttribute { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogError, TypeCatalog, TypeDescriptor, TypeRef};
    use crate::model::attribute::{Attribute, AttributeKind, ValidationAttribute};

    fn user_type() -> TypeDescriptor {
        TypeDescriptor::new("Demo.User")
            .member("Name", vec![ValidationAttribute::required().into()])
            .member(
                "Email",
                vec![
                    Attribute::display_name("E-mail"),
                    ValidationAttribute::max_length(120).into(),
                ],
            )
    }

    #[test]
    fn registers_and_looks_up_members() {
        let mut catalog = TypeCatalog::new();
        catalog.register(user_type()).expect("user type registration");

        let user = TypeRef::new("Demo.User");
        let email = catalog.member(&user, "Email").expect("email member");
        assert_eq!(email.declaring_type(), &user);
        assert_eq!(email.attributes().len(), 2);
        let validation: Vec<_> = email.declared_validation_attributes().collect();
        assert_eq!(validation.len(), 1);
        assert_eq!(validation[0].kind(), AttributeKind::MaxLength);
    }

    #[test]
    fn missing_member_is_reported() {
        let mut catalog = TypeCatalog::new();
        catalog.register(user_type()).expect("user type registration");

        let err = catalog
            .member(&TypeRef::new("Demo.User"), "Nickname")
            .expect_err("undeclared member must fail");
        assert_eq!(
            err,
            CatalogError::MissingMember {
                type_ref: TypeRef::new("Demo.User"),
                member: "Nickname".to_string(),
            }
        );
    }

    #[test]
    fn rejects_duplicate_type_and_member() {
        let mut catalog = TypeCatalog::new();
        catalog.register(user_type()).expect("first registration");
        let err = catalog.register(user_type()).expect_err("duplicate type");
        assert!(matches!(err, CatalogError::DuplicateType(_)));

        let twice = TypeDescriptor::new("Demo.Other")
            .member("Name", vec![])
            .member("Name", vec![]);
        let err = catalog.register(twice).expect_err("duplicate member");
        assert!(matches!(err, CatalogError::DuplicateMember { .. }));
    }

    #[test]
    fn rejects_invalid_names() {
        let mut catalog = TypeCatalog::new();
        let err = catalog
            .register(TypeDescriptor::new("Demo..User"))
            .expect_err("empty segment");
        assert!(matches!(err, CatalogError::InvalidName(_)));

        let err = catalog
            .register(TypeDescriptor::new("Demo.User").member("first name", vec![]))
            .expect_err("space in member name");
        assert!(matches!(err, CatalogError::InvalidName(_)));
    }

    #[test]
    fn rejects_invalid_attribute_declaration() {
        let mut catalog = TypeCatalog::new();
        let err = catalog
            .register(
                TypeDescriptor::new("Demo.User")
                    .member("Age", vec![ValidationAttribute::range(120.0, 0.0).into()]),
            )
            .expect_err("inverted range");
        assert!(matches!(err, CatalogError::InvalidAttribute { .. }));
        assert!(!catalog.contains_type(&TypeRef::new("Demo.User")));
    }

    #[test]
    fn finds_attribute_of_kind() {
        let mut catalog = TypeCatalog::new();
        catalog.register(user_type()).expect("user type registration");
        let user = TypeRef::new("Demo.User");

        let required = catalog
            .attribute_of_kind(&user, "Name", &AttributeKind::Required)
            .expect("name lookup");
        assert!(required.is_some());
        let display = catalog
            .attribute_of_kind(&user, "Name", &AttributeKind::DisplayName)
            .expect("name lookup");
        assert!(display.is_none());
    }
}
