//! Immutable mapping configuration and its registration builder.
//!
//! # Responsibility
//! - Collect type maps in registration order and validate their shape.
//! - Freeze them into a configuration that is only ever read afterwards.
//!
//! # Invariants
//! - At most one type map per `(source, destination)` pair.
//! - Property map members belong to the type map's source/destination types.
//! - A destination member is targeted by at most one property map per type map.
//! - `MappingConfiguration` has no mutating API; share it through `Arc`.

use crate::mapping::type_map::{TypeMap, TypeMapSource};
use crate::model::catalog::TypeRef;
use log::{debug, info};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Frozen set of type maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingConfiguration {
    type_maps: Vec<TypeMap>,
}

impl MappingConfiguration {
    pub fn builder() -> MappingConfigurationBuilder {
        MappingConfigurationBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.type_maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.type_maps.is_empty()
    }

    pub fn find(&self, source_type: &TypeRef, destination_type: &TypeRef) -> Option<&TypeMap> {
        self.type_maps.iter().find(|type_map| {
            type_map.source_type() == source_type && type_map.destination_type() == destination_type
        })
    }
}

impl TypeMapSource for MappingConfiguration {
    fn type_maps(&self) -> &[TypeMap] {
        &self.type_maps
    }
}

/// Validating builder for `MappingConfiguration`.
#[derive(Debug, Default)]
pub struct MappingConfigurationBuilder {
    type_maps: Vec<TypeMap>,
    pairs: BTreeSet<(TypeRef, TypeRef)>,
}

impl MappingConfigurationBuilder {
    /// Appends one type map after shape validation.
    pub fn register(&mut self, type_map: TypeMap) -> Result<&mut Self, MappingConfigError> {
        let pair = (
            type_map.source_type().clone(),
            type_map.destination_type().clone(),
        );
        if self.pairs.contains(&pair) {
            return Err(MappingConfigError::DuplicateTypeMap {
                source_type: pair.0,
                destination_type: pair.1,
            });
        }

        let mut destinations = BTreeSet::<&str>::new();
        for property_map in type_map.property_maps() {
            let destination = property_map.destination_member();
            if destination.declaring_type() != type_map.destination_type() {
                return Err(MappingConfigError::TypeMismatch {
                    expected: type_map.destination_type().clone(),
                    found: destination.declaring_type().clone(),
                    member: destination.name().to_string(),
                });
            }
            if let Some(source) = property_map.source_member() {
                if source.declaring_type() != type_map.source_type() {
                    return Err(MappingConfigError::TypeMismatch {
                        expected: type_map.source_type().clone(),
                        found: source.declaring_type().clone(),
                        member: source.name().to_string(),
                    });
                }
            }
            if !destinations.insert(destination.name()) {
                return Err(MappingConfigError::DuplicateDestination {
                    destination_type: type_map.destination_type().clone(),
                    member: destination.name().to_string(),
                });
            }
        }

        debug!(
            "event=type_map_registered module=mapping source={} destination={} property_maps={}",
            type_map.source_type(),
            type_map.destination_type(),
            type_map.property_maps().len()
        );
        self.pairs.insert(pair);
        self.type_maps.push(type_map);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.type_maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.type_maps.is_empty()
    }

    pub fn build(self) -> MappingConfiguration {
        info!(
            "event=mapping_built module=mapping status=ok type_maps={}",
            self.type_maps.len()
        );
        MappingConfiguration {
            type_maps: self.type_maps,
        }
    }
}

/// Type map registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingConfigError {
    DuplicateTypeMap {
        source_type: TypeRef,
        destination_type: TypeRef,
    },
    TypeMismatch {
        expected: TypeRef,
        found: TypeRef,
        member: String,
    },
    DuplicateDestination {
        destination_type: TypeRef,
        member: String,
    },
}

impl Display for MappingConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateTypeMap {
                source_type,
                destination_type,
            } => write!(
                f,
                "type map already registered: {source_type} -> {destination_type}"
            ),
            Self::TypeMismatch {
                expected,
                found,
                member,
            } => write!(
                f,
                "member `{member}` belongs to {found}, expected a member of {expected}"
            ),
            Self::DuplicateDestination {
                destination_type,
                member,
            } => write!(
                f,
                "destination member mapped twice: {destination_type}.{member}"
            ),
        }
    }
}

impl Error for MappingConfigError {}

#[cfg(test)]
mod tests {
    use super::{MappingConfigError, MappingConfiguration};
    use crate::mapping::type_map::{PropertyMap, TypeMap, TypeMapSource};
    use crate::model::catalog::{MemberRef, TypeRef};

    fn member(type_name: &str, name: &str) -> MemberRef {
        MemberRef::new(TypeRef::new(type_name), name, Vec::new())
    }

    fn name_map(source: &str, destination: &str) -> TypeMap {
        TypeMap::new(source, destination).with_property_map(PropertyMap::mapped(
            member(source, "Name"),
            member(destination, "Name"),
        ))
    }

    #[test]
    fn keeps_registration_order_per_source() {
        let mut builder = MappingConfiguration::builder();
        builder
            .register(name_map("Vm", "User"))
            .expect("first map")
            .register(name_map("Other", "User"))
            .expect("second map")
            .register(name_map("Vm", "Account"))
            .expect("third map");
        let config = builder.build();

        let vm = TypeRef::new("Vm");
        let destinations: Vec<_> = config
            .type_maps_for_source(&vm)
            .map(|map| map.destination_type().name())
            .collect();
        assert_eq!(destinations, vec!["User", "Account"]);
        assert!(config
            .find(&TypeRef::new("Other"), &TypeRef::new("User"))
            .is_some());
    }

    #[test]
    fn rejects_duplicate_pair() {
        let mut builder = MappingConfiguration::builder();
        builder.register(name_map("Vm", "User")).expect("first map");
        let err = builder
            .register(name_map("Vm", "User"))
            .expect_err("duplicate pair must fail");
        assert!(matches!(err, MappingConfigError::DuplicateTypeMap { .. }));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn rejects_members_of_foreign_types() {
        let mut builder = MappingConfiguration::builder();
        let wrong_destination = TypeMap::new("Vm", "User").with_property_map(PropertyMap::mapped(
            member("Vm", "Name"),
            member("Account", "Name"),
        ));
        let err = builder
            .register(wrong_destination)
            .expect_err("foreign destination member");
        assert_eq!(
            err,
            MappingConfigError::TypeMismatch {
                expected: TypeRef::new("User"),
                found: TypeRef::new("Account"),
                member: "Name".to_string(),
            }
        );

        let wrong_source = TypeMap::new("Vm", "User").with_property_map(PropertyMap::mapped(
            member("Other", "Name"),
            member("User", "Name"),
        ));
        let err = builder
            .register(wrong_source)
            .expect_err("foreign source member");
        assert!(matches!(err, MappingConfigError::TypeMismatch { .. }));
        assert!(builder.is_empty());
    }

    #[test]
    fn rejects_destination_targeted_twice() {
        let mut builder = MappingConfiguration::builder();
        let twice = name_map("Vm", "User").with_property_map(PropertyMap::unmapped(member(
            "User", "Name",
        )));
        let err = builder.register(twice).expect_err("duplicate destination");
        assert!(matches!(
            err,
            MappingConfigError::DuplicateDestination { .. }
        ));
    }
}
