//! Type map and property map records.
//!
//! # Invariants
//! - A property map that is ignored or has no source member contributes
//!   nothing to attribute resolution.
//! - Property maps keep their declared order.

use crate::model::catalog::{MemberRef, TypeRef};
use std::sync::Arc;

/// Correspondence between one source member and one destination member.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMap {
    source_member: Option<MemberRef>,
    destination_member: MemberRef,
    ignored: bool,
}

impl PropertyMap {
    /// Maps `source` onto `destination`.
    pub fn mapped(source: MemberRef, destination: MemberRef) -> Self {
        Self {
            source_member: Some(source),
            destination_member: destination,
            ignored: false,
        }
    }

    /// Destination member with no source counterpart.
    pub fn unmapped(destination: MemberRef) -> Self {
        Self {
            source_member: None,
            destination_member: destination,
            ignored: false,
        }
    }

    /// Marks this map as ignored.
    pub fn ignore(mut self) -> Self {
        self.ignored = true;
        self
    }

    pub fn source_member(&self) -> Option<&MemberRef> {
        self.source_member.as_ref()
    }

    pub fn destination_member(&self) -> &MemberRef {
        &self.destination_member
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Source member of a map that takes part in resolution.
    pub fn contributing_source(&self) -> Option<&MemberRef> {
        if self.ignored {
            return None;
        }
        self.source_member.as_ref()
    }
}

/// Declared correspondence between a source and a destination type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMap {
    source_type: TypeRef,
    destination_type: TypeRef,
    property_maps: Vec<PropertyMap>,
}

impl TypeMap {
    pub fn new(source_type: impl Into<TypeRef>, destination_type: impl Into<TypeRef>) -> Self {
        Self {
            source_type: source_type.into(),
            destination_type: destination_type.into(),
            property_maps: Vec::new(),
        }
    }

    pub fn with_property_map(mut self, property_map: PropertyMap) -> Self {
        self.property_maps.push(property_map);
        self
    }

    pub fn source_type(&self) -> &TypeRef {
        &self.source_type
    }

    pub fn destination_type(&self) -> &TypeRef {
        &self.destination_type
    }

    /// Property maps in declared order.
    pub fn property_maps(&self) -> &[PropertyMap] {
        &self.property_maps
    }
}

/// Read-only enumeration of type maps in registration order.
pub trait TypeMapSource {
    fn type_maps(&self) -> &[TypeMap];

    /// Type maps whose source is `source_type`, in registration order.
    fn type_maps_for_source<'a>(
        &'a self,
        source_type: &'a TypeRef,
    ) -> impl Iterator<Item = &'a TypeMap> + 'a {
        self.type_maps()
            .iter()
            .filter(move |type_map| type_map.source_type() == source_type)
    }
}

impl TypeMapSource for [TypeMap] {
    fn type_maps(&self) -> &[TypeMap] {
        self
    }
}

impl TypeMapSource for Vec<TypeMap> {
    fn type_maps(&self) -> &[TypeMap] {
        self.as_slice()
    }
}

impl<T: TypeMapSource + ?Sized> TypeMapSource for &T {
    fn type_maps(&self) -> &[TypeMap] {
        (**self).type_maps()
    }
}

impl<T: TypeMapSource + ?Sized> TypeMapSource for Arc<T> {
    fn type_maps(&self) -> &[TypeMap] {
        (**self).type_maps()
    }
}

#[cfg(test)]
mod tests {
    use super::{PropertyMap, TypeMap, TypeMapSource};
    use crate::model::catalog::{MemberRef, TypeRef};

    fn member(type_name: &str, name: &str) -> MemberRef {
        MemberRef::new(TypeRef::new(type_name), name, Vec::new())
    }

    #[test]
    fn ignored_and_unmapped_maps_do_not_contribute() {
        let mapped = PropertyMap::mapped(member("Vm", "Name"), member("User", "Name"));
        assert!(mapped.contributing_source().is_some());

        let ignored = mapped.clone().ignore();
        assert!(ignored.is_ignored());
        assert!(ignored.contributing_source().is_none());
        assert!(ignored.source_member().is_some());

        let unmapped = PropertyMap::unmapped(member("User", "Name"));
        assert!(unmapped.contributing_source().is_none());
    }

    #[test]
    fn keeps_property_map_order() {
        let type_map = TypeMap::new("Vm", "User")
            .with_property_map(PropertyMap::unmapped(member("User", "B")))
            .with_property_map(PropertyMap::unmapped(member("User", "A")));
        let names: Vec<_> = type_map
            .property_maps()
            .iter()
            .map(|map| map.destination_member().name())
            .collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn vec_and_references_are_type_map_sources() {
        let maps = vec![TypeMap::new("Vm", "User")];
        fn count(source: impl TypeMapSource) -> usize {
            source.type_maps().len()
        }
        assert_eq!(count(&maps), 1);
        assert_eq!(count(maps.as_slice()), 1);
    }

    #[test]
    fn filters_type_maps_by_source_in_order() {
        let maps = vec![
            TypeMap::new("Vm", "User"),
            TypeMap::new("Other", "User"),
            TypeMap::new("Vm", "Account"),
        ];
        let vm = TypeRef::new("Vm");
        let destinations: Vec<_> = maps
            .type_maps_for_source(&vm)
            .map(|map| map.destination_type().name())
            .collect();
        assert_eq!(destinations, vec!["User", "Account"]);
        assert_eq!(maps.type_maps_for_source(&TypeRef::new("User")).count(), 0);
    }
}
