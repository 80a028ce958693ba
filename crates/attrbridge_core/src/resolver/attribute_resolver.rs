//! Mapped attribute resolution.
//!
//! # Responsibility
//! - Compute the attribute set for `(source type, property)` by merging the
//!   validation attributes of every mapped destination member with the
//!   attributes the caller already has.
//!
//! # Invariants
//! - Discovered attributes come first, in type map registration order, then
//!   property map order, then declaration order.
//! - Every existing attribute is emitted afterwards, unchanged and in order.
//! - A discovered attribute is dropped when an existing one shares its kind.
//! - Resolution never fails and never mutates the configuration.

use crate::mapping::type_map::TypeMapSource;
use crate::model::attribute::{Attribute, AttributeKind};
use crate::model::catalog::TypeRef;
use log::debug;
use std::collections::BTreeSet;
use std::iter::FusedIterator;

/// How discovered attributes are deduplicated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Drop a candidate only when the existing set already has its kind.
    /// Two same-kind candidates from different type maps are both emitted.
    #[default]
    AgainstExisting,
    /// Also drop a candidate whose kind was already emitted by this query.
    FirstDiscovered,
}

/// One resolution request. Lives for a single call.
#[derive(Debug, Clone, Copy)]
pub struct AttributeQuery<'a> {
    source_type: Option<&'a TypeRef>,
    property_name: &'a str,
    existing: &'a [Attribute],
    policy: DuplicatePolicy,
}

impl<'a> AttributeQuery<'a> {
    pub fn new(
        source_type: Option<&'a TypeRef>,
        property_name: &'a str,
        existing: &'a [Attribute],
    ) -> Self {
        Self {
            source_type,
            property_name,
            existing,
            policy: DuplicatePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Lazily merges discovered and existing attributes.
    pub fn resolve<S>(self, source: &'a S) -> ResolvedAttributes<'a>
    where
        S: TypeMapSource + ?Sized,
    {
        let property_name = self.property_name;
        let discovered = self
            .source_type
            .into_iter()
            .flat_map(move |source_type| source.type_maps_for_source(source_type))
            .flat_map(|type_map| type_map.property_maps().iter())
            .filter(move |property_map| {
                property_map
                    .contributing_source()
                    .is_some_and(|member| member.name() == property_name)
            })
            .flat_map(|property_map| {
                property_map
                    .destination_member()
                    .declared_validation_attributes()
            });

        ResolvedAttributes {
            discovered: Box::new(discovered),
            existing: self.existing.iter(),
            existing_kinds: self.existing.iter().map(Attribute::kind).collect(),
            emitted_kinds: BTreeSet::new(),
            policy: self.policy,
        }
    }

    /// Eager form of `resolve`; logs one event per call.
    pub fn collect<S>(self, source: &'a S) -> Vec<Attribute>
    where
        S: TypeMapSource + ?Sized,
    {
        let merged: Vec<Attribute> = self.resolve(source).cloned().collect();
        debug!(
            "event=attributes_resolved module=resolver source_type={} property={} existing={} discovered={}",
            self.source_type.map(TypeRef::name).unwrap_or("-"),
            self.property_name,
            self.existing.len(),
            merged.len() - self.existing.len()
        );
        merged
    }
}

/// Merged attribute sequence. Single pass; not restartable.
pub struct ResolvedAttributes<'a> {
    discovered: Box<dyn Iterator<Item = &'a Attribute> + 'a>,
    existing: std::slice::Iter<'a, Attribute>,
    existing_kinds: BTreeSet<AttributeKind>,
    emitted_kinds: BTreeSet<AttributeKind>,
    policy: DuplicatePolicy,
}

impl<'a> Iterator for ResolvedAttributes<'a> {
    type Item = &'a Attribute;

    fn next(&mut self) -> Option<Self::Item> {
        for candidate in self.discovered.by_ref() {
            let kind = candidate.kind();
            if self.existing_kinds.contains(&kind) {
                continue;
            }
            if self.policy == DuplicatePolicy::FirstDiscovered && !self.emitted_kinds.insert(kind)
            {
                continue;
            }
            return Some(candidate);
        }
        self.existing.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (existing, _) = self.existing.size_hint();
        (existing, None)
    }
}

impl FusedIterator for ResolvedAttributes<'_> {}

/// Resolves with the default policy and returns an owned set.
pub fn resolve_attributes<S>(
    source: &S,
    source_type: Option<&TypeRef>,
    property_name: &str,
    existing: &[Attribute],
) -> Vec<Attribute>
where
    S: TypeMapSource + ?Sized,
{
    AttributeQuery::new(source_type, property_name, existing).collect(source)
}

#[cfg(test)]
mod tests {
    use super::{resolve_attributes, AttributeQuery, DuplicatePolicy};
    use crate::mapping::type_map::{PropertyMap, TypeMap};
    use crate::model::attribute::{Attribute, AttributeKind, ValidationAttribute};
    use crate::model::catalog::{MemberRef, TypeRef};

    fn member(type_name: &str, name: &str, attributes: Vec<Attribute>) -> MemberRef {
        MemberRef::new(TypeRef::new(type_name), name, attributes)
    }

    fn two_maps_with_required() -> Vec<TypeMap> {
        vec![
            TypeMap::new("Vm", "User").with_property_map(PropertyMap::mapped(
                member("Vm", "Name", vec![]),
                member(
                    "User",
                    "Name",
                    vec![ValidationAttribute::required().with_message("user").into()],
                ),
            )),
            TypeMap::new("Vm", "Account").with_property_map(PropertyMap::mapped(
                member("Vm", "Name", vec![]),
                member(
                    "Account",
                    "Name",
                    vec![
                        ValidationAttribute::required().with_message("account").into(),
                        ValidationAttribute::max_length(40).into(),
                    ],
                ),
            )),
        ]
    }

    fn messages(attributes: &[Attribute]) -> Vec<Option<&str>> {
        attributes
            .iter()
            .map(|attribute| {
                attribute
                    .as_validation()
                    .and_then(|validation| validation.error_message.as_deref())
            })
            .collect()
    }

    #[test]
    fn literal_policy_keeps_same_kind_candidates_from_different_maps() {
        let maps = two_maps_with_required();
        let vm = TypeRef::new("Vm");
        let merged = resolve_attributes(&maps, Some(&vm), "Name", &[]);

        let kinds: Vec<_> = merged.iter().map(Attribute::kind).collect();
        assert_eq!(
            kinds,
            vec![
                AttributeKind::Required,
                AttributeKind::Required,
                AttributeKind::MaxLength
            ]
        );
        assert_eq!(
            messages(&merged),
            vec![Some("user"), Some("account"), None]
        );
    }

    #[test]
    fn first_discovered_policy_collapses_candidates() {
        let maps = two_maps_with_required();
        let vm = TypeRef::new("Vm");
        let merged = AttributeQuery::new(Some(&vm), "Name", &[])
            .with_policy(DuplicatePolicy::FirstDiscovered)
            .collect(&maps);

        assert_eq!(merged.len(), 2);
        assert_eq!(messages(&merged), vec![Some("user"), None]);
    }

    #[test]
    fn one_existing_attribute_suppresses_every_same_kind_candidate() {
        let maps = two_maps_with_required();
        let vm = TypeRef::new("Vm");
        let existing = vec![Attribute::from(
            ValidationAttribute::required().with_message("own"),
        )];
        let merged = resolve_attributes(&maps, Some(&vm), "Name", &existing);

        assert_eq!(messages(&merged), vec![None, Some("own")]);
        assert_eq!(merged[0].kind(), AttributeKind::MaxLength);
    }

    #[test]
    fn destination_metadata_attributes_are_not_candidates() {
        let maps = vec![TypeMap::new("Vm", "User").with_property_map(PropertyMap::mapped(
            member("Vm", "Name", vec![]),
            member("User", "Name", vec![Attribute::display_name("Full name")]),
        ))];
        let vm = TypeRef::new("Vm");
        assert!(resolve_attributes(&maps, Some(&vm), "Name", &[]).is_empty());
    }

    #[test]
    fn matches_on_source_member_name_not_destination_name() {
        let maps = vec![TypeMap::new("Vm", "User").with_property_map(PropertyMap::mapped(
            member("Vm", "FullName", vec![]),
            member("User", "Name", vec![ValidationAttribute::required().into()]),
        ))];
        let vm = TypeRef::new("Vm");
        assert_eq!(resolve_attributes(&maps, Some(&vm), "FullName", &[]).len(), 1);
        assert!(resolve_attributes(&maps, Some(&vm), "Name", &[]).is_empty());
    }

    #[test]
    fn sequence_is_lazy_and_fused() {
        let maps = two_maps_with_required();
        let vm = TypeRef::new("Vm");
        let existing = vec![Attribute::display_name("Name")];
        let mut resolved = AttributeQuery::new(Some(&vm), "Name", &existing).resolve(&maps);

        assert_eq!(
            resolved.next().map(Attribute::kind),
            Some(AttributeKind::Required)
        );
        assert_eq!(resolved.by_ref().count(), 3);
        assert!(resolved.next().is_none());
        assert!(resolved.next().is_none());
    }
}
