//! Validator construction hook with mapped attribute inheritance.
//!
//! # Invariants
//! - Container type and property name are taken from the metadata object.
//! - Host factory errors are returned unchanged.
//! - Validators are described, never executed.

use crate::mapping::configuration::MappingConfiguration;
use crate::model::attribute::{Attribute, AttributeKind, ValidationAttribute};
use crate::provider::metadata::{MetadataDescriptor, ModelMetadata};
use crate::resolver::attribute_resolver::{AttributeQuery, DuplicatePolicy};
use log::debug;
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::sync::Arc;

/// Host binding context passed through to the validator factory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingContext {
    /// Full binding name of the model, e.g. `user.Name`. May be empty.
    pub model_name: String,
}

impl BindingContext {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
        }
    }
}

/// Host validator construction.
pub trait ValidatorFactory {
    type Metadata: MetadataDescriptor;
    type Validator;
    type Error;

    fn get_validators(
        &self,
        metadata: &Self::Metadata,
        context: &BindingContext,
        attributes: &[Attribute],
    ) -> Result<Vec<Self::Validator>, Self::Error>;
}

/// Validator factory that merges mapped attributes before delegating.
pub struct MappedValidatorProvider<F> {
    configuration: Arc<MappingConfiguration>,
    base: F,
    policy: DuplicatePolicy,
}

impl<F: ValidatorFactory> MappedValidatorProvider<F> {
    pub fn new(configuration: Arc<MappingConfiguration>, base: F) -> Self {
        Self {
            configuration,
            base,
            policy: DuplicatePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn configuration(&self) -> &MappingConfiguration {
        &self.configuration
    }

    pub fn base(&self) -> &F {
        &self.base
    }
}

impl<F: ValidatorFactory> ValidatorFactory for MappedValidatorProvider<F> {
    type Metadata = F::Metadata;
    type Validator = F::Validator;
    type Error = F::Error;

    fn get_validators(
        &self,
        metadata: &Self::Metadata,
        context: &BindingContext,
        attributes: &[Attribute],
    ) -> Result<Vec<Self::Validator>, Self::Error> {
        // Root-level metadata has no property to look up.
        let merged = match metadata.property_name() {
            Some(property_name) => {
                AttributeQuery::new(metadata.container_type(), property_name, attributes)
                    .with_policy(self.policy)
                    .collect(self.configuration.as_ref())
            }
            None => attributes.to_vec(),
        };
        self.base.get_validators(metadata, context, &merged)
    }
}

/// Description of one validator the host would run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorDescriptor {
    pub kind: AttributeKind,
    /// Binding name the validator reports against.
    pub field: String,
    pub error_message: String,
    pub attribute: ValidationAttribute,
}

/// Default host factory: one descriptor per validation kind, first one wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotatedValidatorFactory;

impl ValidatorFactory for AnnotatedValidatorFactory {
    type Metadata = ModelMetadata;
    type Validator = ValidatorDescriptor;
    type Error = Infallible;

    fn get_validators(
        &self,
        metadata: &Self::Metadata,
        context: &BindingContext,
        attributes: &[Attribute],
    ) -> Result<Vec<Self::Validator>, Self::Error> {
        let field = if context.model_name.is_empty() {
            metadata.property_name.clone()
        } else {
            context.model_name.clone()
        };
        let display_name = metadata.display_name_or_property();

        let mut seen = BTreeSet::new();
        let validators: Vec<ValidatorDescriptor> = attributes
            .iter()
            .filter_map(Attribute::as_validation)
            .filter(|attribute| seen.insert(attribute.kind()))
            .map(|attribute| ValidatorDescriptor {
                kind: attribute.kind(),
                field: field.clone(),
                error_message: attribute.format_error_message(display_name),
                attribute: attribute.clone(),
            })
            .collect();

        debug!(
            "event=validators_created module=provider field={} validators={}",
            field,
            validators.len()
        );
        Ok(validators)
    }
}
