//! Metadata construction hook with mapped attribute inheritance.
//!
//! # Responsibility
//! - Define the host seam for building per-property metadata.
//! - Wrap any host factory so it sees the merged attribute set.
//!
//! # Invariants
//! - The wrapped factory is called exactly once per request.
//! - Host factory errors are returned unchanged.
//! - The provider holds no mutable state and performs no caching.

use crate::mapping::configuration::MappingConfiguration;
use crate::model::attribute::{Attribute, AttributeKind, MetadataAttribute};
use crate::model::catalog::{CatalogError, TypeCatalog, TypeRef};
use crate::resolver::attribute_resolver::{AttributeQuery, DuplicatePolicy};
use log::debug;
use std::convert::Infallible;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Deferred read of the model value.
pub type ModelAccessor = Arc<dyn Fn() -> Option<serde_json::Value> + Send + Sync>;

/// What the validator hook needs to know about a metadata object.
pub trait MetadataDescriptor {
    fn container_type(&self) -> Option<&TypeRef>;
    fn property_name(&self) -> Option<&str>;
}

/// Host metadata construction.
pub trait MetadataFactory {
    type Metadata;
    type Error;

    fn create_metadata(
        &self,
        attributes: &[Attribute],
        container_type: Option<&TypeRef>,
        model_accessor: Option<ModelAccessor>,
        model_type: &TypeRef,
        property_name: &str,
    ) -> Result<Self::Metadata, Self::Error>;
}

/// Metadata factory that merges mapped attributes before delegating.
pub struct MappedMetadataProvider<F> {
    configuration: Arc<MappingConfiguration>,
    base: F,
    policy: DuplicatePolicy,
}

impl<F: MetadataFactory> MappedMetadataProvider<F> {
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

    /// Builds metadata for a declared property.
    ///
    /// # Errors
    /// - `ProviderError::Catalog` when `property_name` is not declared on
    ///   `container_type`.
    /// - `ProviderError::Host` when the wrapped factory fails.
    pub fn metadata_for_property(
        &self,
        catalog: &TypeCatalog,
        container_type: &TypeRef,
        property_name: &str,
        model_type: &TypeRef,
        model_accessor: Option<ModelAccessor>,
    ) -> Result<F::Metadata, ProviderError<F::Error>> {
        let member = catalog.member(container_type, property_name)?;
        self.create_metadata(
            member.attributes(),
            Some(container_type),
            model_accessor,
            model_type,
            property_name,
        )
        .map_err(ProviderError::Host)
    }
}

impl<F: MetadataFactory> MetadataFactory for MappedMetadataProvider<F> {
    type Metadata = F::Metadata;
    type Error = F::Error;

    fn create_metadata(
        &self,
        attributes: &[Attribute],
        container_type: Option<&TypeRef>,
        model_accessor: Option<ModelAccessor>,
        model_type: &TypeRef,
        property_name: &str,
    ) -> Result<Self::Metadata, Self::Error> {
        let merged = AttributeQuery::new(container_type, property_name, attributes)
            .with_policy(self.policy)
            .collect(self.configuration.as_ref());
        self.base.create_metadata(
            &merged,
            container_type,
            model_accessor,
            model_type,
            property_name,
        )
    }
}

/// Per-property description consumed by binding and validation.
#[derive(Clone)]
pub struct ModelMetadata {
    pub container_type: Option<TypeRef>,
    pub model_type: TypeRef,
    pub property_name: String,
    /// Attribute set the metadata was built from, in resolution order.
    pub attributes: Vec<Attribute>,
    pub is_required: bool,
    pub display_name: Option<String>,
    pub data_type: Option<String>,
    pub is_read_only: bool,
    pub show_for_edit: bool,
    model_accessor: Option<ModelAccessor>,
}

impl ModelMetadata {
    /// Reads the model value through the accessor, if one was supplied.
    pub fn model(&self) -> Option<serde_json::Value> {
        self.model_accessor.as_ref().and_then(|accessor| accessor())
    }

    /// Display name, falling back to the property name.
    pub fn display_name_or_property(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or(self.property_name.as_str())
    }
}

impl Debug for ModelMetadata {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelMetadata")
            .field("container_type", &self.container_type)
            .field("model_type", &self.model_type)
            .field("property_name", &self.property_name)
            .field("attributes", &self.attributes)
            .field("is_required", &self.is_required)
            .field("display_name", &self.display_name)
            .field("data_type", &self.data_type)
            .field("is_read_only", &self.is_read_only)
            .field("show_for_edit", &self.show_for_edit)
            .field("has_model_accessor", &self.model_accessor.is_some())
            .finish()
    }
}

impl MetadataDescriptor for ModelMetadata {
    fn container_type(&self) -> Option<&TypeRef> {
        self.container_type.as_ref()
    }

    fn property_name(&self) -> Option<&str> {
        if self.property_name.is_empty() {
            None
        } else {
            Some(self.property_name.as_str())
        }
    }
}

/// Default host factory reading data-annotation style attributes.
///
/// When several attributes share a kind, the first one wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotatedMetadataFactory;

impl MetadataFactory for AnnotatedMetadataFactory {
    type Metadata = ModelMetadata;
    type Error = Infallible;

    fn create_metadata(
        &self,
        attributes: &[Attribute],
        container_type: Option<&TypeRef>,
        model_accessor: Option<ModelAccessor>,
        model_type: &TypeRef,
        property_name: &str,
    ) -> Result<Self::Metadata, Self::Error> {
        let metadata_attribute = |kind: AttributeKind| {
            attributes
                .iter()
                .find(|attribute| attribute.kind() == kind)
                .and_then(|attribute| match attribute {
                    Attribute::Metadata(metadata) => Some(metadata),
                    Attribute::Validation(_) => None,
                })
        };

        let display_name = match metadata_attribute(AttributeKind::DisplayName) {
            Some(MetadataAttribute::DisplayName { name }) => Some(name.clone()),
            _ => None,
        };
        let data_type = match metadata_attribute(AttributeKind::DataType) {
            Some(MetadataAttribute::DataType { data_type }) => Some(data_type.clone()),
            _ => None,
        };
        let is_read_only = matches!(
            metadata_attribute(AttributeKind::ReadOnly),
            Some(MetadataAttribute::ReadOnly { read_only: true })
        );
        let show_for_edit = !matches!(
            metadata_attribute(AttributeKind::ScaffoldColumn),
            Some(MetadataAttribute::ScaffoldColumn { scaffold: false })
        );
        let is_required = attributes
            .iter()
            .any(|attribute| attribute.kind() == AttributeKind::Required);

        debug!(
            "event=metadata_created module=provider container={} property={} attributes={} required={}",
            container_type.map(TypeRef::name).unwrap_or("-"),
            property_name,
            attributes.len(),
            is_required
        );

        Ok(ModelMetadata {
            container_type: container_type.cloned(),
            model_type: model_type.clone(),
            property_name: property_name.to_string(),
            attributes: attributes.to_vec(),
            is_required,
            display_name,
            data_type,
            is_read_only,
            show_for_edit,
            model_accessor,
        })
    }
}

/// Errors of the catalog-backed convenience entry point.
#[derive(Debug)]
pub enum ProviderError<E> {
    Catalog(CatalogError),
    Host(E),
}

impl<E: Display> Display for ProviderError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Host(err) => write!(f, "{err}"),
        }
    }
}

impl<E: Error + 'static> Error for ProviderError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Catalog(err) => Some(err),
            Self::Host(err) => Some(err),
        }
    }
}

impl<E> From<CatalogError> for ProviderError<E> {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}
