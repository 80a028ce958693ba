//! Validation attribute inheritance across object-to-object mappings.
//!
//! A presentation type mapped onto a domain type picks up the domain type's
//! validation attributes at metadata/validator construction time, without
//! redeclaring them.

pub mod config;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod provider;
pub mod resolver;

pub use config::document::{
    load_mapping_document, load_mapping_file, ConfigError, LoadedMapping, MappingDocument,
};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use mapping::configuration::{
    MappingConfigError, MappingConfiguration, MappingConfigurationBuilder,
};
pub use mapping::type_map::{PropertyMap, TypeMap, TypeMapSource};
pub use model::attribute::{
    Attribute, AttributeDeclarationError, AttributeKind, MetadataAttribute, ValidationAttribute,
    ValidationRule,
};
pub use model::catalog::{
    CatalogError, MemberDescriptor, MemberRef, TypeCatalog, TypeDescriptor, TypeRef,
};
pub use provider::metadata::{
    AnnotatedMetadataFactory, MappedMetadataProvider, MetadataDescriptor, MetadataFactory,
    ModelAccessor, ModelMetadata, ProviderError,
};
pub use provider::validator::{
    AnnotatedValidatorFactory, BindingContext, MappedValidatorProvider, ValidatorDescriptor,
    ValidatorFactory,
};
pub use resolver::attribute_resolver::{
    resolve_attributes, AttributeQuery, DuplicatePolicy, ResolvedAttributes,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
