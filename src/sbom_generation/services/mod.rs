mod digest_correlator;
mod graph_builder;
mod graph_validator;
mod id_registry;
mod metadata_generator;

pub use digest_correlator::DigestCorrelator;
pub use graph_builder::GraphBuilder;
pub use graph_validator::GraphValidator;
pub use id_registry::{IdRegistry, MAX_DISAMBIGUATORS};
pub use metadata_generator::{MetadataGenerator, NAMESPACE_BASE};
