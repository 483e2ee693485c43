//! Guarded queries and the models they target

mod descriptor;
mod model;

pub use descriptor::{QueryDescriptor, QueryOperation};
pub use model::{IndexSpec, ModelDescriptor, ModelIdentity, SchemaDefinition};
