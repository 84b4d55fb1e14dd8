mod feature;
mod registry;

pub use feature::{FeatureError, FeatureErrorExt};
pub use registry::{RegistryError, RegistryErrorExt};
