use fkit_domain::Variables;
use std::error::Error;
use std::fmt::Debug;

/// Error type produced by connections and SDK accessors. Carried unchanged inside
/// [`FeatureError::Connection`](crate::FeatureError::Connection) so callers can downcast it.
pub type ConnectionError = Box<dyn Error + Send + Sync + 'static>;

/// The live experimentation SDK as seen by feature holders.
///
/// Implementations are shared across threads and may be swapped at any time through
/// [`FeatureRegistry::initialize`](crate::FeatureRegistry::initialize).
pub trait Connection: Debug + Send + Sync {
    /// Returns the variables currently assigned to `feature_id`.
    ///
    /// # Errors
    ///
    /// Returns the provider's error when the variables cannot be fetched.
    fn get_variables(&self, feature_id: &str) -> Result<Box<dyn Variables>, ConnectionError>;

    /// Records that the user was exposed to `feature_id`, optionally for a specific experiment.
    fn record_exposure(&self, _feature_id: &str, _experiment_slug: Option<&str>) {}

    /// Records that the part `part_id` of `feature_id`'s configuration was unusable.
    fn record_malformed_configuration(&self, _feature_id: &str, _part_id: &str) {}
}
