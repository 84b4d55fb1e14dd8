use crate::accessor::SdkAccessor;
use crate::connection::{Connection, ConnectionError};
use crate::descriptor::FeatureDescriptor;
use crate::error::{FeatureError, RegistryError};
use crate::holder::{FeatureHolder, HolderState};
use fxhash::FxHashMap;
use serde_json::Value;
use std::any::{Any, type_name};
use std::fmt::{self, Debug};
use std::sync::Arc;
use tracing::{debug, trace};

/// Type-erased view of a [`FeatureHolder`], used for registry-wide operations.
pub trait Feature: Any + Debug + Send + Sync {
    fn feature_id(&self) -> &str;
    fn doc(&self) -> Option<&str>;
    fn state(&self) -> HolderState;
    /// Name of the configuration type held.
    fn value_type(&self) -> &'static str;
    /// Drops the cached value, if any.
    fn invalidate(&self);
    /// Constructs and caches the value if the holder is empty.
    ///
    /// # Errors
    ///
    /// Same as [`FeatureHolder::value`].
    fn warm_up(&self) -> Result<(), FeatureError>;
    /// # Errors
    ///
    /// Same as [`FeatureHolder::record_exposure`].
    fn record_exposure(&self) -> Result<(), FeatureError>;
    /// The value as JSON, or `None` when the feature was not registered as serializable.
    ///
    /// # Errors
    ///
    /// Same as [`FeatureHolder::value_json`].
    fn value_json(&self) -> Option<Result<Value, FeatureError>>;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Send + Sync + 'static> Feature for FeatureHolder<T> {
    fn feature_id(&self) -> &str {
        Self::feature_id(self)
    }

    fn doc(&self) -> Option<&str> {
        Self::doc(self)
    }

    fn state(&self) -> HolderState {
        Self::state(self)
    }

    fn value_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn invalidate(&self) {
        self.with_cached_value(None);
    }

    fn warm_up(&self) -> Result<(), FeatureError> {
        self.value().map(drop)
    }

    fn record_exposure(&self) -> Result<(), FeatureError> {
        Self::record_exposure(self)
    }

    fn value_json(&self) -> Option<Result<Value, FeatureError>> {
        Self::value_json(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[derive(Default)]
struct RegistryInner {
    sdk: SdkAccessor,
    features: Vec<Arc<dyn Feature>>,
    index: FxHashMap<String, usize>,
}

/// The set of feature holders of one application, sharing one SDK accessor.
///
/// Cloning is cheap and yields a handle to the same holders and accessor.
#[derive(Clone, Default)]
pub struct FeatureRegistry {
    inner: Arc<RegistryInner>,
}

impl FeatureRegistry {
    #[must_use]
    pub fn builder() -> FeatureRegistryBuilder {
        FeatureRegistryBuilder::default()
    }

    /// Installs the function used by every holder to obtain the SDK connection.
    ///
    /// Cached values are kept; call [`invalidate_cached_values`](Self::invalidate_cached_values)
    /// to have them rebuilt from the new connection.
    pub fn initialize<F>(&self, get_sdk: F)
    where
        F: Fn() -> Option<Arc<dyn Connection>> + Send + Sync + 'static,
    {
        self.try_initialize(move || Ok(get_sdk()));
    }

    /// Like [`initialize`](Self::initialize) for accessors that can fail. Failures surface
    /// from [`FeatureHolder::value`] as [`FeatureError::Connection`].
    pub fn try_initialize<F>(&self, get_sdk: F)
    where
        F: Fn() -> Result<Option<Arc<dyn Connection>>, ConnectionError> + Send + Sync + 'static,
    {
        self.inner.sdk.replace(get_sdk);
        debug!(replacements = self.inner.sdk.replacements(), "SDK accessor installed");
    }

    /// Wires a fixed connection.
    pub fn set_connection(&self, connection: Arc<dyn Connection>) {
        self.initialize(move || Some(Arc::clone(&connection)));
    }

    /// Reverts to "no connection"; holders constructed afterwards use their defaults.
    pub fn disconnect(&self) {
        self.initialize(|| None);
    }

    /// Empties every holder. Values are rebuilt lazily on their next read.
    pub fn invalidate_cached_values(&self) {
        for feature in &self.inner.features {
            feature.invalidate();
        }
        debug!(features = self.inner.features.len(), "Cached feature values invalidated");
    }

    /// Calls the currently installed accessor.
    ///
    /// # Errors
    ///
    /// Propagates the accessor's error.
    pub fn connection(&self) -> Result<Option<Arc<dyn Connection>>, ConnectionError> {
        self.inner.sdk.connection()
    }

    pub fn sdk(&self) -> &SdkAccessor {
        &self.inner.sdk
    }

    pub fn feature(&self, feature_id: &str) -> Option<&Arc<dyn Feature>> {
        self.inner.index.get(feature_id).map(|&idx| &self.inner.features[idx])
    }

    /// Typed lookup of a registered holder.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnknownFeature`] when nothing is registered under `feature_id`.
    /// - [`RegistryError::TypeMismatch`] when the holder's value type is not `T`.
    pub fn holder<T: Send + Sync + 'static>(
        &self,
        feature_id: &str,
    ) -> Result<Arc<FeatureHolder<T>>, RegistryError> {
        let feature = self.feature(feature_id).ok_or_else(|| RegistryError::UnknownFeature {
            message: feature_id.to_owned().into(),
            context: None,
        })?;
        let value_type = feature.value_type();

        Arc::clone(feature).into_any().downcast::<FeatureHolder<T>>().map_err(|_| {
            RegistryError::TypeMismatch {
                message: format!("`{feature_id}` holds {value_type}, not {}", type_name::<T>()).into(),
                context: None,
            }
        })
    }

    pub fn contains(&self, feature_id: &str) -> bool {
        self.inner.index.contains_key(feature_id)
    }

    /// Registered feature ids, in registration order.
    pub fn feature_ids(&self) -> impl Iterator<Item = &str> {
        self.inner.features.iter().map(|feature| feature.feature_id())
    }

    /// Registered features, in registration order.
    pub fn features(&self) -> impl Iterator<Item = &Arc<dyn Feature>> {
        self.inner.features.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.features.is_empty()
    }
}

impl Debug for FeatureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureRegistry")
            .field("features", &self.feature_ids().collect::<Vec<_>>())
            .field("sdk", &self.inner.sdk)
            .finish()
    }
}

/// Collects descriptors into a [`FeatureRegistry`]. All holders share one accessor.
#[derive(Default)]
pub struct FeatureRegistryBuilder {
    inner: RegistryInner,
}

impl FeatureRegistryBuilder {
    /// Registers a feature and returns its typed holder.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateFeature`] when the id is already taken.
    pub fn register<T: Send + Sync + 'static>(
        &mut self,
        descriptor: FeatureDescriptor<T>,
    ) -> Result<Arc<FeatureHolder<T>>, RegistryError> {
        if self.inner.index.contains_key(descriptor.name()) {
            return Err(RegistryError::DuplicateFeature {
                message: descriptor.name().to_owned().into(),
                context: None,
            });
        }

        let holder = Arc::new(FeatureHolder::new(descriptor, self.inner.sdk.clone()));
        self.inner.index.insert(holder.feature_id().to_owned(), self.inner.features.len());
        self.inner.features.push(Arc::clone(&holder) as Arc<dyn Feature>);
        trace!(feature = holder.feature_id(), value_type = type_name::<T>(), "Feature registered");

        Ok(holder)
    }

    /// Chaining form of [`register`](Self::register) for when the typed holder is not needed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateFeature`] when the id is already taken.
    pub fn feature<T: Send + Sync + 'static>(
        mut self,
        descriptor: FeatureDescriptor<T>,
    ) -> Result<Self, RegistryError> {
        self.register(descriptor)?;
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> FeatureRegistry {
        debug!(features = self.inner.features.len(), "Feature registry built");
        FeatureRegistry { inner: Arc::new(self.inner) }
    }
}

impl Debug for FeatureRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.inner.features.iter().map(|feature| feature.feature_id()).collect();
        f.debug_struct("FeatureRegistryBuilder").field("features", &ids).finish()
    }
}
