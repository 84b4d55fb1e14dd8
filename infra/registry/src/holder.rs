use crate::accessor::SdkAccessor;
use crate::connection::Connection;
use crate::descriptor::{Constructor, DescriptorParts, FeatureDescriptor, Renderer};
use crate::error::{FeatureError, FeatureErrorExt};
use fkit_domain::{NullVariables, Variables, VariablesError};
use parking_lot::RwLock;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Whether a holder currently caches a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HolderState {
    Empty,
    Populated,
}

struct Slot<T> {
    value: Option<Arc<T>>,
    /// Bumped on every explicit write so constructions that started earlier can tell
    /// their result is stale.
    generation: u64,
}

/// A lazily constructed, cached, invalidatable configuration value for one feature.
///
/// The first [`value`](Self::value) call resolves the connection through the shared
/// [`SdkAccessor`], fetches the feature's variables and runs the constructor. The result
/// is cached until [`with_cached_value`](Self::with_cached_value) replaces or clears it.
///
/// Concurrent first reads may each run the constructor, but only the first finished
/// result is installed and every caller receives that same `Arc`.
pub struct FeatureHolder<T> {
    feature_id: Cow<'static, str>,
    doc: Option<Cow<'static, str>>,
    sdk: SdkAccessor,
    constructor: RwLock<Constructor<T>>,
    render: Option<Renderer<T>>,
    slot: RwLock<Slot<T>>,
}

impl<T> FeatureHolder<T> {
    /// Creates an empty holder wired to `sdk`.
    pub fn new(descriptor: FeatureDescriptor<T>, sdk: SdkAccessor) -> Self {
        let DescriptorParts { name: feature_id, doc, constructor, render } = descriptor.into_parts();
        Self {
            feature_id,
            doc,
            sdk,
            constructor: RwLock::new(constructor),
            render,
            slot: RwLock::new(Slot { value: None, generation: 0 }),
        }
    }

    pub fn feature_id(&self) -> &str {
        &self.feature_id
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn state(&self) -> HolderState {
        if self.slot.read().value.is_some() { HolderState::Populated } else { HolderState::Empty }
    }

    /// The cached value, without constructing one.
    pub fn cached_value(&self) -> Option<Arc<T>> {
        self.slot.read().value.clone()
    }

    /// Returns the cached value, constructing and caching it first if the holder is empty.
    ///
    /// With no connection the constructor sees empty variables, so it yields the
    /// feature's defaults.
    ///
    /// # Errors
    ///
    /// - [`FeatureError::Connection`] when the accessor or the connection fails.
    /// - [`FeatureError::ConstructionFailed`] when the constructor rejects the variables.
    ///   If the error names a variable it is also reported to the connection as a
    ///   malformed configuration.
    ///
    /// Nothing is cached on error.
    pub fn value(&self) -> Result<Arc<T>, FeatureError> {
        let generation = {
            let slot = self.slot.read();
            if let Some(value) = &slot.value {
                return Ok(Arc::clone(value));
            }
            slot.generation
        };

        let constructed = Arc::new(self.construct()?);

        let mut slot = self.slot.write();
        if let Some(winner) = &slot.value {
            trace!(feature = %self.feature_id, "Discarding value constructed concurrently");
            return Ok(Arc::clone(winner));
        }
        if slot.generation != generation {
            debug!(feature = %self.feature_id, "Holder was reset during construction, value not cached");
            return Ok(constructed);
        }
        slot.value = Some(Arc::clone(&constructed));
        Ok(constructed)
    }

    /// The value rendered as JSON, constructing it first if the holder is empty.
    ///
    /// `None` when the descriptor was not made [`serializable`](FeatureDescriptor::serializable).
    ///
    /// # Errors
    ///
    /// Same as [`value`](Self::value), plus [`FeatureError::Serialization`] when rendering fails.
    pub fn value_json(&self) -> Option<Result<Value, FeatureError>> {
        let render = self.render?;
        Some(self.value().and_then(|value| {
            render(&value).context(format!("feature `{}`: rendering value", self.feature_id))
        }))
    }

    /// Replaces the cached value. `None` empties the holder so the next read reconstructs.
    ///
    /// Never invokes the constructor or the accessor.
    pub fn with_cached_value(&self, value: Option<T>) {
        let mut slot = self.slot.write();
        slot.value = value.map(Arc::new);
        slot.generation = slot.generation.wrapping_add(1);
    }

    /// Swaps the constructor and empties the holder.
    pub fn with_initializer<F>(&self, constructor: F)
    where
        F: Fn(&dyn Variables) -> Result<T, VariablesError> + Send + Sync + 'static,
    {
        *self.constructor.write() = Arc::new(constructor);
        self.with_cached_value(None);
        debug!(feature = %self.feature_id, "Initializer replaced");
    }

    /// Reports an exposure of this feature to the current connection, if any.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Connection`] when the accessor fails.
    pub fn record_exposure(&self) -> Result<(), FeatureError> {
        if let Some(connection) = self.connection()? {
            connection.record_exposure(&self.feature_id, None);
        }
        Ok(())
    }

    /// Reports an exposure of this feature within the experiment `slug`.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Connection`] when the accessor fails.
    pub fn record_experiment_exposure(&self, slug: &str) -> Result<(), FeatureError> {
        if let Some(connection) = self.connection()? {
            connection.record_exposure(&self.feature_id, Some(slug));
        }
        Ok(())
    }

    /// Reports that the configuration part `part_id` of this feature could not be used.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Connection`] when the accessor fails.
    pub fn record_malformed_configuration(&self, part_id: &str) -> Result<(), FeatureError> {
        if let Some(connection) = self.connection()? {
            connection.record_malformed_configuration(&self.feature_id, part_id);
        }
        Ok(())
    }

    fn connection(&self) -> Result<Option<Arc<dyn Connection>>, FeatureError> {
        self.sdk.connection().context(format!("feature `{}`", self.feature_id))
    }

    fn construct(&self) -> Result<T, FeatureError> {
        let connection = self.connection()?;
        let constructor = Arc::clone(&self.constructor.read());
        debug!(feature = %self.feature_id, connected = connection.is_some(), "Constructing feature value");

        let result = match &connection {
            Some(connection) => {
                let variables = connection
                    .get_variables(&self.feature_id)
                    .context(format!("feature `{}`: fetching variables", self.feature_id))?;
                constructor(&*variables)
            },
            None => constructor(&NullVariables),
        };

        result.map_err(|source| {
            if let (Some(connection), Some(part_id)) = (&connection, source.part_id()) {
                connection.record_malformed_configuration(&self.feature_id, part_id);
            }
            FeatureError::ConstructionFailed {
                source,
                context: Some(format!("feature `{}`", self.feature_id).into()),
            }
        })
    }
}

impl<T> fmt::Debug for FeatureHolder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureHolder")
            .field("feature_id", &self.feature_id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
