use crate::connection::{Connection, ConnectionError};
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

type GetSdk = dyn Fn() -> Result<Option<Arc<dyn Connection>>, ConnectionError> + Send + Sync;

struct Accessor {
    get_sdk: Box<GetSdk>,
}

impl Accessor {
    fn disconnected() -> Self {
        Self { get_sdk: Box::new(|| Ok(None)) }
    }
}

/// A shared, atomically replaceable function returning the current SDK connection.
///
/// Every holder of a registry keeps a clone of the same accessor, so a replacement is
/// observed by all of them on their next construction. Values that are already cached
/// are not affected.
#[derive(Clone)]
pub struct SdkAccessor {
    current: Arc<ArcSwap<Accessor>>,
    replacements: Arc<AtomicU64>,
}

impl SdkAccessor {
    /// An accessor that always reports "no connection".
    #[must_use]
    pub fn disconnected() -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(Accessor::disconnected())),
            replacements: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Installs a new accessor function. Last writer wins.
    pub fn replace<F>(&self, get_sdk: F)
    where
        F: Fn() -> Result<Option<Arc<dyn Connection>>, ConnectionError> + Send + Sync + 'static,
    {
        self.current.store(Arc::new(Accessor { get_sdk: Box::new(get_sdk) }));
        self.replacements.fetch_add(1, Ordering::Release);
    }

    /// Calls the currently installed accessor.
    ///
    /// # Errors
    ///
    /// Propagates whatever the installed accessor returns.
    pub fn connection(&self) -> Result<Option<Arc<dyn Connection>>, ConnectionError> {
        // The accessor may block, so hold a full reference rather than a borrowed guard.
        let accessor = self.current.load_full();
        (accessor.get_sdk)()
    }

    /// How many times the accessor has been replaced since creation.
    #[must_use]
    pub fn replacements(&self) -> u64 {
        self.replacements.load(Ordering::Acquire)
    }
}

impl Default for SdkAccessor {
    fn default() -> Self {
        Self::disconnected()
    }
}

impl fmt::Debug for SdkAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkAccessor").field("replacements", &self.replacements()).finish_non_exhaustive()
    }
}
