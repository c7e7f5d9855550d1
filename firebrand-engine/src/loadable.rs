//! Deferred members.
//!
//! A [`Loadable`] is either loaded (holding an `Arc` of its value) or
//! unloaded with a loader that produces the value on first access. The
//! value is assigned at most once; concurrent first accesses wait for the
//! single loader run. A failed load leaves the member unloaded, so the next
//! access retries.

use crate::EngineResult;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

type Loader<T> = Box<dyn Fn() -> EngineResult<T> + Send + Sync>;

pub struct Loadable<T> {
    cell: OnceCell<Arc<T>>,
    loader: Option<Loader<T>>,
}

impl<T> Loadable<T> {
    /// A member that is already loaded.
    pub fn ready(value: T) -> Self {
        Self {
            cell: OnceCell::with_value(Arc::new(value)),
            loader: None,
        }
    }

    /// A member loaded by `loader` on first access.
    pub fn deferred(loader: impl Fn() -> EngineResult<T> + Send + Sync + 'static) -> Self {
        Self {
            cell: OnceCell::new(),
            loader: Some(Box::new(loader)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Returns the value if loaded, without triggering the loader.
    pub fn peek(&self) -> Option<&Arc<T>> {
        self.cell.get()
    }

    /// Returns the value, loading it first if needed. Every call after a
    /// successful load returns the same `Arc`.
    pub fn get(&self) -> EngineResult<Arc<T>> {
        self.cell
            .get_or_try_init(|| match &self.loader {
                Some(load) => load().map(Arc::new),
                None => Err(crate::EngineError::UnexpectedResult(
                    "unloaded member has no loader".into(),
                )),
            })
            .cloned()
    }
}

impl<T: fmt::Debug> fmt::Debug for Loadable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Loaded").field(value).finish(),
            None => f.write_str("Unloaded"),
        }
    }
}
