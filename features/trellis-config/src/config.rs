use std::{ops::Deref, sync::Arc};

/// A shared, injectable view of one registered config
///
/// Dereferences to the config struct; clone it freely, the value itself
/// is shared.
pub struct Config<T> {
    inner: Arc<T>,
}

impl<T> Config<T> {
    pub(crate) fn new(inner: Arc<T>) -> Self {
        Config { inner }
    }

    pub fn inner(&self) -> Arc<T> {
        self.inner.clone()
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }
}

impl<T> Clone for Config<T> {
    fn clone(&self) -> Self {
        Config {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
