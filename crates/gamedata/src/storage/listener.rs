//! Per-key callback collectors.
//!
//! Both collectors implement [`ChangeListener`] and dispatch only to callbacks
//! registered for the changed key. Changes to other keys are ignored.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;

use super::ChangeListener;

pub type ChangeCallback<K, V> = Box<dyn Fn(&K, &V)>;

/// One callback per key. Inserting again replaces the previous callback.
pub struct CallbackCollector<K, V> {
    callbacks: RefCell<HashMap<K, ChangeCallback<K, V>>>,
}

impl<K, V> Default for CallbackCollector<K, V> {
    fn default() -> Self {
        Self {
            callbacks: RefCell::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V> CallbackCollector<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&self, key: K, callback: F)
    where
        F: Fn(&K, &V) + 'static,
    {
        self.callbacks.borrow_mut().insert(key, Box::new(callback));
    }

    pub fn remove(&self, key: &K) -> bool {
        self.callbacks.borrow_mut().remove(key).is_some()
    }

    pub fn remove_all(&self) {
        self.callbacks.borrow_mut().clear();
    }

    pub fn contains(&self, key: &K) -> bool {
        self.callbacks.borrow().contains_key(key)
    }
}

impl<K: Eq + Hash, V> ChangeListener<K, V> for CallbackCollector<K, V> {
    fn on_changed(&self, key: &K, value: &V) {
        if let Some(callback) = self.callbacks.borrow().get(key) {
            callback(key, value);
        }
    }
}

/// Ordered list of callbacks per key. Inserting appends.
pub struct MultiCallbackCollector<K, V> {
    callbacks: RefCell<HashMap<K, Vec<ChangeCallback<K, V>>>>,
}

impl<K, V> Default for MultiCallbackCollector<K, V> {
    fn default() -> Self {
        Self {
            callbacks: RefCell::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V> MultiCallbackCollector<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&self, key: K, callback: F)
    where
        F: Fn(&K, &V) + 'static,
    {
        self.callbacks
            .borrow_mut()
            .entry(key)
            .or_default()
            .push(Box::new(callback));
    }

    pub fn extend(&self, key: K, callbacks: Vec<ChangeCallback<K, V>>) {
        self.callbacks
            .borrow_mut()
            .entry(key)
            .or_default()
            .extend(callbacks);
    }

    /// Drop every callback registered for `key`.
    pub fn remove(&self, key: &K) -> bool {
        self.callbacks.borrow_mut().remove(key).is_some()
    }

    pub fn remove_all(&self) {
        self.callbacks.borrow_mut().clear();
    }

    pub fn callback_count(&self, key: &K) -> usize {
        self.callbacks.borrow().get(key).map_or(0, Vec::len)
    }
}

impl<K: Eq + Hash, V> ChangeListener<K, V> for MultiCallbackCollector<K, V> {
    fn on_changed(&self, key: &K, value: &V) {
        if let Some(callbacks) = self.callbacks.borrow().get(key) {
            for callback in callbacks {
                callback(key, value);
            }
        }
    }
}
