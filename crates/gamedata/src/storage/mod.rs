//! Observable keyed storage.
//!
//! A [`Storage`] maps keys to values and notifies registered
//! [`ChangeListener`]s synchronously from inside [`Storage::set`], after the
//! value has been committed. Listeners are held weakly: the store never keeps a
//! listener alive, and a dropped listener is silently pruned.
//!
//! Listeners must not call back into `set` on the store that is notifying them.

mod listener;

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ops::Index;
use std::rc::{Rc, Weak};

pub use listener::{CallbackCollector, ChangeCallback, MultiCallbackCollector};

/// Receiver of change notifications from a [`Storage`].
pub trait ChangeListener<K, V> {
    fn on_changed(&self, key: &K, value: &V);
}

pub struct Storage<K, V> {
    values: HashMap<K, V>,
    listeners: Vec<Weak<dyn ChangeListener<K, V>>>,
}

impl<K, V> Default for Storage<K, V> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            listeners: Vec::new(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Storage<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("values", &self.values)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<K, V> Storage<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listener<L>(listener: &Rc<L>) -> Self
    where
        L: ChangeListener<K, V> + 'static,
    {
        let mut storage = Self::new();
        storage.add_listener(listener);
        storage
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    /// Stored value for `key`, or `default` when absent.
    pub fn get_or<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.values.get(key).unwrap_or(default)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    /// Insert or replace the value for `key`, then notify every live listener.
    pub fn set(&mut self, key: K, value: V) {
        self.listeners.retain(|listener| listener.strong_count() > 0);
        self.values.insert(key.clone(), value);
        if let Some(value) = self.values.get(&key) {
            Self::notify(&self.listeners, &key, value);
        }
    }

    /// Replay a change notification for every stored pair.
    ///
    /// Iteration order is unspecified.
    pub fn trigger_callbacks(&self) {
        for (key, value) in &self.values {
            Self::notify(&self.listeners, key, value);
        }
    }

    pub fn clear_values(&mut self) {
        self.values.clear();
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn add_listener<L>(&mut self, listener: &Rc<L>) -> &mut Self
    where
        L: ChangeListener<K, V> + 'static,
    {
        let weak: Weak<L> = Rc::downgrade(listener);
        self.listeners.push(weak);
        self
    }

    /// Unregister `listener`. Returns `false` if it was not registered.
    pub fn remove_listener<L>(&mut self, listener: &Rc<L>) -> bool
    where
        L: ChangeListener<K, V> + 'static,
    {
        let target = Rc::as_ptr(listener);
        let position = self
            .listeners
            .iter()
            .position(|weak| std::ptr::addr_eq(weak.as_ptr(), target));

        match position {
            Some(index) => {
                self.listeners.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .iter()
            .filter(|listener| listener.strong_count() > 0)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn notify(listeners: &[Weak<dyn ChangeListener<K, V>>], key: &K, value: &V) {
        for listener in listeners.iter().filter_map(Weak::upgrade) {
            listener.on_changed(key, value);
        }
    }
}

/// Indexing requires the key to be present; use [`Storage::get`] otherwise.
impl<K, V> Index<&K> for Storage<K, V>
where
    K: Eq + Hash,
{
    type Output = V;

    fn index(&self, key: &K) -> &V {
        &self.values[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<(u32, i64)>>,
    }

    impl ChangeListener<u32, i64> for Recorder {
        fn on_changed(&self, key: &u32, value: &i64) {
            self.seen.borrow_mut().push((*key, *value));
        }
    }

    #[test]
    fn test_set_then_get() {
        let mut storage: Storage<u32, i64> = Storage::new();
        storage.set(1, 42);
        assert_eq!(storage.get(&1), Some(&42));
        assert_eq!(*storage.get_or(&1, &-1), 42);
        assert_eq!(*storage.get_or(&2, &-1), -1);
        assert_eq!(storage[&1], 42);
    }

    #[test]
    fn test_set_overwrites() {
        let mut storage: Storage<u32, i64> = Storage::new();
        storage.set(1, 10);
        storage.set(1, 20);
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(&1), Some(&20));
    }

    #[test]
    fn test_listener_notified_once_per_set() {
        let recorder = Rc::new(Recorder::default());
        let mut storage: Storage<u32, i64> = Storage::with_listener(&recorder);

        storage.set(7, 99);
        assert_eq!(*recorder.seen.borrow(), vec![(7, 99)]);

        assert!(storage.remove_listener(&recorder));
        storage.set(7, 100);
        assert_eq!(recorder.seen.borrow().len(), 1);
    }

    #[test]
    fn test_remove_unknown_listener_reports_failure() {
        let registered = Rc::new(Recorder::default());
        let stranger = Rc::new(Recorder::default());
        let mut storage: Storage<u32, i64> = Storage::new();
        storage.add_listener(&registered);

        assert!(!storage.remove_listener(&stranger));
        assert_eq!(storage.listener_count(), 1);
    }

    #[test]
    fn test_listener_observes_committed_value() {
        struct ExpectFive;
        impl ChangeListener<u32, i64> for ExpectFive {
            fn on_changed(&self, _key: &u32, value: &i64) {
                assert_eq!(*value, 5);
            }
        }

        let listener = Rc::new(ExpectFive);
        let mut storage: Storage<u32, i64> = Storage::new();
        storage.add_listener(&listener);
        storage.set(1, 5);
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let mut storage: Storage<u32, i64> = Storage::new();
        {
            let recorder = Rc::new(Recorder::default());
            storage.add_listener(&recorder);
            assert_eq!(storage.listener_count(), 1);
        }
        storage.set(1, 1);
        assert_eq!(storage.listener_count(), 0);
    }

    #[test]
    fn test_clear_values_keeps_listeners() {
        let recorder = Rc::new(Recorder::default());
        let mut storage: Storage<u32, i64> = Storage::with_listener(&recorder);
        storage.set(1, 1);
        storage.set(2, 2);

        storage.clear_values();
        assert!(storage.is_empty());
        assert_eq!(storage.get(&1), None);

        recorder.seen.borrow_mut().clear();
        storage.set(3, 3);
        storage.trigger_callbacks();
        assert_eq!(*recorder.seen.borrow(), vec![(3, 3), (3, 3)]);
    }

    #[test]
    fn test_listeners_of_different_types_share_a_store() {
        let recorder = Rc::new(Recorder::default());
        let collector = Rc::new(CallbackCollector::new());
        let hits = Rc::new(RefCell::new(0));
        {
            let hits = Rc::clone(&hits);
            collector.insert(2u32, move |_, _: &i64| *hits.borrow_mut() += 1);
        }

        let mut storage: Storage<u32, i64> = Storage::new();
        storage.add_listener(&recorder).add_listener(&collector);
        storage.set(1, 10);
        storage.set(2, 20);

        assert_eq!(storage.listener_count(), 2);
        assert_eq!(*recorder.seen.borrow(), vec![(1, 10), (2, 20)]);
        assert_eq!(*hits.borrow(), 1);

        assert!(storage.remove_listener(&collector));
        assert!(!storage.remove_listener(&collector));
        assert_eq!(storage.listener_count(), 1);
    }

    #[test]
    fn test_trigger_callbacks_replays_all_pairs() {
        let mut storage: Storage<u32, i64> = Storage::new();
        storage.set(1, 10);
        storage.set(2, 20);

        let recorder = Rc::new(Recorder::default());
        storage.add_listener(&recorder);
        storage.trigger_callbacks();

        let mut seen = recorder.seen.borrow().clone();
        seen.sort_unstable();
        assert_eq!(seen, vec![(1, 10), (2, 20)]);
    }
}
