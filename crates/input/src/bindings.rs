use crate::action::Action;
use std::collections::HashMap;
use std::hash::Hash;

/// Maps a backend's key type to logical actions.
///
/// Several keys may trigger the same action; a key maps to at most one action.
#[derive(Debug, Clone)]
pub struct Bindings<K> {
    map: HashMap<K, Action>,
}

impl<K: Eq + Hash> Default for Bindings<K> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> Bindings<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style bind.
    pub fn with(mut self, key: K, action: Action) -> Self {
        self.bind(key, action);
        self
    }

    /// Bind `key` to `action`, returning the action it was previously bound to.
    pub fn bind(&mut self, key: K, action: Action) -> Option<Action> {
        self.map.insert(key, action)
    }

    pub fn unbind(&mut self, key: &K) -> Option<Action> {
        self.map.remove(key)
    }

    pub fn action_for(&self, key: &K) -> Option<Action> {
        self.map.get(key).copied()
    }

    /// Keys bound to `action`, in no particular order.
    pub fn keys_for(&self, action: Action) -> impl Iterator<Item = &K> {
        self.map
            .iter()
            .filter(move |(_, a)| **a == action)
            .map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
