//! Retained fragment tree rendered by feature controllers
//!
//! Stand-in for the controllers' slice of the page DOM: each controller
//! mounts named fragments under the root the host supplied, updates them in
//! place, and unmounts them on teardown. Hosts and tests inspect fragments
//! by name.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// One rendered control fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    /// Fragment kind, e.g. "menu", "slider", "overlay"
    pub kind: String,
    /// Visible text content
    pub text: String,
    /// Attribute map
    pub attrs: BTreeMap<String, String>,
    /// Hidden fragments stay mounted but are not displayed
    pub hidden: bool,
}

impl Fragment {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

/// Root element fragments are mounted under. Cheap to clone; clones share
/// the same tree.
#[derive(Clone, Default)]
pub struct DomRoot {
    // Vec keeps mount order, which mirrors controller registration order.
    fragments: Arc<Mutex<Vec<(String, Fragment)>>>,
}

impl DomRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a fragment under `name`, replacing any previous fragment with
    /// the same name.
    pub fn mount(&self, name: impl Into<String>, fragment: Fragment) {
        let name = name.into();
        let mut fragments = self.fragments.lock().unwrap();
        if let Some(slot) = fragments.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = fragment;
        } else {
            fragments.push((name, fragment));
        }
    }

    /// Remove the fragment mounted under `name`. Missing names are a no-op.
    pub fn unmount(&self, name: &str) {
        self.fragments.lock().unwrap().retain(|(n, _)| n != name);
    }

    /// Update a mounted fragment in place. Missing names are a no-op.
    pub fn update(&self, name: &str, f: impl FnOnce(&mut Fragment)) {
        let mut fragments = self.fragments.lock().unwrap();
        if let Some((_, fragment)) = fragments.iter_mut().find(|(n, _)| n == name) {
            f(fragment);
        }
    }

    /// Snapshot of the fragment mounted under `name`.
    pub fn get(&self, name: &str) -> Option<Fragment> {
        self.fragments
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f.clone())
    }

    /// Mounted fragment names, in mount order.
    pub fn names(&self) -> Vec<String> {
        self.fragments.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }

    /// Number of mounted fragments.
    pub fn len(&self) -> usize {
        self.fragments.lock().unwrap().len()
    }

    /// True iff nothing is mounted.
    pub fn is_empty(&self) -> bool {
        self.fragments.lock().unwrap().is_empty()
    }
}

impl std::fmt::Debug for DomRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomRoot").field("fragments", &self.names()).finish()
    }
}
