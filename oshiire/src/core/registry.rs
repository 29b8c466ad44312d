use std::collections::VecDeque;

use crate::core::config::TagConfig;
use crate::core::window::{Window, WindowId};

#[derive(Debug)]
pub struct TagEntry {
    pub config: TagConfig,
    /// Ordered membership; the order defines the `next` cycle.
    pub members: Vec<Window>,
}

/// Tag membership plus the transient (dialog) FIFO.
///
/// Invariants, enforced by construction: a window id belongs to at most one
/// tag, never appears twice in a membership list, and is never a member and
/// a transient at the same time. Admitting an id that is already held
/// elsewhere releases the older admission first.
#[derive(Debug, Default)]
pub struct Registry {
    tags: Vec<TagEntry>,
    transients: VecDeque<Window>,
}

impl Registry {
    pub fn new(configs: Vec<TagConfig>) -> Self {
        Self {
            tags: configs
                .into_iter()
                .map(|config| TagEntry {
                    config,
                    members: Vec::new(),
                })
                .collect(),
            transients: VecDeque::new(),
        }
    }

    pub fn tags(&self) -> impl Iterator<Item = &TagEntry> {
        self.tags.iter()
    }

    pub fn tag_configs(&self) -> impl Iterator<Item = &TagConfig> {
        self.tags.iter().map(|e| &e.config)
    }

    pub fn entry(&self, name: &str) -> Option<&TagEntry> {
        self.tags.iter().find(|e| e.config.name == name)
    }

    pub fn entry_mut(&mut self, name: &str) -> Option<&mut TagEntry> {
        self.tags.iter_mut().find(|e| e.config.name == name)
    }

    /// The tag owning a window id. At most one by construction.
    pub fn owner_of(&self, id: WindowId) -> Option<&str> {
        self.tags
            .iter()
            .find(|e| e.members.iter().any(|w| w.id == id))
            .map(|e| e.config.name.as_str())
    }

    pub fn is_member(&self, tag: &str, id: WindowId) -> bool {
        self.entry(tag)
            .map(|e| e.members.iter().any(|w| w.id == id))
            .unwrap_or(false)
    }

    /// Append a window to a tag's membership. Releases any older admission of
    /// the same id (other tag or transient set) first. Returns false when the
    /// window is already a member of the target tag or the tag is unknown.
    pub fn admit(&mut self, tag: &str, window: Window) -> bool {
        if self.is_member(tag, window.id) {
            return false;
        }
        self.release(window.id);
        match self.entry_mut(tag) {
            Some(entry) => {
                entry.members.push(window);
                true
            }
            None => false,
        }
    }

    /// Remove a window id from its owning tag and from the transient FIFO.
    /// Returns the name of the tag that lost a member, if any.
    pub fn release(&mut self, id: WindowId) -> Option<String> {
        self.transients.retain(|w| w.id != id);
        for entry in &mut self.tags {
            if let Some(pos) = entry.members.iter().position(|w| w.id == id) {
                entry.members.remove(pos);
                return Some(entry.config.name.clone());
            }
        }
        None
    }

    pub fn push_transient(&mut self, window: Window) {
        // A transient is never simultaneously a tag member.
        let id = window.id;
        for entry in &mut self.tags {
            entry.members.retain(|w| w.id != id);
        }
        if !self.transients.iter().any(|w| w.id == id) {
            self.transients.push_back(window);
        }
    }

    /// Oldest waiting transient, FIFO.
    pub fn pop_transient(&mut self) -> Option<Window> {
        self.transients.pop_front()
    }

    pub fn has_transients(&self) -> bool {
        !self.transients.is_empty()
    }

    pub fn transient_count(&self) -> usize {
        self.transients.len()
    }

    pub fn member_count(&self) -> usize {
        self.tags.iter().map(|e| e.members.len()).sum()
    }

    /// Drop all membership and transients, keeping the tag configurations.
    pub fn clear(&mut self) {
        for entry in &mut self.tags {
            entry.members.clear();
        }
        self.transients.clear();
    }
}
