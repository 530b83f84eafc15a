use std::collections::{HashMap, HashSet};

use crate::shared::constants::is_sentinel;
use crate::shared::detection::TrackId;

/// Track ids observed in one batch.
pub type SeenTracks = HashSet<TrackId>;

/// Per-track display name, kept only while a track is continuously present.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfirmedNameCache {
    names: HashMap<TrackId, String>,
}

impl ConfirmedNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, track_id: &TrackId) -> Option<&str> {
        self.names.get(track_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entries sorted by track id.
    pub fn entries(&self) -> Vec<(&TrackId, &str)> {
        let mut entries: Vec<_> = self
            .names
            .iter()
            .map(|(id, name)| (id, name.as_str()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// True once the track holds a real (non-sentinel) name.
    pub fn is_confirmed(&self, track_id: &TrackId) -> bool {
        self.get(track_id).is_some_and(|name| !is_sentinel(name))
    }

    pub(crate) fn insert(&mut self, track_id: TrackId, name: String) {
        self.names.insert(track_id, name);
    }

    /// Drops every entry not in `seen`; returns the dropped ids, sorted.
    pub(crate) fn retain_seen(&mut self, seen: &SeenTracks) -> Vec<TrackId> {
        let mut removed: Vec<TrackId> = self
            .names
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();
        for id in &removed {
            self.names.remove(id);
        }
        removed.sort();
        removed
    }
}
