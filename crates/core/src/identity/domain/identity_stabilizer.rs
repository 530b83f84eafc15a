use crate::identity::domain::confirmed_name_cache::{ConfirmedNameCache, SeenTracks};
use crate::shared::constants::is_sentinel;
use crate::shared::detection::{Detection, TrackId};

/// Result of applying one batch's evidence to the cache.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Confirmation {
    pub seen: SeenTracks,
    /// Tracks whose cache entry became a real name during this batch.
    pub confirmed: Vec<(TrackId, String)>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StabilizeOutcome {
    pub confirmed: Vec<(TrackId, String)>,
    pub pruned: Vec<TrackId>,
}

/// Turns noisy per-frame face names into a stable name per track.
///
/// The first real name seen for a track sticks until the track is missing
/// from a batch; sentinel names never overwrite an existing entry, and a
/// later conflicting real name is ignored. A track absent from one batch
/// loses its history.
#[derive(Debug, Default)]
pub struct IdentityStabilizer {
    cache: ConfirmedNameCache,
}

impl IdentityStabilizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &ConfirmedNameCache {
        &self.cache
    }

    /// Updates the cache from each detection's freshly recognised name, in
    /// batch order, and replaces that name with the track's cached one.
    pub fn confirm(&mut self, detections: &mut [Detection]) -> Confirmation {
        let mut confirmation = Confirmation::default();
        for detection in detections.iter_mut() {
            confirmation.seen.insert(detection.id.clone());

            if self.update(&detection.id, &detection.face.name) {
                confirmation
                    .confirmed
                    .push((detection.id.clone(), detection.face.name.clone()));
            }

            if let Some(name) = self.cache.get(&detection.id) {
                detection.face.name = name.to_string();
            }
        }
        confirmation
    }

    /// Forgets every track that was not in `seen`. Returns the forgotten ids.
    pub fn prune(&mut self, seen: &SeenTracks) -> Vec<TrackId> {
        self.cache.retain_seen(seen)
    }

    pub fn stabilize(&mut self, detections: &mut [Detection]) -> StabilizeOutcome {
        let confirmation = self.confirm(detections);
        let pruned = self.prune(&confirmation.seen);
        StabilizeOutcome {
            confirmed: confirmation.confirmed,
            pruned,
        }
    }

    /// Returns true when `evidence` became the track's confirmed name.
    fn update(&mut self, track_id: &TrackId, evidence: &str) -> bool {
        if !is_sentinel(evidence) {
            if !self.cache.is_confirmed(track_id) {
                self.cache.insert(track_id.clone(), evidence.to_string());
                return true;
            }
        } else if self.cache.get(track_id).is_none() {
            self.cache.insert(track_id.clone(), evidence.to_string());
        }
        false
    }
}
