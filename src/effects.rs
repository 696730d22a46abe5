use crate::clock::Millis;
use crate::model::{Glyph, Point};
use serde::Serialize;
use std::collections::BTreeMap;

pub(crate) const EFFECT_LIFETIME_MS: Millis = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub(crate) struct EffectId(u64);

/// Immutable once spawned; the only other lifecycle event is removal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub(crate) struct Effect {
    pub(crate) id: EffectId,
    pub(crate) at: Point,
    pub(crate) glyph: Glyph,
    pub(crate) spawned_at: Millis,
}

impl Effect {
    /// 0.0 at spawn, 1.0 at expiry.
    pub(crate) fn progress(&self, now: Millis) -> f32 {
        let age = now.saturating_sub(self.spawned_at) as f32;
        (age / EFFECT_LIFETIME_MS as f32).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Default)]
pub(crate) struct EffectQueue {
    live: BTreeMap<EffectId, Effect>,
    next_id: u64,
}

impl EffectQueue {
    /// Caller is responsible for arming the expiry timer for the returned id.
    pub(crate) fn spawn(&mut self, at: Point, glyph: Glyph, now: Millis) -> EffectId {
        let id = EffectId(self.next_id);
        self.next_id += 1;
        self.live.insert(
            id,
            Effect {
                id,
                at,
                glyph,
                spawned_at: now,
            },
        );
        id
    }

    pub(crate) fn expire(&mut self, id: EffectId) -> bool {
        self.live.remove(&id).is_some()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.live.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn rescale(&mut self, sx: f32, sy: f32) {
        for e in self.live.values_mut() {
            e.at = Point::new(e.at.x * sx, e.at.y * sy);
        }
    }
}
