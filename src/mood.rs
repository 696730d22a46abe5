use crate::clock::Millis;
use crate::needs::Needs;
use serde::Serialize;

const SLEEPY_BELOW_ENERGY: f32 = 20.0;
const SAD_BELOW_HUNGER: f32 = 30.0;
const SAD_BELOW_HYGIENE: f32 = 40.0;
const ANGRY_BELOW_HAPPINESS: f32 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub(crate) enum Mood {
    Happy,
    Sad,
    Angry,
    Sleepy,
    Eating,
    /// Terminal state. Nothing transitions here yet.
    #[allow(dead_code)]
    Dead,
}

/// Derives mood from needs. First matching rule wins; the order is part of
/// the contract.
pub(crate) fn resolve(needs: &Needs) -> Mood {
    if needs.energy() < SLEEPY_BELOW_ENERGY {
        return Mood::Sleepy;
    }
    if needs.hunger() < SAD_BELOW_HUNGER {
        return Mood::Sad;
    }
    if needs.hygiene() < SAD_BELOW_HYGIENE {
        return Mood::Sad;
    }
    if needs.happiness() < ANGRY_BELOW_HAPPINESS {
        return Mood::Angry;
    }
    Mood::Happy
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Expiry {
    At(Millis),
    NeedsChange,
}

/// Optimistic mood shown on top of the resolved one.
///
/// Reads never cache the resolved mood, so a decay tick and an override
/// expiry landing on the same instant give the same answer in either order.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct MoodLayer {
    over: Option<(Mood, Expiry)>,
}

impl MoodLayer {
    pub(crate) fn set_until(&mut self, mood: Mood, until: Millis) {
        self.over = Some((mood, Expiry::At(until)));
    }

    /// Holds until the needs next change and the resolver runs again.
    pub(crate) fn set_until_needs_change(&mut self, mood: Mood) {
        self.over = Some((mood, Expiry::NeedsChange));
    }

    /// Timed overrides are left alone; they run out on their own clock.
    pub(crate) fn on_needs_changed(&mut self) {
        if matches!(self.over, Some((_, Expiry::NeedsChange))) {
            self.over = None;
        }
    }

    pub(crate) fn expire(&mut self, now: Millis) {
        if let Some((_, Expiry::At(until))) = self.over {
            if now >= until {
                self.over = None;
            }
        }
    }

    pub(crate) fn current(&self, needs: &Needs, now: Millis) -> Mood {
        match self.over {
            Some((mood, Expiry::NeedsChange)) => mood,
            Some((mood, Expiry::At(until))) if now < until => mood,
            _ => resolve(needs),
        }
    }
}
