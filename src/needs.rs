use crate::config::{DecayRates, SleepRates};
use serde::Serialize;

pub(crate) const NEED_MIN: f32 = 0.0;
pub(crate) const NEED_MAX: f32 = 100.0;

pub(crate) const GROWTH_MIN: f32 = 1.0;
pub(crate) const GROWTH_MAX: f32 = 1.5;
pub(crate) const GROWTH_PER_MEAL: f32 = 0.1;
pub(crate) const GROWTH_SHRINK_PER_TICK: f32 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Need {
    Hunger,
    Happiness,
    Energy,
    Hygiene,
}

/// The four welfare meters. Fields are private so every write goes through
/// the clamp; each value is always in `[NEED_MIN, NEED_MAX]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub(crate) struct Needs {
    hunger: f32,
    happiness: f32,
    energy: f32,
    hygiene: f32,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            hunger: 80.0,
            happiness: 80.0,
            energy: 100.0,
            hygiene: 100.0,
        }
    }
}

fn clamp_need(v: f32) -> f32 {
    v.clamp(NEED_MIN, NEED_MAX)
}

impl Needs {
    #[cfg(test)]
    pub(crate) fn new(hunger: f32, happiness: f32, energy: f32, hygiene: f32) -> Self {
        Self {
            hunger: clamp_need(hunger),
            happiness: clamp_need(happiness),
            energy: clamp_need(energy),
            hygiene: clamp_need(hygiene),
        }
    }

    pub(crate) fn hunger(&self) -> f32 {
        self.hunger
    }
    pub(crate) fn happiness(&self) -> f32 {
        self.happiness
    }
    pub(crate) fn energy(&self) -> f32 {
        self.energy
    }
    pub(crate) fn hygiene(&self) -> f32 {
        self.hygiene
    }

    /// Saturating add (negative `delta` subtracts). Returns the new value.
    pub(crate) fn adjust(&mut self, need: Need, delta: f32) -> f32 {
        let slot = match need {
            Need::Hunger => &mut self.hunger,
            Need::Happiness => &mut self.happiness,
            Need::Energy => &mut self.energy,
            Need::Hygiene => &mut self.hygiene,
        };
        *slot = clamp_need(*slot + delta);
        *slot
    }

    pub(crate) fn awake_tick(&mut self, rates: &DecayRates) {
        self.adjust(Need::Hunger, -rates.hunger);
        self.adjust(Need::Happiness, -rates.happiness);
        self.adjust(Need::Energy, -rates.energy);
        self.adjust(Need::Hygiene, -rates.hygiene);
    }

    /// Happiness and hygiene are left alone while asleep.
    pub(crate) fn asleep_tick(&mut self, rates: &SleepRates) {
        self.adjust(Need::Energy, rates.energy_recovery);
        self.adjust(Need::Hunger, -rates.hunger);
    }
}

/// Visual size multiplier, bounded to `[GROWTH_MIN, GROWTH_MAX]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub(crate) struct Growth(f32);

impl Default for Growth {
    fn default() -> Self {
        Self(GROWTH_MIN)
    }
}

impl Growth {
    pub(crate) fn scale(self) -> f32 {
        self.0
    }

    pub(crate) fn grow(&mut self) {
        self.0 = (self.0 + GROWTH_PER_MEAL).min(GROWTH_MAX);
    }

    pub(crate) fn shrink(&mut self) {
        self.0 = (self.0 - GROWTH_SHRINK_PER_TICK).max(GROWTH_MIN);
    }
}
