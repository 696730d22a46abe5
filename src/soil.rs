use crate::model::{Point, Stage};
use crate::needs::{Need, Needs};
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

/// A draw strictly above this spawns a mess.
const SOIL_THRESHOLD: f32 = 0.7;
const SOIL_HYGIENE_PENALTY: f32 = 10.0;

/// Uniform draws in `[0, 1)`. Injected so tests can force or deny soiling.
pub(crate) trait RandomSource {
    fn unit(&mut self) -> f32;
}

impl RandomSource for StdRng {
    fn unit(&mut self) -> f32 {
        self.gen::<f32>()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub(crate) struct MessId(pub(crate) u64);

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub(crate) struct Mess {
    pub(crate) id: MessId,
    pub(crate) at: Point,
}

#[derive(Debug, Default)]
pub(crate) struct Soiling {
    messes: BTreeMap<MessId, Mess>,
    next_id: u64,
}

impl Soiling {
    /// One soiling check. Draws only when the pet is awake and not starving.
    pub(crate) fn check(
        &mut self,
        sleeping: bool,
        needs: &mut Needs,
        stage: &Stage,
        rng: &mut dyn RandomSource,
    ) -> Option<MessId> {
        if sleeping || needs.hunger() <= 0.0 {
            return None;
        }
        if rng.unit() <= SOIL_THRESHOLD {
            return None;
        }

        let at = stage.floor_point(rng.unit(), rng.unit());
        let id = MessId(self.next_id);
        self.next_id += 1;
        self.messes.insert(id, Mess { id, at });
        needs.adjust(Need::Hygiene, -SOIL_HYGIENE_PENALTY);
        Some(id)
    }

    pub(crate) fn remove(&mut self, id: MessId) -> bool {
        self.messes.remove(&id).is_some()
    }

    pub(crate) fn oldest(&self) -> Option<MessId> {
        self.messes.keys().next().copied()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Mess> {
        self.messes.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.messes.len()
    }

    pub(crate) fn rescale(&mut self, sx: f32, sy: f32) {
        for m in self.messes.values_mut() {
            m.at = Point::new(m.at.x * sx, m.at.y * sy);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::RandomSource;
    use std::collections::VecDeque;

    /// Replays the given draws, then repeats `fallback` forever.
    pub(crate) struct Scripted {
        draws: VecDeque<f32>,
        fallback: f32,
        pub(crate) calls: usize,
    }

    impl Scripted {
        pub(crate) fn new(draws: &[f32], fallback: f32) -> Self {
            Self {
                draws: draws.iter().copied().collect(),
                fallback,
                calls: 0,
            }
        }

        pub(crate) fn always(v: f32) -> Self {
            Self::new(&[], v)
        }
    }

    impl RandomSource for Scripted {
        fn unit(&mut self) -> f32 {
            self.calls += 1;
            self.draws.pop_front().unwrap_or(self.fallback)
        }
    }
}
