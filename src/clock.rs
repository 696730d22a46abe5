use std::collections::{BTreeMap, HashMap};

/// Simulated time in milliseconds since session start.
pub(crate) type Millis = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TimerId(u64);

/// Named timer slots. A slot holds at most one pending timer; scheduling into
/// an occupied slot cancels whatever was there first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Slot {
    Decay,
    MoodReset,
    VeinExpiry,
}

struct Entry<E> {
    event: E,
    period: Option<Millis>,
    slot: Option<Slot>,
}

/// Single-threaded timer wheel over a simulated clock.
///
/// Timers are keyed by `(due, id)`, so two timers due at the same instant fire
/// in the order they were created. Popping a timer moves `now` to its due time,
/// which lets handlers stamp their own work with the exact firing instant.
pub(crate) struct Scheduler<E> {
    now: Millis,
    next_id: u64,
    queue: BTreeMap<(Millis, TimerId), Entry<E>>,
    due_of: HashMap<TimerId, Millis>,
    slots: HashMap<Slot, TimerId>,
}

impl<E: Copy> Scheduler<E> {
    pub(crate) fn new() -> Self {
        Self {
            now: 0,
            next_id: 0,
            queue: BTreeMap::new(),
            due_of: HashMap::new(),
            slots: HashMap::new(),
        }
    }

    pub(crate) fn now(&self) -> Millis {
        self.now
    }

    /// Periodic timer; first fires one full period from now.
    pub(crate) fn every(&mut self, period: Millis, event: E) -> TimerId {
        let period = period.max(1);
        self.insert(self.now + period, Some(period), None, event)
    }

    pub(crate) fn after(&mut self, delay: Millis, event: E) -> TimerId {
        self.insert(self.now + delay, None, None, event)
    }

    /// Cancel-then-schedule a one-shot timer in `slot` (debounce).
    pub(crate) fn replace_after(&mut self, slot: Slot, delay: Millis, event: E) -> TimerId {
        self.cancel_slot(slot);
        self.insert(self.now + delay, None, Some(slot), event)
    }

    /// Cancel-then-subscribe a periodic timer in `slot`.
    pub(crate) fn replace_every(&mut self, slot: Slot, period: Millis, event: E) -> TimerId {
        self.cancel_slot(slot);
        let period = period.max(1);
        self.insert(self.now + period, Some(period), Some(slot), event)
    }

    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        let Some(due) = self.due_of.remove(&id) else {
            return false;
        };
        if let Some(entry) = self.queue.remove(&(due, id)) {
            if let Some(slot) = entry.slot {
                if self.slots.get(&slot) == Some(&id) {
                    self.slots.remove(&slot);
                }
            }
        }
        true
    }

    pub(crate) fn cancel_slot(&mut self, slot: Slot) -> bool {
        match self.slots.get(&slot).copied() {
            Some(id) => self.cancel(id),
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self, id: TimerId) -> bool {
        self.due_of.contains_key(&id)
    }

    #[cfg(test)]
    pub(crate) fn slot_due(&self, slot: Slot) -> Option<Millis> {
        self.slots
            .get(&slot)
            .and_then(|id| self.due_of.get(id))
            .copied()
    }

    /// Pops the earliest timer due at or before `until`, advancing `now` to its
    /// due time. Periodic timers are re-armed under the same id.
    pub(crate) fn pop_due(&mut self, until: Millis) -> Option<E> {
        let (&(due, id), _) = self.queue.first_key_value()?;
        if due > until {
            return None;
        }
        let entry = self.queue.remove(&(due, id))?;
        self.now = self.now.max(due);

        match entry.period {
            Some(period) => {
                let next = due + period;
                self.due_of.insert(id, next);
                let event = entry.event;
                self.queue.insert((next, id), entry);
                Some(event)
            }
            None => {
                self.due_of.remove(&id);
                if let Some(slot) = entry.slot {
                    if self.slots.get(&slot) == Some(&id) {
                        self.slots.remove(&slot);
                    }
                }
                Some(entry.event)
            }
        }
    }

    /// Moves the clock forward once every due timer has been drained.
    pub(crate) fn settle(&mut self, until: Millis) {
        self.now = self.now.max(until);
    }

    /// Session teardown: drops every pending timer.
    pub(crate) fn clear(&mut self) {
        self.queue.clear();
        self.due_of.clear();
        self.slots.clear();
    }

    #[cfg(test)]
    pub(crate) fn pending_count(&self) -> usize {
        self.queue.len()
    }

    fn insert(&mut self, due: Millis, period: Option<Millis>, slot: Option<Slot>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.insert((due, id), Entry { event, period, slot });
        self.due_of.insert(id, due);
        if let Some(slot) = slot {
            self.slots.insert(slot, id);
        }
        id
    }
}
