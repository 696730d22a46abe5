use crate::model::Point;

/// Release must land strictly closer than this to the pet center to feed.
pub(crate) const FEED_RADIUS_PX: f32 = 150.0;

/// Drag-to-feed gesture. `item` indexes the food catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) enum Drag {
    #[default]
    Idle,
    Dragging { item: usize, at: Point },
}

impl Drag {
    /// Starts a gesture, abandoning any gesture already in flight.
    pub(crate) fn begin(&mut self, item: usize, at: Point) {
        *self = Drag::Dragging { item, at };
    }

    pub(crate) fn update(&mut self, to: Point) -> bool {
        match self {
            Drag::Dragging { at, .. } => {
                *at = to;
                true
            }
            Drag::Idle => false,
        }
    }

    /// Ends the gesture. Returns the dragged item if `release` is inside the
    /// commit radius around `center`; either way the gesture is back to idle.
    pub(crate) fn end(&mut self, release: Point, center: Point) -> Release {
        let previous = std::mem::take(self);
        match previous {
            Drag::Idle => Release::NotDragging,
            Drag::Dragging { item, .. } if release.distance(center) < FEED_RADIUS_PX => {
                Release::Commit(item)
            }
            Drag::Dragging { .. } => Release::Missed,
        }
    }

    pub(crate) fn cancel(&mut self) {
        *self = Drag::Idle;
    }

    pub(crate) fn is_dragging(&self) -> bool {
        matches!(self, Drag::Dragging { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Release {
    Commit(usize),
    Missed,
    NotDragging,
}
