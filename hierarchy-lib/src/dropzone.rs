//! Drag-and-drop intent classification

use std::fmt;
use std::str::FromStr;

use tokio::time::Instant;

use crate::config::DragConfig;
use crate::error::DropError;
use crate::model::SkelType;
use crate::node::TreeNode;
use crate::service::MoveRequest;
use crate::sort_key;

/// A pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The bounding box of a rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.x + self.width && point.y >= self.y && point.y <= self.bottom()
    }
}

/// Where a drop lands relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropZone {
    /// Insert as the target's previous sibling.
    Before,
    /// Insert as the target's next sibling.
    After,
    /// Reparent under the target.
    Into,
}

/// Classifies a pointer position inside a row.
///
/// The top and bottom `strip_ratio` of the row height are the before and
/// after strips; everything in between is the body.
///
/// ```
/// use hierarchy_lib::dropzone::{classify, DropZone, Point, Rect};
///
/// let row = Rect::new(0.0, 0.0, 200.0, 40.0);
/// assert_eq!(classify(row, Point::new(5.0, 2.0), 0.25), DropZone::Before);
/// assert_eq!(classify(row, Point::new(5.0, 20.0), 0.25), DropZone::Into);
/// assert_eq!(classify(row, Point::new(5.0, 39.0), 0.25), DropZone::After);
/// ```
pub fn classify(row: Rect, pointer: Point, strip_ratio: f64) -> DropZone {
    let strip = row.height * strip_ratio;
    if pointer.y < row.y + strip {
        DropZone::Before
    } else if pointer.y > row.bottom() - strip {
        DropZone::After
    } else {
        DropZone::Into
    }
}

/// The `<key>/<kind>` payload carried by a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    pub key: String,
    pub kind: SkelType,
}

impl DragPayload {
    pub fn new(key: impl Into<String>, kind: SkelType) -> Self {
        Self { key: key.into(), kind }
    }

    /// Encodes the payload for the drag data transfer.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DragPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.key, self.kind)
    }
}

impl FromStr for DragPayload {
    type Err = DropError;

    /// Keys may contain `/`; the kind is everything after the last one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, kind) = s
            .rsplit_once('/')
            .ok_or_else(|| DropError::MalformedPayload(s.to_string()))?;
        if key.is_empty() {
            return Err(DropError::MalformedPayload(s.to_string()));
        }
        Ok(Self {
            key: key.to_string(),
            kind: kind.parse()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Hover {
    key: String,
    zone: DropZone,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScheduledClear {
    generation: u64,
    deadline: Instant,
}

/// Tracks the drag in progress and the hovered drop target.
///
/// Leaving a row does not clear the classification right away. A clear is
/// scheduled after `leave_delay`; if the pointer came back over the row in
/// the meantime the check is re-armed with `rearm_delay` instead. Every
/// schedule carries a generation so superseded deadlines are ignored.
#[derive(Debug)]
pub struct DropZoneClassifier {
    config: DragConfig,
    dragged: Option<DragPayload>,
    hover: Option<Hover>,
    left: bool,
    generation: u64,
    scheduled: Option<ScheduledClear>,
}

impl DropZoneClassifier {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            dragged: None,
            hover: None,
            left: false,
            generation: 0,
            scheduled: None,
        }
    }

    /// Starts dragging an entry; returns the encoded payload.
    pub fn start_drag(&mut self, key: impl Into<String>, kind: SkelType) -> String {
        let payload = DragPayload::new(key, kind);
        let encoded = payload.encode();
        self.dragged = Some(payload);
        encoded
    }

    /// Ends the drag and forgets any classification.
    pub fn end_drag(&mut self) {
        self.dragged = None;
        self.reset();
    }

    /// The entry being dragged, if any.
    pub fn dragged(&self) -> Option<&DragPayload> {
        self.dragged.as_ref()
    }

    /// Classifies the pointer over `target_key`'s row.
    ///
    /// Returns `None` while the target is the dragged entry itself.
    pub fn drag_over(&mut self, target_key: &str, row: Rect, pointer: Point) -> Option<DropZone> {
        if self.is_dragging(target_key) {
            self.hover = None;
            return None;
        }
        let zone = classify(row, pointer, self.config.strip_ratio);
        self.left = false;
        self.hover = Some(Hover {
            key: target_key.to_string(),
            zone,
        });
        Some(zone)
    }

    /// Handles the pointer leaving a row.
    ///
    /// `still_inside` is `true` when the pointer only moved between parts
    /// of the same row. Returns the deadline of the scheduled clear.
    pub fn drag_leave(&mut self, still_inside: bool, now: Instant) -> Option<Instant> {
        if still_inside {
            self.left = false;
            return None;
        }
        self.left = true;
        self.schedule(now + self.config.leave_delay)
    }

    /// Runs the scheduled clear if it is due.
    ///
    /// Returns `true` if the classification was cleared.
    pub fn poll_clear(&mut self, now: Instant) -> bool {
        let Some(scheduled) = self.scheduled else {
            return false;
        };
        if scheduled.generation != self.generation || now < scheduled.deadline {
            return false;
        }
        self.scheduled = None;

        if self.left {
            log::debug!("[DropZoneClassifier::poll_clear] clearing drop markers");
            self.hover = None;
            true
        } else {
            self.left = true;
            self.schedule(now + self.config.rearm_delay);
            false
        }
    }

    /// Deadline of the pending clear, if one is scheduled.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduled
            .filter(|s| s.generation == self.generation)
            .map(|s| s.deadline)
    }

    /// The hovered target and its zone.
    pub fn current(&self) -> Option<(&str, DropZone)> {
        self.hover.as_ref().map(|h| (h.key.as_str(), h.zone))
    }

    /// The zone recorded for `target_key`, if it is the hovered target.
    pub fn zone_for(&self, target_key: &str) -> Option<DropZone> {
        self.hover
            .as_ref()
            .filter(|h| h.key == target_key)
            .map(|h| h.zone)
    }

    /// Forgets the classification and cancels the pending clear.
    pub fn reset(&mut self) {
        self.hover = None;
        self.left = false;
        self.generation += 1;
        self.scheduled = None;
    }

    fn is_dragging(&self, key: &str) -> bool {
        self.dragged.as_ref().is_some_and(|d| d.key == key)
    }

    fn schedule(&mut self, deadline: Instant) -> Option<Instant> {
        self.generation += 1;
        self.scheduled = Some(ScheduledClear {
            generation: self.generation,
            deadline,
        });
        Some(deadline)
    }
}

/// Builds the move request for dropping `payload` onto `siblings[position]`.
///
/// Returns `None` for a self-drop, and for `Before`/`After` drops on a
/// target without a parent reference.
pub fn plan_move(
    payload: &DragPayload,
    zone: DropZone,
    siblings: &[TreeNode],
    position: usize,
) -> Option<MoveRequest> {
    let target = siblings.get(position)?;
    if target.key == payload.key {
        return None;
    }

    match zone {
        DropZone::Into => Some(MoveRequest::new(payload.kind, payload.key.as_str(), target.key.as_str())),
        DropZone::Before => {
            let parent = target.parent_entry()?;
            let prev = position
                .checked_sub(1)
                .and_then(|i| siblings.get(i))
                .map(|n| n.sort_order);
            let index = sort_key::key_before(prev, target.sort_order);
            Some(MoveRequest::new(payload.kind, payload.key.as_str(), parent).with_sort_index(index))
        }
        DropZone::After => {
            let parent = target.parent_entry()?;
            let next = siblings.get(position + 1).map(|n| n.sort_order);
            let index = sort_key::key_after(target.sort_order, next);
            Some(MoveRequest::new(payload.kind, payload.key.as_str(), parent).with_sort_index(index))
        }
    }
}
