//! Caption synchronization core.
//!
//! [`CaptionSync`] tracks which caption is active for a playhead that mostly
//! moves forward in small steps but may jump anywhere, while the caption set
//! itself is edited underneath it. Ordinary ticks take an O(1) path that only
//! looks at the active caption and its successor; anything that breaks that
//! assumption (a seek, a structural edit) falls back to a binary search.
//!
//! Every operation returns the events that should be delivered to listeners.
//! A caption change is reported once per transition; "captions finished" is
//! reported once each time forward playback runs off the end of the last
//! caption.

use crate::caption::Caption;
use crate::index::CaptionIndex;

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info, trace};

/// Structural edits of a caption collection.
pub enum StructuralChange<C> {
    /// All captions were removed, or all lost their times, or the set was reset.
    BulkClear,
    Inserted(Rc<C>),
    Removed(Rc<C>),
    /// A caption that had no start time received its first one.
    TimeAssigned(Rc<C>),
    /// An indexed caption's start time was edited in place, or cleared.
    Retimed(Rc<C>),
}

impl<C> Clone for StructuralChange<C> {
    fn clone(&self) -> Self {
        match self {
            StructuralChange::BulkClear => StructuralChange::BulkClear,
            StructuralChange::Inserted(c) => StructuralChange::Inserted(c.clone()),
            StructuralChange::Removed(c) => StructuralChange::Removed(c.clone()),
            StructuralChange::TimeAssigned(c) => StructuralChange::TimeAssigned(c.clone()),
            StructuralChange::Retimed(c) => StructuralChange::Retimed(c.clone()),
        }
    }
}

impl<C: Caption> fmt::Debug for StructuralChange<C> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StructuralChange::BulkClear => write!(fmt, "BulkClear"),
            StructuralChange::Inserted(c) => write!(fmt, "Inserted({})", c.id()),
            StructuralChange::Removed(c) => write!(fmt, "Removed({})", c.id()),
            StructuralChange::TimeAssigned(c) => write!(fmt, "TimeAssigned({})", c.id()),
            StructuralChange::Retimed(c) => write!(fmt, "Retimed({})", c.id()),
        }
    }
}

/// Notifications produced by the synchronizer.
pub enum SyncEvent<C> {
    /// The displayed caption changed; `None` means nothing is displayed.
    CaptionChanged(Option<Rc<C>>),
    CaptionsFinished,
}

impl<C> Clone for SyncEvent<C> {
    fn clone(&self) -> Self {
        match self {
            SyncEvent::CaptionChanged(c) => SyncEvent::CaptionChanged(c.clone()),
            SyncEvent::CaptionsFinished => SyncEvent::CaptionsFinished,
        }
    }
}

impl<C: Caption> PartialEq for SyncEvent<C> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SyncEvent::CaptionChanged(a), SyncEvent::CaptionChanged(b)) => same_caption(a, b),
            (SyncEvent::CaptionsFinished, SyncEvent::CaptionsFinished) => true,
            _ => false,
        }
    }
}

impl<C: Caption> fmt::Debug for SyncEvent<C> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyncEvent::CaptionChanged(Some(c)) => write!(fmt, "CaptionChanged({})", c.id()),
            SyncEvent::CaptionChanged(None) => write!(fmt, "CaptionChanged(none)"),
            SyncEvent::CaptionsFinished => write!(fmt, "CaptionsFinished"),
        }
    }
}

fn same_caption<C: Caption>(a: &Option<Rc<C>>, b: &Option<Rc<C>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.id() == b.id(),
        (None, None) => true,
        _ => false,
    }
}

pub struct CaptionSync<C> {
    index: CaptionIndex<C>,
    /// Last caption starting at or before the playhead, displayed or not.
    active: Option<usize>,
    /// Displayed caption as last computed, delivered or not.
    last_notified: Option<Rc<C>>,
    /// Displayed caption as last seen by listeners.
    last_delivered: Option<Rc<C>>,
    events_disabled: bool,
    /// Set while the playhead sits past the last caption and no end report is due.
    finished: bool,
}

impl<C: Caption> CaptionSync<C> {
    /// Builds the index from the given captions; captions without a start time
    /// are skipped.
    pub fn new<I>(captions: I) -> Self
    where
        I: IntoIterator<Item = Rc<C>>,
    {
        Self {
            index: CaptionIndex::from_captions(captions),
            active: None,
            last_notified: None,
            last_delivered: None,
            events_disabled: false,
            finished: false,
        }
    }

    /// Playback moved to `time`. Cheap when `time` is a small step forward.
    pub fn advance(&mut self, time: Duration) -> Vec<SyncEvent<C>> {
        let mut out = Vec::new();
        self.fast_path(time, &mut out);
        self.deliver(&mut out);
        out
    }

    /// Recomputes from scratch for an arbitrary `time`.
    pub fn seek(&mut self, time: Duration) -> Vec<SyncEvent<C>> {
        let mut out = Vec::new();
        self.relocate(time, &mut out);
        self.deliver(&mut out);
        out
    }

    /// Applies a structural edit, `time` being the current playhead time.
    pub fn apply(&mut self, change: &StructuralChange<C>, time: Duration) -> Vec<SyncEvent<C>> {
        debug!(?change, "caption set changed");
        let mut out = Vec::new();
        match change {
            StructuralChange::BulkClear => {
                self.index.clear();
                self.active = None;
                self.finished = false;
                self.notify(None, &mut out);
            }
            StructuralChange::Inserted(caption) => {
                if self.index.insert(caption.clone()).is_some() {
                    self.relocate(time, &mut out);
                }
            }
            StructuralChange::Removed(caption) => {
                if self.index.remove(caption).is_some() {
                    self.relocate(time, &mut out);
                }
            }
            StructuralChange::TimeAssigned(caption) => {
                if self.index.iter().any(|c| c.id() == caption.id()) {
                    self.reindex(caption, time, &mut out);
                } else if let Some(pos) = self.index.insert(caption.clone()) {
                    if let Some(active) = self.active {
                        if pos <= active {
                            self.active = Some(active + 1);
                        }
                    }
                    self.fast_path(time, &mut out);
                }
            }
            StructuralChange::Retimed(caption) => self.reindex(caption, time, &mut out),
        }
        self.deliver(&mut out);
        out
    }

    /// Withholds or resumes delivery. Nothing is recomputed; the next operation
    /// delivers the displayed caption if listeners have not seen it yet.
    pub fn set_events_disabled(&mut self, disabled: bool) {
        self.events_disabled = disabled;
    }

    pub fn events_disabled(&self) -> bool {
        self.events_disabled
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// The caption currently displayed, if any.
    pub fn active_caption(&self) -> Option<&Rc<C>> {
        self.last_notified.as_ref()
    }

    pub fn index(&self) -> &CaptionIndex<C> {
        &self.index
    }

    fn fast_path(&mut self, time: Duration, out: &mut Vec<SyncEvent<C>>) {
        if self.index.is_empty() {
            return;
        }
        trace!(time = time.as_secs_f64(), "playhead advanced");

        let current = self.active.and_then(|i| self.index.get(i)).cloned();
        if let Some(current) = &current {
            if current.is_shown_at(time) {
                return;
            }
        }

        let next_pos = self.active.map_or(0, |i| i + 1);
        let next = self.index.get(next_pos).cloned();
        if let Some(next) = &next {
            if next.is_shown_at(time) {
                self.active = Some(next_pos);
                self.finished = false;
                self.notify(Some(next.clone()), out);
                return;
            }
        }

        let before_next = next
            .as_ref()
            .map_or(true, |n| n.start_time().map_or(false, |s| time < s));
        let after_current = current
            .as_ref()
            .map_or(true, |c| c.start_time().map_or(false, |s| time >= s));
        if before_next && after_current {
            self.notify(None, out);
            if next.is_none() {
                self.finish(out);
            } else {
                self.finished = false;
            }
            return;
        }

        debug!(time = time.as_secs_f64(), "playhead jumped, searching");
        // A tick that overshoots the last caption still reports the end on the
        // next tick.
        self.slow_path(time, out);
    }

    /// Searches for `time`. Returns whether the playhead sits past the last
    /// caption's window.
    fn slow_path(&mut self, time: Duration, out: &mut Vec<SyncEvent<C>>) -> bool {
        let found = self.index.search(time);
        self.active = found;
        let shown = found
            .and_then(|i| self.index.get(i))
            .filter(|c| c.is_shown_at(time))
            .cloned();
        let past_end = shown.is_none() && found.map_or(false, |i| i + 1 == self.index.len());
        if !past_end {
            self.finished = false;
        }
        self.notify(shown, out);
        past_end
    }

    /// Slow path for a playhead that did not get here by playing. Landing past
    /// the end counts as already finished, so later ticks stay quiet.
    fn relocate(&mut self, time: Duration, out: &mut Vec<SyncEvent<C>>) {
        if self.slow_path(time, out) {
            self.finished = true;
        }
    }

    fn reindex(&mut self, caption: &Rc<C>, time: Duration, out: &mut Vec<SyncEvent<C>>) {
        let removed = self.index.remove(caption).is_some();
        let inserted = self.index.insert(caption.clone()).is_some();
        if removed || inserted {
            self.relocate(time, out);
        }
    }

    fn notify(&mut self, caption: Option<Rc<C>>, out: &mut Vec<SyncEvent<C>>) {
        if same_caption(&self.last_notified, &caption) {
            return;
        }
        debug!(caption = ?caption.as_ref().map(|c| c.id()), "active caption changed");
        self.last_notified = caption;
        self.deliver(out);
    }

    fn deliver(&mut self, out: &mut Vec<SyncEvent<C>>) {
        if self.events_disabled || same_caption(&self.last_delivered, &self.last_notified) {
            return;
        }
        self.last_delivered = self.last_notified.clone();
        out.push(SyncEvent::CaptionChanged(self.last_notified.clone()));
    }

    fn finish(&mut self, out: &mut Vec<SyncEvent<C>>) {
        if self.finished {
            return;
        }
        self.finished = true;
        info!("captions finished");
        if !self.events_disabled {
            out.push(SyncEvent::CaptionsFinished);
        }
    }
}
