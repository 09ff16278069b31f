//! The collaborators a synchronizer listens to: a playhead and a caption
//! collection, plus in-memory implementations of both.

use crate::caption::{Caption, CaptionId, Subtitle, TimeChange};
use crate::error::SubsyncError;
use crate::signal::Signal;
use crate::sync::StructuralChange;

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

pub trait Playhead {
    /// Current playback position. Reading it has no side effects.
    fn playhead_time(&self) -> Duration;

    /// Fired whenever the position moves, at whatever cadence the player likes.
    fn advanced(&self) -> &Signal<()>;
}

pub trait CaptionCollection {
    type Caption: Caption + 'static;

    /// Captions that have a start time, in any order.
    fn captions_with_times(&self) -> Vec<Rc<Self::Caption>>;

    fn changes(&self) -> &Signal<StructuralChange<Self::Caption>>;
}

/// A playhead moved by hand, for tests and script replays.
#[derive(Default)]
pub struct ManualPlayhead {
    time: Cell<Duration>,
    advanced: Signal<()>,
}

impl ManualPlayhead {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the playhead and fires `advanced`.
    pub fn set_time(&self, time: Duration) {
        self.time.set(time);
        self.advanced.emit(&());
    }

    /// Moves the playhead without firing `advanced`, like a player jumping to
    /// a new position. Listeners must be told by other means.
    pub fn seek(&self, time: Duration) {
        self.time.set(time);
    }
}

impl Playhead for ManualPlayhead {
    fn playhead_time(&self) -> Duration {
        self.time.get()
    }

    fn advanced(&self) -> &Signal<()> {
        &self.advanced
    }
}

/// An editable set of subtitles that announces every structural edit.
#[derive(Default)]
pub struct CaptionSet {
    subtitles: Vec<Rc<Subtitle>>,
    changes: Signal<StructuralChange<Subtitle>>,
}

impl CaptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_subtitles<I>(subtitles: I) -> Result<Self, SubsyncError>
    where
        I: IntoIterator<Item = Subtitle>,
    {
        let mut set = Self::new();
        for subtitle in subtitles {
            set.add(subtitle)?;
        }
        Ok(set)
    }

    pub fn get(&self, id: CaptionId) -> Option<&Rc<Subtitle>> {
        self.subtitles.iter().find(|s| s.id() == id)
    }

    pub fn len(&self) -> usize {
        self.subtitles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subtitles.is_empty()
    }

    pub fn add(&mut self, subtitle: Subtitle) -> Result<Rc<Subtitle>, SubsyncError> {
        if self.get(subtitle.id()).is_some() {
            return Err(SubsyncError::DuplicateCaption(subtitle.id()));
        }
        let subtitle = Rc::new(subtitle);
        self.subtitles.push(subtitle.clone());
        debug!(id = %subtitle.id(), "caption added");
        self.changes
            .emit(&StructuralChange::Inserted(subtitle.clone()));
        Ok(subtitle)
    }

    pub fn remove(&mut self, id: CaptionId) -> Result<Rc<Subtitle>, SubsyncError> {
        let pos = self
            .subtitles
            .iter()
            .position(|s| s.id() == id)
            .ok_or(SubsyncError::UnknownCaption(id))?;
        let subtitle = self.subtitles.remove(pos);
        debug!(%id, "caption removed");
        self.changes.emit(&StructuralChange::Removed(subtitle.clone()));
        Ok(subtitle)
    }

    pub fn clear_all(&mut self) {
        self.subtitles.clear();
        debug!("all captions cleared");
        self.changes.emit(&StructuralChange::BulkClear);
    }

    /// Keeps every subtitle but forgets all timing.
    pub fn clear_times(&mut self) {
        for subtitle in &self.subtitles {
            subtitle.set_times(None, None);
        }
        debug!("all caption times cleared");
        self.changes.emit(&StructuralChange::BulkClear);
    }

    /// Replaces the whole set. Listeners see a bulk clear followed by one
    /// insertion per new subtitle.
    pub fn reset<I>(&mut self, subtitles: I) -> Result<(), SubsyncError>
    where
        I: IntoIterator<Item = Subtitle>,
    {
        self.subtitles.clear();
        self.changes.emit(&StructuralChange::BulkClear);
        for subtitle in subtitles {
            self.add(subtitle)?;
        }
        Ok(())
    }

    pub fn set_times(
        &mut self,
        id: CaptionId,
        show_at: Option<Duration>,
        hide_at: Option<Duration>,
    ) -> Result<TimeChange, SubsyncError> {
        let subtitle = self
            .get(id)
            .cloned()
            .ok_or(SubsyncError::UnknownCaption(id))?;
        let change = subtitle.set_times(show_at, hide_at);
        debug!(%id, ?change, "caption times edited");
        match change {
            TimeChange::FirstAssigned => {
                self.changes.emit(&StructuralChange::TimeAssigned(subtitle))
            }
            TimeChange::Retimed | TimeChange::Cleared => {
                self.changes.emit(&StructuralChange::Retimed(subtitle))
            }
            TimeChange::Unchanged => (),
        }
        Ok(change)
    }
}

impl CaptionCollection for CaptionSet {
    type Caption = Subtitle;

    fn captions_with_times(&self) -> Vec<Rc<Subtitle>> {
        self.subtitles
            .iter()
            .filter(|s| s.start_time().is_some())
            .cloned()
            .collect()
    }

    fn changes(&self) -> &Signal<StructuralChange<Subtitle>> {
        &self.changes
    }
}
