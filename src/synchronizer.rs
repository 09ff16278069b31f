use crate::caption::Caption;
use crate::signal::{Signal, Subscription};
use crate::source::{CaptionCollection, Playhead};
use crate::sync::{CaptionSync, StructuralChange, SyncEvent};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

/// A [`CaptionSync`] wired to a playhead and a caption collection.
///
/// The synchronizer listens to both sources through weak references, so the
/// sources never keep it alive. Events are delivered after the internal state
/// is released; listeners may call back into the synchronizer.
pub struct Synchronizer<C: Caption + 'static> {
    core: RefCell<CaptionSync<C>>,
    playhead: Rc<dyn Playhead>,
    events: Signal<SyncEvent<C>>,
    subscriptions: RefCell<Vec<Subscription>>,
    detached: Cell<bool>,
}

impl<C: Caption + 'static> Synchronizer<C> {
    pub fn attach<S>(playhead: Rc<dyn Playhead>, collection: &S) -> Rc<Self>
    where
        S: CaptionCollection<Caption = C>,
    {
        let core = CaptionSync::new(collection.captions_with_times());
        debug!(captions = core.index().len(), "synchronizer attached");
        let sync = Rc::new(Self {
            core: RefCell::new(core),
            playhead: playhead.clone(),
            events: Signal::new(),
            subscriptions: RefCell::new(Vec::new()),
            detached: Cell::new(false),
        });

        let weak = Rc::downgrade(&sync);
        let on_tick = playhead.advanced().subscribe(move |_| {
            if let Some(sync) = weak.upgrade() {
                sync.on_time_advanced();
            }
        });
        let weak = Rc::downgrade(&sync);
        let on_change = collection.changes().subscribe(move |change| {
            if let Some(sync) = weak.upgrade() {
                sync.on_structural_change(change);
            }
        });
        sync.subscriptions.borrow_mut().extend([on_tick, on_change]);
        sync
    }

    pub fn on_time_advanced(&self) {
        if self.detached.get() {
            return;
        }
        let time = self.playhead.playhead_time();
        let events = self.core.borrow_mut().advance(time);
        self.dispatch(events);
    }

    pub fn on_structural_change(&self, change: &StructuralChange<C>) {
        if self.detached.get() {
            return;
        }
        let time = self.playhead.playhead_time();
        let events = self.core.borrow_mut().apply(change, time);
        self.dispatch(events);
    }

    /// Recomputes for the current playhead time without assuming it moved
    /// forward, e.g. after the caller knows the player seeked.
    pub fn resync(&self) {
        if self.detached.get() {
            return;
        }
        let time = self.playhead.playhead_time();
        let events = self.core.borrow_mut().seek(time);
        self.dispatch(events);
    }

    pub fn set_events_disabled(&self, disabled: bool) {
        self.core.borrow_mut().set_events_disabled(disabled);
    }

    pub fn events_disabled(&self) -> bool {
        self.core.borrow().events_disabled()
    }

    /// Listener registry for caption and finished events.
    pub fn events(&self) -> &Signal<SyncEvent<C>> {
        &self.events
    }

    pub fn active_caption(&self) -> Option<Rc<C>> {
        self.core.borrow().active_caption().cloned()
    }

    pub fn is_attached(&self) -> bool {
        !self.detached.get()
    }

    /// Stops listening to both sources. No event is delivered afterwards.
    pub fn detach(&self) {
        if self.detached.replace(true) {
            return;
        }
        self.subscriptions.borrow_mut().clear();
        debug!("synchronizer detached");
    }

    fn dispatch(&self, events: Vec<SyncEvent<C>>) {
        for event in events {
            if self.detached.get() {
                return;
            }
            self.events.emit(&event);
        }
    }
}
