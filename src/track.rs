use crate::caption::{Caption, CaptionId};
use crate::signal::Subscription;
use crate::source::CaptionCollection;
use crate::sync::StructuralChange;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::trace;

/// One visual marker on a timeline track.
pub trait TrackMarker {
    /// Called right before the marker is dropped.
    fn detach(&mut self);
}

type MarkerFactory<C, M> = Box<dyn FnMut(&Rc<C>) -> M>;

struct Markers<C, M> {
    by_id: BTreeMap<CaptionId, M>,
    factory: MarkerFactory<C, M>,
}

impl<C: Caption, M: TrackMarker> Markers<C, M> {
    fn add(&mut self, caption: &Rc<C>) {
        let marker = (self.factory)(caption);
        if let Some(mut stale) = self.by_id.insert(caption.id(), marker) {
            stale.detach();
        }
        trace!(id = %caption.id(), "marker added");
    }

    fn remove(&mut self, id: CaptionId) {
        if let Some(mut marker) = self.by_id.remove(&id) {
            marker.detach();
            trace!(%id, "marker removed");
        }
    }

    fn clear(&mut self) {
        for (_, mut marker) in std::mem::take(&mut self.by_id) {
            marker.detach();
        }
    }
}

/// Keeps one marker per timed caption, mirroring the collection's edits.
pub struct TimelineTrack<C, M> {
    markers: RefCell<Markers<C, M>>,
    subscription: RefCell<Option<Subscription>>,
}

impl<C, M> TimelineTrack<C, M>
where
    C: Caption + 'static,
    M: TrackMarker + 'static,
{
    pub fn attach<S, F>(collection: &S, factory: F) -> Rc<Self>
    where
        S: CaptionCollection<Caption = C>,
        F: FnMut(&Rc<C>) -> M + 'static,
    {
        let mut markers = Markers {
            by_id: BTreeMap::new(),
            factory: Box::new(factory),
        };
        for caption in collection.captions_with_times() {
            markers.add(&caption);
        }
        let track = Rc::new(Self {
            markers: RefCell::new(markers),
            subscription: RefCell::new(None),
        });
        let weak = Rc::downgrade(&track);
        let subscription = collection.changes().subscribe(move |change| {
            if let Some(track) = weak.upgrade() {
                track.on_change(change);
            }
        });
        *track.subscription.borrow_mut() = Some(subscription);
        track
    }

    pub fn on_change(&self, change: &StructuralChange<C>) {
        let mut markers = self.markers.borrow_mut();
        match change {
            StructuralChange::BulkClear => markers.clear(),
            StructuralChange::Inserted(caption) | StructuralChange::TimeAssigned(caption) => {
                if caption.start_time().is_some() {
                    markers.add(caption);
                }
            }
            StructuralChange::Removed(caption) => markers.remove(caption.id()),
            StructuralChange::Retimed(caption) => {
                if caption.start_time().is_none() {
                    markers.remove(caption.id());
                } else if !markers.by_id.contains_key(&caption.id()) {
                    markers.add(caption);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.markers.borrow().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.borrow().by_id.is_empty()
    }

    pub fn contains(&self, id: CaptionId) -> bool {
        self.markers.borrow().by_id.contains_key(&id)
    }

    /// Runs `f` on the marker for `id`, if there is one.
    pub fn marker<R>(&self, id: CaptionId, f: impl FnOnce(&M) -> R) -> Option<R> {
        self.markers.borrow().by_id.get(&id).map(f)
    }

    pub fn ids(&self) -> Vec<CaptionId> {
        self.markers.borrow().by_id.keys().copied().collect()
    }

    /// Stops following the collection and destroys every marker.
    pub fn detach(&self) {
        self.subscription.borrow_mut().take();
        self.markers.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::Subtitle;
    use crate::source::CaptionSet;

    use std::time::Duration;

    struct Marker {
        label: String,
        detached: Rc<RefCell<Vec<String>>>,
    }

    impl TrackMarker for Marker {
        fn detach(&mut self) {
            self.detached.borrow_mut().push(self.label.clone());
        }
    }

    fn timed(id: u64, start: u64) -> Subtitle {
        Subtitle::new(CaptionId(id), format!("cap{}", id))
            .with_times(Some(Duration::from_secs(start)), None)
    }

    fn setup(set: &CaptionSet) -> (Rc<TimelineTrack<Subtitle, Marker>>, Rc<RefCell<Vec<String>>>) {
        let detached = Rc::new(RefCell::new(Vec::new()));
        let d = detached.clone();
        let track = TimelineTrack::attach(set, move |caption: &Rc<Subtitle>| Marker {
            label: caption.text().to_string(),
            detached: d.clone(),
        });
        (track, detached)
    }

    #[test]
    fn seeded_with_timed_captions() {
        let set = CaptionSet::from_subtitles(vec![
            timed(2, 5),
            Subtitle::new(CaptionId(3), "untimed"),
            timed(1, 1),
        ])
        .unwrap();

        let (track, _) = setup(&set);

        assert_eq!(track.ids(), vec![CaptionId(1), CaptionId(2)]);
        assert_eq!(track.marker(CaptionId(2), |m| m.label.clone()), Some("cap2".into()));
    }

    #[test]
    fn mirrors_membership() {
        let mut set = CaptionSet::new();
        let (track, detached) = setup(&set);

        set.add(timed(1, 1)).unwrap();
        set.add(Subtitle::new(CaptionId(2), "cap2")).unwrap();
        assert_eq!(track.ids(), vec![CaptionId(1)]);

        set.set_times(CaptionId(2), Some(Duration::from_secs(4)), None)
            .unwrap();
        assert!(track.contains(CaptionId(2)));

        set.remove(CaptionId(1)).unwrap();
        assert_eq!(track.ids(), vec![CaptionId(2)]);
        assert_eq!(*detached.borrow(), vec!["cap1"]);

        set.set_times(CaptionId(2), None, None).unwrap();
        assert!(track.is_empty());
    }

    #[test]
    fn bulk_clear_destroys_all_markers() {
        let mut set = CaptionSet::from_subtitles(vec![timed(1, 1), timed(2, 2)]).unwrap();
        let (track, detached) = setup(&set);

        set.clear_all();

        assert!(track.is_empty());
        assert_eq!(detached.borrow().len(), 2);
    }

    #[test]
    fn detach_stops_following() {
        let mut set = CaptionSet::from_subtitles(vec![timed(1, 1)]).unwrap();
        let (track, detached) = setup(&set);

        track.detach();
        set.add(timed(2, 2)).unwrap();

        assert_eq!(track.len(), 0);
        assert_eq!(*detached.borrow(), vec!["cap1"]);
        assert_eq!(set.changes().listener_count(), 0);
    }
}
