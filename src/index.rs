use crate::caption::Caption;

use std::rc::Rc;
use std::time::Duration;

/// Captions with an assigned start time, kept sorted ascending by start time.
///
/// Captions sharing a start time keep their arrival order. Captions without a
/// start time are never stored.
pub struct CaptionIndex<C> {
    captions: Vec<Rc<C>>,
}

impl<C: Caption> CaptionIndex<C> {
    pub fn new() -> Self {
        Self {
            captions: Vec::new(),
        }
    }

    pub fn from_captions<I>(captions: I) -> Self
    where
        I: IntoIterator<Item = Rc<C>>,
    {
        let mut index = Self::new();
        for caption in captions {
            index.insert(caption);
        }
        index
    }

    /// Inserts after any caption with an equal start time. Returns the position,
    /// or `None` if the caption has no start time.
    pub fn insert(&mut self, caption: Rc<C>) -> Option<usize> {
        let start = caption.start_time()?;
        let pos = self.upper_bound(start);
        self.captions.insert(pos, caption);
        Some(pos)
    }

    /// Removes the caption with the same identity. The equal-key range is tried
    /// first; a caption whose start time was edited in place is still found by
    /// a full scan.
    pub fn remove(&mut self, caption: &C) -> Option<Rc<C>> {
        let id = caption.id();
        let keyed = caption.start_time().and_then(|start| {
            let (lo, hi) = (self.lower_bound(start), self.upper_bound(start));
            (lo..hi).find(|&i| self.captions[i].id() == id)
        });
        let pos = keyed.or_else(|| self.captions.iter().position(|c| c.id() == id))?;
        Some(self.captions.remove(pos))
    }

    /// Position of the last caption starting at or before `time`, or `None`
    /// when `time` precedes every caption.
    pub fn search(&self, time: Duration) -> Option<usize> {
        self.upper_bound(time).checked_sub(1)
    }

    pub fn get(&self, pos: usize) -> Option<&Rc<C>> {
        self.captions.get(pos)
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    pub fn clear(&mut self) {
        self.captions.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<C>> {
        self.captions.iter()
    }

    fn lower_bound(&self, time: Duration) -> usize {
        self.captions
            .partition_point(|c| c.start_time().map_or(false, |s| s < time))
    }

    fn upper_bound(&self, time: Duration) -> usize {
        self.captions
            .partition_point(|c| c.start_time().map_or(false, |s| s <= time))
    }
}

impl<C: Caption> Default for CaptionIndex<C> {
    fn default() -> Self {
        Self::new()
    }
}
