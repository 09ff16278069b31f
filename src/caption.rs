use std::cell::Cell;
use std::fmt;
use std::time::Duration;

/// Stable identity of a caption. Two captions are the same caption iff their ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptionId(pub u64);

impl fmt::Display for CaptionId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

/// A timed caption as seen by the synchronizer.
///
/// The synchronizer never owns captions; it holds shared references and asks
/// them for their start time and whether they are displayed at a given time.
pub trait Caption {
    fn id(&self) -> CaptionId;

    /// `None` while the caption has no start time assigned yet.
    fn start_time(&self) -> Option<Duration>;

    fn is_shown_at(&self, time: Duration) -> bool;
}

/// What a call to [`Subtitle::set_times`] did to the start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeChange {
    FirstAssigned,
    Retimed,
    Cleared,
    Unchanged,
}

#[derive(Debug)]
pub struct Subtitle {
    id: CaptionId,
    show_at: Cell<Option<Duration>>,
    hide_at: Cell<Option<Duration>>,
    text: String,
}

impl Subtitle {
    pub fn new<S: Into<String>>(id: CaptionId, text: S) -> Self {
        Self {
            id,
            show_at: Cell::new(None),
            hide_at: Cell::new(None),
            text: text.into(),
        }
    }

    pub fn with_times(self, show_at: Option<Duration>, hide_at: Option<Duration>) -> Self {
        self.show_at.set(show_at);
        self.hide_at.set(hide_at);
        self
    }

    pub fn show_at(&self) -> Option<Duration> {
        self.show_at.get()
    }

    /// `None` means the subtitle stays up once shown.
    pub fn hide_at(&self) -> Option<Duration> {
        self.hide_at.get()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Edits the timing in place. Callers holding this subtitle in an index must
    /// be told about the edit; see [`crate::source::CaptionSet::set_times`].
    pub fn set_times(&self, show_at: Option<Duration>, hide_at: Option<Duration>) -> TimeChange {
        let previous = self.show_at.replace(show_at);
        self.hide_at.set(hide_at);
        match (previous, show_at) {
            (None, Some(_)) => TimeChange::FirstAssigned,
            (Some(_), None) => TimeChange::Cleared,
            (Some(old), Some(new)) if old != new => TimeChange::Retimed,
            _ => TimeChange::Unchanged,
        }
    }
}

impl Caption for Subtitle {
    fn id(&self) -> CaptionId {
        self.id
    }

    fn start_time(&self) -> Option<Duration> {
        self.show_at.get()
    }

    fn is_shown_at(&self, time: Duration) -> bool {
        match self.show_at.get() {
            Some(show_at) => show_at <= time && self.hide_at.get().map_or(true, |h| time < h),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    macro_rules! test_shown_at {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (show, hide, time, expected) = $value;

                let sub = Subtitle::new(CaptionId(1), "").with_times(show, hide);

                assert_eq!(sub.is_shown_at(secs(time)), expected);
            }
        )*
        }
    }

    test_shown_at! {
        test_shown_at_0: (Some(secs(1.0)), Some(secs(3.0)), 0.5, false),
        test_shown_at_1: (Some(secs(1.0)), Some(secs(3.0)), 1.0, true),
        test_shown_at_2: (Some(secs(1.0)), Some(secs(3.0)), 2.999, true),
        test_shown_at_3: (Some(secs(1.0)), Some(secs(3.0)), 3.0, false),
        test_shown_at_4: (Some(secs(1.0)), None, 1000.0, true),
        test_shown_at_5: (None, Some(secs(3.0)), 2.0, false),
        test_shown_at_6: (None, None, 0.0, false),
    }

    #[test]
    fn set_times_reports_kind_of_edit() {
        let sub = Subtitle::new(CaptionId(7), "hello");
        assert_eq!(sub.set_times(Some(secs(2.0)), None), TimeChange::FirstAssigned);
        assert_eq!(sub.set_times(Some(secs(2.0)), Some(secs(4.0))), TimeChange::Unchanged);
        assert_eq!(sub.set_times(Some(secs(3.0)), Some(secs(4.0))), TimeChange::Retimed);
        assert_eq!(sub.set_times(None, None), TimeChange::Cleared);
        assert_eq!(sub.start_time(), None);
    }
}
