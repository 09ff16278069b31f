use crate::caption::{Caption, CaptionId, Subtitle};
use crate::error::SubsyncError;
use crate::script::Command;
use crate::source::{CaptionSet, ManualPlayhead, Playhead};
use crate::sync::SyncEvent;
use crate::synchronizer::Synchronizer;
use crate::track::{TimelineTrack, TrackMarker};

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info};

pub struct ReplayOpts {
    /// Keep a timeline track alongside the synchronizer and report its markers.
    pub track: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Logged {
    Caption { id: CaptionId, text: String },
    NoCaption,
    Finished,
}

/// An event as delivered, stamped with the playhead time at delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub at: Duration,
    pub event: Logged,
}

#[derive(Debug, Default)]
pub struct Report {
    pub entries: Vec<Entry>,
    /// Marker ids left on the timeline track, when one was kept.
    pub track: Option<Vec<CaptionId>>,
}

struct Lane {
    id: CaptionId,
}

impl TrackMarker for Lane {
    fn detach(&mut self) {
        debug!(id = %self.id, "lane detached");
    }
}

/// Runs a script: leading `caption` commands form the initial collection,
/// the rest drive it through a synchronizer.
pub fn replay(mut commands: Vec<Command>, opts: ReplayOpts) -> Result<Report, SubsyncError> {
    let split = commands
        .iter()
        .position(|c| !matches!(c, Command::Caption(_)))
        .unwrap_or(commands.len());
    let body = commands.split_off(split);

    let mut set = CaptionSet::new();
    for command in commands {
        if let Command::Caption(spec) = command {
            set.add(spec.into_subtitle())?;
        }
    }
    info!(captions = set.len(), commands = body.len(), "starting replay");

    let playhead = Rc::new(ManualPlayhead::new());
    let sync = Synchronizer::attach(playhead.clone(), &set);
    let track = if opts.track {
        Some(TimelineTrack::attach(&set, |caption: &Rc<Subtitle>| Lane {
            id: caption.id(),
        }))
    } else {
        None
    };

    let entries = Rc::new(RefCell::new(Vec::new()));
    let log = entries.clone();
    let clock = playhead.clone();
    sync.events().connect(move |event| {
        let event = match event {
            SyncEvent::CaptionChanged(Some(c)) => Logged::Caption {
                id: c.id(),
                text: c.text().to_string(),
            },
            SyncEvent::CaptionChanged(None) => Logged::NoCaption,
            SyncEvent::CaptionsFinished => Logged::Finished,
        };
        log.borrow_mut().push(Entry {
            at: clock.playhead_time(),
            event,
        });
    });

    for command in body {
        match command {
            Command::Caption(spec) => return Err(SubsyncError::LateDeclaration(spec.id)),
            Command::Add(spec) => {
                set.add(spec.into_subtitle())?;
            }
            Command::Remove(id) => {
                set.remove(id)?;
            }
            Command::Times {
                id,
                show_at,
                hide_at,
            } => {
                set.set_times(id, show_at, hide_at)?;
            }
            Command::Clear => set.clear_all(),
            Command::ClearTimes => set.clear_times(),
            Command::Mute(disabled) => sync.set_events_disabled(disabled),
            Command::At(time) => playhead.set_time(time),
            Command::Seek(time) => {
                playhead.seek(time);
                sync.resync();
            }
        }
    }

    sync.detach();
    let track = track.map(|track| {
        let ids = track.ids();
        track.detach();
        ids
    });
    let entries = entries.borrow().clone();
    Ok(Report { entries, track })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn run(script: &str, track: bool) -> Result<Report, SubsyncError> {
        let commands = Parser::new().parse(script)?;
        replay(commands, ReplayOpts { track })
    }

    fn events(report: &Report) -> Vec<(f64, String)> {
        report
            .entries
            .iter()
            .map(|e| {
                let what = match &e.event {
                    Logged::Caption { id, .. } => format!("cap{}", id),
                    Logged::NoCaption => "none".to_string(),
                    Logged::Finished => "finished".to_string(),
                };
                (e.at.as_secs_f64(), what)
            })
            .collect()
    }

    const THREE: &str = "caption 1 1 3 one\ncaption 2 5 8 two\ncaption 3 10 12 three\n";

    #[test]
    fn plays_through() {
        let script = format!("{}at 0\nat 2\nat 4\nat 6\nat 9\nat 11\nat 13\n", THREE);

        let report = run(&script, false).unwrap();

        assert_eq!(
            events(&report),
            vec![
                (2.0, "cap1".to_string()),
                (4.0, "none".to_string()),
                (6.0, "cap2".to_string()),
                (9.0, "none".to_string()),
                (11.0, "cap3".to_string()),
                (13.0, "none".to_string()),
                (13.0, "finished".to_string()),
            ]
        );
        assert!(report.track.is_none());
    }

    #[test]
    fn structural_edits_and_muting() {
        let script = format!(
            "{}at 6\nremove 2\nadd 4 5.5 7 four\nmute\nat 11\nunmute\nat 11.5\nclear\n",
            THREE
        );

        let report = run(&script, true).unwrap();

        assert_eq!(
            events(&report),
            vec![
                (6.0, "cap2".to_string()),
                (6.0, "none".to_string()),
                (6.0, "cap4".to_string()),
                (11.5, "cap3".to_string()),
                (11.5, "none".to_string()),
            ]
        );
        assert_eq!(report.track, Some(vec![]));
    }

    #[test]
    fn seeks_search_without_finishing() {
        let script = format!("{}seek 6\nseek 6\nseek 30\nat 31\nseek 11\nat 13\n", THREE);

        let report = run(&script, false).unwrap();

        assert_eq!(
            events(&report),
            vec![
                (6.0, "cap2".to_string()),
                (30.0, "none".to_string()),
                (11.0, "cap3".to_string()),
                (13.0, "none".to_string()),
                (13.0, "finished".to_string()),
            ]
        );
    }

    #[test]
    fn track_lists_timed_captions() {
        let script = format!("{}add 7 - - later\ntimes 7 20 21\nremove 1\n", THREE);

        let report = run(&script, true).unwrap();

        assert_eq!(
            report.track,
            Some(vec![CaptionId(2), CaptionId(3), CaptionId(7)])
        );
    }

    #[test]
    fn late_declarations_are_rejected() {
        let script = format!("{}at 1\ncaption 9 1 2 late\n", THREE);

        assert!(matches!(
            run(&script, false),
            Err(SubsyncError::LateDeclaration(CaptionId(9)))
        ));
    }

    #[test]
    fn unknown_ids_are_errors() {
        assert!(matches!(
            run("remove 3\n", false),
            Err(SubsyncError::UnknownCaption(CaptionId(3)))
        ));
    }
}
