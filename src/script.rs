use crate::caption::{CaptionId, Subtitle};

use std::time::Duration;

/// A caption as written in a replay script.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSpec {
    pub id: CaptionId,
    pub show_at: Option<Duration>,
    pub hide_at: Option<Duration>,
    pub text: String,
}

impl CaptionSpec {
    pub fn into_subtitle(self) -> Subtitle {
        Subtitle::new(self.id, self.text).with_times(self.show_at, self.hide_at)
    }
}

/// One line of a replay script.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Part of the collection before playback starts.
    Caption(CaptionSpec),
    Add(CaptionSpec),
    Remove(CaptionId),
    Times {
        id: CaptionId,
        show_at: Option<Duration>,
        hide_at: Option<Duration>,
    },
    Clear,
    ClearTimes,
    Mute(bool),
    /// Move the playhead.
    At(Duration),
    /// Jump the playhead and resynchronize from scratch.
    Seek(Duration),
}
