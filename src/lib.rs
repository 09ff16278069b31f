//! Keeps a set of timed captions in step with a media playhead.
//!
//! [`sync::CaptionSync`] is the synchronization core; [`synchronizer::Synchronizer`]
//! wires it to a [`source::Playhead`] and a [`source::CaptionCollection`] and
//! publishes caption events to listeners. [`track::TimelineTrack`] mirrors the
//! same collection into one marker per caption.

pub mod caption;
pub mod error;
pub mod index;
pub mod parser;
pub mod replay;
pub mod script;
pub mod serialiser;
pub mod signal;
pub mod source;
pub mod sync;
pub mod synchronizer;
pub mod track;

pub use caption::{Caption, CaptionId, Subtitle};
pub use error::SubsyncError;
pub use sync::{CaptionSync, StructuralChange, SyncEvent};
pub use synchronizer::Synchronizer;
