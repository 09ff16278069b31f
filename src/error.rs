use crate::caption::CaptionId;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubsyncError {
    #[error("{0}")]
    ParseError(String),
    #[error("a caption with id {0} already exists")]
    DuplicateCaption(CaptionId),
    #[error("there is no caption with id {0}")]
    UnknownCaption(CaptionId),
    #[error("caption {0} is declared after playback started; use `add` instead")]
    LateDeclaration(CaptionId),
}
