//! Upload to cue list pipeline.
//!
//! A conversion is all-or-nothing: either every track decodes and at least one cue comes out,
//! or one of the three [`ConvertError`] outcomes is returned and nothing else.
//!
//! [`ConvertError`]: enum.ConvertError.html

use futures::io::{self, AsyncRead};
use tracing::debug;

use crate::{cue, source, Cue, Error, FrameClock, Smf};

/// Why a conversion produced no cues.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The upload could not be read.
    #[error("failed to read midi file")]
    Io(#[from] io::Error),
    /// The upload is not a well-formed `SMF`.
    #[error("failed to parse midi file")]
    Decode(#[from] Error),
    /// The file is valid but holds no note long enough to last a frame.
    #[error("no playable note events found")]
    NoPlayableNotes,
}

impl ConvertError {
    /// HTTP status class the outcome maps to.
    pub fn status(&self) -> u16 {
        match self {
            ConvertError::Io(_) | ConvertError::Decode(_) => 500,
            ConvertError::NoPlayableNotes => 400,
        }
    }

    /// Message shown to whoever uploaded the file.
    pub fn message(&self) -> &'static str {
        match self {
            ConvertError::Io(_) => "Error reading MIDI file.",
            ConvertError::Decode(_) => "Error parsing MIDI file.",
            ConvertError::NoPlayableNotes => "No playable note events found in MIDI file.",
        }
    }
}

/// Decodes `bytes` and reconstructs its cues.
pub fn convert_bytes(clock: &FrameClock, bytes: &[u8]) -> Result<Vec<Cue>, ConvertError> {
    let smf = Smf::read_bytes(bytes)?;
    let cues = cue::reconstruct_smf(*clock, &smf);
    debug!(tracks = smf.tracks.len(), cues = cues.len(), "reconstructed cues");

    if cues.is_empty() {
        return Err(ConvertError::NoPlayableNotes);
    }
    Ok(cues)
}

/// Reads an upload to completion, then converts it.
pub async fn convert_reader<TRead: AsyncRead + Unpin>(
    clock: &FrameClock,
    io: TRead,
) -> Result<Vec<Cue>, ConvertError> {
    let bytes = source::read_source(io).await?;
    convert_bytes(clock, &bytes)
}

/// Serializes cues as a flat JSON array of `{note, startFrame, duration}` records.
pub fn cues_to_json(cues: &[Cue]) -> serde_json::Result<String> {
    serde_json::to_string(cues)
}
