//! Fully decoded, owning form of an `SMF`.

use tracing::warn;

use crate::{read, Error, Event, Header};

/// `MTrk` chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Track<'a> {
    pub events: Vec<Event<'a>>,
}

/// Standard Midi File.
#[derive(Debug, Clone, PartialEq)]
pub struct Smf<'a> {
    pub header: Header,
    pub tracks: Vec<Track<'a>>,
}

impl<'a> Smf<'a> {
    /// Decodes every track. The first malformed chunk or event fails the whole read.
    pub fn read_bytes(data: &'a [u8]) -> Result<Self, Error> {
        let reader = read::SmfReader::new(data)?;
        let header = reader.header();
        let mut tracks = Vec::with_capacity(header.tracks as usize);
        for track_chunk_data in reader.track_chunk_iter() {
            let events = track_chunk_data?;
            let track = Track {
                events: events.collect::<Result<Vec<_>, _>>()?,
            };
            tracks.push(track);
        }

        if tracks.len() != header.tracks as usize {
            warn!(
                declared = header.tracks,
                found = tracks.len(),
                "track count differs from header"
            );
        }

        Ok(Smf { header, tracks })
    }
}
