//! Lazy `SMF` reader over a borrowed byte slice.
//!
//! Nothing here allocates: events borrow text and sysex payloads straight from the input.

use std::convert::TryFrom;

use tracing::trace;

use crate::{
    Action, Error, Event, EventKind, Format, Fps, Header, MetaEvent, MidiEvent, MidiEventKind,
    SysexEvent, Text, Timing,
};

fn read_byte(data: &mut &[u8], context: &'static str) -> Result<u8, Error> {
    let (&byte, rest) = data.split_first().ok_or_else(|| Error::fatal(context))?;
    *data = rest;
    Ok(byte)
}

fn take<'a>(data: &mut &'a [u8], length: usize, context: &'static str) -> Result<&'a [u8], Error> {
    if data.len() < length {
        return Err(Error::fatal(context));
    }
    let (taken, rest) = data.split_at(length);
    *data = rest;
    Ok(taken)
}

fn read_u16(data: &mut &[u8], context: &'static str) -> Result<u16, Error> {
    let bytes = take(data, 2, context)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &mut &[u8], context: &'static str) -> Result<u32, Error> {
    let bytes = take(data, 4, context)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_vlq(data: &mut &[u8], context: &'static str) -> Result<u32, Error> {
    let mut result: u32 = 0;
    for _ in 0..4 {
        let byte = read_byte(data, context)?;
        result = (result << 7) | u32::from(byte & 0b0111_1111);
        if byte & 0b1000_0000 == 0 {
            return Ok(result);
        }
    }

    // vlq must fit into 28 bits
    Err(Error::invalid(context))
}

fn read_data<'a>(data: &mut &'a [u8], context: &'static str) -> Result<&'a [u8], Error> {
    let length = read_vlq(data, context)?;
    take(data, length as usize, context)
}

fn read_data_byte(data: &mut &[u8], context: &'static str) -> Result<u8, Error> {
    let byte = read_byte(data, context)?;
    if byte & 0b1000_0000 != 0 {
        return Err(Error::invalid(context));
    }
    Ok(byte)
}

fn fixed<const N: usize>(data: &[u8], context: &'static str) -> Result<[u8; N], Error> {
    <[u8; N]>::try_from(data).map_err(|_| Error::invalid(context))
}

fn read_header(data: &mut &[u8]) -> Result<Header, Error> {
    // validate chunk type
    if take(data, 4, "header chunk type")? != b"MThd" {
        return Err(Error::invalid("header chunk type"));
    }

    // header may be longer than 6 bytes, extra bytes are skipped
    let length = read_u32(data, "header length")?;
    if length < 6 {
        return Err(Error::invalid("header length"));
    }
    let mut body = take(data, length as usize, "header data")?;

    let format = match read_u16(&mut body, "header format")? {
        0 => Format::Single,
        1 => Format::MultiTrack,
        2 => Format::MultiSequence,
        _ => return Err(Error::invalid("header format")),
    };

    let tracks = read_u16(&mut body, "header tracks")?;
    let division = read_u16(&mut body, "header division")?;

    let timing = if division & 0x8000 == 0 {
        Timing::Metrical(division)
    } else {
        // high byte holds the negated frame rate
        let fps = match ((division >> 8) as u8 as i8).wrapping_neg() as u8 {
            24 => Fps::Fps24,
            25 => Fps::Fps25,
            29 => Fps::Fps30Drop,
            30 => Fps::Fps30NonDrop,
            other => Fps::Other(other),
        };
        Timing::Timecode {
            fps,
            subframe: division as u8,
        }
    };

    Ok(Header {
        format,
        tracks,
        timing,
    })
}

fn read_meta_event<'a>(data: &mut &'a [u8]) -> Result<MetaEvent<'a>, Error> {
    let meta_type = read_byte(data, "meta event type")?;
    let payload = read_data(data, "meta event data")?;

    let meta_event = match meta_type {
        0x00 => {
            let number = fixed::<2>(payload, "sequence number")?;
            MetaEvent::SequenceNumber(u16::from_be_bytes(number))
        }
        0x01 => MetaEvent::Text(Text::new(payload)),
        0x02 => MetaEvent::CopyrightNotice(Text::new(payload)),
        0x03 => MetaEvent::Name(Text::new(payload)),
        0x04 => MetaEvent::InstrumentName(Text::new(payload)),
        0x05 => MetaEvent::Lyric(Text::new(payload)),
        0x06 => MetaEvent::Marker(Text::new(payload)),
        0x07 => MetaEvent::CuePoint(Text::new(payload)),
        0x20 => {
            let [channel] = fixed::<1>(payload, "channel prefix")?;
            MetaEvent::ChannelPrefix(channel)
        }
        0x2f => {
            fixed::<0>(payload, "end of track")?;
            MetaEvent::EndOfTrack
        }
        0x51 => {
            let [a, b, c] = fixed::<3>(payload, "set tempo")?;
            MetaEvent::SetTempo(u32::from_be_bytes([0, a, b, c]))
        }
        0x54 => {
            let [hh, mm, ss, fr, ff] = fixed::<5>(payload, "smpte offset")?;
            MetaEvent::SMTPEOffset { hh, mm, ss, fr, ff }
        }
        0x58 => {
            let [nn, dd, cc, bb] = fixed::<4>(payload, "time signature")?;
            MetaEvent::TimeSignature { nn, dd, cc, bb }
        }
        0x59 => {
            let [sf, mi] = fixed::<2>(payload, "key signature")?;
            MetaEvent::KeySignature { sf, mi }
        }
        0x7f => MetaEvent::SequencerSpecific(payload),
        _ => MetaEvent::Unknown {
            meta_type,
            data: payload,
        },
    };

    Ok(meta_event)
}

fn read_midi_event(data: &mut &[u8], status: u8) -> Result<MidiEvent, Error> {
    let channel = status & 0x0f;
    let first = read_data_byte(data, "midi event data")?;

    let kind = match status & 0xf0 {
        0x80 => MidiEventKind::NoteOff {
            key: first,
            velocity: read_data_byte(data, "note off velocity")?,
        },
        0x90 => match read_data_byte(data, "note on velocity")? {
            0 => MidiEventKind::NoteOff {
                key: first,
                velocity: 0,
            },
            velocity => MidiEventKind::NoteOn {
                key: first,
                velocity,
            },
        },
        0xa0 => MidiEventKind::PolyphonicKeyPressure {
            key: first,
            velocity: read_data_byte(data, "key pressure")?,
        },
        0xb0 => {
            let value = read_data_byte(data, "controller value")?;
            match first {
                120 => MidiEventKind::AllSoundOff,
                121 => MidiEventKind::ResetAllControllers,
                122 if value == 0 => MidiEventKind::LocalControl(Action::Disconnect),
                122 => MidiEventKind::LocalControl(Action::Reconnect),
                123 => MidiEventKind::AllNotesOff,
                124 => MidiEventKind::OmniModeOff,
                125 => MidiEventKind::OmniModeOn,
                126 => MidiEventKind::MonoModeOn(value),
                127 => MidiEventKind::PolyModeOn,
                number => MidiEventKind::ControllerChange { number, value },
            }
        }
        0xc0 => MidiEventKind::ProgramChange(first),
        0xd0 => MidiEventKind::ChannelKeyPressure(first),
        0xe0 => MidiEventKind::PitchBend {
            lsb: first,
            msb: read_data_byte(data, "pitch bend")?,
        },
        _ => return Err(Error::invalid("midi event status")),
    };

    Ok(MidiEvent { channel, kind })
}

fn read_event<'a>(
    data: &mut &'a [u8],
    running_status: &mut Option<u8>,
) -> Result<Event<'a>, Error> {
    // read time since previous event
    let delta = read_vlq(data, "event delta time")?;

    let status = match data.first() {
        Some(&byte) if byte & 0b1000_0000 != 0 => {
            *data = &data[1..];
            byte
        }
        Some(_) => {
            running_status.ok_or_else(|| Error::invalid("data byte without running status"))?
        }
        None => return Err(Error::fatal("event status")),
    };

    // meta and sysex events leave running status untouched, some writers rely on it
    let kind = match status {
        0xff => EventKind::Meta(read_meta_event(data)?),
        0xf0 => EventKind::Sysex(SysexEvent::F0(read_data(data, "sysex data")?)),
        0xf7 => EventKind::Sysex(SysexEvent::F7(read_data(data, "sysex data")?)),
        0x80..=0xef => {
            *running_status = Some(status);
            EventKind::Midi(read_midi_event(data, status)?)
        }
        _ => return Err(Error::invalid("event status")),
    };

    Ok(Event { delta, kind })
}

/// Reader over a complete `SMF` buffer.
///
/// The header is validated on construction, track chunks are decoded lazily.
#[derive(Debug, Clone)]
pub struct SmfReader<'a> {
    header: Header,
    chunks: &'a [u8],
}

impl<'a> SmfReader<'a> {
    /// Validates the `MThd` chunk and prepares track iteration.
    pub fn new(bytes: &'a [u8]) -> Result<Self, Error> {
        let mut data = bytes;
        let header = read_header(&mut data)?;
        Ok(SmfReader {
            header,
            chunks: data,
        })
    }

    pub fn header(&self) -> Header {
        self.header
    }

    /// Iterates over the `MTrk` chunks the header declares, in file order.
    pub fn track_chunk_iter(&self) -> TrackChunkIter<'a> {
        TrackChunkIter {
            data: self.chunks,
            remaining: self.header.tracks,
            done: false,
        }
    }
}

/// Iterator over the track chunks of an [`SmfReader`].
///
/// Chunks with an unknown type are skipped. Iteration ends once the declared number of tracks
/// has been read or fewer bytes than a chunk header remain, so trailing padding is ignored. The
/// iterator stops after the first error.
///
/// [`SmfReader`]: struct.SmfReader.html
#[derive(Debug, Clone)]
pub struct TrackChunkIter<'a> {
    data: &'a [u8],
    remaining: u16,
    done: bool,
}

impl<'a> TrackChunkIter<'a> {
    fn next_chunk(&mut self) -> Result<Option<EventIter<'a>>, Error> {
        while self.remaining > 0 && self.data.len() >= 8 {
            let chunk_type = take(&mut self.data, 4, "track chunk type")?;
            let length = read_u32(&mut self.data, "track chunk length")?;
            let body = take(&mut self.data, length as usize, "track chunk data")?;

            if chunk_type == b"MTrk" {
                self.remaining -= 1;
                return Ok(Some(EventIter::new(body)));
            }
            trace!(?chunk_type, length, "skipping alien chunk");
        }

        if !self.data.is_empty() {
            trace!(bytes = self.data.len(), "ignoring trailing bytes");
        }
        Ok(None)
    }
}

impl<'a> Iterator for TrackChunkIter<'a> {
    type Item = Result<EventIter<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_chunk() {
            Ok(Some(events)) => Some(Ok(events)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Iterator over the events of one `MTrk` chunk.
#[derive(Debug, Clone)]
pub struct EventIter<'a> {
    data: &'a [u8],
    running_status: Option<u8>,
    done: bool,
}

impl<'a> EventIter<'a> {
    /// Creates an iterator over raw `MTrk` chunk data (without the chunk header).
    pub fn new(data: &'a [u8]) -> Self {
        EventIter {
            data,
            running_status: None,
            done: false,
        }
    }
}

impl<'a> Iterator for EventIter<'a> {
    type Item = Result<Event<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.data.is_empty() {
            return None;
        }

        let event = read_event(&mut self.data, &mut self.running_status);
        if event.is_err() {
            self.done = true;
        }
        Some(event)
    }
}
