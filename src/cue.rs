//! Note-on/note-off pairing and tick to frame conversion.
//!
//! Each track is walked on its own: the tick clock and the pending notes are local to one pass
//! and never shared between tracks or between calls. A note-on for a pitch that is already
//! pending replaces the earlier start, so the following note-off closes the later note.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{Event, EventKind, FrameClock, MidiEventKind, Smf};

/// One sounded note in frame units. `duration` is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    pub note: u8,
    pub start_frame: u64,
    pub duration: u64,
}

/// [`RawEvent`] variants relevant to pairing.
///
/// [`RawEvent`]: struct.RawEvent.html
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    Other,
}

/// Decoded event reduced to what the reconstruction needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    /// Ticks since the previous event of the same track.
    pub delta: u32,
    pub kind: RawEventKind,
}

impl RawEvent {
    pub fn note_on(delta: u32, note: u8) -> Self {
        RawEvent {
            delta,
            kind: RawEventKind::NoteOn { note, velocity: 64 },
        }
    }

    pub fn note_off(delta: u32, note: u8) -> Self {
        RawEvent {
            delta,
            kind: RawEventKind::NoteOff { note, velocity: 64 },
        }
    }

    pub fn other(delta: u32) -> Self {
        RawEvent {
            delta,
            kind: RawEventKind::Other,
        }
    }
}

impl<'a> From<&Event<'a>> for RawEvent {
    fn from(event: &Event<'a>) -> Self {
        let kind = match event.kind {
            EventKind::Midi(midi) => match midi.kind {
                MidiEventKind::NoteOn { key, velocity } => RawEventKind::NoteOn {
                    note: key,
                    velocity,
                },
                MidiEventKind::NoteOff { key, velocity } => RawEventKind::NoteOff {
                    note: key,
                    velocity,
                },
                _ => RawEventKind::Other,
            },
            _ => RawEventKind::Other,
        };

        RawEvent {
            delta: event.delta,
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingNote {
    start_frame: u64,
    start_ticks: u64,
}

/// Reconstruction state for a single track.
#[derive(Debug)]
pub struct TrackCues {
    clock: FrameClock,
    ticks: u64,
    pending: HashMap<u8, PendingNote>,
    cues: Vec<Cue>,
}

impl TrackCues {
    pub fn new(clock: FrameClock) -> Self {
        TrackCues {
            clock,
            ticks: 0,
            pending: HashMap::new(),
            cues: Vec::new(),
        }
    }

    /// Advances the tick clock by the event's delta, then interprets the event.
    pub fn push(&mut self, event: RawEvent) {
        self.ticks += u64::from(event.delta);

        match event.kind {
            RawEventKind::NoteOn { note, .. } => self.note_on(note),
            RawEventKind::NoteOff { note, .. } => self.note_off(note),
            RawEventKind::Other => {}
        }
    }

    fn note_on(&mut self, note: u8) {
        let pending = PendingNote {
            start_frame: self.clock.frames(self.ticks),
            start_ticks: self.ticks,
        };

        if let Some(previous) = self.pending.insert(note, pending) {
            trace!(note, previous_ticks = previous.start_ticks, "note retriggered before release");
        }
    }

    fn note_off(&mut self, note: u8) {
        let pending = match self.pending.remove(&note) {
            Some(pending) => pending,
            None => {
                trace!(note, ticks = self.ticks, "note-off without pending note-on");
                return;
            }
        };

        let duration = self.clock.frames(self.ticks - pending.start_ticks);
        if duration > 0 {
            self.cues.push(Cue {
                note,
                start_frame: pending.start_frame,
                duration,
            });
        } else {
            trace!(note, start_ticks = pending.start_ticks, "dropping note shorter than a frame");
        }
    }

    /// Returns the emitted cues. Notes still pending are discarded.
    pub fn finish(self) -> Vec<Cue> {
        if !self.pending.is_empty() {
            debug!(unreleased = self.pending.len(), "track ended with notes still sounding");
        }
        self.cues
    }
}

/// Reconstructs the cues of one track, in emission order.
pub fn reconstruct_track<I>(clock: FrameClock, events: I) -> Vec<Cue>
where
    I: IntoIterator<Item = RawEvent>,
{
    let mut track = TrackCues::new(clock);
    for event in events {
        track.push(event);
    }
    track.finish()
}

/// Reconstructs every track independently and concatenates the results in track order.
pub fn reconstruct<T, I>(clock: FrameClock, tracks: T) -> Vec<Cue>
where
    T: IntoIterator<Item = I>,
    I: IntoIterator<Item = RawEvent>,
{
    tracks
        .into_iter()
        .flat_map(|events| reconstruct_track(clock, events))
        .collect()
}

/// Reconstructs the cues of a decoded file.
pub fn reconstruct_smf(clock: FrameClock, smf: &Smf<'_>) -> Vec<Cue> {
    reconstruct(
        clock,
        smf.tracks
            .iter()
            .map(|track| track.events.iter().map(RawEvent::from)),
    )
}

#[cfg(test)]
mod tests {
    use super::{reconstruct, reconstruct_track, Cue, RawEvent};
    use crate::FrameClock;

    fn cue(note: u8, start_frame: u64, duration: u64) -> Cue {
        Cue {
            note,
            start_frame,
            duration,
        }
    }

    #[test]
    fn test_one_quarter_note_is_dropped() {
        let events = vec![RawEvent::note_on(0, 60), RawEvent::note_off(96, 60)];
        assert!(reconstruct_track(FrameClock::default(), events).is_empty());
    }

    #[test]
    fn test_half_note_is_one_frame() {
        let events = vec![RawEvent::note_on(0, 60), RawEvent::note_off(192, 60)];
        assert_eq!(
            reconstruct_track(FrameClock::default(), events),
            vec![cue(60, 0, 1)]
        );
    }

    #[test]
    fn test_overlapping_notes_pair_by_pitch() {
        let clock = FrameClock::new(30, 1).unwrap();
        let events = vec![
            RawEvent::note_on(0, 60),
            RawEvent::note_on(10, 64),
            RawEvent::note_off(10, 60),
            RawEvent::note_off(10, 64),
        ];
        // one tick is half a frame
        assert_eq!(
            reconstruct_track(clock, events),
            vec![cue(60, 0, 10), cue(64, 5, 10)]
        );
    }

    #[test]
    fn test_unmatched_note_off_is_ignored() {
        let events = vec![
            RawEvent::note_on(0, 60),
            RawEvent::note_off(192, 62),
            RawEvent::note_off(192, 60),
        ];
        assert_eq!(
            reconstruct_track(FrameClock::default(), events),
            vec![cue(60, 0, 2)]
        );
    }

    #[test]
    fn test_retrigger_overwrites_pending_start() {
        let events = vec![
            RawEvent::note_on(0, 60),
            RawEvent::note_on(384, 60),
            RawEvent::note_off(384, 60),
            RawEvent::note_off(384, 60),
        ];
        assert_eq!(
            reconstruct_track(FrameClock::default(), events),
            vec![cue(60, 2, 2)]
        );
    }

    #[test]
    fn test_zero_duration_clears_pending() {
        let events = vec![
            RawEvent::note_on(0, 60),
            RawEvent::note_off(10, 60),
            RawEvent::note_off(400, 60),
        ];
        assert!(reconstruct_track(FrameClock::default(), events).is_empty());
    }

    #[test]
    fn test_other_events_advance_clock() {
        let events = vec![
            RawEvent::other(192),
            RawEvent::note_on(0, 72),
            RawEvent::other(100),
            RawEvent::note_off(92, 72),
        ];
        assert_eq!(
            reconstruct_track(FrameClock::default(), events),
            vec![cue(72, 1, 1)]
        );
    }

    #[test]
    fn test_tracks_are_independent() {
        let clock = FrameClock::default();
        let tracks = vec![
            vec![RawEvent::note_on(0, 60), RawEvent::note_off(384, 60)],
            // a note-off for a pitch opened in the previous track does not match
            vec![RawEvent::note_on(192, 60)],
            vec![
                RawEvent::note_off(0, 60),
                RawEvent::note_on(0, 60),
                RawEvent::note_off(192, 60),
            ],
        ];
        assert_eq!(reconstruct(clock, tracks), vec![cue(60, 0, 2), cue(60, 0, 1)]);
    }

    #[test]
    fn test_reconstruct_is_repeatable() {
        let clock = FrameClock::default();
        let tracks = vec![vec![
            RawEvent::note_on(0, 60),
            RawEvent::note_on(0, 67),
            RawEvent::note_off(576, 67),
            RawEvent::note_off(192, 60),
        ]];
        let first = reconstruct(clock, tracks.clone());
        let second = reconstruct(clock, tracks);
        assert_eq!(first, vec![cue(67, 0, 3), cue(60, 0, 4)]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input() {
        let clock = FrameClock::default();
        assert!(reconstruct(clock, Vec::<Vec<RawEvent>>::new()).is_empty());
        assert!(reconstruct(clock, vec![vec![RawEvent::other(0)]]).is_empty());
    }

    #[test]
    fn test_cue_serializes_camel_case() {
        let json = serde_json::to_string(&cue(60, 0, 1)).unwrap();
        assert_eq!(json, r#"{"note":60,"startFrame":0,"duration":1}"#);
    }
}
