use midi_cues::{EventKind, Format, MetaEvent, MidiEventKind, Smf, Timing};

fn test_data(data: &[u8]) -> Vec<Vec<midi_cues::Event>> {
    let smf_reader = midi_cues::read::SmfReader::new(data).unwrap();
    let track_chunks = smf_reader
        .track_chunk_iter()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    track_chunks
        .into_iter()
        .map(|events| events.collect::<Result<Vec<_>, _>>())
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn test_smf_reader() {
    let tracks = test_data(include_bytes!("res/two_tracks.mid"));
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].len(), 6);
    assert_eq!(tracks[1].len(), 6);

    match tracks[0][0].kind {
        EventKind::Meta(MetaEvent::Name(name)) => assert_eq!(name.as_utf8(), Ok("Lead")),
        ref other => panic!("unexpected event {:?}", other),
    }

    // running status note-on with zero velocity
    match tracks[0][4].kind {
        EventKind::Midi(event) => {
            assert_eq!(event.channel, 0);
            assert_eq!(event.kind, MidiEventKind::NoteOff { key: 64, velocity: 0 });
        }
        ref other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(tracks[0][4].delta, 384);
}

#[test]
fn test_smf_read_bytes() {
    let smf = Smf::read_bytes(include_bytes!("res/two_tracks.mid")).unwrap();
    assert_eq!(smf.header.format, Format::MultiTrack);
    assert_eq!(smf.header.tracks, 2);
    assert_eq!(smf.header.timing, Timing::Metrical(96));
    assert_eq!(smf.tracks.len(), 2);
    assert_eq!(
        smf.tracks[1].events[0].kind,
        EventKind::Midi(midi_cues::MidiEvent {
            channel: 0,
            kind: MidiEventKind::ProgramChange(5),
        })
    );
}

#[test]
fn test_truncated_file() {
    let data = include_bytes!("res/two_tracks.mid");
    assert!(Smf::read_bytes(&data[..data.len() - 3]).is_err());
}
