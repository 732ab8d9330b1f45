use std::{env, fs};

use midi_cues::{cue::RawEvent, cue::RawEventKind};

/// Counts note events per track without collecting the file into an `Smf`.
fn no_allocation_read(bytes: &[u8]) -> Result<(), midi_cues::Error> {
    let smf = midi_cues::read::SmfReader::new(bytes)?;
    println!("{:?}", smf.header());
    for (index, track) in smf.track_chunk_iter().enumerate() {
        let mut notes = 0;
        for event in track? {
            if let RawEventKind::NoteOn { .. } = RawEvent::from(&event?).kind {
                notes += 1;
            }
        }
        println!("track {}: {} note-on events", index, notes);
    }

    Ok(())
}

fn main() {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "read".to_string());
    let path = match (args.next(), args.next()) {
        (Some(path), None) => path,
        _ => {
            eprintln!("Usage: {} <file.mid>", program);
            std::process::exit(1);
        }
    };

    let bytes = fs::read(&path).expect("failed to read file");
    if let Err(err) = no_allocation_read(&bytes) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
