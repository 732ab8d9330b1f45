use std::{env, fs::File, process};

use futures::{executor::block_on, io::AllowStdIo};
use midi_cues::{
    convert::{convert_reader, cues_to_json, ConvertError},
    FrameClock,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn exit_code(err: &ConvertError) -> i32 {
    match err {
        ConvertError::NoPlayableNotes => 2,
        ConvertError::Io(_) | ConvertError::Decode(_) => 3,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "midi-cues".to_string());
    let path = match (args.next(), args.next()) {
        (Some(path), None) => path,
        _ => {
            eprintln!("Usage: {} <file.mid>", program);
            process::exit(1);
        }
    };

    let clock = FrameClock::default();
    let result = File::open(&path)
        .map_err(ConvertError::from)
        .and_then(|file| block_on(convert_reader(&clock, AllowStdIo::new(file))));

    let cues = match result {
        Ok(cues) => cues,
        Err(err) => {
            error!(path = %path, status = err.status(), "{}", err);
            eprintln!("{}", err.message());
            process::exit(exit_code(&err));
        }
    };

    info!(path = %path, cues = cues.len(), "converted");
    match cues_to_json(&cues) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            error!("failed to serialize cues: {}", err);
            process::exit(3);
        }
    }
}
