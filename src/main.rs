use clap::Parser;
use crossbeam_channel::bounded;
use log::{error, info};
use prost::Message as _;
use std::fs::File;
use std::io::{self, Read};
use std::process;
use std::sync::Arc;
use std::thread;
use tapflow::processor::DnstapProcessor;
use tapflow::{Config, DnsMessage};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Stream of length-delimited dnstap frames, "-" for stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Capacity of the stdout sink channel
    #[arg(long, default_value_t = 512)]
    sink_buffer: usize,

    /// Push one generated CLIENT_QUERY envelope through the pipeline and exit
    #[arg(long)]
    selftest: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("invalid configuration: {}", e);
                process::exit(1);
            }
        },
        None => Config::default(),
    };
    if let Err(e) = config.validate() {
        error!("invalid configuration: {}", e);
        process::exit(1);
    }
    let config = Arc::new(config);

    ctrlc::set_handler(move || {
        error!("Ctrl+C received! Forcing exit...");
        process::exit(0);
    })
    .expect("Error setting Ctrl-C handler");

    // stdout sink: one JSON record per line
    let (sink_tx, sink_rx) = bounded::<DnsMessage>(args.sink_buffer);
    let sink_handle = thread::spawn(move || {
        for dm in sink_rx.iter() {
            match serde_json::to_string(&dm) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("sink encode failed: {}", e),
            }
        }
    });

    let processor = match DnstapProcessor::spawn(config, vec![sink_tx]) {
        Ok(processor) => processor,
        Err(e) => {
            error!("processor start failed: {}", e);
            process::exit(1);
        }
    };

    let ingress = processor.ingress();
    let result = if args.selftest {
        let envelope = tapflow::dnstap::build_test_envelope(sample_query());
        ingress
            .send(envelope.encode_to_vec())
            .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e.to_string()))
    } else {
        read_frames(&args.input, &ingress)
    };
    if let Err(e) = result {
        error!("frame reader failed: {}", e);
    }

    drop(ingress);
    processor.stop();
    let _ = sink_handle.join();
    info!("done");
}

/// Feeds every length-delimited frame from `input` into the pipeline.
/// Blocks when the ingress queue is full; stops at end of stream.
fn read_frames(input: &str, ingress: &crossbeam_channel::Sender<Vec<u8>>) -> io::Result<()> {
    let mut reader: Box<dyn Read> = if input == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(File::open(input)?)
    };

    let mut count = 0u64;
    loop {
        let mut len_buf = [0u8; 4];
        match reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
        let len = u32::from_be_bytes(len_buf) as usize;

        let mut frame = vec![0u8; len];
        reader.read_exact(&mut frame)?;

        if ingress.send(frame).is_err() {
            break;
        }
        count += 1;
    }

    info!("end of stream, {} frames read", count);
    Ok(())
}

// A minimal A query for selftest runs: id 0x1234, example.com IN A.
fn sample_query() -> Vec<u8> {
    let mut p = vec![
        0x12, 0x34, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    p.extend_from_slice(b"\x07example\x03com\x00");
    p.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    p
}
