use clap::{Arg, Command};

use evtx_flat::err::Result;
use evtx_flat::{EventDescriptions, EvtxParser};

use log::debug;
use std::io::{self, BufWriter, Write};

fn main() {
    env_logger::init();

    let matches = Command::new("EVTX Flat Dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Dumps EVTX event log files as flat key/value lines")
        .arg(
            Arg::new("input")
                .value_name("FILE")
                .num_args(1..)
                .required(true)
                .help("EVTX files to dump"),
        )
        .get_matches();

    let descriptions = EventDescriptions::load();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    // Files are independent; a failed file never affects the next one, and
    // parse failures are reported on stdout rather than via the exit code.
    for path in matches
        .get_many::<String>("input")
        .expect("This is a required argument")
    {
        if let Err(e) = dump_file(path, &descriptions, &mut out) {
            debug!("{path}: {e}");
            let _ = writeln!(out, "Failed on {path}");
        }
    }

    let _ = out.flush();
}

fn dump_file(
    path: &str,
    descriptions: &EventDescriptions,
    out: &mut impl Write,
) -> Result<()> {
    let mut parser = EvtxParser::from_path(path)?;
    parser.dump_records(descriptions, out)
}
