mod book;
mod convert;
mod fetch;
mod log;

use std::env;
use std::error::Error;
use std::fs::File;
use std::io;
use std::process::ExitCode;

const OPENINGS_URL: &str = "https://raw.githubusercontent.com/Destaq/chess-graph/cc81f477b55e1888b42df6e85204951428be5fb3/elo_reading/openings_sheet.csv";

const USAGE: &str = "usage: openings [convert | book <csv> [depth]]";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error(e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None | Some("convert") => {
            let body = fetch::get(OPENINGS_URL)?;
            convert::convert(body.as_bytes(), io::stdout().lock(), io::stderr().lock())
        }
        Some("book") => {
            let path = args.get(1).ok_or(USAGE)?;
            let depth = match args.get(2) {
                Some(depth) => depth.parse()?,
                None => book::DEFAULT_DEPTH,
            };
            book::generate(File::open(path)?, io::stdout().lock(), depth)
        }
        Some(command) => Err(format!("unknown command {command:?}; {USAGE}").into()),
    }
}
