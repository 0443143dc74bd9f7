use serde::Serialize;
use shakmaty::{Chess, EnPassantMode, Position, fen::Fen, uci::UciMove};
use std::collections::BTreeMap;
use std::error::Error;
use std::io::{Read, Write};

use crate::log;

pub const DEFAULT_DEPTH: usize = 10;

const ECO_FIELD: &str = "eco";
const NAME_FIELD: &str = "name";
const MOVES_FIELD: &str = "moves";

/// Opening book keyed by position: for every position reached within the
/// depth limit, the moves the book knows there. ECO codes and opening names
/// are interned once and referenced by index from each book move.
#[derive(Debug, Serialize)]
pub struct OpeningBook {
    pub depth: usize,
    pub ecos: Vec<String>,
    pub names: Vec<String>,
    pub moves: BTreeMap<String, Vec<BookMove>>,
}

#[derive(Debug, Serialize)]
pub struct BookMove {
    pub eco: usize,
    pub name: usize,
    pub uci: String,
}

/// Build an opening book from a converted dataset (UCI move lines) and
/// write it as pretty JSON.
pub fn generate<R, W>(input: R, mut output: W, depth: usize) -> Result<(), Box<dyn Error>>
where
    R: Read,
    W: Write,
{
    let book = build(input, depth)?;

    serde_json::to_writer_pretty(&mut output, &book)?;
    writeln!(output)?;
    Ok(())
}

pub(crate) fn build<R: Read>(input: R, depth: usize) -> Result<OpeningBook, Box<dyn Error>> {
    let mut reader = csv::Reader::from_reader(input);

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| format!("no {name:?} column in header"))
    };
    let eco_at = column(ECO_FIELD)?;
    let name_at = column(NAME_FIELD)?;
    let moves_at = column(MOVES_FIELD)?;

    let mut book = OpeningBook {
        depth,
        ecos: Vec::new(),
        names: Vec::new(),
        moves: BTreeMap::new(),
    };

    log::info("reading openings");

    for record in reader.records() {
        let record = record?;
        log::info(format!("storing {} {}", &record[eco_at], &record[name_at]));

        book.ecos.push(record[eco_at].to_string());
        book.names.push(record[name_at].to_string());

        let eco = book.ecos.len() - 1;
        let name = book.names.len() - 1;

        let line = &record[moves_at];
        if line.trim().is_empty() {
            log::warn(format!("no moves for {}", &record[name_at]));
            continue;
        }

        let mut pos = Chess::default();

        for token in line.split_whitespace().take(depth) {
            // The input is this tool's own converted output, so a token
            // that does not replay means a corrupt file.
            let uci: UciMove = token
                .parse()
                .map_err(|e| format!("bad move {token:?} for {}: {e}", &record[name_at]))?;
            let m = uci
                .to_move(&pos)
                .map_err(|e| format!("bad move {token:?} for {}: {e}", &record[name_at]))?;

            let fen = Fen::from_position(&pos, EnPassantMode::Legal).to_string();
            book.moves.entry(fen).or_default().push(BookMove {
                eco,
                name,
                uci: token.to_string(),
            });

            pos.play_unchecked(m);
        }
    }

    Ok(book)
}
