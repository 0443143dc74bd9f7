use csv::StringRecord;
use shakmaty::{CastlingMode, Chess, Position, san::SanPlus};
use smallvec::SmallVec;
use std::error::Error;
use std::io::{Read, Write};

type MoveList = SmallVec<[String; 32]>;

const MOVES_FIELD: &str = "moves";

pub(crate) struct ConvertedLine {
    pub ucis: MoveList,
    /// Reason the line stopped short, if it did. Tokens after the first
    /// bad one are never looked at.
    pub failed: Option<String>,
}

/// Replay a space-separated SAN line from the start position and collect
/// the UCI form of every move that applies legally.
pub(crate) fn convert_line(line: &str) -> ConvertedLine {
    let mut pos = Chess::default();
    let mut ucis = MoveList::new();

    for token in line.split_whitespace() {
        let san: SanPlus = match token.parse() {
            Ok(san) => san,
            Err(e) => {
                return ConvertedLine {
                    ucis,
                    failed: Some(format!("unparseable move {token:?}: {e}")),
                };
            }
        };

        let m = match san.san.to_move(&pos) {
            Ok(m) => m,
            Err(e) => {
                return ConvertedLine {
                    ucis,
                    failed: Some(format!("illegal move {token:?}: {e}")),
                };
            }
        };

        ucis.push(m.to_uci(CastlingMode::Standard).to_string());
        pos.play_unchecked(m);
    }

    ConvertedLine { ucis, failed: None }
}

/// Convert a CSV dataset of SAN opening lines to UCI, row by row.
///
/// Every input row produces exactly one output row with the same fields in
/// the same order; only the `moves` field is rewritten. A row whose line
/// stops replaying keeps the converted prefix and gets one line on the
/// diagnostics sink. Only reader/writer failures abort the pass.
pub fn convert<R, W, D>(input: R, output: W, mut diagnostics: D) -> Result<(), Box<dyn Error>>
where
    R: Read,
    W: Write,
    D: Write,
{
    let mut reader = csv::Reader::from_reader(input);
    let mut writer = csv::Writer::from_writer(output);

    let headers = reader.headers()?.clone();
    let moves_at = headers
        .iter()
        .position(|h| h == MOVES_FIELD)
        .ok_or_else(|| format!("no {MOVES_FIELD:?} column in header"))?;
    writer.write_record(&headers)?;

    for record in reader.records() {
        let record = record?;
        let line = convert_line(&record[moves_at]);

        if let Some(reason) = line.failed {
            writeln!(diagnostics, "{reason} in {record:?}")?;
        }

        let joined = line.ucis.join(" ");
        let mut out = StringRecord::new();
        for (i, field) in record.iter().enumerate() {
            out.push_field(if i == moves_at { &joined } else { field });
        }
        writer.write_record(&out)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ucis(line: &str) -> Vec<String> {
        convert_line(line).ucis.to_vec()
    }

    #[test]
    fn test_convert_line_italian_game() {
        let line = convert_line("e4 e5 Bc4");
        assert_eq!(line.ucis.to_vec(), ["e2e4", "e7e5", "f1c4"]);
        assert!(line.failed.is_none());
    }

    #[test]
    fn test_convert_line_empty() {
        let line = convert_line("");
        assert!(line.ucis.is_empty());
        assert!(line.failed.is_none());
    }

    #[test]
    fn test_convert_line_keeps_legal_prefix() {
        // Fourth token repeats a move that is no longer available
        let line = convert_line("e4 e5 Qh5 Qh5");
        assert_eq!(line.ucis.to_vec(), ["e2e4", "e7e5", "d1h5"]);
        let reason = line.failed.unwrap();
        assert!(reason.contains("Qh5"));
    }

    #[test]
    fn test_convert_line_unparseable_token() {
        let line = convert_line("e4 xyzzy e5");
        assert_eq!(line.ucis.to_vec(), ["e2e4"]);
        assert!(line.failed.unwrap().contains("xyzzy"));
    }

    #[test]
    fn test_convert_line_castling() {
        assert_eq!(
            ucis("e4 e5 Nf3 Nc6 Bc4 Nf6 O-O"),
            ["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6", "e1g1"]
        );
    }

    #[test]
    fn test_convert_line_promotion() {
        assert_eq!(
            ucis("e4 d5 exd5 c6 dxc6 Nf6 cxb7 Nbd7 bxa8=Q"),
            ["e2e4", "d7d5", "e4d5", "c7c6", "d5c6", "g8f6", "c6b7", "b8d7", "b7a8q"]
        );
    }

    #[test]
    fn test_convert_line_mate_suffix() {
        assert_eq!(ucis("e4 e5 Bc4 Nc6 Qh5 Nf6 Qxf7#"), [
            "e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"
        ]);
    }

    fn run_convert(input: &str) -> (String, String) {
        let mut output = Vec::new();
        let mut diagnostics = Vec::new();
        convert(input.as_bytes(), &mut output, &mut diagnostics).unwrap();
        (
            String::from_utf8(output).unwrap(),
            String::from_utf8(diagnostics).unwrap(),
        )
    }

    #[test]
    fn test_convert_preserves_fields_and_rows() {
        let input = "\
eco,name,moves
C50,Italian Game,e4 e5 Bc4
XX,Bad Line,e4 e5 Qh5 Qh5
ZZ,Empty,
";
        let (output, diagnostics) = run_convert(input);
        assert_eq!(
            output,
            "\
eco,name,moves
C50,Italian Game,e2e4 e7e5 f1c4
XX,Bad Line,e2e4 e7e5 d1h5
ZZ,Empty,
"
        );

        // One diagnostic line, for the one truncated row, carrying the
        // original row content
        let lines: Vec<&str> = diagnostics.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Qh5"));
        assert!(lines[0].contains("Bad Line"));
    }

    #[test]
    fn test_convert_moves_column_position_does_not_matter() {
        let input = "moves,name\ne4,King's Pawn\n";
        let (output, diagnostics) = run_convert(input);
        assert_eq!(output, "moves,name\ne2e4,King's Pawn\n");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_convert_missing_moves_column_is_fatal() {
        let mut output = Vec::new();
        let mut diagnostics = Vec::new();
        let err = convert("eco,name\nC50,Italian Game\n".as_bytes(), &mut output, &mut diagnostics)
            .unwrap_err();
        assert!(err.to_string().contains("moves"));
    }

    #[test]
    fn test_convert_first_move_illegal_yields_empty_field() {
        let input = "name,moves\nBroken,Ke2 e5\n";
        let (output, diagnostics) = run_convert(input);
        assert_eq!(output, "name,moves\nBroken,\n");
        assert_eq!(diagnostics.lines().count(), 1);
    }
}
