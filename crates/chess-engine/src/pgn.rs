//! Portable Game Notation (PGN) scanning and replay.
//!
//! [`parse_pgn`] splits a multi-game text into [`PgnRecord`]s: the tag pairs
//! of each game plus its movetext reduced to bare SAN tokens and variation
//! brackets. Move numbers, comments, NAGs, `!`/`?` annotations and result
//! markers never reach the token list.
//!
//! Replaying a record feeds every SAN token to [`Game::add_move_san`];
//! variations become sibling branches of the move they replace.

use crate::game::{Game, GameError};
use crate::Position;
use chess_core::FenError;
use thiserror::Error;
use tracing::debug;

/// Error type for PGN scanning and replay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PgnError {
    /// The text does not follow the PGN grammar.
    #[error("malformed PGN at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    /// A movetext token could not be played.
    #[error("cannot play {token:?}: {source}")]
    Move { token: String, source: GameError },

    /// The game's FEN tag does not hold a valid position.
    #[error("invalid FEN tag: {0}")]
    Fen(#[from] FenError),
}

/// One movetext element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A SAN move with move number and annotations stripped.
    Move(String),
    /// `(`: the following moves replace the last one played.
    VariationStart,
    /// `)`: back to the line the variation branched from.
    VariationEnd,
}

/// A single game as read from PGN text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgnRecord {
    /// Tag pairs in the order they appear.
    pub headers: Vec<(String, String)>,
    pub tokens: Vec<Token>,
    /// Game termination marker ("1-0", "0-1", "1/2-1/2" or "*"), if present.
    pub result: Option<String>,
}

impl PgnRecord {
    /// Value of the first tag named `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The main-line SAN moves, variations left out.
    pub fn mainline(&self) -> Vec<&str> {
        let mut depth = 0usize;
        let mut moves = Vec::new();
        for token in &self.tokens {
            match token {
                Token::VariationStart => depth += 1,
                Token::VariationEnd => depth = depth.saturating_sub(1),
                Token::Move(san) if depth == 0 => moves.push(san.as_str()),
                Token::Move(_) => {}
            }
        }
        moves
    }

    /// Plays the record into a fresh [`Game`].
    ///
    /// The game starts from the `FEN` tag when there is one. On return the
    /// cursor sits at the end of the main line.
    pub fn replay(&self) -> Result<Game, PgnError> {
        let mut game = match self.header("FEN") {
            Some(fen) => Game::from_position(Position::from_fen(fen)?),
            None => Game::new(),
        };

        let mut branch_points = Vec::new();
        for token in &self.tokens {
            match token {
                Token::Move(san) => {
                    game.add_move_san(san).map_err(|source| PgnError::Move {
                        token: san.clone(),
                        source,
                    })?;
                }
                Token::VariationStart => {
                    branch_points.push(game.current());
                    game.undo();
                }
                Token::VariationEnd => {
                    if let Some(node) = branch_points.pop() {
                        game.goto(node).map_err(|source| PgnError::Move {
                            token: ")".to_string(),
                            source,
                        })?;
                    }
                }
            }
        }

        debug!(plies = game.san_path().len(), "replayed game");
        Ok(game)
    }
}

/// Scans every game in `text`.
pub fn parse_pgn(text: &str) -> Result<Vec<PgnRecord>, PgnError> {
    let mut scanner = Scanner::new(text);
    let mut records = Vec::new();
    let mut record = PgnRecord::default();
    let mut in_movetext = false;
    let mut depth = 0usize;
    let mut variation_line = 0;

    loop {
        scanner.skip_whitespace();
        let Some(c) = scanner.peek() else {
            break;
        };

        match c {
            '[' => {
                if in_movetext {
                    // A new tag section ends a game that had no result marker.
                    check_closed(depth, variation_line)?;
                    records.push(std::mem::take(&mut record));
                    in_movetext = false;
                }
                let tag = scanner.tag()?;
                record.headers.push(tag);
            }
            '{' => scanner.comment()?,
            ';' => scanner.skip_line(),
            '%' if scanner.at_line_start() => scanner.skip_line(),
            '(' => {
                scanner.bump();
                if depth == 0 {
                    variation_line = scanner.line;
                }
                depth += 1;
                in_movetext = true;
                record.tokens.push(Token::VariationStart);
            }
            ')' => {
                scanner.bump();
                if depth == 0 {
                    return Err(scanner.malformed("unbalanced ')'"));
                }
                depth -= 1;
                record.tokens.push(Token::VariationEnd);
            }
            '$' => {
                scanner.bump();
                scanner.word();
            }
            _ => {
                let word = scanner.word();
                if word.is_empty() {
                    return Err(scanner.malformed(format!("unexpected character {:?}", c)));
                }
                in_movetext = true;
                if is_result(word) {
                    check_closed(depth, variation_line)?;
                    record.result = Some(word.to_string());
                    records.push(std::mem::take(&mut record));
                    in_movetext = false;
                } else if let Some(san) = move_text(word) {
                    record.tokens.push(Token::Move(san.to_string()));
                }
            }
        }
    }

    check_closed(depth, variation_line)?;
    if in_movetext || !record.headers.is_empty() {
        records.push(record);
    }
    Ok(records)
}

/// Scans `text` and replays each game on its own.
///
/// A game that fails to replay yields its error without affecting the
/// others; only a scanning error fails the whole call.
pub fn read_games(text: &str) -> Result<Vec<Result<Game, PgnError>>, PgnError> {
    Ok(parse_pgn(text)?.iter().map(PgnRecord::replay).collect())
}

fn is_result(word: &str) -> bool {
    matches!(word, "1-0" | "0-1" | "1/2-1/2" | "*")
}

fn check_closed(depth: usize, line: usize) -> Result<(), PgnError> {
    if depth > 0 {
        return Err(PgnError::Malformed {
            line,
            reason: "unterminated variation".to_string(),
        });
    }
    Ok(())
}

/// Strips a leading move number ("12." or "12...") and trailing `!`/`?`
/// annotations. `None` if nothing is left.
fn move_text(word: &str) -> Option<&str> {
    let after_number = word.trim_start_matches(|c: char| c.is_ascii_digit());
    let word = if after_number.starts_with('.') {
        after_number.trim_start_matches('.')
    } else {
        word
    };
    let san = word.trim_end_matches(|c| c == '!' || c == '?');
    (!san.is_empty()).then_some(san)
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Scanner {
            text,
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.text[..self.pos].ends_with('\n')
    }

    fn malformed(&self, reason: impl Into<String>) -> PgnError {
        PgnError::Malformed {
            line: self.line,
            reason: reason.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.bump();
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    /// A run of characters up to whitespace or a PGN delimiter.
    fn word(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || "[]{}();$".contains(c) {
                break;
            }
            self.bump();
        }
        &self.text[start..self.pos]
    }

    /// `{ ... }`, which may span lines and does not nest.
    fn comment(&mut self) -> Result<(), PgnError> {
        let line = self.line;
        self.bump();
        while let Some(c) = self.bump() {
            if c == '}' {
                return Ok(());
            }
        }
        Err(PgnError::Malformed {
            line,
            reason: "unterminated comment".to_string(),
        })
    }

    /// `[Name "Value"]`, with `\"` and `\\` escapes in the value.
    fn tag(&mut self) -> Result<(String, String), PgnError> {
        let line = self.line;
        let unterminated = || PgnError::Malformed {
            line,
            reason: "unterminated tag".to_string(),
        };

        self.bump();
        self.skip_whitespace();
        let name = self.word().to_string();
        if name.is_empty() {
            return Err(self.malformed("tag without a name"));
        }
        self.skip_whitespace();
        if self.bump() != Some('"') {
            return Err(self.malformed(format!("tag {} has no quoted value", name)));
        }

        let mut value = String::new();
        loop {
            match self.bump().ok_or_else(unterminated)? {
                '"' => break,
                '\\' => value.push(self.bump().ok_or_else(unterminated)?),
                '\n' => return Err(unterminated()),
                c => value.push(c),
            }
        }

        self.skip_whitespace();
        if self.bump() != Some(']') {
            return Err(unterminated());
        }
        Ok((name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::san::SanError;

    const IMMORTAL_OPENING: &str = r#"[Event "London"]
[Site "London ENG"]
[White "Adolf Anderssen"]
[Black "Lionel Kieseritzky"]
[Result "1-0"]

1. e4 e5 2. f4 exf4 3. Bc4 Qh4+ 4. Kf1 b5 {Bryan Countergambit} 5. Bxb5 Nf6
6. Nf3 Qh6 7. d3 Nh5 8. Nh4 Qg5 9. Nf5 c6 10. g4 Nf6 11. Rg1 cxb5 12. h4 Qg6
13. h5 Qg5 14. Qf3 Ng8 15. Bxf4 Qf6 16. Nc3 Bc5 17. Nd5 Qxb2 18. Bd6 Bxg1
19. e5 Qxa1+ 20. Ke2 Na6 21. Nxg7+ Kd8 22. Qf6+ Nxf6 23. Be7# 1-0
"#;

    fn moves(record: &PgnRecord) -> Vec<&str> {
        record
            .tokens
            .iter()
            .filter_map(|t| match t {
                Token::Move(san) => Some(san.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn parses_headers_and_moves() {
        let records = parse_pgn(IMMORTAL_OPENING).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.header("White"), Some("Adolf Anderssen"));
        assert_eq!(record.header("Round"), None);
        assert_eq!(record.headers.len(), 5);
        assert_eq!(record.result.as_deref(), Some("1-0"));
        let san = moves(record);
        assert_eq!(san.len(), 45);
        assert_eq!(&san[..4], &["e4", "e5", "f4", "exf4"]);
        assert_eq!(san.last(), Some(&"Be7#"));
    }

    #[test]
    fn replays_to_mate() {
        let records = parse_pgn(IMMORTAL_OPENING).unwrap();
        let game = records[0].replay().unwrap();
        assert_eq!(game.san_path().len(), 45);
        assert!(game.position().is_checkmate());
    }

    #[test]
    fn strips_numbers_annotations_and_nags() {
        let text = "1.e4!! e5?! 2.Nf3 $1 Nc6 ; a rest-of-line comment\n3.Bb5 3...a6 *";
        let records = parse_pgn(text).unwrap();
        assert_eq!(moves(&records[0]), vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]);
        assert_eq!(records[0].result.as_deref(), Some("*"));
    }

    #[test]
    fn castling_zeros_are_not_move_numbers() {
        let records = parse_pgn("12. 0-0 O-O-O *").unwrap();
        assert_eq!(moves(&records[0]), vec!["0-0", "O-O-O"]);
    }

    #[test]
    fn splits_multiple_games() {
        let text = "[Event \"A\"]\n\n1. d4 d5 1/2-1/2\n\n[Event \"B\"]\n\n1. c4 0-1\n";
        let records = parse_pgn(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].header("Event"), Some("A"));
        assert_eq!(moves(&records[0]), vec!["d4", "d5"]);
        assert_eq!(records[1].header("Event"), Some("B"));
        assert_eq!(records[1].result.as_deref(), Some("0-1"));
    }

    #[test]
    fn new_tags_end_a_game_without_result() {
        let text = "[Event \"A\"]\n1. e4\n[Event \"B\"]\n1. d4 *";
        let records = parse_pgn(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].result, None);
        assert_eq!(moves(&records[1]), vec!["d4"]);
    }

    #[test]
    fn tag_value_escapes() {
        let records = parse_pgn(r#"[Annotator "The \"Doctor\" \\ 2"] *"#).unwrap();
        assert_eq!(records[0].header("Annotator"), Some(r#"The "Doctor" \ 2"#));
    }

    #[test]
    fn malformed_input() {
        assert_eq!(
            parse_pgn("1. e4 {never closed\n\n"),
            Err(PgnError::Malformed {
                line: 1,
                reason: "unterminated comment".to_string()
            })
        );
        assert!(matches!(
            parse_pgn("[Event \"x\n"),
            Err(PgnError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            parse_pgn("\n1. e4 (1. d4 *"),
            Err(PgnError::Malformed { line: 2, .. })
        ));
        assert!(matches!(parse_pgn("1. e4 ) *"), Err(PgnError::Malformed { .. })));
    }

    #[test]
    fn variations_become_branches() {
        let text = "1. e4 e5 (1... c5 2. Nf3 (2. Nc3) 2... d6) 2. Nf3 *";
        let record = &parse_pgn(text).unwrap()[0];
        assert_eq!(record.mainline(), vec!["e4", "e5", "Nf3"]);

        let mut game = record.replay().unwrap();
        assert_eq!(game.san_path(), vec!["e4", "e5", "Nf3"]);

        game.goto(game.root()).unwrap();
        let e4 = game.variations()[0];
        game.forward(e4).unwrap();
        let replies: Vec<&str> = game
            .variations()
            .iter()
            .map(|&id| game.node(id).unwrap().san())
            .collect();
        assert_eq!(replies, vec!["e5", "c5"]);

        let c5 = game.variations()[1];
        game.forward(c5).unwrap();
        let second: Vec<&str> = game
            .variations()
            .iter()
            .map(|&id| game.node(id).unwrap().san())
            .collect();
        assert_eq!(second, vec!["Nf3", "Nc3"]);
    }

    #[test]
    fn fen_tag_sets_start_position() {
        let text = "[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/8/R3K3 w Q - 0 1\"]\n\n1. O-O-O Ke7 *";
        let game = parse_pgn(text).unwrap()[0].replay().unwrap();
        assert_eq!(game.san_path(), vec!["O-O-O", "Ke7"]);
        assert_eq!(game.to_fen(), "8/4k3/8/8/8/8/8/2KR4 w - - 2 2");

        let bad = "[FEN \"8/8 w - - 0 1\"]\n*";
        assert!(matches!(
            parse_pgn(bad).unwrap()[0].replay(),
            Err(PgnError::Fen(_))
        ));
    }

    #[test]
    fn bad_move_names_the_token() {
        let record = &parse_pgn("1. e4 e5 2. Ke3 *").unwrap()[0];
        assert_eq!(
            record.replay().unwrap_err(),
            PgnError::Move {
                token: "Ke3".to_string(),
                source: GameError::InvalidMove(SanError::InvalidMove("Ke3".to_string())),
            }
        );
    }

    #[test]
    fn read_games_isolates_failures() {
        let text = "1. e4 e5 *\n\n1. e5 *\n\n1. d4 d5 2. c4 *";
        let games = read_games(text).unwrap();
        assert_eq!(games.len(), 3);
        assert!(games[0].is_ok());
        assert!(matches!(games[1], Err(PgnError::Move { .. })));
        assert_eq!(
            games[2].as_ref().unwrap().san_path(),
            vec!["d4", "d5", "c4"]
        );
    }

    #[test]
    fn headers_without_moves() {
        let records = parse_pgn("[Event \"Empty\"]\n").unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].tokens.is_empty());
        assert!(parse_pgn("  \n\n").unwrap().is_empty());
    }
}
