use chess::{Board, BoardStatus, ChessMove, Color, File, MoveGen, Piece, Square};
use rand::seq::SliceRandom;
use rand::Rng;
use std::str::FromStr;

use crate::services::errors::chess_service_errors::ChessServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
    /// Neither side can mate, e.g. bare kings.
    Draw,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        self != GameStatus::Ongoing
    }
}

/// A move that passed the rules check, with the position it leads to.
#[derive(Debug, Clone)]
pub struct AppliedMove {
    pub board: Board,
    pub chess_move: ChessMove,
    pub side: Color,
    pub piece: Piece,
    pub status: GameStatus,
}

impl AppliedMove {
    /// Coordinate form understood by the remote host, e.g. "e2e4" or "e7e8q".
    pub fn coordinates(&self) -> String {
        self.chess_move.to_string()
    }
}

/// Rules adapter over the `chess` crate.
#[derive(Clone, Default)]
pub struct ChessService;

impl ChessService {
    pub fn new() -> Self {
        ChessService
    }

    /// Loads a FEN, or the starting position when none is stored yet.
    pub fn load_position(&self, fen: Option<&str>) -> Result<Board, ChessServiceError> {
        match fen.map(str::trim).filter(|fen| !fen.is_empty()) {
            Some(fen) => Board::from_str(fen)
                .map_err(|e| ChessServiceError::InvalidPosition(format!("Invalid FEN: {}", e))),
            None => Ok(Board::default()),
        }
    }

    /// Applies `text` (SAN or coordinates) to `board`. `None` if the move cannot
    /// be read or is not legal.
    pub fn apply_move(&self, board: &Board, text: &str, permissive: bool) -> Option<AppliedMove> {
        let chess_move = parse_move(board, text, permissive)?;
        let side = board.side_to_move();
        let piece = board.piece_on(chess_move.get_source())?;
        let new_board = board.make_move_new(chess_move);
        let status = status_of(&new_board);

        Some(AppliedMove {
            board: new_board,
            chess_move,
            side,
            piece,
            status,
        })
    }

    /// Legal moves in coordinate form.
    pub fn legal_moves(&self, board: &Board) -> Vec<String> {
        MoveGen::new_legal(board).map(|m| m.to_string()).collect()
    }

    pub fn random_move<R: Rng + ?Sized>(&self, board: &Board, rng: &mut R) -> Option<String> {
        self.legal_moves(board).choose(rng).cloned()
    }

    pub fn status(&self, board: &Board) -> GameStatus {
        status_of(board)
    }

    pub fn is_terminal(&self, board: &Board) -> bool {
        status_of(board).is_terminal()
    }

    pub fn serialize_position(&self, board: &Board) -> String {
        format!("{}", board)
    }

    /// Checks an opening move against a throwaway board on the starting
    /// position, before anything is created for a new game.
    pub fn prevalidate_opening(&self, text: &str) -> bool {
        let scratch = Board::default();
        self.apply_move(&scratch, text, true).is_some()
    }
}

fn status_of(board: &Board) -> GameStatus {
    match board.status() {
        BoardStatus::Checkmate => GameStatus::Checkmate,
        BoardStatus::Stalemate => GameStatus::Stalemate,
        BoardStatus::Ongoing if insufficient_material(board) => GameStatus::Draw,
        BoardStatus::Ongoing => GameStatus::Ongoing,
    }
}

fn insufficient_material(board: &Board) -> bool {
    match board.combined().popcnt() {
        2 => true,
        3 => board.pieces(Piece::Knight).popcnt() + board.pieces(Piece::Bishop).popcnt() == 1,
        _ => false,
    }
}

fn parse_move(board: &Board, text: &str, permissive: bool) -> Option<ChessMove> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.is_ascii() {
        return None;
    }

    if let Some(chess_move) = parse_exact(board, trimmed) {
        return Some(chess_move);
    }
    if !permissive {
        return None;
    }

    let candidates = normalized_candidates(trimmed);
    candidates
        .iter()
        .find_map(|candidate| parse_exact(board, candidate))
        .or_else(|| {
            candidates
                .iter()
                .find_map(|candidate| match_piece_destination(board, candidate))
        })
}

fn parse_exact(board: &Board, text: &str) -> Option<ChessMove> {
    if let Ok(chess_move) = ChessMove::from_san(board, text) {
        if board.legal(chess_move) {
            return Some(chess_move);
        }
    }
    match ChessMove::from_str(text) {
        Ok(chess_move) if board.legal(chess_move) => Some(chess_move),
        _ => None,
    }
}

/// Spellings people actually type: "nf3", "0-0", "Qh5+!", "e8=q".
fn normalized_candidates(text: &str) -> Vec<String> {
    let stripped = text.trim_end_matches(|c: char| "+#!?".contains(c));
    let lower = stripped.to_ascii_lowercase();
    let mut candidates = Vec::new();

    match lower.as_str() {
        "o-o" | "0-0" => candidates.push("O-O".to_string()),
        "o-o-o" | "0-0-0" => candidates.push("O-O-O".to_string()),
        _ => {
            let lower = match lower.split_once('=') {
                Some((body, promotion)) => format!("{}={}", body, promotion.to_ascii_uppercase()),
                None => lower,
            };
            candidates.push(stripped.to_string());
            if let Some(first) = lower.chars().next() {
                // "b" could be a bishop or the b-file, try the piece first
                if "nbrqk".contains(first) {
                    candidates.push(format!("{}{}", first.to_ascii_uppercase(), &lower[1..]));
                }
            }
            candidates.push(lower);
        }
    }

    candidates
}

/// Last resort: a unique legal move of the named piece onto the named square.
fn match_piece_destination(board: &Board, text: &str) -> Option<ChessMove> {
    let (body, promotion) = match text.split_once('=') {
        Some((body, promotion)) => (body, Some(piece_from_letter(promotion.chars().next()?)?)),
        None => (text, None),
    };
    let body: String = body.chars().filter(|c| *c != 'x').collect();
    if body.len() < 2 {
        return None;
    }

    let dest = Square::from_str(&body[body.len() - 2..]).ok()?;
    let first = body.chars().next()?;
    let piece = match piece_from_letter(first) {
        Some(piece) => piece,
        None if body.len() == 2 || ('a'..='h').contains(&first) => Piece::Pawn,
        None => return None,
    };
    let source_file = match piece {
        Piece::Pawn if body.len() > 2 && ('a'..='h').contains(&first) => {
            Some(File::from_index(first as usize - 'a' as usize))
        }
        _ => None,
    };

    let mut matches = MoveGen::new_legal(board).filter(|m| {
        m.get_dest() == dest
            && board.piece_on(m.get_source()) == Some(piece)
            && source_file.map_or(true, |file| m.get_source().get_file() == file)
            && match promotion {
                Some(wanted) => m.get_promotion() == Some(wanted),
                None => matches!(m.get_promotion(), None | Some(Piece::Queen)),
            }
    });

    let found = matches.next()?;
    match matches.next() {
        Some(_) => None,
        None => Some(found),
    }
}

fn piece_from_letter(letter: char) -> Option<Piece> {
    match letter {
        'N' => Some(Piece::Knight),
        'B' => Some(Piece::Bishop),
        'R' => Some(Piece::Rook),
        'Q' => Some(Piece::Queen),
        'K' => Some(Piece::King),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;
    use std::collections::HashSet;

    #[test]
    fn test_load_position_defaults_to_start() {
        let service = ChessService::new();

        let board = service.load_position(None).unwrap();

        assert_eq!(board, Board::default());
        assert_eq!(service.legal_moves(&board).len(), 20);
    }

    #[test]
    fn test_load_position_rejects_garbage() {
        let service = ChessService::new();

        let result = service.load_position(Some("not a fen"));

        assert!(matches!(result, Err(ChessServiceError::InvalidPosition(_))));
    }

    #[rstest]
    #[case("e4", "e2e4")]
    #[case("e2e4", "e2e4")]
    #[case("Nf3", "g1f3")]
    #[case("g1f3", "g1f3")]
    fn test_apply_move_strict(#[case] text: &str, #[case] expected: &str) {
        let service = ChessService::new();
        let board = Board::default();

        let applied = service.apply_move(&board, text, false).unwrap();

        assert_eq!(applied.coordinates(), expected);
        assert_eq!(applied.side, Color::White);
        assert_eq!(applied.status, GameStatus::Ongoing);
    }

    #[rstest]
    #[case("nf3", "g1f3")]
    #[case("Nf3+", "g1f3")]
    #[case("e4!?", "e2e4")]
    #[case("NC3", "b1c3")]
    fn test_apply_move_permissive(#[case] text: &str, #[case] expected: &str) {
        let service = ChessService::new();
        let board = Board::default();

        let applied = service.apply_move(&board, text, true).unwrap();

        assert_eq!(applied.coordinates(), expected);
    }

    #[test]
    fn test_castling_spelled_with_zeros() {
        let service = ChessService::new();
        let board = service
            .load_position(Some(
                "r1bqk1nr/pppp1ppp/2n5/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
            ))
            .unwrap();

        let applied = service.apply_move(&board, "0-0", true).unwrap();

        assert_eq!(applied.coordinates(), "e1g1");
        assert_eq!(applied.piece, Piece::King);
    }

    #[rstest]
    #[case("e5")]
    #[case("Ke2")]
    #[case("")]
    #[case("hello")]
    #[case("♞f3")]
    fn test_apply_move_rejects_illegal_or_unreadable(#[case] text: &str) {
        let service = ChessService::new();

        assert!(service.apply_move(&Board::default(), text, true).is_none());
    }

    #[test]
    fn test_promotion() {
        let service = ChessService::new();
        let board = service
            .load_position(Some("8/P7/8/8/8/8/8/K6k w - - 0 1"))
            .unwrap();

        let applied = service.apply_move(&board, "a7a8q", false).unwrap();

        assert_eq!(applied.chess_move.get_promotion(), Some(Piece::Queen));
        assert!(service.serialize_position(&applied.board).contains('Q'));
    }

    #[test]
    fn test_checkmate_detected() {
        let service = ChessService::new();
        let mut board = Board::default();
        for text in ["f3", "e5", "g4"] {
            board = service.apply_move(&board, text, false).unwrap().board;
        }

        let applied = service.apply_move(&board, "Qh4", false).unwrap();

        assert_eq!(applied.status, GameStatus::Checkmate);
        assert_eq!(applied.side, Color::Black);
        assert!(service.is_terminal(&applied.board));
    }

    #[test]
    fn test_bare_kings_is_a_draw() {
        let service = ChessService::new();
        let board = service
            .load_position(Some("8/8/8/8/8/8/1q6/K6k w - - 0 1"))
            .unwrap();

        let applied = service.apply_move(&board, "Kxb2", false).unwrap();

        assert_eq!(applied.status, GameStatus::Draw);
    }

    #[test]
    fn test_random_move_is_legal() {
        let service = ChessService::new();
        let board = Board::default();
        let mut rng = StdRng::seed_from_u64(7);

        let chosen = service.random_move(&board, &mut rng).unwrap();

        assert!(service.legal_moves(&board).contains(&chosen));
    }

    #[test]
    fn test_random_move_with_single_option() {
        let service = ChessService::new();
        // White king in the corner, only Kb1 escapes the rook and queen lines
        let board = service
            .load_position(Some("k7/8/8/8/8/8/7r/K7 w - - 0 1"))
            .unwrap();
        assert_eq!(service.legal_moves(&board), vec!["a1b1".to_string()]);

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..5 {
            assert_eq!(service.random_move(&board, &mut rng).as_deref(), Some("a1b1"));
        }
    }

    #[test]
    fn test_random_move_none_when_no_legal_moves() {
        let service = ChessService::new();
        let board = service
            .load_position(Some("k7/8/1Q6/8/8/8/8/K7 b - - 0 1"))
            .unwrap();

        assert!(service.is_terminal(&board));
        assert_eq!(service.random_move(&board, &mut StdRng::seed_from_u64(3)), None);
    }

    #[test]
    fn test_prevalidate_opening() {
        let service = ChessService::new();

        assert!(service.prevalidate_opening("e4"));
        assert!(service.prevalidate_opening("nf3"));
        assert!(!service.prevalidate_opening("e5"));
        assert!(!service.prevalidate_opening("Qxf7"));
    }

    proptest! {
        #[test]
        fn test_position_round_trip_preserves_legal_moves(picks in prop::collection::vec(any::<prop::sample::Index>(), 0..40)) {
            let service = ChessService::new();
            let mut board = Board::default();

            for pick in picks {
                let moves = service.legal_moves(&board);
                if moves.is_empty() {
                    break;
                }
                let text = pick.get(&moves);
                board = service.apply_move(&board, text, false).unwrap().board;
            }

            let reloaded = service
                .load_position(Some(&service.serialize_position(&board)))
                .unwrap();

            let original: HashSet<String> = service.legal_moves(&board).into_iter().collect();
            let restored: HashSet<String> = service.legal_moves(&reloaded).into_iter().collect();
            prop_assert_eq!(original, restored);
        }
    }
}
