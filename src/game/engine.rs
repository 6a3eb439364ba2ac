//! Move generation and legality checking.
//!
//! Pseudo-moves respect piece geometry, blocking and capture color only;
//! the legality filter removes the ones that leave the mover's own king
//! attacked, using a reversible trial application instead of board copies.

use crate::models::board::{Board, Color, Piece, PieceKind, Position};
use crate::models::moves::SimpleMove;

const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];
const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Is `square` attacked by any piece of `attacker`?
pub fn is_square_attacked(board: &Board, attacker: Color, square: Position) -> bool {
    for (dx, dy) in ROOK_DIRS {
        let mut target = square.offset(dx, dy);
        while target.on_board() {
            if let Some(piece) = board.piece_at(target) {
                if piece.color == attacker
                    && (piece.kind == PieceKind::Queen || piece.kind == PieceKind::Rook)
                {
                    return true;
                }
                break;
            }
            target = target.offset(dx, dy);
        }
    }

    for (dx, dy) in BISHOP_DIRS {
        let mut target = square.offset(dx, dy);
        while target.on_board() {
            if let Some(piece) = board.piece_at(target) {
                if piece.color == attacker
                    && (piece.kind == PieceKind::Queen || piece.kind == PieceKind::Bishop)
                {
                    return true;
                }
                break;
            }
            target = target.offset(dx, dy);
        }
    }

    for (dx, dy) in KNIGHT_OFFSETS {
        if board
            .piece_at(square.offset(dx, dy))
            .map_or(false, |p| p.color == attacker && p.kind == PieceKind::Knight)
        {
            return true;
        }
    }

    for (dx, dy) in KING_OFFSETS {
        if board
            .piece_at(square.offset(dx, dy))
            .map_or(false, |p| p.color == attacker && p.kind == PieceKind::King)
        {
            return true;
        }
    }

    // A pawn attacks the two squares diagonally in front of it, so from the
    // attacked square we look one rank toward the attacker's side.
    let pawn_dy = match attacker {
        Color::White => 1,
        Color::Black => -1,
    };
    for dx in [-1, 1] {
        if board
            .piece_at(square.offset(dx, pawn_dy))
            .map_or(false, |p| p.color == attacker && p.kind == PieceKind::Pawn)
        {
            return true;
        }
    }

    false
}

pub fn is_king_in_check(board: &Board, color: Color) -> bool {
    is_square_attacked(board, color.other(), board.king_position(color))
}

/// Geometry-only moves for one piece, ignoring self-check.
pub fn pseudo_moves(board: &Board, piece: &Piece, en_passant: Option<Position>) -> Vec<SimpleMove> {
    match piece.kind {
        PieceKind::Pawn => pawn_moves(board, piece, en_passant),
        PieceKind::Knight => offset_moves(board, piece, &KNIGHT_OFFSETS),
        PieceKind::Bishop => sliding_moves(board, piece, &BISHOP_DIRS),
        PieceKind::Rook => sliding_moves(board, piece, &ROOK_DIRS),
        PieceKind::Queen => {
            let mut moves = sliding_moves(board, piece, &BISHOP_DIRS);
            moves.extend(sliding_moves(board, piece, &ROOK_DIRS));
            moves
        }
        PieceKind::King => king_moves(board, piece),
    }
}

fn pawn_moves(board: &Board, piece: &Piece, en_passant: Option<Position>) -> Vec<SimpleMove> {
    let mut moves = Vec::new();
    let from = piece.position;
    let dy: i8 = match piece.color {
        Color::White => -1,
        Color::Black => 1,
    };

    let one = from.offset(0, dy);
    if one.on_board() && board.piece_at(one).is_none() {
        moves.push(SimpleMove::new(from, one));
        let two = from.offset(0, dy * 2);
        if !piece.has_moved && two.on_board() && board.piece_at(two).is_none() {
            moves.push(SimpleMove::new(from, two));
        }
    }

    for dx in [-1, 1] {
        let target = from.offset(dx, dy);
        if board
            .piece_at(target)
            .map_or(false, |p| p.color != piece.color)
        {
            moves.push(SimpleMove::new(from, target));
        }
        if en_passant == Some(target) {
            moves.push(SimpleMove::new(from, target));
        }
    }

    moves
}

fn offset_moves(board: &Board, piece: &Piece, offsets: &[(i8, i8)]) -> Vec<SimpleMove> {
    let mut moves = Vec::new();
    for &(dx, dy) in offsets {
        let target = piece.position.offset(dx, dy);
        if !target.on_board() {
            continue;
        }
        if board
            .piece_at(target)
            .map_or(true, |p| p.color != piece.color)
        {
            moves.push(SimpleMove::new(piece.position, target));
        }
    }
    moves
}

fn sliding_moves(board: &Board, piece: &Piece, dirs: &[(i8, i8)]) -> Vec<SimpleMove> {
    let mut moves = Vec::new();
    for &(dx, dy) in dirs {
        let mut target = piece.position.offset(dx, dy);
        while target.on_board() {
            match board.piece_at(target) {
                None => moves.push(SimpleMove::new(piece.position, target)),
                Some(blocker) => {
                    if blocker.color != piece.color {
                        moves.push(SimpleMove::new(piece.position, target));
                    }
                    break;
                }
            }
            target = target.offset(dx, dy);
        }
    }
    moves
}

fn king_moves(board: &Board, piece: &Piece) -> Vec<SimpleMove> {
    let mut moves = offset_moves(board, piece, &KING_OFFSETS);

    if piece.has_moved {
        return moves;
    }

    // Castling: rook present and unmoved, the squares between empty, and the
    // king neither in check nor crossing an attacked square. The queenside
    // b-file square only needs to be empty.
    let rank = piece.position.y;
    let enemy = piece.color.other();
    let king_safe = !is_square_attacked(board, enemy, piece.position);

    let queenside_rook = board.piece_at(Position::new(0, rank));
    if queenside_rook.map_or(false, |r| {
        r.kind == PieceKind::Rook && r.color == piece.color && !r.has_moved
    }) && (1..=3).all(|x| board.piece_at(Position::new(x, rank)).is_none())
        && king_safe
        && !is_square_attacked(board, enemy, Position::new(3, rank))
        && !is_square_attacked(board, enemy, Position::new(2, rank))
    {
        moves.push(SimpleMove::new(
            piece.position,
            piece.position.offset(-2, 0),
        ));
    }

    let kingside_rook = board.piece_at(Position::new(7, rank));
    if kingside_rook.map_or(false, |r| {
        r.kind == PieceKind::Rook && r.color == piece.color && !r.has_moved
    }) && (5..=6).all(|x| board.piece_at(Position::new(x, rank)).is_none())
        && king_safe
        && !is_square_attacked(board, enemy, Position::new(5, rank))
        && !is_square_attacked(board, enemy, Position::new(6, rank))
    {
        moves.push(SimpleMove::new(piece.position, piece.position.offset(2, 0)));
    }

    moves
}

/// Saved state for reversing a trial application.
pub struct TrialMove {
    from: Position,
    to: Position,
    moved: Piece,
    captured: Option<Piece>,
    old_king_pos: Option<Position>,
}

/// Apply a move just far enough to test for self-check. The returned record
/// restores the board exactly via [`undo_move`].
pub fn try_move(board: &mut Board, mv: SimpleMove) -> Option<TrialMove> {
    let moved = *board.piece_at(mv.from)?;
    let captured = board.piece_at(mv.to).copied();

    let mut placed = moved;
    placed.position = mv.to;
    board.set(mv.to, Some(placed));
    board.set(mv.from, None);

    let mut old_king_pos = None;
    if moved.kind == PieceKind::King {
        old_king_pos = Some(board.king_position(moved.color));
        board.set_king_position(moved.color, mv.to);
    }

    Some(TrialMove {
        from: mv.from,
        to: mv.to,
        moved,
        captured,
        old_king_pos,
    })
}

pub fn undo_move(board: &mut Board, trial: TrialMove) {
    board.set(trial.from, Some(trial.moved));
    board.set(trial.to, trial.captured);
    if let Some(pos) = trial.old_king_pos {
        board.set_king_position(trial.moved.color, pos);
    }
}

fn filter_self_check(board: &mut Board, mover: Color, pseudo: Vec<SimpleMove>) -> Vec<SimpleMove> {
    let mut legal = Vec::with_capacity(pseudo.len());
    for mv in pseudo {
        if let Some(trial) = try_move(board, mv) {
            if !is_king_in_check(board, mover) {
                legal.push(mv);
            }
            undo_move(board, trial);
        }
    }
    legal
}

/// All legal moves for the piece currently on `from`. The board is mutated
/// during trials but restored before returning.
pub fn legal_moves_for_piece(
    board: &mut Board,
    from: Position,
    en_passant: Option<Position>,
) -> Vec<SimpleMove> {
    let Some(piece) = board.piece_at(from).copied() else {
        return Vec::new();
    };
    let pseudo = pseudo_moves(board, &piece, en_passant);
    filter_self_check(board, piece.color, pseudo)
}

pub fn legal_moves_for_color(
    board: &mut Board,
    color: Color,
    en_passant: Option<Position>,
) -> Vec<SimpleMove> {
    let mut origins = Vec::new();
    for y in 0..8 {
        for x in 0..8 {
            let pos = Position::new(x, y);
            if board.piece_at(pos).map_or(false, |p| p.color == color) {
                origins.push(pos);
            }
        }
    }

    let mut legal = Vec::new();
    for from in origins {
        legal.extend(legal_moves_for_piece(board, from, en_passant));
    }
    legal
}

pub fn has_no_legal_moves(board: &mut Board, color: Color, en_passant: Option<Position>) -> bool {
    legal_moves_for_color(board, color, en_passant).is_empty()
}

/// Algebraic notation for a move about to be applied (the board still holds
/// the pre-move position). Landing on the active mine appends `*`; castling
/// and en-passant adjustments happen during move execution.
pub fn notation(board: &Board, piece: &Piece, to: Position, mine: Option<Position>) -> String {
    let mut text = String::new();
    text.push_str(piece.kind.notation_letter());
    if piece.kind == PieceKind::Pawn && piece.position.x != to.x {
        text.push(piece.position.file_notation());
    }
    if board.piece_at(to).is_some() {
        text.push('x');
    }
    text.push_str(&to.square_notation());
    if mine == Some(to) {
        text.push('*');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_board() -> Board {
        Board {
            grid: Default::default(),
            white_king_position: Position::new(4, 7),
            black_king_position: Position::new(4, 0),
        }
    }

    fn place(board: &mut Board, kind: PieceKind, color: Color, x: i8, y: i8) {
        let pos = Position::new(x, y);
        board.set(
            pos,
            Some(Piece {
                kind,
                color,
                position: pos,
                has_moved: false,
            }),
        );
        if kind == PieceKind::King {
            board.set_king_position(color, pos);
        }
    }

    #[test]
    fn opening_position_has_twenty_moves_per_side() {
        let mut board = Board::new();
        assert_eq!(legal_moves_for_color(&mut board, Color::White, None).len(), 20);
        assert_eq!(legal_moves_for_color(&mut board, Color::Black, None).len(), 20);
    }

    #[test]
    fn attack_detection_by_piece_kind() {
        let board = Board::new();
        // Knight on b1 reaches a3; pawns attack diagonally by color direction.
        assert!(is_square_attacked(&board, Color::White, Position::new(0, 5)));
        assert!(is_square_attacked(&board, Color::White, Position::new(3, 5)));
        assert!(is_square_attacked(&board, Color::Black, Position::new(3, 2)));
        // No one attacks the middle of an untouched board.
        assert!(!is_square_attacked(&board, Color::White, Position::new(4, 3)));

        let mut board = empty_board();
        place(&mut board, PieceKind::King, Color::White, 4, 7);
        place(&mut board, PieceKind::King, Color::Black, 4, 0);
        place(&mut board, PieceKind::Rook, Color::Black, 4, 4);
        assert!(is_square_attacked(&board, Color::Black, Position::new(4, 7)));
        assert!(is_king_in_check(&board, Color::White));
        // Blocked ray does not attack past the blocker.
        place(&mut board, PieceKind::Knight, Color::White, 4, 6);
        assert!(!is_king_in_check(&board, Color::White));
    }

    #[test]
    fn sliding_pieces_stop_at_blockers() {
        let mut board = empty_board();
        place(&mut board, PieceKind::King, Color::White, 0, 7);
        place(&mut board, PieceKind::King, Color::Black, 7, 0);
        place(&mut board, PieceKind::Rook, Color::White, 3, 4);
        place(&mut board, PieceKind::Pawn, Color::White, 3, 2);
        place(&mut board, PieceKind::Pawn, Color::Black, 3, 6);

        let rook = *board.piece_at(Position::new(3, 4)).unwrap();
        let moves = pseudo_moves(&board, &rook, None);
        // Up the file: d5 only, own pawn at d6 blocks. Down: captures d2.
        assert!(moves.contains(&SimpleMove::new(rook.position, Position::new(3, 3))));
        assert!(!moves.contains(&SimpleMove::new(rook.position, Position::new(3, 2))));
        assert!(moves.contains(&SimpleMove::new(rook.position, Position::new(3, 6))));
        assert!(!moves.contains(&SimpleMove::new(rook.position, Position::new(3, 7))));
    }

    #[test]
    fn pawn_double_advance_requires_clear_path_and_unmoved() {
        let mut board = Board::new();
        let from = Position::new(4, 6);
        let moves = legal_moves_for_piece(&mut board, from, None);
        assert!(moves.contains(&SimpleMove::new(from, Position::new(4, 5))));
        assert!(moves.contains(&SimpleMove::new(from, Position::new(4, 4))));

        // Mark the pawn as moved: the double step disappears.
        let mut pawn = *board.piece_at(from).unwrap();
        pawn.has_moved = true;
        board.set(from, Some(pawn));
        let moves = legal_moves_for_piece(&mut board, from, None);
        assert!(!moves.contains(&SimpleMove::new(from, Position::new(4, 4))));
    }

    #[test]
    fn en_passant_square_is_generated() {
        let mut board = empty_board();
        place(&mut board, PieceKind::King, Color::White, 4, 7);
        place(&mut board, PieceKind::King, Color::Black, 4, 0);
        place(&mut board, PieceKind::Pawn, Color::White, 4, 3);
        place(&mut board, PieceKind::Pawn, Color::Black, 3, 3);

        let target = Position::new(3, 2);
        let moves = legal_moves_for_piece(&mut board, Position::new(4, 3), Some(target));
        assert!(moves.contains(&SimpleMove::new(Position::new(4, 3), target)));

        let moves = legal_moves_for_piece(&mut board, Position::new(4, 3), None);
        assert!(!moves.contains(&SimpleMove::new(Position::new(4, 3), target)));
    }

    #[test]
    fn pinned_piece_has_no_moves() {
        let mut board = empty_board();
        place(&mut board, PieceKind::King, Color::White, 4, 7);
        place(&mut board, PieceKind::King, Color::Black, 7, 0);
        place(&mut board, PieceKind::Bishop, Color::White, 4, 6);
        place(&mut board, PieceKind::Rook, Color::Black, 4, 0);

        assert!(legal_moves_for_piece(&mut board, Position::new(4, 6), None).is_empty());
    }

    #[test]
    fn legality_filter_leaves_no_trace() {
        let mut board = Board::new();
        let before = board.clone();
        legal_moves_for_color(&mut board, Color::White, None);
        legal_moves_for_piece(&mut board, Position::new(6, 7), None);
        assert_eq!(board, before);
    }

    #[test]
    fn castling_requires_safe_king_path() {
        let mut board = empty_board();
        place(&mut board, PieceKind::King, Color::White, 4, 7);
        place(&mut board, PieceKind::King, Color::Black, 4, 0);
        place(&mut board, PieceKind::Rook, Color::White, 7, 7);
        place(&mut board, PieceKind::Rook, Color::White, 0, 7);

        let kingside = SimpleMove::new(Position::new(4, 7), Position::new(6, 7));
        let queenside = SimpleMove::new(Position::new(4, 7), Position::new(2, 7));
        let moves = legal_moves_for_piece(&mut board, Position::new(4, 7), None);
        assert!(moves.contains(&kingside));
        assert!(moves.contains(&queenside));

        // An enemy rook covering f1 forbids kingside castling only.
        place(&mut board, PieceKind::Rook, Color::Black, 5, 0);
        let moves = legal_moves_for_piece(&mut board, Position::new(4, 7), None);
        assert!(!moves.contains(&kingside));
        assert!(moves.contains(&queenside));

        // Covering b1 does not matter: the king never crosses it.
        board.set(Position::new(5, 0), None);
        place(&mut board, PieceKind::Rook, Color::Black, 1, 0);
        let moves = legal_moves_for_piece(&mut board, Position::new(4, 7), None);
        assert!(moves.contains(&kingside));
        assert!(moves.contains(&queenside));

        // A king in check cannot castle at all.
        board.set(Position::new(1, 0), None);
        place(&mut board, PieceKind::Rook, Color::Black, 4, 2);
        let moves = legal_moves_for_piece(&mut board, Position::new(4, 7), None);
        assert!(!moves.contains(&kingside));
        assert!(!moves.contains(&queenside));
    }

    #[test]
    fn castling_requires_unmoved_rook_of_own_color() {
        let mut board = empty_board();
        place(&mut board, PieceKind::King, Color::White, 4, 7);
        place(&mut board, PieceKind::King, Color::Black, 4, 0);
        place(&mut board, PieceKind::Rook, Color::Black, 7, 7);

        let kingside = SimpleMove::new(Position::new(4, 7), Position::new(6, 7));
        let moves = legal_moves_for_piece(&mut board, Position::new(4, 7), None);
        assert!(!moves.contains(&kingside));

        let mut rook = Piece {
            kind: PieceKind::Rook,
            color: Color::White,
            position: Position::new(7, 7),
            has_moved: true,
        };
        board.set(Position::new(7, 7), Some(rook));
        let moves = legal_moves_for_piece(&mut board, Position::new(4, 7), None);
        assert!(!moves.contains(&kingside));

        rook.has_moved = false;
        board.set(Position::new(7, 7), Some(rook));
        let moves = legal_moves_for_piece(&mut board, Position::new(4, 7), None);
        assert!(moves.contains(&kingside));
    }

    #[test]
    fn notation_formatting() {
        let board = Board::new();
        let pawn = *board.piece_at(Position::new(4, 6)).unwrap();
        assert_eq!(notation(&board, &pawn, Position::new(4, 4), None), "e4");

        let knight = *board.piece_at(Position::new(6, 7)).unwrap();
        assert_eq!(notation(&board, &knight, Position::new(5, 5), None), "Nf3");
        assert_eq!(
            notation(&board, &knight, Position::new(5, 5), Some(Position::new(5, 5))),
            "Nf3*"
        );

        // Pawn captures carry the origin file.
        let mut board = empty_board();
        place(&mut board, PieceKind::King, Color::White, 4, 7);
        place(&mut board, PieceKind::King, Color::Black, 4, 0);
        place(&mut board, PieceKind::Pawn, Color::White, 4, 3);
        place(&mut board, PieceKind::Pawn, Color::Black, 3, 2);
        let pawn = *board.piece_at(Position::new(4, 3)).unwrap();
        assert_eq!(notation(&board, &pawn, Position::new(3, 2), None), "exd6");
    }
}
