//! Game management with a tree of variations.
//!
//! A [`Game`] owns one [`Position`] and a tree of played moves. The tree is
//! an arena of [`GameNode`]s addressed by [`NodeId`]; the root is a sentinel
//! without a move. A cursor marks the current node, and the position always
//! equals the start position with every move from the root to the cursor
//! applied in order.

use crate::san::{move_to_san, san_to_move, SanError};
use crate::{Move, Position};
use chess_core::FenError;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Handle to a node of a game's move tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The sentinel root every game starts at.
    pub const ROOT: NodeId = NodeId(0);

    /// Arena index of the node.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One move in the tree, with the SAN it was recorded under.
#[derive(Debug, Clone)]
pub struct GameNode {
    mov: Option<Move>,
    san: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl GameNode {
    fn root() -> Self {
        GameNode {
            mov: None,
            san: "-".to_string(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// The move leading to this node; `None` at the root.
    pub fn mov(&self) -> Option<&Move> {
        self.mov.as_ref()
    }

    /// SAN of the move, computed in the parent's position; "-" at the root.
    pub fn san(&self) -> &str {
        &self.san
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Continuations from this node, first-played first.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Error type for game operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The SAN text matches no legal move.
    #[error(transparent)]
    InvalidMove(#[from] SanError),

    /// The move is not legal in the current position.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// The node id does not belong to this game.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// `forward` was given a node that does not continue the current one.
    #[error("node {0} is not a continuation of the current node")]
    NotAChild(NodeId),

    #[error(transparent)]
    Fen(#[from] FenError),
}

/// A chess game: a position plus the tree of moves that reached it.
#[derive(Debug, Clone)]
pub struct Game {
    position: Position,
    nodes: Vec<GameNode>,
    current: NodeId,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Creates a new game with the standard starting position.
    pub fn new() -> Self {
        Self::from_position(Position::startpos())
    }

    /// Creates a game starting from `position`.
    pub fn from_position(position: Position) -> Self {
        Game {
            position,
            nodes: vec![GameNode::root()],
            current: NodeId::ROOT,
        }
    }

    /// Creates a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        Ok(Self::from_position(Position::from_fen(fen)?))
    }

    /// Returns a reference to the current position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The cursor.
    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> Option<&GameNode> {
        self.nodes.get(id.0)
    }

    pub fn current_node(&self) -> &GameNode {
        &self.nodes[self.current.0]
    }

    /// Moves already explored from the current node.
    pub fn variations(&self) -> &[NodeId] {
        self.current_node().children()
    }

    /// Returns all legal moves in the current position.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.position.legal_moves()
    }

    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }

    /// Plays a move on the current position and advances the cursor to it.
    ///
    /// If the current node already has a child recorded with the same SAN,
    /// that child is reused instead of growing a duplicate branch.
    pub fn add_move(&mut self, m: Move) -> Result<NodeId, GameError> {
        if !self.position.legal_moves().contains(&m) {
            return Err(GameError::IllegalMove(m.to_uci()));
        }
        let san = move_to_san(&self.position, &m);
        Ok(self.descend(m, san))
    }

    /// Decodes `san` against the current position, then plays it like
    /// [`add_move`](Self::add_move). Nothing changes on error.
    pub fn add_move_san(&mut self, san: &str) -> Result<NodeId, GameError> {
        let m = san_to_move(&self.position, san)?;
        Ok(self.descend(m, san.to_string()))
    }

    fn descend(&mut self, m: Move, san: String) -> NodeId {
        let parent = self.current;
        let existing = self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child.0].san == san);

        let child = match existing {
            Some(child) => {
                debug!(san = %san, node = %child, "reusing variation");
                child
            }
            None => {
                let child = NodeId(self.nodes.len());
                debug!(san = %san, node = %child, parent = %parent, "adding move");
                self.nodes.push(GameNode {
                    mov: Some(m),
                    san,
                    parent: Some(parent),
                    children: Vec::new(),
                });
                self.nodes[parent.0].children.push(child);
                child
            }
        };

        self.position.apply_move(&m);
        self.current = child;
        child
    }

    /// Takes back the move leading to the current node and steps to its
    /// parent. Returns false (and does nothing) at the root.
    pub fn undo(&mut self) -> bool {
        let node = &self.nodes[self.current.0];
        let (Some(m), Some(parent)) = (node.mov, node.parent) else {
            return false;
        };
        debug!(san = %node.san, node = %self.current, "undo");
        self.position.undo_move(&m);
        self.current = parent;
        true
    }

    /// Replays `child`, which must be a continuation of the current node.
    pub fn forward(&mut self, child: NodeId) -> Result<(), GameError> {
        let node = self.node(child).ok_or(GameError::UnknownNode(child))?;
        let m = match (node.parent, node.mov) {
            (Some(parent), Some(m)) if parent == self.current => m,
            _ => return Err(GameError::NotAChild(child)),
        };
        self.position.apply_move(&m);
        self.current = child;
        Ok(())
    }

    /// Moves the cursor to any node of the tree: back to the closest common
    /// ancestor, then forward along the target's line.
    pub fn goto(&mut self, target: NodeId) -> Result<(), GameError> {
        if self.node(target).is_none() {
            return Err(GameError::UnknownNode(target));
        }
        let line = self.path_to(target);
        while !line.contains(&self.current) {
            if !self.undo() {
                break;
            }
        }
        let start = line
            .iter()
            .position(|&id| id == self.current)
            .map_or(0, |i| i + 1);
        for &id in &line[start..] {
            if let Some(m) = self.nodes[id.0].mov {
                self.position.apply_move(&m);
            }
            self.current = id;
        }
        debug!(node = %target, "goto");
        Ok(())
    }

    /// Returns to the start position, keeping the tree.
    pub fn rewind(&mut self) {
        while self.undo() {}
    }

    /// SAN of every move from the root to the cursor.
    pub fn san_path(&self) -> Vec<&str> {
        self.path_to(self.current)
            .into_iter()
            .skip(1)
            .map(|id| self.nodes[id.0].san.as_str())
            .collect()
    }

    /// Node ids from the root to `id`, both included.
    fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut cursor = id;
        while let Some(parent) = self.nodes[cursor.0].parent {
            path.push(parent);
            cursor = parent;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{Color, Square};

    fn play(game: &mut Game, moves: &[&str]) {
        for san in moves {
            game.add_move_san(san).unwrap();
        }
    }

    #[test]
    fn new_game() {
        let game = Game::new();
        assert_eq!(game.position(), &Position::startpos());
        assert_eq!(game.current(), game.root());
        assert!(game.current_node().is_root());
        assert_eq!(game.current_node().san(), "-");
        assert!(game.variations().is_empty());
        assert!(game.san_path().is_empty());
        assert_eq!(game.legal_moves().len(), 20);
    }

    #[test]
    fn add_move_san_advances() {
        let mut game = Game::new();
        let id = game.add_move_san("e4").unwrap();
        assert_eq!(game.current(), id);
        assert_eq!(game.position().side_to_move, Color::Black);
        assert_eq!(game.current_node().san(), "e4");
        assert_eq!(game.current_node().parent(), Some(NodeId::ROOT));
        assert_eq!(
            game.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }

    #[test]
    fn add_move_records_san() {
        let mut game = Game::new();
        let m = game
            .legal_moves()
            .into_iter()
            .find(|m| m.to_uci() == "g1f3")
            .unwrap();
        let id = game.add_move(m).unwrap();
        assert_eq!(game.node(id).unwrap().san(), "Nf3");
        assert_eq!(game.node(id).unwrap().mov(), Some(&m));
    }

    #[test]
    fn illegal_move_is_rejected() {
        let mut game = Game::new();
        let before = game.position().clone();
        assert_eq!(
            game.add_move_san("e5"),
            Err(GameError::InvalidMove(SanError::InvalidMove("e5".into())))
        );

        // A move generated for another position.
        let other = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let rook = other.legal_moves_from(Square::A1)[0];
        assert!(matches!(
            game.add_move(rook),
            Err(GameError::IllegalMove(_))
        ));

        assert_eq!(game.position(), &before);
        assert_eq!(game.current(), NodeId::ROOT);
        assert!(game.variations().is_empty());
    }

    #[test]
    fn readding_a_move_reuses_the_child() {
        let mut game = Game::new();
        let first = game.add_move_san("e4").unwrap();
        assert!(game.undo());
        let again = game.add_move_san("e4").unwrap();
        assert_eq!(first, again);
        game.rewind();
        assert_eq!(game.variations(), &[first]);
    }

    #[test]
    fn variations_branch_from_current_node() {
        let mut game = Game::new();
        let e4 = game.add_move_san("e4").unwrap();
        let e5 = game.add_move_san("e5").unwrap();
        game.undo();
        let c5 = game.add_move_san("c5").unwrap();
        game.undo();
        assert_eq!(game.current(), e4);
        assert_eq!(game.variations(), &[e5, c5]);
    }

    #[test]
    fn undo_at_root_is_noop() {
        let mut game = Game::new();
        assert!(!game.undo());
        assert_eq!(game.position(), &Position::startpos());
    }

    #[test]
    fn forward_requires_a_child() {
        let mut game = Game::new();
        let e4 = game.add_move_san("e4").unwrap();
        let e5 = game.add_move_san("e5").unwrap();
        game.rewind();

        assert_eq!(game.forward(e5), Err(GameError::NotAChild(e5)));
        assert_eq!(game.forward(NodeId(99)), Err(GameError::UnknownNode(NodeId(99))));
        assert_eq!(game.forward(NodeId::ROOT), Err(GameError::NotAChild(NodeId::ROOT)));

        game.forward(e4).unwrap();
        game.forward(e5).unwrap();
        assert_eq!(game.san_path(), vec!["e4", "e5"]);
    }

    #[test]
    fn goto_switches_lines() {
        let mut game = Game::new();
        play(&mut game, &["e4", "e5", "Nf3", "Nc6"]);
        let ruy = game.current();
        let ruy_fen = game.to_fen();

        game.goto(NodeId::ROOT).unwrap();
        play(&mut game, &["d4", "d5", "c4"]);
        let gambit = game.current();
        let gambit_fen = game.to_fen();

        game.goto(ruy).unwrap();
        assert_eq!(game.to_fen(), ruy_fen);
        assert_eq!(game.san_path(), vec!["e4", "e5", "Nf3", "Nc6"]);

        game.goto(gambit).unwrap();
        assert_eq!(game.to_fen(), gambit_fen);
        assert_eq!(game.san_path(), vec!["d4", "d5", "c4"]);

        assert_eq!(game.goto(NodeId(500)), Err(GameError::UnknownNode(NodeId(500))));
        assert_eq!(game.current(), gambit);
    }

    #[test]
    fn cursor_position_matches_replay() {
        let mut game = Game::new();
        play(&mut game, &["e4", "d5", "exd5", "Qxd5", "Nc3", "Qa5"]);
        game.undo();
        play(&mut game, &["Qd8"]);

        let mut replay = Position::startpos();
        let mut id = game.current();
        let mut line = Vec::new();
        while let Some(m) = game.node(id).unwrap().mov() {
            line.push(*m);
            id = game.node(id).unwrap().parent().unwrap();
        }
        for m in line.iter().rev() {
            replay.apply_move(m);
        }
        assert_eq!(game.position(), &replay);
    }

    #[test]
    fn from_fen_errors() {
        assert!(matches!(Game::from_fen("not a fen"), Err(GameError::Fen(_))));
        let game = Game::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        assert_eq!(game.to_fen(), "4k3/8/8/8/8/8/8/4K2R w K - 0 1");
    }

    #[test]
    fn huge_fen_counters_never_overflow() {
        let mut game = Game::from_fen(&format!("4k3/8/8/8/8/8/8/4K2R w K - {} 1", u32::MAX)).unwrap();
        game.add_move_san("Kd1").unwrap();
        assert_eq!(game.position().halfmove_clock, u32::MAX);
        assert!(game.undo());
        assert_eq!(game.position().halfmove_clock, u32::MAX);

        assert!(matches!(
            Game::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 4294967295"),
            Err(GameError::Fen(FenError::InvalidFullmoveNumber(_)))
        ));
    }

    #[test]
    fn node_id_display() {
        assert_eq!(NodeId::ROOT.to_string(), "#0");
        assert_eq!(NodeId(3).index(), 3);
    }
}
