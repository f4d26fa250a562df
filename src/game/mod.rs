//! 游戏核心逻辑模块（棋盘、会话与规则引擎）。

pub mod board;
pub mod rules;
pub mod session;

pub use board::{Board, Cell, Mark, MoveOutcome, BOARD_CELLS, WINNING_LINES};
pub use rules::{ComputerMove, MoveRejection, PlayerIntent, RuleEngine, RuleError};
pub use session::{GameEvent, GameSession, Opponent, SessionConfig};
