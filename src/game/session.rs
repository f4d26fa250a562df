use serde::{Deserialize, Serialize};

use crate::ai::{ConfigError, Difficulty, MovePolicy};

use super::board::{Board, Mark, MoveOutcome};

/// 对局过程中的事件流，供前端渲染状态文本和高亮。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    MarkPlaced {
        mark: Mark,
        index: usize,
    },
    ComputerMoved {
        mark: Mark,
        index: usize,
        policy: MovePolicy,
    },
    TurnPassed {
        next: Mark,
    },
    GameWon {
        winner: Mark,
        line: [usize; 3],
    },
    GameDrawn,
    SessionReset,
}

/// 新建对局的配置。电脑对局必须先选好玩家棋子。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum SessionConfig {
    TwoPlayers,
    VsComputer {
        #[serde(default)]
        player_mark: Option<Mark>,
        difficulty_level: u8,
    },
}

impl SessionConfig {
    pub fn vs_computer(player_mark: Mark, difficulty_level: u8) -> Self {
        SessionConfig::VsComputer {
            player_mark: Some(player_mark),
            difficulty_level,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig::TwoPlayers
    }
}

/// 对手类型。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Opponent {
    Human,
    Computer { mark: Mark, difficulty: Difficulty },
}

/// 一局游戏的全部状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSession {
    pub board: Board,
    pub current_player: Mark,
    /// 先手棋子；重开时回到这一方。
    pub player_mark: Mark,
    pub opponent: Opponent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<MoveOutcome>,
}

impl GameSession {
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        let (player_mark, opponent) = match config {
            SessionConfig::TwoPlayers => (Mark::X, Opponent::Human),
            SessionConfig::VsComputer {
                player_mark,
                difficulty_level,
            } => {
                let player_mark = player_mark.ok_or(ConfigError::MissingPlayerMark)?;
                let difficulty = Difficulty::new(difficulty_level)?;
                (
                    player_mark,
                    Opponent::Computer {
                        mark: player_mark.opponent(),
                        difficulty,
                    },
                )
            }
        };

        Ok(Self {
            board: Board::new(),
            current_player: player_mark,
            player_mark,
            opponent,
            event_log: Vec::new(),
            outcome: None,
        })
    }

    pub fn is_active(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn computer_mark(&self) -> Option<Mark> {
        match self.opponent {
            Opponent::Human => None,
            Opponent::Computer { mark, .. } => Some(mark),
        }
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        match self.opponent {
            Opponent::Human => None,
            Opponent::Computer { difficulty, .. } => Some(difficulty),
        }
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    /// 交换行棋方。只在局面仍在进行时调用。
    pub fn advance_turn(&mut self) {
        self.current_player = self.current_player.opponent();
    }

    /// 清空棋盘重新开局，先手回到 `player_mark`。
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.current_player = self.player_mark;
        self.outcome = None;
        self.event_log.clear();
        self.record_event(GameEvent::SessionReset);
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            board: Board::new(),
            current_player: Mark::X,
            player_mark: Mark::X,
            opponent: Opponent::Human,
            event_log: Vec::new(),
            outcome: None,
        }
    }
}
