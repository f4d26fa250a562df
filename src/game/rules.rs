use serde::{Deserialize, Serialize};

use crate::ai::{AiAgent, ConfigError, MovePolicy};

use super::board::{MoveOutcome, BOARD_CELLS};
use super::session::{GameEvent, GameSession, Opponent, SessionConfig};

/// 落子被拒绝的具体原因。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MoveRejection {
    OutOfRange { index: usize },
    CellOccupied { index: usize },
    SessionInactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    InvalidMove { reason: MoveRejection },
    NoLegalMove,
    NotComputerTurn,
    Config { error: ConfigError },
}

/// 表现层发出的意图，由规则层翻译成状态迁移。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum PlayerIntent {
    CellClicked { index: usize },
    Reset,
    NewGame { config: SessionConfig },
}

/// 电脑回合的结果：落点、所走分支以及落子后的局面。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComputerMove {
    pub index: usize,
    pub policy: MovePolicy,
    pub outcome: MoveOutcome,
}

/// 规则引擎：驱动回合推进，并持有电脑对手的随机源。
#[derive(Default)]
pub struct RuleEngine {
    agent: AiAgent,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            agent: AiAgent::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            agent: AiAgent::with_seed(seed),
        }
    }

    fn ensure_active(session: &GameSession) -> Result<(), RuleError> {
        if session.is_active() {
            Ok(())
        } else {
            Err(RuleError::InvalidMove {
                reason: MoveRejection::SessionInactive,
            })
        }
    }

    fn ensure_vacant(session: &GameSession, index: usize) -> Result<(), RuleError> {
        if index >= BOARD_CELLS {
            return Err(RuleError::InvalidMove {
                reason: MoveRejection::OutOfRange { index },
            });
        }
        if session.board.cell(index).is_some() {
            return Err(RuleError::InvalidMove {
                reason: MoveRejection::CellOccupied { index },
            });
        }
        Ok(())
    }

    /// 当前行棋方在 `index` 落子。任何错误都不改变局面。
    pub fn play_move(
        &mut self,
        session: &mut GameSession,
        index: usize,
    ) -> Result<MoveOutcome, RuleError> {
        Self::ensure_active(session)?;
        Self::ensure_vacant(session, index)?;

        let mark = session.current_player;
        session.board.set(index, mark);
        session.record_event(GameEvent::MarkPlaced { mark, index });

        Ok(Self::settle(session))
    }

    /// 电脑走一步。仅在电脑对局且轮到电脑时合法。
    pub fn computer_turn(
        &mut self,
        session: &mut GameSession,
    ) -> Result<ComputerMove, RuleError> {
        Self::ensure_active(session)?;

        let (mark, difficulty) = match session.opponent {
            Opponent::Computer { mark, difficulty } => (mark, difficulty),
            Opponent::Human => return Err(RuleError::NotComputerTurn),
        };
        if session.current_player != mark {
            return Err(RuleError::NotComputerTurn);
        }

        let (index, policy) =
            self.agent
                .select_move(&session.board, mark, mark.opponent(), difficulty)?;

        session.board.set(index, mark);
        session.record_event(GameEvent::ComputerMoved {
            mark,
            index,
            policy,
        });

        let outcome = Self::settle(session);
        Ok(ComputerMove {
            index,
            policy,
            outcome,
        })
    }

    pub fn dispatch(
        &mut self,
        session: &mut GameSession,
        intent: PlayerIntent,
    ) -> Result<MoveOutcome, RuleError> {
        match intent {
            PlayerIntent::CellClicked { index } => self.play_move(session, index),
            PlayerIntent::Reset => {
                session.reset();
                Ok(MoveOutcome::Ongoing)
            }
            PlayerIntent::NewGame { config } => {
                *session =
                    GameSession::new(config).map_err(|error| RuleError::Config { error })?;
                Ok(MoveOutcome::Ongoing)
            }
        }
    }

    /// 落子后的统一收尾：终局则封盘记录事件，否则换边。
    fn settle(session: &mut GameSession) -> MoveOutcome {
        let outcome = session.board.evaluate();
        match &outcome {
            MoveOutcome::Win { mark, line } => {
                session.record_event(GameEvent::GameWon {
                    winner: *mark,
                    line: *line,
                });
                session.outcome = Some(outcome.clone());
            }
            MoveOutcome::Draw => {
                session.record_event(GameEvent::GameDrawn);
                session.outcome = Some(outcome.clone());
            }
            MoveOutcome::Ongoing => {
                session.advance_turn();
                session.record_event(GameEvent::TurnPassed {
                    next: session.current_player,
                });
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::{Board, Mark};

    fn two_player_session() -> GameSession {
        GameSession::new(SessionConfig::TwoPlayers).expect("config should be valid")
    }

    #[test]
    fn play_move_places_the_mark_and_passes_the_turn() {
        let mut engine = RuleEngine::new();
        let mut session = two_player_session();

        let outcome = engine
            .play_move(&mut session, 4)
            .expect("move should be accepted");

        assert_eq!(outcome, MoveOutcome::Ongoing);
        assert_eq!(session.board.cell(4), Some(Mark::X));
        assert_eq!(session.current_player, Mark::O);
        assert_eq!(
            session.event_log,
            vec![
                GameEvent::MarkPlaced {
                    mark: Mark::X,
                    index: 4
                },
                GameEvent::TurnPassed { next: Mark::O },
            ]
        );
    }

    #[test]
    fn replaying_an_occupied_cell_is_rejected_without_side_effects() {
        let mut engine = RuleEngine::new();
        let mut session = two_player_session();

        engine
            .play_move(&mut session, 4)
            .expect("first move should be accepted");
        let snapshot = session.clone();

        let error = engine
            .play_move(&mut session, 4)
            .expect_err("occupied cell should be rejected");

        assert_eq!(
            error,
            RuleError::InvalidMove {
                reason: MoveRejection::CellOccupied { index: 4 }
            }
        );
        assert_eq!(session, snapshot);
        assert_eq!(session.board.cell(4), Some(Mark::X));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut engine = RuleEngine::new();
        let mut session = two_player_session();

        for index in [9, 42] {
            let error = engine
                .play_move(&mut session, index)
                .expect_err("index outside the board should be rejected");

            assert_eq!(
                error,
                RuleError::InvalidMove {
                    reason: MoveRejection::OutOfRange { index }
                }
            );
        }
    }

    #[test]
    fn completing_the_top_row_wins_and_deactivates_the_session() {
        let mut engine = RuleEngine::new();
        let mut session = two_player_session();
        session.board.set(0, Mark::X);
        session.board.set(1, Mark::X);
        session.board.set(4, Mark::O);
        session.board.set(7, Mark::O);

        let outcome = engine
            .play_move(&mut session, 2)
            .expect("winning move should be accepted");

        assert_eq!(
            outcome,
            MoveOutcome::Win {
                mark: Mark::X,
                line: [0, 1, 2]
            }
        );
        assert!(!session.is_active());
        assert_eq!(
            session.event_log.last(),
            Some(&GameEvent::GameWon {
                winner: Mark::X,
                line: [0, 1, 2]
            })
        );

        let error = engine
            .play_move(&mut session, 3)
            .expect_err("finished session should reject moves");
        assert_eq!(
            error,
            RuleError::InvalidMove {
                reason: MoveRejection::SessionInactive
            }
        );
    }

    #[test]
    fn a_full_game_without_lines_ends_in_a_draw() {
        let mut engine = RuleEngine::new();
        let mut session = two_player_session();
        let moves = [0, 2, 1, 3, 5, 4, 6, 7, 8];

        for (played, index) in moves.iter().enumerate() {
            let outcome = engine
                .play_move(&mut session, *index)
                .expect("scripted move should be accepted");

            if played + 1 < moves.len() {
                assert_eq!(outcome, MoveOutcome::Ongoing, "after move {played}");
            } else {
                assert_eq!(outcome, MoveOutcome::Draw);
            }
        }

        assert!(!session.is_active());
        assert_eq!(session.outcome, Some(MoveOutcome::Draw));
        assert_eq!(session.event_log.last(), Some(&GameEvent::GameDrawn));
    }

    #[test]
    fn computer_turn_plays_a_legal_move_and_returns_the_turn() {
        let mut engine = RuleEngine::with_seed(11);
        let mut session = GameSession::new(SessionConfig::vs_computer(Mark::X, 5))
            .expect("config should be valid");

        engine
            .play_move(&mut session, 0)
            .expect("human move should be accepted");

        let reply = engine
            .computer_turn(&mut session)
            .expect("computer should find a move");

        assert_ne!(reply.index, 0);
        assert_eq!(session.board.cell(reply.index), Some(Mark::O));
        assert_eq!(reply.outcome, MoveOutcome::Ongoing);
        assert_eq!(session.current_player, Mark::X);
        assert!(session.event_log.contains(&GameEvent::ComputerMoved {
            mark: Mark::O,
            index: reply.index,
            policy: reply.policy,
        }));
    }

    #[test]
    fn computer_turn_requires_a_computer_opponent() {
        let mut engine = RuleEngine::with_seed(3);
        let mut session = two_player_session();

        let error = engine
            .computer_turn(&mut session)
            .expect_err("two-player session has no computer");

        assert_eq!(error, RuleError::NotComputerTurn);
    }

    #[test]
    fn computer_turn_waits_for_the_computer_to_be_on_move() {
        let mut engine = RuleEngine::with_seed(3);
        let mut session = GameSession::new(SessionConfig::vs_computer(Mark::X, 2))
            .expect("config should be valid");

        let error = engine
            .computer_turn(&mut session)
            .expect_err("it is the human's turn");

        assert_eq!(error, RuleError::NotComputerTurn);
    }

    #[test]
    fn dispatch_translates_intents_into_transitions() {
        let mut engine = RuleEngine::with_seed(5);
        let mut session = two_player_session();

        engine
            .dispatch(&mut session, PlayerIntent::CellClicked { index: 0 })
            .expect("click should place a mark");
        assert_eq!(session.board.cell(0), Some(Mark::X));

        engine
            .dispatch(&mut session, PlayerIntent::Reset)
            .expect("reset should always succeed");
        assert_eq!(session.board, Board::new());
        assert_eq!(session.current_player, Mark::X);

        engine
            .dispatch(
                &mut session,
                PlayerIntent::NewGame {
                    config: SessionConfig::vs_computer(Mark::O, 1),
                },
            )
            .expect("new game with a valid config should succeed");
        assert_eq!(session.computer_mark(), Some(Mark::X));
        assert_eq!(session.current_player, Mark::O);

        let error = engine
            .dispatch(
                &mut session,
                PlayerIntent::NewGame {
                    config: SessionConfig::vs_computer(Mark::O, 9),
                },
            )
            .expect_err("invalid difficulty should surface as a config error");
        assert_eq!(
            error,
            RuleError::Config {
                error: ConfigError::InvalidDifficulty { level: 9 }
            }
        );
    }
}
