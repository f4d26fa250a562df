use std::fmt;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::{Board, Mark, MoveOutcome, RuleError};

/// 每个难度等级下电脑走最优解的概率，下标 = 等级 - 1。
pub const OPTIMAL_PROBABILITY: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];

const DEFAULT_LEVEL: u8 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ConfigError {
    InvalidDifficulty { level: u8 },
    MissingPlayerMark,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDifficulty { level } => {
                write!(f, "difficulty level {level} is outside 1..=5")
            }
            ConfigError::MissingPlayerMark => {
                write!(f, "a player mark must be chosen before starting a computer game")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// 难度等级，取值 1..=5。配置阶段校验，绝不静默夹取。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub fn new(level: u8) -> Result<Self, ConfigError> {
        if (1..=5).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ConfigError::InvalidDifficulty { level })
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn optimal_probability(self) -> f64 {
        OPTIMAL_PROBABILITY[usize::from(self.0 - 1)]
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(DEFAULT_LEVEL)
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = ConfigError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Difficulty::new(level)
    }
}

impl From<Difficulty> for u8 {
    fn from(difficulty: Difficulty) -> u8 {
        difficulty.0
    }
}

/// 难度闸门选出的分支：最优解或随机落子。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MovePolicy {
    Optimal,
    Random,
}

/// 严格按 `roll < probability` 判定，与原实现的 `Math.random()` 比较一致。
pub fn policy_for_roll(difficulty: Difficulty, roll: f64) -> MovePolicy {
    if roll < difficulty.optimal_probability() {
        MovePolicy::Optimal
    } else {
        MovePolicy::Random
    }
}

pub struct AiAgent {
    rng: SmallRng,
}

impl AiAgent {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// 按难度概率在最优解与随机合法落子之间选择，返回格子下标与所走分支。
    pub fn select_move(
        &mut self,
        board: &Board,
        computer: Mark,
        player: Mark,
        difficulty: Difficulty,
    ) -> Result<(usize, MovePolicy), RuleError> {
        if board.is_full() {
            return Err(RuleError::NoLegalMove);
        }

        let roll = self.rng.gen::<f64>();
        match policy_for_roll(difficulty, roll) {
            MovePolicy::Optimal => {
                let index = best_move(board, computer, player).ok_or(RuleError::NoLegalMove)?;
                Ok((index, MovePolicy::Optimal))
            }
            MovePolicy::Random => {
                let index = self.random_move(board).ok_or(RuleError::NoLegalMove)?;
                Ok((index, MovePolicy::Random))
            }
        }
    }

    fn random_move(&mut self, board: &Board) -> Option<usize> {
        let empty: Vec<usize> = board.empty_cells().collect();
        empty.choose(&mut self.rng).copied()
    }
}

impl Default for AiAgent {
    fn default() -> Self {
        AiAgent::new()
    }
}

/// 逐一尝试每个空位并用完整极小极大搜索打分，返回得分最高的下标。
/// 同分时保留最先遇到的（即下标最小的）空位，刻意保证可复现。
pub fn best_move(board: &Board, computer: Mark, player: Mark) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for index in board.empty_cells() {
        let score = minimax_score(board.with_mark(index, computer), false, computer, player);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

/// 穷举搜索到终局为止：电脑胜 +1，玩家胜 -1，平局 0。
/// 不限深度、不剪枝，也不按步数折扣，快胜与慢胜同分。
/// 每个分支在棋盘副本上递归，绝不共享可变棋盘。
pub fn minimax_score(board: Board, maximizing: bool, computer: Mark, player: Mark) -> i32 {
    match board.evaluate() {
        MoveOutcome::Win { mark, .. } => {
            if mark == computer {
                1
            } else {
                -1
            }
        }
        MoveOutcome::Draw => 0,
        MoveOutcome::Ongoing => {
            if maximizing {
                let mut best = i32::MIN;
                for index in board.empty_cells() {
                    let score =
                        minimax_score(board.with_mark(index, computer), false, computer, player);
                    best = best.max(score);
                }
                best
            } else {
                let mut best = i32::MAX;
                for index in board.empty_cells() {
                    let score =
                        minimax_score(board.with_mark(index, player), true, computer, player);
                    best = best.min(score);
                }
                best
            }
        }
    }
}
