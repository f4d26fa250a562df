//! AI 算法模块（极小极大搜索与难度闸门）。

pub mod minimax;

pub use minimax::{
    best_move, minimax_score, policy_for_roll, AiAgent, ConfigError, Difficulty, MovePolicy,
    OPTIMAL_PROBABILITY,
};
