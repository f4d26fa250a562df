use serde::{Deserialize, Serialize};
use std::fmt;

/// 棋盘格子数量（3×3）。
pub const BOARD_CELLS: usize = 9;

/// 所有获胜线：三行、三列、两条对角线。
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 棋子标记。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl Default for Mark {
    fn default() -> Self {
        Mark::X
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// 单个格子：`None` 表示空位。
pub type Cell = Option<Mark>;

/// 一步落子之后的局面判定结果。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MoveOutcome {
    Ongoing,
    Win { mark: Mark, line: [usize; 3] },
    Draw,
}

/// 3×3 棋盘。序列化为与前端一致的九元素数组。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct Board {
    cells: [Cell; BOARD_CELLS],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_CELLS],
        }
    }

    pub fn cell(&self, index: usize) -> Cell {
        self.cells[index]
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_some())
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index)
    }

    /// 直接写入一个格子。合法性校验由规则层负责。
    pub fn set(&mut self, index: usize, mark: Mark) {
        debug_assert!(self.cells[index].is_none(), "cell {index} already taken");
        self.cells[index] = Some(mark);
    }

    /// 返回落子后的棋盘副本，原棋盘不变。搜索的每个分支都走这条路。
    pub fn with_mark(&self, index: usize, mark: Mark) -> Board {
        let mut next = *self;
        next.set(index, mark);
        next
    }

    /// 扫描全部获胜线判定局面。返回最先命中的完成线；合法对局中
    /// 最多只有一方能拥有完成线，扫描顺序不影响胜负归属。
    pub fn evaluate(&self) -> MoveOutcome {
        for line in WINNING_LINES {
            let [a, b, c] = line;
            if let Some(mark) = self.cells[a] {
                if self.cells[b] == Some(mark) && self.cells[c] == Some(mark) {
                    return MoveOutcome::Win { mark, line };
                }
            }
        }

        if self.is_full() {
            MoveOutcome::Draw
        } else {
            MoveOutcome::Ongoing
        }
    }
}
