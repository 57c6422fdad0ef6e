use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_PARTY_SLOTS: usize = 12;
pub const DEFAULT_DIVISOR_CEILING: u32 = 20;
pub const DEFAULT_SEATS: u32 = 7;
pub const DEFAULT_ELECTION_NAME: &str = "Election";
pub const MAX_SEATS: u32 = 1000;
/// 票數輸入上限（與原本的輸入欄位一致）
pub const MAX_VOTES: u64 = 999_999_999;
pub const MAX_PARTY_SLOTS: usize = 100;
/// 每個政黨最多產生的商數個數
pub const MAX_DIVISOR_CEILING: u32 = 100;

pub fn clamp_seats(value: i64) -> u32 {
    value.clamp(0, MAX_SEATS as i64) as u32
}

pub fn clamp_votes(value: i64) -> u64 {
    value.clamp(0, MAX_VOTES as i64) as u64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub votes: u64,
}

impl Party {
    pub fn with_default_name(slot: usize) -> Self {
        Self {
            name: format!("Party {}", slot + 1),
            votes: 0,
        }
    }

    /// 載入紀錄時缺少的列會變成空白政黨
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            votes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub election_name: String,
    pub seats: u32,
    pub divisor_ceiling: u32,
    pub parties: Vec<Party>,
}

impl Session {
    /// 建立固定槽位數的選舉，所有欄位皆為安全預設值。
    /// `divisor_ceiling` 為 0 時會提升為 1，確保 session 永遠有效。
    pub fn new(party_slots: usize, divisor_ceiling: u32) -> Self {
        Self {
            election_name: DEFAULT_ELECTION_NAME.to_string(),
            seats: DEFAULT_SEATS,
            divisor_ceiling: divisor_ceiling.clamp(1, MAX_DIVISOR_CEILING),
            parties: (0..party_slots).map(Party::with_default_name).collect(),
        }
    }

    pub fn party_slots(&self) -> usize {
        self.parties.len()
    }

    /// 引擎使用的票數向量
    pub fn vote_counts(&self) -> Vec<i64> {
        self.parties.iter().map(|p| p.votes as i64).collect()
    }

    pub fn total_votes(&self) -> u64 {
        self.parties.iter().map(|p| p.votes).sum()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_PARTY_SLOTS, DEFAULT_DIVISOR_CEILING)
    }
}

/// votes / divisor, kept as an exact ratio so equal quotients compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quotient {
    pub party: usize,
    pub divisor: u32,
    pub votes: u64,
}

impl Quotient {
    pub fn value(&self) -> f64 {
        self.votes as f64 / self.divisor as f64
    }

    /// Exact comparison of the two ratios by cross-multiplication.
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        let lhs = self.votes as u128 * other.divisor as u128;
        let rhs = other.votes as u128 * self.divisor as u128;
        lhs.cmp(&rhs)
    }

    /// Ranking order: larger value first, then lower party index, then lower divisor.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .cmp_value(self)
            .then(self.party.cmp(&other.party))
            .then(self.divisor.cmp(&other.divisor))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Won,
    Next,
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    /// 所有正數商，依排名排序
    pub ranking: Vec<Quotient>,
    /// 各政黨席次，長度等於政黨數
    pub seats: Vec<u32>,
    /// ranking 前 `winners` 筆為當選的商
    pub winners: usize,
    /// 若再多一席，下一個當選的商在 ranking 中的位置
    pub next: Option<usize>,
}

impl AllocationResult {
    pub fn empty(parties: usize) -> Self {
        Self {
            ranking: Vec::new(),
            seats: vec![0; parties],
            winners: 0,
            next: None,
        }
    }

    pub fn winning(&self) -> &[Quotient] {
        &self.ranking[..self.winners]
    }

    pub fn next_quotient(&self) -> Option<&Quotient> {
        self.next.and_then(|i| self.ranking.get(i))
    }

    pub fn total_awarded(&self) -> u32 {
        self.seats.iter().sum()
    }

    pub fn cell_state(&self, party: usize, divisor: u32) -> CellState {
        let matches = |q: &Quotient| q.party == party && q.divisor == divisor;
        if self.winning().iter().any(matches) {
            CellState::Won
        } else if self.next_quotient().is_some_and(matches) {
            CellState::Next
        } else {
            CellState::Idle
        }
    }
}
