use crate::domain::model::{AllocationResult, CellState, Quotient, Session};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellReport {
    pub divisor: u32,
    pub value: f64,
    pub state: CellState,
}

/// 當選或下一席的商數，附上政黨名稱與數值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotientReport {
    pub party: usize,
    pub name: String,
    pub divisor: u32,
    pub votes: u64,
    pub value: f64,
}

impl QuotientReport {
    fn new(session: &Session, quotient: &Quotient) -> Self {
        Self {
            party: quotient.party,
            name: session
                .parties
                .get(quotient.party)
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            divisor: quotient.divisor,
            votes: quotient.votes,
            value: quotient.value(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyReport {
    pub slot: usize,
    pub name: String,
    pub votes: u64,
    pub seats: u32,
    pub quotients: Vec<CellReport>,
}

/// JSON 輸出：session 與配票結果的完整快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionReport {
    pub election_name: String,
    pub seats: u32,
    pub seats_awarded: u32,
    pub divisor_ceiling: u32,
    pub total_votes: u64,
    pub generated_at: DateTime<Utc>,
    pub parties: Vec<PartyReport>,
    pub winning: Vec<QuotientReport>,
    pub next: Option<QuotientReport>,
}

impl ElectionReport {
    pub fn build(session: &Session, result: &AllocationResult) -> Self {
        let parties = session
            .parties
            .iter()
            .enumerate()
            .map(|(slot, party)| PartyReport {
                slot,
                name: party.name.clone(),
                votes: party.votes,
                seats: result.seats.get(slot).copied().unwrap_or(0),
                quotients: (1..=session.divisor_ceiling)
                    .map(|divisor| CellReport {
                        divisor,
                        value: party.votes as f64 / divisor as f64,
                        state: result.cell_state(slot, divisor),
                    })
                    .collect(),
            })
            .collect();

        Self {
            election_name: session.election_name.clone(),
            seats: session.seats,
            seats_awarded: result.total_awarded(),
            divisor_ceiling: session.divisor_ceiling,
            total_votes: session.total_votes(),
            generated_at: Utc::now(),
            parties,
            winning: result
                .winning()
                .iter()
                .map(|q| QuotientReport::new(session, q))
                .collect(),
            next: result
                .next_quotient()
                .map(|q| QuotientReport::new(session, q)),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
