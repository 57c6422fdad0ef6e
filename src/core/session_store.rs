use crate::core::apportionment::Apportioner;
use crate::core::record::{self, LoadReport};
use crate::domain::model::{clamp_seats, clamp_votes, AllocationResult, Session};
use crate::domain::ports::Storage;
use crate::utils::error::{DhondtError, RecordIssue, Result};

/// Owns the mutable election and the latest allocation computed from it.
///
/// Setters never fail: out-of-range values are clamped and unknown party slots are
/// ignored. Nothing is recomputed until the host calls [`SessionStore::recompute`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    session: Session,
    engine: Apportioner,
    result: AllocationResult,
}

impl SessionStore {
    pub fn new(session: Session) -> Self {
        let engine = Apportioner::new(session.divisor_ceiling);
        let result = AllocationResult::empty(session.party_slots());
        Self {
            session,
            engine,
            result,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// 最近一次 recompute 的結果
    pub fn result(&self) -> &AllocationResult {
        &self.result
    }

    pub fn set_votes(&mut self, slot: usize, value: i64) {
        match self.session.parties.get_mut(slot) {
            Some(party) => party.votes = clamp_votes(value),
            None => tracing::warn!("Ignoring votes for unknown party slot {}", slot),
        }
    }

    /// 使用者輸入的文字，無法解析時視為 0 票
    pub fn set_votes_text(&mut self, slot: usize, text: &str) {
        let value = text.trim().parse::<i64>().unwrap_or_else(|_| {
            tracing::debug!("Votes '{}' for slot {} parsed as 0", text, slot);
            0
        });
        self.set_votes(slot, value);
    }

    pub fn set_name(&mut self, slot: usize, name: impl Into<String>) {
        match self.session.parties.get_mut(slot) {
            Some(party) => party.name = name.into(),
            None => tracing::warn!("Ignoring name for unknown party slot {}", slot),
        }
    }

    pub fn set_seats(&mut self, value: i64) {
        self.session.seats = clamp_seats(value);
    }

    pub fn set_election_name(&mut self, name: impl Into<String>) {
        self.session.election_name = name.into();
    }

    /// Stable: parties with equal votes keep their relative order.
    pub fn sort_by_votes_descending(&mut self) {
        self.session
            .parties
            .sort_by(|a, b| b.votes.cmp(&a.votes));
    }

    pub fn serialize(&self) -> Result<String> {
        record::serialize(&self.session)
    }

    /// 以紀錄內容取代目前的 session，槽位數與除數上限維持不變
    pub fn deserialize(&mut self, text: &str) -> Result<Vec<RecordIssue>> {
        let report = record::deserialize(
            text,
            self.session.party_slots(),
            self.session.divisor_ceiling,
        )?;
        Ok(self.apply(report))
    }

    /// Like [`SessionStore::deserialize`] but refuses records that needed defaulting.
    pub fn deserialize_strict(&mut self, text: &str) -> Result<()> {
        let report = record::deserialize(
            text,
            self.session.party_slots(),
            self.session.divisor_ceiling,
        )?;
        self.session = report.into_strict()?;
        Ok(())
    }

    fn apply(&mut self, report: LoadReport) -> Vec<RecordIssue> {
        for issue in &report.issues {
            tracing::warn!("⚠️ {}", issue);
        }
        self.session = report.session;
        report.issues
    }

    pub fn save<S: Storage>(&self, storage: &S, path: &str) -> Result<()> {
        let text = self.serialize()?;
        storage.write_file(path, text.as_bytes())?;
        tracing::info!("💾 Saved '{}' to {}", self.session.election_name, path);
        Ok(())
    }

    pub fn load<S: Storage>(&mut self, storage: &S, path: &str) -> Result<Vec<RecordIssue>> {
        let text = decode(path, storage.read_file(path)?)?;
        let issues = self.deserialize(&text)?;
        tracing::info!(
            "📂 Loaded '{}' from {} ({} issues)",
            self.session.election_name,
            path,
            issues.len()
        );
        Ok(issues)
    }

    pub fn load_strict<S: Storage>(&mut self, storage: &S, path: &str) -> Result<()> {
        let text = decode(path, storage.read_file(path)?)?;
        self.deserialize_strict(&text)
    }

    pub fn recompute(&mut self) -> Result<&AllocationResult> {
        let votes = self.session.vote_counts();
        self.result = self.engine.allocate(&votes, self.session.seats)?;
        tracing::debug!(
            "Recomputed '{}': {} seats awarded",
            self.session.election_name,
            self.result.total_awarded()
        );
        Ok(&self.result)
    }
}

/// 紀錄檔必須是 UTF-8，不做替換字元的修補
fn decode(path: &str, data: Vec<u8>) -> Result<String> {
    String::from_utf8(data).map_err(|e| {
        DhondtError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{} is not valid UTF-8: {}", path, e),
        ))
    })
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Session::default())
    }
}
