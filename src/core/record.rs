//! Flat CSV record of an election:
//!
//! ```text
//! Election Name,<name>
//! Seats,<integer>
//! Party,Votes
//! <party name>,<votes>
//! ...
//! ```

use crate::domain::model::{clamp_seats, clamp_votes, Party, Session};
use crate::utils::error::{DhondtError, RecordIssue, Result};
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};

pub const ELECTION_NAME_KEY: &str = "Election Name";
pub const SEATS_KEY: &str = "Seats";
pub const HEADER: [&str; 2] = ["Party", "Votes"];

/// 載入結果：永遠是有效的 session，外加被補預設值的問題清單
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub session: Session,
    pub issues: Vec<RecordIssue>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// 嚴格模式：有任何問題就回傳第一個 MalformedRecord
    pub fn into_strict(self) -> Result<Session> {
        match self.issues.into_iter().next() {
            Some(issue) => Err(DhondtError::MalformedRecord(issue)),
            None => Ok(self.session),
        }
    }
}

pub fn serialize(session: &Session) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record([ELECTION_NAME_KEY, session.election_name.as_str()])?;
    writer.write_record([SEATS_KEY, session.seats.to_string().as_str()])?;
    writer.write_record(HEADER)?;
    for party in &session.parties {
        writer.write_record([party.name.as_str(), party.votes.to_string().as_str()])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DhondtError::IoError(std::io::Error::new(e.error().kind(), e.to_string())))?;
    String::from_utf8(bytes)
        .map_err(|e| DhondtError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Walks the record one physical line at a time. A blank line is an empty row,
/// so it still occupies its party slot.
struct RowCursor<'t> {
    lines: std::str::Lines<'t>,
    line: usize,
}

impl RowCursor<'_> {
    /// 回傳 (行號, 資料列)；讀完後一律回傳 None
    fn next_row(&mut self) -> Result<(usize, Option<StringRecord>)> {
        self.line += 1;
        let start = self.line;
        let Some(first) = self.lines.next() else {
            return Ok((start, None));
        };

        // 引號內的換行屬於同一列
        let mut raw = first.to_string();
        while raw.matches('"').count() % 2 == 1 {
            let Some(more) = self.lines.next() else { break };
            self.line += 1;
            raw.push('\n');
            raw.push_str(more);
        }
        Ok((start, Some(parse_row(&raw)?)))
    }

    /// Non-blank rows left after the last party slot.
    fn remaining(&mut self) -> Result<usize> {
        let mut count = 0;
        while let (_, Some(row)) = self.next_row()? {
            if !row.is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }
}

fn parse_row(raw: &str) -> Result<StringRecord> {
    let mut record = StringRecord::new();
    if raw.is_empty() {
        return Ok(record);
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());
    reader.read_record(&mut record)?;
    Ok(record)
}

/// Best-effort positional load. Missing or short party rows become blank parties,
/// a malformed seat value becomes 0, and every defaulted field is reported.
pub fn deserialize(text: &str, party_slots: usize, divisor_ceiling: u32) -> Result<LoadReport> {
    let mut cursor = RowCursor {
        lines: text.lines(),
        line: 0,
    };

    let mut session = Session::new(party_slots, divisor_ceiling);
    let mut issues = Vec::new();

    match cursor.next_row()? {
        (_, Some(row)) if row.len() >= 2 && &row[0] == ELECTION_NAME_KEY => {
            session.election_name = row[1].to_string();
        }
        (line, _) => issues.push(RecordIssue::MissingElectionName { line }),
    }

    match cursor.next_row()? {
        (line, Some(row)) if row.len() >= 2 && &row[0] == SEATS_KEY => {
            match row[1].trim().parse::<i64>() {
                Ok(value) => session.seats = clamp_seats(value),
                Err(_) => {
                    session.seats = 0;
                    issues.push(RecordIssue::InvalidSeats {
                        line,
                        value: row[1].to_string(),
                    });
                }
            }
        }
        (line, _) => issues.push(RecordIssue::MissingSeats { line }),
    }

    // 標題列只檢查不使用
    match cursor.next_row()? {
        (_, Some(row)) if row.get(0) == Some(HEADER[0]) && row.get(1) == Some(HEADER[1]) => {}
        (line, _) => issues.push(RecordIssue::MissingHeader { line }),
    }

    let mut found = 0;
    for slot in 0..party_slots {
        let (line, row) = cursor.next_row()?;
        let Some(row) = row else {
            session.parties[slot] = Party::blank();
            continue;
        };
        found += 1;

        if row.len() < 2 {
            session.parties[slot] = Party::blank();
            issues.push(RecordIssue::ShortRow { line, slot });
            continue;
        }

        let votes = match row[1].trim().parse::<i64>() {
            Ok(value) if value >= 0 => clamp_votes(value),
            _ => {
                issues.push(RecordIssue::InvalidVotes {
                    line,
                    slot,
                    value: row[1].to_string(),
                });
                0
            }
        };
        session.parties[slot] = Party {
            name: row[0].to_string(),
            votes,
        };
    }

    if found < party_slots {
        issues.push(RecordIssue::MissingRows {
            expected: party_slots,
            found,
        });
    }

    let extra = cursor.remaining()?;
    if extra > 0 {
        issues.push(RecordIssue::ExtraRows { count: extra });
    }

    Ok(LoadReport { session, issues })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> Session {
        let mut session = Session::new(4, 20);
        session.election_name = "City Council".to_string();
        session.seats = 7;
        let votes = [100_000, 80_000, 30_000, 20_000];
        for (party, (name, votes)) in session
            .parties
            .iter_mut()
            .zip(["Reds", "Blues", "Greens", "Golds"].iter().zip(votes))
        {
            party.name = name.to_string();
            party.votes = votes;
        }
        session
    }

    #[test]
    fn test_serialize_layout() {
        let text = serialize(&sample_session()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Election Name,City Council",
                "Seats,7",
                "Party,Votes",
                "Reds,100000",
                "Blues,80000",
                "Greens,30000",
                "Golds,20000",
            ]
        );
    }

    #[test]
    fn test_round_trip() {
        let session = sample_session();
        let text = serialize(&session).unwrap();
        let report = deserialize(&text, 4, 20).unwrap();
        assert!(report.is_clean(), "issues: {:?}", report.issues);
        assert_eq!(report.session, session);
    }

    #[test]
    fn test_names_with_delimiters_are_quoted() {
        let mut session = sample_session();
        session.election_name = "Vote, \"2024\"".to_string();
        session.parties[0].name = "Left, United".to_string();

        let text = serialize(&session).unwrap();
        assert!(text.contains("\"Left, United\""));

        let report = deserialize(&text, 4, 20).unwrap();
        assert_eq!(report.session.election_name, "Vote, \"2024\"");
        assert_eq!(report.session.parties[0].name, "Left, United");
    }

    #[test]
    fn test_missing_rows_are_padded() {
        let text = "Election Name,Test\nSeats,5\nParty,Votes\nA,100\nB,50\n";
        let report = deserialize(text, 12, 20).unwrap();

        assert_eq!(report.session.election_name, "Test");
        assert_eq!(report.session.seats, 5);
        assert_eq!(report.session.parties[0], Party { name: "A".into(), votes: 100 });
        assert_eq!(report.session.parties[1], Party { name: "B".into(), votes: 50 });
        for party in &report.session.parties[2..] {
            assert_eq!(party, &Party::blank());
        }
        assert_eq!(
            report.issues,
            vec![RecordIssue::MissingRows { expected: 12, found: 2 }]
        );
    }

    #[test]
    fn test_short_row_resets_party() {
        let text = "Election Name,Test\nSeats,3\nParty,Votes\nA,100\nLonely\nC,30\n";
        let report = deserialize(text, 3, 20).unwrap();

        assert_eq!(report.session.parties[1], Party::blank());
        assert_eq!(report.session.parties[2].votes, 30);
        assert_eq!(report.issues, vec![RecordIssue::ShortRow { line: 5, slot: 1 }]);
    }

    #[test]
    fn test_blank_line_keeps_its_slot() {
        let text = "Election Name,T\nSeats,3\nParty,Votes\nA,10\n\nB,20\n";
        let report = deserialize(text, 3, 20).unwrap();

        let names: Vec<&str> = report
            .session
            .parties
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "", "B"]);
        assert_eq!(report.session.parties[2].votes, 20);
        assert_eq!(report.issues, vec![RecordIssue::ShortRow { line: 5, slot: 1 }]);
    }

    #[test]
    fn test_quoted_newline_stays_in_one_row() {
        let text = "Election Name,T\nSeats,3\nParty,Votes\n\"Two\nLines\",10\nB,20\n";
        let report = deserialize(text, 2, 20).unwrap();
        assert!(report.is_clean(), "issues: {:?}", report.issues);
        assert_eq!(report.session.parties[0].name, "Two\nLines");
        assert_eq!(report.session.parties[1], Party { name: "B".into(), votes: 20 });
    }

    #[test]
    fn test_trailing_blank_lines_are_not_extra_rows() {
        let text = "Election Name,T\nSeats,1\nParty,Votes\nA,1\n\n\n";
        let report = deserialize(text, 1, 20).unwrap();
        assert!(report.is_clean(), "issues: {:?}", report.issues);
    }

    #[test]
    fn test_malformed_seats_default_to_zero() {
        let text = "Election Name,Test\nSeats,seven\nParty,Votes\nA,1\n";
        let report = deserialize(text, 1, 20).unwrap();
        assert_eq!(report.session.seats, 0);
        assert!(matches!(
            report.issues.as_slice(),
            [RecordIssue::InvalidSeats { line: 2, .. }]
        ));
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let text = "Election Name,Test\nSeats,5000\nParty,Votes\nA,-20\nB,abc\nC,12\n";
        let report = deserialize(text, 3, 20).unwrap();
        assert_eq!(report.session.seats, 1000);
        assert_eq!(report.session.parties[0].votes, 0);
        assert_eq!(report.session.parties[1].votes, 0);
        assert_eq!(report.session.parties[2].votes, 12);
        assert_eq!(report.issues.len(), 2);
    }

    #[test]
    fn test_wrong_keys_keep_defaults() {
        let text = "Title,Test\nCount,3\nParty,Votes\nA,1\n";
        let report = deserialize(text, 1, 20).unwrap();
        assert_eq!(report.session.election_name, "Election");
        assert_eq!(report.session.seats, 7);
        assert_eq!(
            report.issues,
            vec![
                RecordIssue::MissingElectionName { line: 1 },
                RecordIssue::MissingSeats { line: 2 },
            ]
        );
    }

    #[test]
    fn test_extra_rows_are_ignored() {
        let text = "Election Name,Test\nSeats,1\nParty,Votes\nA,1\nB,2\nC,3\n";
        let report = deserialize(text, 2, 20).unwrap();
        assert_eq!(report.session.party_slots(), 2);
        assert_eq!(report.issues, vec![RecordIssue::ExtraRows { count: 1 }]);
    }

    #[test]
    fn test_empty_record_is_all_defaults() {
        let report = deserialize("", 3, 20).unwrap();
        assert_eq!(report.session.election_name, "Election");
        assert!(report.session.parties.iter().all(|p| p == &Party::blank()));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_strict_mode_reports_first_issue() {
        let text = "Election Name,Test\nSeats,x\nParty,Votes\n";
        let err = deserialize(text, 2, 20).unwrap().into_strict().unwrap_err();
        assert!(matches!(
            err,
            DhondtError::MalformedRecord(RecordIssue::InvalidSeats { .. })
        ));
    }
}
