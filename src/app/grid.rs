use crate::domain::model::{AllocationResult, CellState, Session};
use colored::Colorize;
use serde::{Deserialize, Serialize};

/// Host-side colour scheme. Has no effect on allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Background colours as RGB triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub won: (u8, u8, u8),
    pub next: (u8, u8, u8),
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            // 淺綠 / 橘色
            Theme::Light => Palette {
                won: (144, 238, 144),
                next: (255, 165, 0),
            },
            // 深綠 / 深橘
            Theme::Dark => Palette {
                won: (0, 100, 0),
                next: (204, 85, 0),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct GridRenderer {
    theme: Theme,
    precision: usize,
    color: bool,
}

impl GridRenderer {
    pub fn new(theme: Theme, precision: usize, color: bool) -> Self {
        Self {
            theme,
            precision,
            color,
        }
    }

    /// Text shown in a quotient cell. Zero-vote parties show a bare `0`.
    pub fn format_quotient(&self, votes: u64, divisor: u32) -> String {
        if votes == 0 {
            "0".to_string()
        } else {
            format!("{:.*}", self.precision, votes as f64 / divisor as f64)
        }
    }

    fn decorate(&self, text: &str, width: usize, state: CellState) -> String {
        let padded = format!("{:>width$}", text, width = width);
        if self.color {
            let palette = self.theme.palette();
            let (r, g, b) = match state {
                CellState::Won => palette.won,
                CellState::Next => palette.next,
                CellState::Idle => return padded,
            };
            padded.on_truecolor(r, g, b).to_string()
        } else {
            let marker = match state {
                CellState::Won => '*',
                CellState::Next => '+',
                CellState::Idle => ' ',
            };
            format!("{}{}", padded, marker)
        }
    }

    pub fn render(&self, session: &Session, result: &AllocationResult) -> String {
        let divisors: Vec<u32> = (1..=session.divisor_ceiling).collect();

        let cells: Vec<Vec<String>> = session
            .parties
            .iter()
            .map(|party| {
                divisors
                    .iter()
                    .map(|&d| self.format_quotient(party.votes, d))
                    .collect()
            })
            .collect();

        let width_of = |s: &str| s.chars().count();
        let seats_width = result
            .seats
            .iter()
            .map(|s| s.to_string().len())
            .chain(std::iter::once("Seats".len()))
            .max()
            .unwrap_or(5);
        let name_width = session
            .parties
            .iter()
            .map(|p| width_of(&p.name))
            .chain(std::iter::once("Party".len()))
            .max()
            .unwrap_or(5);
        let votes_width = session
            .parties
            .iter()
            .map(|p| p.votes.to_string().len())
            .chain(std::iter::once("Votes".len()))
            .max()
            .unwrap_or(5);
        let column_widths: Vec<usize> = divisors
            .iter()
            .enumerate()
            .map(|(col, d)| {
                cells
                    .iter()
                    .map(|row| width_of(&row[col]))
                    .chain(std::iter::once(width_of(&format!("÷{}", d))))
                    .max()
                    .unwrap_or(1)
            })
            .collect();
        // 無色彩模式每格多一個標記字元
        let marker_width = usize::from(!self.color);

        let mut out = String::new();
        out.push_str(&format!(
            "{} ({} seats, divisors 1..={})\n",
            session.election_name, session.seats, session.divisor_ceiling
        ));

        let mut header = format!(
            "{:>sw$} | {:<nw$} | {:>vw$} |",
            "Seats",
            "Party",
            "Votes",
            sw = seats_width,
            nw = name_width,
            vw = votes_width
        );
        for (d, width) in divisors.iter().zip(&column_widths) {
            header.push_str(&format!(
                " {:>w$}",
                format!("÷{}", d),
                w = width + marker_width
            ));
        }
        out.push_str(header.trim_end());
        out.push('\n');
        out.push_str(&"-".repeat(width_of(header.trim_end())));
        out.push('\n');

        for (slot, party) in session.parties.iter().enumerate() {
            let mut line = format!(
                "{:>sw$} | {:<nw$} | {:>vw$} |",
                result.seats.get(slot).copied().unwrap_or(0),
                party.name,
                party.votes,
                sw = seats_width,
                nw = name_width,
                vw = votes_width
            );
            for ((col, &d), width) in divisors.iter().enumerate().zip(&column_widths) {
                line.push(' ');
                line.push_str(&self.decorate(&cells[slot][col], *width, result.cell_state(slot, d)));
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }

        out.push_str(&format!(
            "\nSeats awarded: {} of {}",
            result.total_awarded(),
            session.seats
        ));
        if let Some(next) = result.next_quotient() {
            let name = session
                .parties
                .get(next.party)
                .map(|p| p.name.as_str())
                .unwrap_or("?");
            out.push_str(&format!(
                "\nNext seat: {} (÷{} = {})",
                name,
                next.divisor,
                self.format_quotient(next.votes, next.divisor)
            ));
        }
        if !self.color {
            out.push_str("\nLegend: * seat won, + next seat");
        }
        out.push('\n');
        out
    }
}
