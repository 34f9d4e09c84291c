use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::state::{Fixture, TicketInfo, TicketLine};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TicketRequest {
    pub min_odd: f64,
    pub max_odd: f64,
}

/// A built ticket: the backend's selection lines and the fixtures they
/// resolve to, each annotated with its market.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TicketSlip {
    pub lines: Vec<TicketLine>,
    pub fixtures: Vec<Fixture>,
}

impl TicketSlip {
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    pub fn total_odd(&self) -> f64 {
        total_odd(self.fixtures.iter().map(|f| f.ticket_info.as_ref().and_then(|t| t.odd)))
    }
}

/// Validates the two odd inputs before anything is sent to the backend.
pub fn parse_odd_range(min_raw: &str, max_raw: &str) -> Result<TicketRequest, String> {
    let min_raw = min_raw.trim();
    let max_raw = max_raw.trim();
    if min_raw.is_empty() || max_raw.is_empty() {
        return Err("Enter both a min and a max odd".to_string());
    }
    let (Ok(min_odd), Ok(max_odd)) = (min_raw.parse::<f64>(), max_raw.parse::<f64>()) else {
        return Err("Odds must be numbers".to_string());
    };
    if !min_odd.is_finite() || !max_odd.is_finite() || min_odd <= 0.0 || max_odd <= 0.0 {
        return Err("Odds must be positive".to_string());
    }
    if min_odd > max_odd {
        return Err("Min odd must not exceed max odd".to_string());
    }
    Ok(TicketRequest { min_odd, max_odd })
}

/// Product of the selection odds. A selection without an odd counts as 1.
pub fn total_odd<I>(odds: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    odds.into_iter().map(|odd| odd.unwrap_or(1.0)).product()
}

pub fn format_odd(value: f64) -> String {
    format!("{value:.2}")
}

pub fn annotate(mut fixture: Fixture, line: &TicketLine) -> Fixture {
    fixture.ticket_info = Some(TicketInfo {
        field: line.field.clone(),
        label: line.label.clone(),
        odd: line.odd,
    });
    fixture
}

/// Resolves every line to its fixture concurrently. Any failed lookup fails
/// the whole slip so a partial ticket is never shown.
pub fn join_ticket<F>(lines: Vec<TicketLine>, fetch: F) -> Result<TicketSlip>
where
    F: Fn(u64) -> Result<Fixture> + Sync,
{
    let fixtures = lines
        .par_iter()
        .map(|line| fetch(line.fixture_id).map(|fixture| annotate(fixture, line)))
        .collect::<Result<Vec<_>>>()?;
    Ok(TicketSlip { lines, fixtures })
}
