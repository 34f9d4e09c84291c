use anyhow::Result;
use rayon::prelude::*;

use crate::state::{Fixture, OddQuote};

/// Over/under thresholds the filterizer can ask for.
pub const THRESHOLDS: [f64; 11] = [0.5, 1.5, 2.5, 3.5, 4.5, 5.5, 6.5, 7.5, 8.5, 9.5, 10.5];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OddCategory {
    Goals,
    Corners,
    Fouls,
}

impl OddCategory {
    pub const ALL: [OddCategory; 3] = [OddCategory::Goals, OddCategory::Corners, OddCategory::Fouls];

    /// Backend market id for the category.
    pub fn odd_id(self) -> &'static str {
        match self {
            OddCategory::Goals => "5",
            OddCategory::Corners => "45",
            OddCategory::Fouls => "80",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OddCategory::Goals => "Goals",
            OddCategory::Corners => "Corners",
            OddCategory::Fouls => "Fouls",
        }
    }

    /// Key under which the matched odd is stored on a fixture.
    pub fn key(self) -> &'static str {
        match self {
            OddCategory::Goals => "goals",
            OddCategory::Corners => "corners",
            OddCategory::Fouls => "fouls",
        }
    }

    pub fn next(self) -> Self {
        match self {
            OddCategory::Goals => OddCategory::Corners,
            OddCategory::Corners => OddCategory::Fouls,
            OddCategory::Fouls => OddCategory::Goals,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            OddCategory::Goals => OddCategory::Fouls,
            OddCategory::Corners => OddCategory::Goals,
            OddCategory::Fouls => OddCategory::Corners,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterizerQuery {
    pub category: OddCategory,
    pub threshold: f64,
}

impl FilterizerQuery {
    pub fn odd_name(&self) -> String {
        format!("Over {:.1}", self.threshold)
    }

    pub fn min_odd_param(&self) -> String {
        format!("{:.1}", self.threshold)
    }
}

/// One backend hit: a fixture id and the price of the requested market.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilteredOdd {
    pub fixture_id: u64,
    pub odd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterizerResult {
    pub query: FilterizerQuery,
    pub fixtures: Vec<Fixture>,
}

pub fn attach_odd(mut fixture: Fixture, query: &FilterizerQuery, odd: Option<f64>) -> Fixture {
    if let Some(value) = odd {
        fixture.odds.insert(
            query.category.key().to_string(),
            OddQuote {
                label: query.odd_name(),
                value,
            },
        );
    }
    fixture
}

/// Fetches every matched fixture concurrently and fails as a whole when any
/// lookup fails.
pub fn join_filtered<F>(query: FilterizerQuery, hits: &[FilteredOdd], fetch: F) -> Result<FilterizerResult>
where
    F: Fn(u64) -> Result<Fixture> + Sync,
{
    let fixtures = hits
        .par_iter()
        .map(|hit| fetch(hit.fixture_id).map(|fixture| attach_odd(fixture, &query, hit.odd)))
        .collect::<Result<Vec<_>>>()?;
    Ok(FilterizerResult { query, fixtures })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_name_uses_one_decimal() {
        let query = FilterizerQuery {
            category: OddCategory::Corners,
            threshold: THRESHOLDS[9],
        };
        assert_eq!(query.odd_name(), "Over 9.5");
        assert_eq!(query.min_odd_param(), "9.5");
        assert_eq!(query.category.odd_id(), "45");
    }

    #[test]
    fn categories_cycle_both_ways() {
        for category in OddCategory::ALL {
            assert_eq!(category.next().prev(), category);
        }
    }
}
