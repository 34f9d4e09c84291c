use crate::state::{Analysis, Fixture, TeamStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Goals,
    Cards,
    Corners,
    Offsides,
    Fouls,
}

impl StatKind {
    pub const ALL: [StatKind; 5] = [
        StatKind::Goals,
        StatKind::Cards,
        StatKind::Corners,
        StatKind::Offsides,
        StatKind::Fouls,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatKind::Goals => "Goals",
            StatKind::Cards => "Cards",
            StatKind::Corners => "Corners",
            StatKind::Offsides => "Offsides",
            StatKind::Fouls => "Fouls",
        }
    }

    /// Bar scale. Combined figures cover both sides so they get a wider range.
    pub fn max_value(self, combined: bool) -> f64 {
        match (self, combined) {
            (StatKind::Goals, false) => 2.0,
            (StatKind::Goals, true) => 4.0,
            (StatKind::Cards, false) => 3.0,
            (StatKind::Cards, true) => 5.0,
            (StatKind::Corners, false) => 4.0,
            (StatKind::Corners, true) => 8.0,
            (StatKind::Offsides, false) => 3.0,
            (StatKind::Offsides, true) => 6.0,
            (StatKind::Fouls, false) => 12.0,
            (StatKind::Fouls, true) => 20.0,
        }
    }

    pub fn value(self, stats: &TeamStats) -> f64 {
        match self {
            StatKind::Goals => stats.avg_goals,
            StatKind::Cards => stats.avg_cards,
            StatKind::Corners => stats.avg_corners,
            StatKind::Offsides => stats.avg_offsides,
            StatKind::Fouls => stats.avg_fouls,
        }
    }
}

/// Fill percentage in `[0, 100]`.
pub fn stat_bar_percent(value: f64, max: f64) -> f64 {
    if !value.is_finite() || !max.is_finite() || max <= 0.0 {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0) * 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatBar {
    pub kind: StatKind,
    pub value: f64,
    pub max: f64,
    pub percent: f64,
}

impl StatBar {
    pub fn new(kind: StatKind, stats: &TeamStats, combined: bool) -> Self {
        let value = kind.value(stats);
        let max = kind.max_value(combined);
        Self {
            kind,
            value,
            max,
            percent: stat_bar_percent(value, max),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatCard {
    pub title: String,
    pub logo: Option<String>,
    pub bars: Vec<StatBar>,
}

fn card(title: &str, logo: Option<&str>, stats: &TeamStats, combined: bool) -> StatCard {
    StatCard {
        title: title.to_string(),
        logo: logo.map(str::to_string),
        bars: StatKind::ALL
            .iter()
            .map(|kind| StatBar::new(*kind, stats, combined))
            .collect(),
    }
}

/// Home, away and combined cards, in that order.
pub fn analysis_cards(fixture: &Fixture, analysis: &Analysis) -> [StatCard; 3] {
    [
        card(
            &fixture.home_team,
            Some(&fixture.home_team_logo),
            &analysis.home,
            false,
        ),
        card(
            &fixture.away_team,
            Some(&fixture.away_team_logo),
            &analysis.away,
            false,
        ),
        card("Combined", None, &analysis.combined, true),
    ]
}
