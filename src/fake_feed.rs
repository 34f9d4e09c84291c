use std::collections::BTreeMap;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::filterizer::{FilterizerQuery, FilterizerResult, OddCategory, attach_odd};
use crate::state::{
    Analysis, Country, Delta, Fixture, FixtureQuery, League, OddQuote, ProviderCommand, TeamStats,
    TicketLine,
};
use crate::ticket::{TicketRequest, TicketSlip, annotate};

const LOGO_BASE: &str =
    "https://raw.githubusercontent.com/luukhopman/football-logos/refs/heads/master/logos";

const COUNTRIES: &[(&str, &str)] = &[
    ("England", "ENG"),
    ("Spain", "ESP"),
    ("Germany", "GER"),
    ("Italy", "ITA"),
    ("France", "FRA"),
    ("Portugal", "POR"),
    ("Netherlands", "NED"),
    ("Belgium", "BEL"),
];

const LEAGUES: &[(&str, u32, &str)] = &[
    ("England", 39, "Premier League"),
    ("England", 40, "Championship"),
    ("Spain", 140, "La Liga"),
    ("Germany", 78, "Bundesliga"),
    ("Italy", 135, "Serie A"),
    ("France", 61, "Ligue 1"),
    ("Portugal", 94, "Primeira Liga"),
    ("Netherlands", 88, "Eredivisie"),
    ("Belgium", 144, "Jupiler Pro League"),
];

const TEAMS: &[&str] = &[
    "Manchester United",
    "Barcelona",
    "Bayern Munich",
    "Juventus",
    "PSG",
    "Ajax",
    "Porto",
    "Real Madrid",
    "Liverpool FC",
    "Southampton FC",
];

const TOP_LEAGUES: &[u32] = &[39, 140, 78, 135, 61];

/// Offline provider used with `BETAI_SOURCE=demo`. Every command is answered
/// after a short random delay so responses can arrive out of order.
pub fn spawn_fake_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let _ = tx.send(Delta::Log("[INFO] Demo data source active".to_string()));
        for cmd in cmd_rx {
            let tx = tx.clone();
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                thread::sleep(Duration::from_millis(rng.gen_range(120..480)));
                for delta in respond(cmd) {
                    let _ = tx.send(delta);
                }
            });
        }
    });
}

fn respond(cmd: ProviderCommand) -> Vec<Delta> {
    let delta = match cmd {
        ProviderCommand::FetchCountries { token } => Delta::SetCountries {
            token,
            result: Ok(demo_countries()),
        },
        ProviderCommand::FetchLeagues { token, country } => Delta::SetLeagues {
            token,
            result: Ok(demo_leagues(&country)),
            country,
        },
        ProviderCommand::FetchFixtures { token, query } => Delta::SetFixtures {
            token,
            result: Ok(demo_fixtures(&query)),
        },
        ProviderCommand::FetchAnalysis { token, fixture_id } => Delta::SetAnalysis {
            token,
            fixture_id,
            result: Ok(demo_analysis(fixture_id)),
        },
        ProviderCommand::BuildTicket { token, request } => Delta::SetTicket {
            token,
            result: Ok(demo_ticket(&request, Local::now().date_naive())),
        },
        ProviderCommand::RunFilterizer { token, query } => Delta::SetFilterizer {
            token,
            result: Ok(demo_filterizer(query, Local::now().date_naive())),
        },
        ProviderCommand::ProbeImages { urls } => {
            // Only the logo host is treated as reachable offline.
            return urls
                .into_iter()
                .map(|url| Delta::ImageStatus {
                    ok: url.starts_with(LOGO_BASE),
                    url,
                })
                .collect();
        }
    };
    vec![delta]
}

pub fn demo_countries() -> Vec<Country> {
    let mut countries: Vec<Country> = COUNTRIES
        .iter()
        .map(|(name, code)| Country {
            name: (*name).to_string(),
            code: Some((*code).to_string()),
            flag: None,
        })
        .collect();
    countries.push(Country {
        name: "Crimea".to_string(),
        code: None,
        flag: None,
    });
    countries
}

pub fn demo_leagues(country: &str) -> Vec<League> {
    LEAGUES
        .iter()
        .filter(|(c, _, _)| *c == country)
        .map(|(_, id, name)| League {
            id: *id,
            name: (*name).to_string(),
            logo: String::new(),
        })
        .collect()
}

fn league_name(id: u32) -> String {
    LEAGUES
        .iter()
        .find(|(_, league_id, _)| *league_id == id)
        .map(|(_, _, name)| (*name).to_string())
        .unwrap_or_else(|| format!("League {id}"))
}

fn team_logo(team: &str) -> String {
    match team {
        "Liverpool FC" | "Southampton FC" => format!(
            "{LOGO_BASE}/England%20-%20Premier%20League/{}.png",
            team.replace(' ', "%20")
        ),
        _ => String::new(),
    }
}

fn demo_fixture(league_id: u32, slot: u32, date: NaiveDate) -> Fixture {
    let id = u64::from(league_id) * 1000 + u64::from(slot);
    let mut rng = StdRng::seed_from_u64(id);
    let home_idx = rng.gen_range(0..TEAMS.len());
    let away_idx = (home_idx + rng.gen_range(1..TEAMS.len())) % TEAMS.len();
    let home = TEAMS[home_idx];
    let away = TEAMS[away_idx];
    let hour = 12 + (slot % 9);

    let mut odds = BTreeMap::new();
    odds.insert(
        "goals".to_string(),
        OddQuote {
            label: "Over 2.5".to_string(),
            value: 1.4 + rng.gen_range(0.0..1.2),
        },
    );

    Fixture {
        id,
        home_team: home.to_string(),
        home_team_logo: team_logo(home),
        away_team: away.to_string(),
        away_team_logo: team_logo(away),
        kickoff: format!("{}T{hour:02}:00:00", date.format("%Y-%m-%d")),
        league_name: league_name(league_id),
        league_logo: String::new(),
        odds,
        ticket_info: None,
    }
}

pub fn demo_fixtures(query: &FixtureQuery) -> Vec<Fixture> {
    match query {
        FixtureQuery::League(id) => {
            let today = Local::now().date_naive();
            (1..=6).map(|slot| demo_fixture(*id, slot, today)).collect()
        }
        FixtureQuery::Date(date) => {
            let offset = date.ordinal() % 3;
            TOP_LEAGUES
                .iter()
                .flat_map(|id| (1..=2).map(move |slot| (*id, slot + offset)))
                .map(|(id, slot)| demo_fixture(id, slot, *date))
                .collect()
        }
    }
}

fn demo_stats(rng: &mut StdRng) -> TeamStats {
    TeamStats {
        avg_goals: rng.gen_range(0.4..2.2),
        avg_cards: rng.gen_range(0.8..3.2),
        avg_corners: rng.gen_range(2.0..6.5),
        avg_offsides: rng.gen_range(0.5..3.0),
        avg_fouls: rng.gen_range(7.0..14.0),
    }
}

pub fn demo_analysis(fixture_id: u64) -> Analysis {
    let mut rng = StdRng::seed_from_u64(fixture_id ^ 0x5eed);
    let home = demo_stats(&mut rng);
    let away = demo_stats(&mut rng);
    let combined = TeamStats {
        avg_goals: home.avg_goals + away.avg_goals,
        avg_cards: home.avg_cards + away.avg_cards,
        avg_corners: home.avg_corners + away.avg_corners,
        avg_offsides: home.avg_offsides + away.avg_offsides,
        avg_fouls: home.avg_fouls + away.avg_fouls,
    };
    Analysis {
        home,
        away,
        combined,
    }
}

/// Three selections whose product lands in the middle of the requested range.
/// Ranges too tight to split into real prices produce an empty slip.
pub fn demo_ticket(request: &TicketRequest, today: NaiveDate) -> TicketSlip {
    let target = (request.min_odd + request.max_odd) / 2.0;
    let per_leg = target.cbrt();
    if per_leg < 1.05 {
        return TicketSlip::default();
    }
    let lines: Vec<TicketLine> = TOP_LEAGUES
        .iter()
        .take(3)
        .map(|league| TicketLine {
            fixture_id: u64::from(*league) * 1000 + 1,
            field: "goals".to_string(),
            label: "Over 1.5".to_string(),
            odd: Some(per_leg),
        })
        .collect();
    let fixtures = lines
        .iter()
        .map(|line| {
            let league = (line.fixture_id / 1000) as u32;
            annotate(demo_fixture(league, 1, today), line)
        })
        .collect();
    TicketSlip { lines, fixtures }
}

fn category_ceiling(category: OddCategory) -> f64 {
    match category {
        OddCategory::Goals => 4.5,
        OddCategory::Corners => 10.5,
        OddCategory::Fouls => 10.5,
    }
}

pub fn demo_filterizer(query: FilterizerQuery, today: NaiveDate) -> FilterizerResult {
    if query.threshold > category_ceiling(query.category) {
        return FilterizerResult {
            query,
            fixtures: Vec::new(),
        };
    }
    let mut rng = StdRng::seed_from_u64(query.threshold.to_bits());
    let fixtures = TOP_LEAGUES
        .iter()
        .map(|league| {
            let odd = 1.2 + rng.gen_range(0.0..1.5) + query.threshold / 4.0;
            attach_odd(demo_fixture(*league, 2, today), &query, Some(odd))
        })
        .collect();
    FilterizerResult { query, fixtures }
}
