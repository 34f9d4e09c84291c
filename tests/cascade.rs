use std::collections::BTreeMap;

use chrono::NaiveDate;

use betai_terminal::state::{
    AnalysisView, AppState, Country, Delta, FilterRow, Fixture, FixtureQuery, FixtureRegion,
    League, ProviderCommand, RequestToken, Sport, TeamStats, Analysis, UtilityTab, ViewMode,
    apply_delta,
};
use betai_terminal::filterizer::FilterizerQuery;
use betai_terminal::stats::analysis_cards;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date")
}

fn country(name: &str) -> Country {
    Country {
        name: name.to_string(),
        code: None,
        flag: None,
    }
}

fn league(id: u32, name: &str) -> League {
    League {
        id,
        name: name.to_string(),
        logo: String::new(),
    }
}

fn fixture(id: u64, home: &str, away: &str) -> Fixture {
    Fixture {
        id,
        home_team: home.to_string(),
        home_team_logo: format!("https://img.test/{id}/home.png"),
        away_team: away.to_string(),
        away_team_logo: format!("https://img.test/{id}/away.png"),
        kickoff: "2024-03-09T15:00:00+00:00".to_string(),
        league_name: "Championship".to_string(),
        league_logo: String::new(),
        odds: BTreeMap::new(),
        ticket_info: None,
    }
}

fn stats(goals: f64) -> TeamStats {
    TeamStats {
        avg_goals: goals,
        avg_cards: 2.0,
        avg_corners: 5.0,
        avg_offsides: 1.5,
        avg_fouls: 11.0,
    }
}

fn fixtures_fetch(cmds: &[ProviderCommand]) -> Option<(RequestToken, FixtureQuery)> {
    cmds.iter().find_map(|cmd| match cmd {
        ProviderCommand::FetchFixtures { token, query } => Some((*token, *query)),
        _ => None,
    })
}

fn leagues_fetch(cmds: &[ProviderCommand]) -> Option<(RequestToken, String)> {
    cmds.iter().find_map(|cmd| match cmd {
        ProviderCommand::FetchLeagues { token, country } => Some((*token, country.clone())),
        _ => None,
    })
}

fn analysis_fetch(cmds: &[ProviderCommand]) -> Option<(RequestToken, u64)> {
    cmds.iter().find_map(|cmd| match cmd {
        ProviderCommand::FetchAnalysis { token, fixture_id } => Some((*token, *fixture_id)),
        _ => None,
    })
}

fn loaded_state() -> AppState {
    let mut state = AppState::with_today(today());
    let cmds = state.bootstrap();
    let token = cmds
        .iter()
        .find_map(|cmd| match cmd {
            ProviderCommand::FetchCountries { token } => Some(*token),
            _ => None,
        })
        .expect("countries fetch");
    apply_delta(
        &mut state,
        Delta::SetCountries {
            token,
            result: Ok(vec![country("England"), country("Crimea"), country("Spain")]),
        },
    );
    state
}

#[test]
fn bootstrap_requests_countries_and_todays_games() {
    let mut state = AppState::with_today(today());
    let cmds = state.bootstrap();

    assert!(matches!(cmds[0], ProviderCommand::FetchCountries { .. }));
    let (_, query) = fixtures_fetch(&cmds).expect("today's fixtures");
    assert_eq!(query, FixtureQuery::Date(today()));
    assert_eq!(state.fixture_region(), FixtureRegion::Loading(query));
}

#[test]
fn crimea_is_never_listed() {
    let state = loaded_state();
    let rows = state.filter_rows();
    let names: Vec<&str> = rows
        .iter()
        .map(|row| match row {
            FilterRow::Country(c) => c.name.as_str(),
            FilterRow::League(l) => l.name.as_str(),
        })
        .collect();
    assert_eq!(names, ["England", "Spain"]);
}

#[test]
fn search_matches_case_insensitively() {
    let mut state = loaded_state();
    for ch in "SPA".chars() {
        state.push_search_char(ch);
    }
    let rows = state.filter_rows();
    assert_eq!(rows.len(), 1);
    assert!(matches!(rows[0], FilterRow::Country(c) if c.name == "Spain"));
}

#[test]
fn england_to_championship_to_analysis() {
    let mut state = loaded_state();

    let cmds = state.select_country(country("England"));
    let (league_token, name) = leagues_fetch(&cmds).expect("leagues fetch");
    assert_eq!(name, "England");
    assert!(state.selected_date.is_none());
    assert_eq!(state.fixture_region(), FixtureRegion::SelectPrompt);

    apply_delta(
        &mut state,
        Delta::SetLeagues {
            token: league_token,
            country: "England".to_string(),
            result: Ok(vec![league(39, "Premier League"), league(40, "Championship")]),
        },
    );
    let rows = state.filter_rows();
    assert_eq!(rows.len(), 3);
    assert!(matches!(rows[0], FilterRow::Country(c) if c.name == "England"));

    let cmds = state.select_league(league(40, "Championship"));
    let (fixtures_token, query) = fixtures_fetch(&cmds).expect("fixtures fetch");
    assert_eq!(query, FixtureQuery::League(40));

    apply_delta(
        &mut state,
        Delta::SetFixtures {
            token: fixtures_token,
            result: Ok(vec![fixture(1, "Leeds", "Sunderland"), fixture(2, "Norwich", "Hull")]),
        },
    );
    assert_eq!(state.visible_fixtures().len(), 2);

    let cmds = state.select_fixture(fixture(1, "Leeds", "Sunderland"));
    let (analysis_token, fixture_id) = analysis_fetch(&cmds).expect("analysis fetch");
    assert_eq!(fixture_id, 1);
    assert!(cmds.iter().any(|cmd| matches!(
        cmd,
        ProviderCommand::ProbeImages { urls } if urls.len() == 2
    )));
    assert!(matches!(state.analysis_view(), AnalysisView::Loading(_)));
    assert!(state.utility_expanded());

    apply_delta(
        &mut state,
        Delta::SetAnalysis {
            token: analysis_token,
            fixture_id: 1,
            result: Ok(Analysis {
                home: stats(1.0),
                away: stats(3.0),
                combined: stats(4.0),
            }),
        },
    );
    let AnalysisView::Ready(selected, analysis) = state.analysis_view() else {
        panic!("analysis should be ready");
    };
    let cards = analysis_cards(selected, analysis);
    assert_eq!(cards[0].title, "Leeds");
    assert_eq!(cards[1].title, "Sunderland");
    assert_eq!(cards[2].title, "Combined");
    assert_eq!(cards[0].bars[0].percent, 50.0);
    assert_eq!(cards[1].bars[0].percent, 100.0);
    assert_eq!(cards[2].bars[0].percent, 100.0);
}

#[test]
fn toggling_country_off_returns_to_today() {
    let mut state = loaded_state();
    state.select_country(country("England"));
    state.select_league(league(40, "Championship"));

    let cmds = state.select_country(country("England"));
    assert!(state.selected_country.is_none());
    assert!(state.selected_league.is_none());
    assert!(state.leagues.is_none());
    assert_eq!(state.selected_date, Some(today()));
    let (_, query) = fixtures_fetch(&cmds).expect("today's fixtures");
    assert_eq!(query, FixtureQuery::Date(today()));
}

#[test]
fn league_takes_precedence_then_date_replaces_it() {
    let mut state = loaded_state();
    state.select_country(country("England"));

    state.select_league(league(39, "Premier League"));
    assert!(state.selected_date.is_none());
    assert_eq!(state.browse_query(), Some(FixtureQuery::League(39)));

    let next_day = today().succ_opt().expect("next day");
    let cmds = state.select_date(next_day);
    assert!(state.selected_league.is_none());
    assert_eq!(
        fixtures_fetch(&cmds).map(|(_, q)| q),
        Some(FixtureQuery::Date(next_day))
    );
}

#[test]
fn toggling_league_off_leaves_a_prompt() {
    let mut state = loaded_state();
    state.select_country(country("England"));
    state.select_league(league(39, "Premier League"));

    let cmds = state.select_league(league(39, "Premier League"));
    assert!(cmds.is_empty());
    assert!(state.selected_league.is_none());
    assert!(state.selected_date.is_none());
    assert_eq!(state.fixture_region(), FixtureRegion::SelectPrompt);
}

#[test]
fn reselecting_a_fixture_clears_it() {
    let mut state = loaded_state();
    state.select_fixture(fixture(5, "Ajax", "Porto"));
    let cmds = state.select_fixture(fixture(5, "Ajax", "Porto"));

    assert!(cmds.is_empty());
    assert!(state.selected_fixture.is_none());
    assert_eq!(state.analysis_view(), AnalysisView::Collapsed);
}

#[test]
fn date_strip_starts_today_and_clamps() {
    let mut state = loaded_state();
    let strip = state.date_strip();
    assert_eq!(strip.len(), 5);
    assert_eq!(strip[0], today());

    assert!(state.shift_date(-1).is_empty());
    for _ in 0..10 {
        state.shift_date(1);
    }
    assert_eq!(state.selected_date, Some(strip[4]));
}

#[test]
fn failed_fixture_fetch_renders_empty() {
    let mut state = AppState::with_today(today());
    let cmds = state.bootstrap();
    let (token, _) = fixtures_fetch(&cmds).expect("fixtures fetch");

    apply_delta(
        &mut state,
        Delta::SetFixtures {
            token,
            result: Err("http 500".to_string()),
        },
    );
    assert_eq!(state.fixture_region(), FixtureRegion::Empty);
    assert!(state.logs.iter().any(|line| line.contains("http 500")));
}

#[test]
fn unsupported_sport_shows_coming_soon() {
    let mut state = loaded_state();
    let cmds = state.cycle_sport();
    assert!(cmds.is_empty());
    assert_eq!(state.sport, Sport::Ufc);
    assert_eq!(state.fixture_region(), FixtureRegion::Unsupported(Sport::Ufc));
    assert!(state.visible_fixtures().is_empty());

    for _ in 0..4 {
        state.cycle_sport();
    }
    assert_eq!(state.sport, Sport::Football);
    assert!(matches!(state.fixture_region(), FixtureRegion::Loading(_)));
}

#[test]
fn ticket_input_is_validated_before_sending() {
    let mut state = loaded_state();
    state.ticket.min_odd = "5".to_string();
    state.ticket.max_odd = "2".to_string();

    let cmds = state.submit_ticket();
    assert!(cmds.is_empty());
    assert!(state.ticket.pending.is_none());
    assert!(state.ticket.message.is_some());
}

#[test]
fn ticket_result_takes_over_and_clear_returns_to_today() {
    let mut state = loaded_state();
    state.select_country(country("England"));
    state.select_league(league(40, "Championship"));
    state.ticket.min_odd = "2".to_string();
    state.ticket.max_odd = "10".to_string();

    let cmds = state.submit_ticket();
    let token = match cmds.as_slice() {
        [ProviderCommand::BuildTicket { token, request }] => {
            assert_eq!(request.min_odd, 2.0);
            assert_eq!(request.max_odd, 10.0);
            *token
        }
        other => panic!("unexpected commands: {other:?}"),
    };
    assert_eq!(state.utility_tab, UtilityTab::Ticket);

    let slip = betai_terminal::ticket::TicketSlip {
        lines: Vec::new(),
        fixtures: vec![fixture(9, "PSG", "Juventus")],
    };
    apply_delta(&mut state, Delta::SetTicket { token, result: Ok(slip) });
    assert!(matches!(state.view, ViewMode::TicketView(_)));
    assert!(matches!(state.fixture_region(), FixtureRegion::Ticket(_)));
    assert_eq!(state.visible_fixtures().len(), 1);

    let cmds = state.clear_ticket();
    assert_eq!(state.view, ViewMode::Browse);
    assert!(state.selected_league.is_none());
    assert_eq!(state.selected_date, Some(today()));
    assert_eq!(
        fixtures_fetch(&cmds).map(|(_, q)| q),
        Some(FixtureQuery::Date(today()))
    );
}

#[test]
fn empty_ticket_keeps_browsing_with_a_message() {
    let mut state = loaded_state();
    state.ticket.min_odd = "1.1".to_string();
    state.ticket.max_odd = "1.2".to_string();
    let token = match state.submit_ticket().as_slice() {
        [ProviderCommand::BuildTicket { token, .. }] => *token,
        other => panic!("unexpected commands: {other:?}"),
    };

    apply_delta(
        &mut state,
        Delta::SetTicket {
            token,
            result: Ok(Default::default()),
        },
    );
    assert_eq!(state.view, ViewMode::Browse);
    assert!(state.ticket.pending.is_none());
    assert_eq!(
        state.ticket.message.as_deref(),
        Some("No ticket matched this odd range")
    );
}

#[test]
fn empty_filterizer_raises_alert() {
    let mut state = loaded_state();
    state.shift_filterizer_threshold(100);
    let cmds = state.submit_filterizer();
    let (token, query) = match cmds.as_slice() {
        [ProviderCommand::RunFilterizer { token, query }] => (*token, *query),
        other => panic!("unexpected commands: {other:?}"),
    };
    assert_eq!(query.odd_name(), "Over 10.5");

    apply_delta(
        &mut state,
        Delta::SetFilterizer {
            token,
            result: Ok(betai_terminal::filterizer::FilterizerResult {
                query,
                fixtures: Vec::new(),
            }),
        },
    );
    assert_eq!(state.view, ViewMode::Browse);
    assert!(state.alert.is_some());
    state.dismiss_alert();
    assert!(state.alert.is_none());
}

#[test]
fn clearing_inactive_ticket_does_not_refetch() {
    let mut state = loaded_state();
    state.select_country(country("England"));
    state.select_league(league(40, "Championship"));

    let cmds = state.clear_ticket();
    assert!(cmds.is_empty());
    assert_eq!(state.browse_query(), Some(FixtureQuery::League(40)));
}

#[test]
fn unsupported_sport_issues_no_fetches() {
    let mut state = loaded_state();
    state.cycle_sport();
    assert_eq!(state.sport, Sport::Ufc);

    assert!(state.select_country(country("England")).is_empty());
    assert!(state.selected_country.is_none());
    assert!(state.select_league(league(40, "Championship")).is_empty());
    assert!(state.select_fixture(fixture(1, "Leeds", "Sunderland")).is_empty());
    assert!(state.selected_fixture.is_none());

    state.ticket.min_odd = "2".to_string();
    state.ticket.max_odd = "10".to_string();
    assert!(state.submit_ticket().is_empty());
    assert!(state.ticket.pending.is_none());
    assert_eq!(
        state.ticket.message.as_deref(),
        Some("UFC coverage is coming soon")
    );
    assert!(state.submit_filterizer().is_empty());
    assert!(state.filterizer.pending.is_none());
}

#[test]
fn midnight_rollover_moves_today_forward() {
    let mut state = loaded_state();
    let tomorrow = today().succ_opt().expect("valid date");

    assert!(state.refresh_today(today()).is_empty());
    let cmds = state.refresh_today(tomorrow);
    assert_eq!(state.today, tomorrow);
    assert_eq!(state.date_strip()[0], tomorrow);
    assert_eq!(state.selected_date, Some(tomorrow));
    assert_eq!(
        fixtures_fetch(&cmds).map(|(_, q)| q),
        Some(FixtureQuery::Date(tomorrow))
    );

    state.select_country(country("England"));
    let cmds = state.select_country(country("England"));
    assert_eq!(state.selected_date, Some(tomorrow));
    assert_eq!(
        fixtures_fetch(&cmds).map(|(_, q)| q),
        Some(FixtureQuery::Date(tomorrow))
    );
}

#[test]
fn rollover_leaves_a_league_browse_alone() {
    let mut state = loaded_state();
    state.select_country(country("England"));
    state.select_league(league(40, "Championship"));

    let tomorrow = today().succ_opt().expect("valid date");
    assert!(state.refresh_today(tomorrow).is_empty());
    assert_eq!(state.browse_query(), Some(FixtureQuery::League(40)));
}

fn run_filterizer(state: &mut AppState) -> (RequestToken, FilterizerQuery) {
    match state.submit_filterizer().as_slice() {
        [ProviderCommand::RunFilterizer { token, query }] => (*token, *query),
        other => panic!("unexpected commands: {other:?}"),
    }
}

#[test]
fn empty_filterizer_clears_pending() {
    let mut state = loaded_state();
    let (token, query) = run_filterizer(&mut state);
    assert!(state.filterizer.pending.is_some());
    assert!(state.submit_filterizer().is_empty());

    apply_delta(
        &mut state,
        Delta::SetFilterizer {
            token,
            result: Ok(betai_terminal::filterizer::FilterizerResult {
                query,
                fixtures: Vec::new(),
            }),
        },
    );
    assert!(state.filterizer.pending.is_none());
    assert_eq!(state.alert.as_deref(), Some("No games matched Goals Over 0.5"));

    // A fresh run is accepted once the previous one settled.
    state.dismiss_alert();
    assert!(!state.submit_filterizer().is_empty());
}

#[test]
fn failed_filterizer_clears_pending() {
    let mut state = loaded_state();
    let (token, _) = run_filterizer(&mut state);

    apply_delta(
        &mut state,
        Delta::SetFilterizer {
            token,
            result: Err("http 502".to_string()),
        },
    );
    assert!(state.filterizer.pending.is_none());
    assert_eq!(state.view, ViewMode::Browse);
    assert_eq!(
        state.filterizer.message.as_deref(),
        Some("Filter request failed")
    );
    assert!(state.logs.iter().any(|line| line.contains("http 502")));
}

#[test]
fn filterizer_result_takes_over_and_clear_returns_to_today() {
    let mut state = loaded_state();
    state.select_country(country("England"));
    state.select_league(league(40, "Championship"));
    let (token, query) = run_filterizer(&mut state);

    apply_delta(
        &mut state,
        Delta::SetFilterizer {
            token,
            result: Ok(betai_terminal::filterizer::FilterizerResult {
                query,
                fixtures: vec![fixture(5, "Leeds", "Hull"), fixture(6, "Stoke", "Luton")],
            }),
        },
    );
    assert!(state.filterizer.pending.is_none());
    assert!(matches!(state.view, ViewMode::FilterizerView(_)));
    assert!(matches!(state.fixture_region(), FixtureRegion::Filterizer(_)));
    assert_eq!(state.visible_fixtures().len(), 2);

    let cmds = state.clear_filterizer();
    assert_eq!(state.view, ViewMode::Browse);
    assert!(state.selected_league.is_none());
    assert_eq!(state.selected_date, Some(today()));
    assert_eq!(
        fixtures_fetch(&cmds).map(|(_, q)| q),
        Some(FixtureQuery::Date(today()))
    );
}

#[test]
fn ticket_result_replaces_filterizer_view() {
    let mut state = loaded_state();
    let (token, query) = run_filterizer(&mut state);
    apply_delta(
        &mut state,
        Delta::SetFilterizer {
            token,
            result: Ok(betai_terminal::filterizer::FilterizerResult {
                query,
                fixtures: vec![fixture(5, "Leeds", "Hull")],
            }),
        },
    );
    assert!(matches!(state.view, ViewMode::FilterizerView(_)));

    state.ticket.min_odd = "2".to_string();
    state.ticket.max_odd = "10".to_string();
    let token = match state.submit_ticket().as_slice() {
        [ProviderCommand::BuildTicket { token, .. }] => *token,
        other => panic!("unexpected commands: {other:?}"),
    };
    let slip = betai_terminal::ticket::TicketSlip {
        lines: Vec::new(),
        fixtures: vec![fixture(9, "PSG", "Juventus")],
    };
    apply_delta(&mut state, Delta::SetTicket { token, result: Ok(slip) });

    assert!(matches!(state.fixture_region(), FixtureRegion::Ticket(_)));
    assert_eq!(state.visible_fixtures()[0].id, 9);
}

#[test]
fn selecting_a_country_leaves_the_filterizer_view() {
    let mut state = loaded_state();
    let (token, query) = run_filterizer(&mut state);
    apply_delta(
        &mut state,
        Delta::SetFilterizer {
            token,
            result: Ok(betai_terminal::filterizer::FilterizerResult {
                query,
                fixtures: vec![fixture(5, "Leeds", "Hull")],
            }),
        },
    );

    state.select_country(country("England"));
    assert_eq!(state.view, ViewMode::Browse);
    assert_eq!(state.fixture_region(), FixtureRegion::SelectPrompt);
}
