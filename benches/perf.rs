use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use chrono::NaiveDate;

use betai_terminal::backend::{parse_countries_json, parse_fixtures_json};
use betai_terminal::state::{AppState, Country, Delta, ProviderCommand, apply_delta};

fn fixtures_json(count: usize) -> String {
    let rows = (0..count)
        .map(|idx| {
            format!(
                r#"{{"fixture_id": {id}, "home_team": "Home {idx}", "home_team_logo": "https://img.test/{id}/h.png", "away_team": "Away {idx}", "away_team_logo": "https://img.test/{id}/a.png", "date": "2024-03-09T15:00:00+00:00", "league_name": "Championship", "league_logo": "", "odds": {{"goals": {{"label": "Over 2.5", "value": 1.9}}}}}}"#,
                id = 1_000_000 + idx
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("[{rows}]")
}

fn countries_json(count: usize) -> String {
    let rows = (0..count)
        .map(|idx| format!(r#"{{"name": "Country {idx}", "code": "C{idx}", "flag": null}}"#))
        .collect::<Vec<_>>()
        .join(",");
    format!("[{rows}]")
}

fn bench_fixture_parse(c: &mut Criterion) {
    let raw = fixtures_json(400);
    c.bench_function("fixtures_parse_400", |b| {
        b.iter(|| {
            let fixtures = parse_fixtures_json(black_box(&raw)).unwrap();
            black_box(fixtures.len());
        })
    });
}

fn bench_country_search(c: &mut Criterion) {
    let countries: Vec<Country> = parse_countries_json(&countries_json(250)).unwrap();
    let mut state = AppState::with_today(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    let token = state
        .bootstrap()
        .into_iter()
        .find_map(|cmd| match cmd {
            ProviderCommand::FetchCountries { token } => Some(token),
            _ => None,
        })
        .unwrap();
    apply_delta(
        &mut state,
        Delta::SetCountries {
            token,
            result: Ok(countries),
        },
    );
    for ch in "try 1".chars() {
        state.push_search_char(ch);
    }

    c.bench_function("filter_rows_search_250", |b| {
        b.iter(|| {
            let rows = state.filter_rows();
            black_box(rows.len());
        })
    });
}

criterion_group!(benches, bench_fixture_parse, bench_country_search);
criterion_main!(benches);
