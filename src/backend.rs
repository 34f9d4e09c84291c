use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::config::BackendConfig;
use crate::filterizer::{FilteredOdd, FilterizerQuery};
use crate::http_client::http_client_with_timeout;
use crate::state::{
    Analysis, Country, Fixture, FixtureQuery, League, OddQuote, TeamStats, TicketLine,
};
use crate::ticket::TicketRequest;

pub fn fetch_countries(cfg: &BackendConfig) -> Result<Vec<Country>> {
    let body = get_body(cfg, &cfg.endpoint("/countries/"))?;
    parse_countries_json(&body)
}

pub fn fetch_leagues(cfg: &BackendConfig, country: &str) -> Result<Vec<League>> {
    let path = format!("/leagues/{}", urlencoding::encode(country));
    let body = get_body(cfg, &cfg.endpoint(&path))?;
    parse_leagues_json(&body)
}

pub fn fixtures_path(query: &FixtureQuery) -> String {
    match query {
        FixtureQuery::League(id) => format!("/games/{id}"),
        FixtureQuery::Date(date) => {
            format!("/top_leagues_games_by_date/{}", date.format("%Y-%m-%d"))
        }
    }
}

pub fn fetch_fixtures(cfg: &BackendConfig, query: &FixtureQuery) -> Result<Vec<Fixture>> {
    let body = get_body(cfg, &cfg.endpoint(&fixtures_path(query)))?;
    parse_fixtures_json(&body)
}

pub fn fetch_analysis(cfg: &BackendConfig, fixture_id: u64) -> Result<Analysis> {
    let body = get_body(cfg, &cfg.endpoint(&format!("/analyze/{fixture_id}")))?;
    parse_analysis_json(&body)
}

pub fn fetch_ticket_lines(cfg: &BackendConfig, request: &TicketRequest) -> Result<Vec<TicketLine>> {
    let url = format!(
        "{}?min_odd={}&max_odd={}",
        cfg.endpoint("/ticket-creator/"),
        request.min_odd,
        request.max_odd
    );
    let body = get_body(cfg, &url)?;
    parse_ticket_json(&body)
}

pub fn fetch_fixture_detail(cfg: &BackendConfig, fixture_id: u64) -> Result<Fixture> {
    let body = get_body(cfg, &cfg.endpoint(&format!("/fixture/{fixture_id}/")))?;
    parse_fixture_detail_json(&body)
        .with_context(|| format!("fixture {fixture_id} detail"))
}

pub fn fetch_filtered_odds(cfg: &BackendConfig, query: &FilterizerQuery) -> Result<Vec<FilteredOdd>> {
    let url = format!(
        "{}?odd_id={}&odd_name={}&min_odd={}",
        cfg.endpoint("/filter-odds/"),
        query.category.odd_id(),
        urlencoding::encode(&query.odd_name()),
        query.min_odd_param()
    );
    let body = get_body(cfg, &url)?;
    parse_filter_odds_json(&body)
}

/// True when the URL answers with a success status.
pub fn probe_image(cfg: &BackendConfig, url: &str) -> bool {
    let Ok(client) = http_client_with_timeout(cfg.request_timeout_secs) else {
        return false;
    };
    match client.head(url).send() {
        Ok(resp) => resp.status().is_success(),
        Err(err) => {
            tracing::debug!(url, error = %err, "image probe failed");
            false
        }
    }
}

fn get_body(cfg: &BackendConfig, url: &str) -> Result<String> {
    let client = http_client_with_timeout(cfg.request_timeout_secs)?;
    tracing::debug!(url, "GET");
    let resp = client.get(url).send().context("request failed")?;
    let status = resp.status();
    if !status.is_success() {
        tracing::warn!(url, status = status.as_u16(), "backend returned error status");
        return Err(anyhow!("http {status}"));
    }
    resp.text().context("failed reading body")
}

fn parse_root(raw: &str, what: &str) -> Result<Option<Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let root = serde_json::from_str(trimmed).with_context(|| format!("invalid {what} json"))?;
    Ok(Some(root))
}

/// Lists come back bare or wrapped in an object.
fn list_items(root: &Value) -> &[Value] {
    if let Some(items) = root.as_array() {
        return items;
    }
    for key in ["data", "games", "fixtures", "results"] {
        if let Some(items) = root.get(key).and_then(Value::as_array) {
            return items;
        }
    }
    &[]
}

pub fn parse_countries_json(raw: &str) -> Result<Vec<Country>> {
    let Some(root) = parse_root(raw, "countries")? else {
        return Ok(Vec::new());
    };
    Ok(list_items(&root)
        .iter()
        .filter_map(|item| {
            let name = pick_string(item, &["name", "countryName"])?;
            if name.is_empty() {
                return None;
            }
            Some(Country {
                name,
                code: pick_string(item, &["code"]).filter(|s| !s.is_empty()),
                flag: pick_string(item, &["flag", "countryLogo"]).filter(|s| !s.is_empty()),
            })
        })
        .collect())
}

pub fn parse_leagues_json(raw: &str) -> Result<Vec<League>> {
    let Some(root) = parse_root(raw, "leagues")? else {
        return Ok(Vec::new());
    };
    Ok(list_items(&root)
        .iter()
        .filter_map(|item| {
            let id = pick_u32(item, &["leagueID", "league_id", "id"])?;
            Some(League {
                id,
                name: pick_string(item, &["name", "leagueName"]).unwrap_or_default(),
                logo: pick_string(item, &["logo", "leagueLogo"]).unwrap_or_default(),
            })
        })
        .collect())
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<Fixture>> {
    let Some(root) = parse_root(raw, "fixtures")? else {
        return Ok(Vec::new());
    };
    Ok(list_items(&root)
        .iter()
        .filter_map(|item| parse_fixture_value(item, &["league_name", "league"]))
        .collect())
}

/// The detail endpoint carries the league as a numeric id; it is shown as text.
pub fn parse_fixture_detail_json(raw: &str) -> Result<Fixture> {
    let root = parse_root(raw, "fixture")?.ok_or_else(|| anyhow!("empty fixture body"))?;
    let item = root
        .get("fixture")
        .filter(|v| v.is_object())
        .unwrap_or(&root);
    parse_fixture_value(item, &["league", "league_name"]).ok_or_else(|| anyhow!("fixture has no id"))
}

fn parse_fixture_value(item: &Value, league_keys: &[&str]) -> Option<Fixture> {
    let id = pick_u64(item, &["fixture_id", "fixtureID", "id"])?;
    Some(Fixture {
        id,
        home_team: pick_string(item, &["home_team", "homeTeam"]).unwrap_or_default(),
        home_team_logo: pick_string(item, &["home_team_logo"]).unwrap_or_default(),
        away_team: pick_string(item, &["away_team", "awayTeam"]).unwrap_or_default(),
        away_team_logo: pick_string(item, &["away_team_logo"]).unwrap_or_default(),
        kickoff: pick_string(item, &["date", "kickoff"]).unwrap_or_default(),
        league_name: pick_string(item, league_keys).unwrap_or_default(),
        league_logo: pick_string(item, &["league_logo"]).unwrap_or_default(),
        odds: parse_odds_map(item.get("odds")),
        ticket_info: None,
    })
}

fn parse_odds_map(value: Option<&Value>) -> BTreeMap<String, OddQuote> {
    let mut odds = BTreeMap::new();
    let Some(Value::Object(map)) = value else {
        return odds;
    };
    for (key, quote) in map {
        let Some(value) = pick_f64(quote, &["value", "odd"]) else {
            continue;
        };
        let label = pick_string(quote, &["label"]).unwrap_or_else(|| key.clone());
        odds.insert(key.clone(), OddQuote { label, value });
    }
    odds
}

pub fn parse_analysis_json(raw: &str) -> Result<Analysis> {
    let root = parse_root(raw, "analysis")?.ok_or_else(|| anyhow!("empty analysis body"))?;
    let side = |key: &str| -> Result<TeamStats> {
        let value = root
            .get(key)
            .filter(|v| v.is_object())
            .ok_or_else(|| anyhow!("analysis missing {key}"))?;
        Ok(parse_team_stats(value))
    };
    Ok(Analysis {
        home: side("home_team")?,
        away: side("away_team")?,
        combined: side("combined")?,
    })
}

fn parse_team_stats(value: &Value) -> TeamStats {
    TeamStats {
        avg_goals: pick_f64(value, &["avg_goals"]).unwrap_or(0.0),
        avg_cards: pick_f64(value, &["avg_cards"]).unwrap_or(0.0),
        avg_corners: pick_f64(value, &["avg_corners"]).unwrap_or(0.0),
        avg_offsides: pick_f64(value, &["avg_offsides"]).unwrap_or(0.0),
        avg_fouls: pick_f64(value, &["avg_fouls"]).unwrap_or(0.0),
    }
}

/// Reads the ticket lines. The backend's own `total_odd` is not used; the
/// total is recomputed from the lines.
pub fn parse_ticket_json(raw: &str) -> Result<Vec<TicketLine>> {
    let Some(root) = parse_root(raw, "ticket")? else {
        return Ok(Vec::new());
    };
    let items = root
        .get("ticket")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_else(|| list_items(&root));
    Ok(items
        .iter()
        .filter_map(|item| {
            Some(TicketLine {
                fixture_id: pick_u64(item, &["fixture_id", "fixtureID"])?,
                field: pick_string(item, &["field"]).unwrap_or_default(),
                label: pick_string(item, &["label"]).unwrap_or_default(),
                odd: pick_f64(item, &["odd"]),
            })
        })
        .collect())
}

pub fn parse_filter_odds_json(raw: &str) -> Result<Vec<FilteredOdd>> {
    let Some(root) = parse_root(raw, "filter-odds")? else {
        return Ok(Vec::new());
    };
    Ok(list_items(&root)
        .iter()
        .filter_map(|item| {
            Some(FilteredOdd {
                fixture_id: pick_u64(item, &["fixture_id", "fixtureID"])?,
                odd: pick_f64(item, &["odd", "odd_value"]),
            })
        })
        .collect())
}

fn pick_string(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(v) = value.get(*key) {
            if let Some(s) = as_string(v) {
                return Some(s);
            }
        }
    }
    None
}

fn pick_u64(value: &Value, keys: &[&str]) -> Option<u64> {
    for key in keys {
        if let Some(v) = value.get(*key) {
            if let Some(num) = v.as_u64() {
                return Some(num);
            }
            if let Some(s) = v.as_str() {
                if let Ok(num) = s.trim().parse::<u64>() {
                    return Some(num);
                }
            }
        }
    }
    None
}

fn pick_u32(value: &Value, keys: &[&str]) -> Option<u32> {
    pick_u64(value, keys).and_then(|num| u32::try_from(num).ok())
}

fn pick_f64(value: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        if let Some(v) = value.get(*key) {
            if let Some(num) = v.as_f64() {
                return Some(num);
            }
            if let Some(s) = v.as_str() {
                if let Ok(num) = s.trim().parse::<f64>() {
                    return Some(num);
                }
            }
        }
    }
    None
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => match map.get("name") {
            Some(Value::String(name)) => Some(name.trim().to_string()),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_path_by_query() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(fixtures_path(&FixtureQuery::League(40)), "/games/40");
        assert_eq!(
            fixtures_path(&FixtureQuery::Date(date)),
            "/top_leagues_games_by_date/2024-03-09"
        );
    }

    #[test]
    fn empty_body_is_empty_list() {
        assert!(parse_countries_json("").unwrap().is_empty());
        assert!(parse_fixtures_json("null").unwrap().is_empty());
        assert!(parse_analysis_json("").is_err());
    }
}
