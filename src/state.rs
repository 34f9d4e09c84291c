use std::collections::{BTreeMap, VecDeque};

use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::filterizer::{FilterizerQuery, FilterizerResult, OddCategory, THRESHOLDS};
use crate::image::ImageBook;
use crate::ticket::{TicketRequest, TicketSlip, format_odd, parse_odd_range};

pub const DATE_STRIP_DAYS: usize = 5;
const MAX_LOGS: usize = 200;
// The backend lists territories that must never be offered as countries.
const EXCLUDED_COUNTRIES: &[&str] = &["Crimea"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    pub code: Option<String>,
    pub flag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: u32,
    pub name: String,
    pub logo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddQuote {
    pub label: String,
    pub value: f64,
}

/// Market annotation attached to a fixture that is part of a ticket slip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketInfo {
    pub field: String,
    pub label: String,
    pub odd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u64,
    pub home_team: String,
    pub home_team_logo: String,
    pub away_team: String,
    pub away_team_logo: String,
    pub kickoff: String,
    pub league_name: String,
    pub league_logo: String,
    #[serde(default)]
    pub odds: BTreeMap<String, OddQuote>,
    #[serde(default)]
    pub ticket_info: Option<TicketInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamStats {
    pub avg_goals: f64,
    pub avg_cards: f64,
    pub avg_corners: f64,
    pub avg_offsides: f64,
    pub avg_fouls: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Analysis {
    pub home: TeamStats,
    pub away: TeamStats,
    pub combined: TeamStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketLine {
    pub fixture_id: u64,
    pub field: String,
    pub label: String,
    pub odd: Option<f64>,
}

/// Identifies one issued request. A response is applied only while its token
/// is still the one recorded on the panel that asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Fetched state keyed on the input that triggered the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<K, T> {
    pub key: K,
    pub token: RequestToken,
    pub state: LoadState<T>,
}

impl<K, T> Tracked<K, T> {
    pub fn loading(key: K, token: RequestToken) -> Self {
        Self {
            key,
            token,
            state: LoadState::Loading,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureQuery {
    League(u32),
    Date(NaiveDate),
}

impl FixtureQuery {
    pub fn describe(&self) -> String {
        match self {
            FixtureQuery::League(id) => format!("league {id}"),
            FixtureQuery::Date(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// What the fixture region shows. Ticket and filterizer results take the
/// region over; otherwise the list browses by league or date.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewMode {
    Browse,
    TicketView(TicketSlip),
    FilterizerView(FilterizerResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sport {
    Football,
    Ufc,
    Basketball,
    Tennis,
    Nfl,
}

impl Sport {
    pub const ALL: [Sport; 5] = [
        Sport::Football,
        Sport::Ufc,
        Sport::Basketball,
        Sport::Tennis,
        Sport::Nfl,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Sport::Football => "Football",
            Sport::Ufc => "UFC",
            Sport::Basketball => "Basketball",
            Sport::Tennis => "Tennis",
            Sport::Nfl => "NFL",
        }
    }

    pub fn has_coverage(self) -> bool {
        matches!(self, Sport::Football)
    }

    fn next(self) -> Self {
        match self {
            Sport::Football => Sport::Ufc,
            Sport::Ufc => Sport::Basketball,
            Sport::Basketball => Sport::Tennis,
            Sport::Tennis => Sport::Nfl,
            Sport::Nfl => Sport::Football,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Filter,
    Fixtures,
    Utility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtilityTab {
    Analysis,
    Ticket,
    Filterizer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketField {
    Min,
    Max,
}

#[derive(Debug, Clone)]
pub struct TicketForm {
    pub min_odd: String,
    pub max_odd: String,
    pub field: TicketField,
    pub pending: Option<RequestToken>,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FilterizerForm {
    pub category: OddCategory,
    pub threshold_idx: usize,
    pub pending: Option<RequestToken>,
    pub message: Option<String>,
}

impl FilterizerForm {
    pub fn query(&self) -> FilterizerQuery {
        let idx = self.threshold_idx.min(THRESHOLDS.len() - 1);
        FilterizerQuery {
            category: self.category,
            threshold: THRESHOLDS[idx],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterRow<'a> {
    Country(&'a Country),
    League(&'a League),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FixtureRegion<'a> {
    Unsupported(Sport),
    SelectPrompt,
    Loading(FixtureQuery),
    Empty,
    Fixtures(&'a [Fixture]),
    Ticket(&'a TicketSlip),
    Filterizer(&'a FilterizerResult),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalysisView<'a> {
    Collapsed,
    Loading(&'a Fixture),
    Failed(&'a Fixture),
    Ready(&'a Fixture, &'a Analysis),
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetCountries {
        token: RequestToken,
        result: Result<Vec<Country>, String>,
    },
    SetLeagues {
        token: RequestToken,
        country: String,
        result: Result<Vec<League>, String>,
    },
    SetFixtures {
        token: RequestToken,
        result: Result<Vec<Fixture>, String>,
    },
    SetAnalysis {
        token: RequestToken,
        fixture_id: u64,
        result: Result<Analysis, String>,
    },
    SetTicket {
        token: RequestToken,
        result: Result<TicketSlip, String>,
    },
    SetFilterizer {
        token: RequestToken,
        result: Result<FilterizerResult, String>,
    },
    ImageStatus {
        url: String,
        ok: bool,
    },
    Log(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCommand {
    FetchCountries {
        token: RequestToken,
    },
    FetchLeagues {
        token: RequestToken,
        country: String,
    },
    FetchFixtures {
        token: RequestToken,
        query: FixtureQuery,
    },
    FetchAnalysis {
        token: RequestToken,
        fixture_id: u64,
    },
    BuildTicket {
        token: RequestToken,
        request: TicketRequest,
    },
    RunFilterizer {
        token: RequestToken,
        query: FilterizerQuery,
    },
    ProbeImages {
        urls: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub today: NaiveDate,
    pub sport: Sport,
    pub focus: Pane,
    pub utility_tab: UtilityTab,
    pub countries: Option<Tracked<(), Vec<Country>>>,
    pub leagues: Option<Tracked<String, Vec<League>>>,
    pub selected_country: Option<Country>,
    pub selected_league: Option<League>,
    pub selected_date: Option<NaiveDate>,
    pub fixtures: Option<Tracked<FixtureQuery, Vec<Fixture>>>,
    pub selected_fixture: Option<Fixture>,
    pub analysis: Option<Tracked<u64, Analysis>>,
    pub view: ViewMode,
    pub ticket: TicketForm,
    pub filterizer: FilterizerForm,
    pub alert: Option<String>,
    pub search: String,
    pub search_active: bool,
    pub filter_selected: usize,
    pub fixture_selected: usize,
    pub images: ImageBook,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    next_token: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_today(Local::now().date_naive())
    }

    pub fn with_today(today: NaiveDate) -> Self {
        Self {
            today,
            sport: Sport::Football,
            focus: Pane::Filter,
            utility_tab: UtilityTab::Analysis,
            countries: None,
            leagues: None,
            selected_country: None,
            selected_league: None,
            selected_date: Some(today),
            fixtures: None,
            selected_fixture: None,
            analysis: None,
            view: ViewMode::Browse,
            ticket: TicketForm {
                min_odd: String::new(),
                max_odd: String::new(),
                field: TicketField::Min,
                pending: None,
                message: None,
            },
            filterizer: FilterizerForm {
                category: OddCategory::Goals,
                threshold_idx: 0,
                pending: None,
                message: None,
            },
            alert: None,
            search: String::new(),
            search_active: false,
            filter_selected: 0,
            fixture_selected: 0,
            images: ImageBook::default(),
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
            next_token: 0,
        }
    }

    fn issue_token(&mut self) -> RequestToken {
        self.next_token += 1;
        RequestToken(self.next_token)
    }

    /// Startup requests: the country list and today's top-league fixtures.
    pub fn bootstrap(&mut self) -> Vec<ProviderCommand> {
        let token = self.issue_token();
        self.countries = Some(Tracked::loading((), token));
        let mut cmds = vec![ProviderCommand::FetchCountries { token }];
        cmds.extend(self.sync_browse(true));
        cmds
    }

    pub fn browse_query(&self) -> Option<FixtureQuery> {
        if let Some(league) = &self.selected_league {
            return Some(FixtureQuery::League(league.id));
        }
        self.selected_date.map(FixtureQuery::Date)
    }

    fn sync_browse(&mut self, force: bool) -> Vec<ProviderCommand> {
        if !self.sport.has_coverage() || !matches!(self.view, ViewMode::Browse) {
            return Vec::new();
        }
        let Some(query) = self.browse_query() else {
            self.fixtures = None;
            self.fixture_selected = 0;
            return Vec::new();
        };
        if !force && self.fixtures.as_ref().is_some_and(|t| t.key == query) {
            return Vec::new();
        }
        let token = self.issue_token();
        self.fixtures = Some(Tracked::loading(query, token));
        self.fixture_selected = 0;
        vec![ProviderCommand::FetchFixtures { token, query }]
    }

    pub fn select_country(&mut self, country: Country) -> Vec<ProviderCommand> {
        if !self.sport.has_coverage() {
            return Vec::new();
        }
        self.reset_search();
        self.selected_league = None;

        if self
            .selected_country
            .as_ref()
            .is_some_and(|c| c.name == country.name)
        {
            self.selected_country = None;
            self.leagues = None;
            self.selected_date = Some(self.today);
            self.view = ViewMode::Browse;
            self.push_log(format!("[INFO] Country cleared: {}", country.name));
            return self.sync_browse(true);
        }

        self.selected_date = None;
        self.view = ViewMode::Browse;
        let token = self.issue_token();
        self.leagues = Some(Tracked::loading(country.name.clone(), token));
        self.push_log(format!("[INFO] Country selected: {}", country.name));
        let mut cmds = vec![ProviderCommand::FetchLeagues {
            token,
            country: country.name.clone(),
        }];
        self.selected_country = Some(country);
        cmds.extend(self.sync_browse(true));
        cmds
    }

    pub fn select_league(&mut self, league: League) -> Vec<ProviderCommand> {
        if !self.sport.has_coverage() {
            return Vec::new();
        }
        self.reset_search();

        if self
            .selected_league
            .as_ref()
            .is_some_and(|l| l.id == league.id)
        {
            self.push_log(format!("[INFO] League cleared: {}", league.name));
            self.selected_league = None;
            return self.sync_browse(true);
        }

        self.push_log(format!("[INFO] League selected: {}", league.name));
        self.selected_league = Some(league);
        self.selected_date = None;
        self.view = ViewMode::Browse;
        self.sync_browse(true)
    }

    pub fn select_date(&mut self, date: NaiveDate) -> Vec<ProviderCommand> {
        self.selected_date = Some(date);
        self.selected_league = None;
        self.view = ViewMode::Browse;
        self.sync_browse(true)
    }

    pub fn date_strip(&self) -> Vec<NaiveDate> {
        (0..DATE_STRIP_DAYS)
            .map(|offset| self.today + ChronoDuration::days(offset as i64))
            .collect()
    }

    pub fn shift_date(&mut self, step: i64) -> Vec<ProviderCommand> {
        let strip = self.date_strip();
        let last = strip.len() as i64 - 1;
        let base = self
            .selected_date
            .and_then(|d| strip.iter().position(|s| *s == d))
            .map(|idx| idx as i64)
            .unwrap_or(if step > 0 { -1 } else { last + 1 });
        let target = strip[(base + step).clamp(0, last) as usize];
        if self.selected_date == Some(target) && self.selected_league.is_none() {
            return Vec::new();
        }
        self.select_date(target)
    }

    pub fn cycle_sport(&mut self) -> Vec<ProviderCommand> {
        self.sport = self.sport.next();
        self.fixture_selected = 0;
        self.sync_browse(false)
    }

    pub fn filter_rows(&self) -> Vec<FilterRow<'_>> {
        let needle = self.search.trim();
        match &self.selected_country {
            Some(country) => {
                let mut rows = vec![FilterRow::Country(country)];
                if let Some(leagues) = self.leagues.as_ref().and_then(|t| t.state.ready()) {
                    rows.extend(
                        leagues
                            .iter()
                            .filter(|l| contains_ci(&l.name, needle))
                            .map(FilterRow::League),
                    );
                }
                rows
            }
            None => self
                .countries
                .as_ref()
                .and_then(|t| t.state.ready())
                .map(|countries| {
                    countries
                        .iter()
                        .filter(|c| contains_ci(&c.name, needle))
                        .map(FilterRow::Country)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn filter_loading(&self) -> bool {
        match &self.selected_country {
            Some(_) => self.leagues.as_ref().is_some_and(|t| t.state.is_loading()),
            None => self.countries.as_ref().is_some_and(|t| t.state.is_loading()),
        }
    }

    pub fn activate_filter_row(&mut self) -> Vec<ProviderCommand> {
        let row = match self.filter_rows().get(self.filter_selected) {
            Some(FilterRow::Country(c)) => FilterRowOwned::Country((*c).clone()),
            Some(FilterRow::League(l)) => FilterRowOwned::League((*l).clone()),
            None => return Vec::new(),
        };
        match row {
            FilterRowOwned::Country(country) => self.select_country(country),
            FilterRowOwned::League(league) => self.select_league(league),
        }
    }

    pub fn start_search(&mut self) {
        self.focus = Pane::Filter;
        self.search_active = true;
    }

    pub fn end_search(&mut self) {
        self.search_active = false;
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search.push(ch);
        self.filter_selected = 0;
    }

    pub fn pop_search_char(&mut self) {
        self.search.pop();
        self.filter_selected = 0;
    }

    fn reset_search(&mut self) {
        self.search.clear();
        self.search_active = false;
        self.filter_selected = 0;
    }

    pub fn visible_fixtures(&self) -> &[Fixture] {
        if !self.sport.has_coverage() {
            return &[];
        }
        match &self.view {
            ViewMode::TicketView(slip) => &slip.fixtures,
            ViewMode::FilterizerView(result) => &result.fixtures,
            ViewMode::Browse => {
                let query = self.browse_query();
                self.fixtures
                    .as_ref()
                    .filter(|t| Some(t.key) == query)
                    .and_then(|t| t.state.ready())
                    .map(|fixtures| fixtures.as_slice())
                    .unwrap_or(&[])
            }
        }
    }

    pub fn fixture_region(&self) -> FixtureRegion<'_> {
        if !self.sport.has_coverage() {
            return FixtureRegion::Unsupported(self.sport);
        }
        match &self.view {
            ViewMode::TicketView(slip) => FixtureRegion::Ticket(slip),
            ViewMode::FilterizerView(result) => FixtureRegion::Filterizer(result),
            ViewMode::Browse => {
                let Some(query) = self.browse_query() else {
                    return FixtureRegion::SelectPrompt;
                };
                let Some(tracked) = self.fixtures.as_ref().filter(|t| t.key == query) else {
                    return FixtureRegion::Loading(query);
                };
                match &tracked.state {
                    LoadState::Loading => FixtureRegion::Loading(query),
                    LoadState::Failed(_) => FixtureRegion::Empty,
                    LoadState::Ready(fixtures) if fixtures.is_empty() => FixtureRegion::Empty,
                    LoadState::Ready(fixtures) => FixtureRegion::Fixtures(fixtures),
                }
            }
        }
    }

    pub fn activate_fixture_row(&mut self) -> Vec<ProviderCommand> {
        let Some(fixture) = self.visible_fixtures().get(self.fixture_selected).cloned() else {
            return Vec::new();
        };
        self.select_fixture(fixture)
    }

    pub fn select_fixture(&mut self, fixture: Fixture) -> Vec<ProviderCommand> {
        if !self.sport.has_coverage() {
            return Vec::new();
        }
        if self
            .selected_fixture
            .as_ref()
            .is_some_and(|f| f.id == fixture.id)
        {
            self.clear_fixture();
            return Vec::new();
        }

        let token = self.issue_token();
        self.analysis = Some(Tracked::loading(fixture.id, token));
        self.utility_tab = UtilityTab::Analysis;
        let mut cmds = vec![ProviderCommand::FetchAnalysis {
            token,
            fixture_id: fixture.id,
        }];
        let urls: Vec<String> = [&fixture.home_team_logo, &fixture.away_team_logo]
            .into_iter()
            .filter(|url| self.images.needs_probe(url))
            .cloned()
            .collect();
        if !urls.is_empty() {
            cmds.push(ProviderCommand::ProbeImages { urls });
        }
        self.selected_fixture = Some(fixture);
        cmds
    }

    pub fn clear_fixture(&mut self) {
        self.selected_fixture = None;
        self.analysis = None;
    }

    pub fn analysis_view(&self) -> AnalysisView<'_> {
        let Some(fixture) = self.selected_fixture.as_ref() else {
            return AnalysisView::Collapsed;
        };
        match self.analysis.as_ref().filter(|t| t.key == fixture.id) {
            Some(Tracked {
                state: LoadState::Ready(analysis),
                ..
            }) => AnalysisView::Ready(fixture, analysis),
            Some(Tracked {
                state: LoadState::Failed(_),
                ..
            }) => AnalysisView::Failed(fixture),
            _ => AnalysisView::Loading(fixture),
        }
    }

    /// The utility pane grows while it has something to show and collapses
    /// back to its idle height otherwise.
    pub fn utility_expanded(&self) -> bool {
        match self.utility_tab {
            UtilityTab::Analysis => self.selected_fixture.is_some(),
            UtilityTab::Ticket => {
                self.ticket.pending.is_some() || matches!(self.view, ViewMode::TicketView(_))
            }
            UtilityTab::Filterizer => {
                self.filterizer.pending.is_some()
                    || matches!(self.view, ViewMode::FilterizerView(_))
            }
        }
    }

    pub fn ticket_input(&mut self, ch: char) {
        if !(ch.is_ascii_digit() || ch == '.') {
            return;
        }
        let field = match self.ticket.field {
            TicketField::Min => &mut self.ticket.min_odd,
            TicketField::Max => &mut self.ticket.max_odd,
        };
        if ch == '.' && field.contains('.') {
            return;
        }
        if field.len() < 8 {
            field.push(ch);
        }
    }

    pub fn ticket_backspace(&mut self) {
        match self.ticket.field {
            TicketField::Min => self.ticket.min_odd.pop(),
            TicketField::Max => self.ticket.max_odd.pop(),
        };
    }

    pub fn toggle_ticket_field(&mut self) {
        self.ticket.field = match self.ticket.field {
            TicketField::Min => TicketField::Max,
            TicketField::Max => TicketField::Min,
        };
    }

    pub fn submit_ticket(&mut self) -> Vec<ProviderCommand> {
        if self.ticket.pending.is_some() {
            return Vec::new();
        }
        if !self.sport.has_coverage() {
            self.ticket.message = Some(self.coming_soon());
            return Vec::new();
        }
        match parse_odd_range(&self.ticket.min_odd, &self.ticket.max_odd) {
            Ok(request) => {
                let token = self.issue_token();
                self.ticket.pending = Some(token);
                self.ticket.message = None;
                self.utility_tab = UtilityTab::Ticket;
                self.push_log(format!(
                    "[INFO] Ticket requested: {} to {}",
                    request.min_odd, request.max_odd
                ));
                vec![ProviderCommand::BuildTicket { token, request }]
            }
            Err(msg) => {
                self.ticket.message = Some(msg);
                Vec::new()
            }
        }
    }

    pub fn clear_ticket(&mut self) -> Vec<ProviderCommand> {
        self.ticket.pending = None;
        self.ticket.message = None;
        if !matches!(self.view, ViewMode::TicketView(_)) {
            return Vec::new();
        }
        self.return_to_today()
    }

    pub fn cycle_filterizer_category(&mut self, forward: bool) {
        self.filterizer.category = if forward {
            self.filterizer.category.next()
        } else {
            self.filterizer.category.prev()
        };
    }

    pub fn shift_filterizer_threshold(&mut self, step: i64) {
        let last = THRESHOLDS.len() as i64 - 1;
        self.filterizer.threshold_idx =
            (self.filterizer.threshold_idx as i64 + step).clamp(0, last) as usize;
    }

    pub fn submit_filterizer(&mut self) -> Vec<ProviderCommand> {
        if self.filterizer.pending.is_some() {
            return Vec::new();
        }
        if !self.sport.has_coverage() {
            self.filterizer.message = Some(self.coming_soon());
            return Vec::new();
        }
        let query = self.filterizer.query();
        let token = self.issue_token();
        self.filterizer.pending = Some(token);
        self.filterizer.message = None;
        self.utility_tab = UtilityTab::Filterizer;
        self.push_log(format!(
            "[INFO] Filterizer requested: {} {}",
            query.category.label(),
            query.odd_name()
        ));
        vec![ProviderCommand::RunFilterizer { token, query }]
    }

    pub fn clear_filterizer(&mut self) -> Vec<ProviderCommand> {
        self.filterizer.pending = None;
        self.filterizer.message = None;
        if !matches!(self.view, ViewMode::FilterizerView(_)) {
            return Vec::new();
        }
        self.return_to_today()
    }

    fn coming_soon(&self) -> String {
        format!("{} coverage is coming soon", self.sport.label())
    }

    /// Moves "today" forward when the wall clock crosses midnight. A browse
    /// pinned to the old today follows it.
    pub fn refresh_today(&mut self, today: NaiveDate) -> Vec<ProviderCommand> {
        if today == self.today {
            return Vec::new();
        }
        let previous = std::mem::replace(&mut self.today, today);
        self.push_log(format!("[INFO] Date rolled over to {today}"));
        if self.selected_league.is_none() && self.selected_date == Some(previous) {
            self.selected_date = Some(today);
            return self.sync_browse(true);
        }
        Vec::new()
    }

    fn return_to_today(&mut self) -> Vec<ProviderCommand> {
        self.view = ViewMode::Browse;
        self.selected_league = None;
        self.selected_date = Some(self.today);
        self.fixture_selected = 0;
        self.sync_browse(true)
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn cycle_focus(&mut self, forward: bool) {
        self.search_active = false;
        self.focus = match (self.focus, forward) {
            (Pane::Filter, true) => Pane::Fixtures,
            (Pane::Fixtures, true) => Pane::Utility,
            (Pane::Utility, true) => Pane::Filter,
            (Pane::Filter, false) => Pane::Utility,
            (Pane::Fixtures, false) => Pane::Filter,
            (Pane::Utility, false) => Pane::Fixtures,
        };
    }

    pub fn set_utility_tab(&mut self, tab: UtilityTab) {
        self.utility_tab = tab;
        self.focus = Pane::Utility;
    }

    pub fn select_next(&mut self) {
        match self.focus {
            Pane::Filter => {
                let total = self.filter_rows().len();
                self.filter_selected = step_index(self.filter_selected, total, true);
            }
            Pane::Fixtures => {
                let total = self.visible_fixtures().len();
                self.fixture_selected = step_index(self.fixture_selected, total, true);
            }
            Pane::Utility => match self.utility_tab {
                UtilityTab::Analysis => {}
                UtilityTab::Ticket => self.toggle_ticket_field(),
                UtilityTab::Filterizer => self.cycle_filterizer_category(true),
            },
        }
    }

    pub fn select_prev(&mut self) {
        match self.focus {
            Pane::Filter => {
                let total = self.filter_rows().len();
                self.filter_selected = step_index(self.filter_selected, total, false);
            }
            Pane::Fixtures => {
                let total = self.visible_fixtures().len();
                self.fixture_selected = step_index(self.fixture_selected, total, false);
            }
            Pane::Utility => match self.utility_tab {
                UtilityTab::Analysis => {}
                UtilityTab::Ticket => self.toggle_ticket_field(),
                UtilityTab::Filterizer => self.cycle_filterizer_category(false),
            },
        }
    }

    /// Enter on the focused pane.
    pub fn activate(&mut self) -> Vec<ProviderCommand> {
        match self.focus {
            Pane::Filter => self.activate_filter_row(),
            Pane::Fixtures => self.activate_fixture_row(),
            Pane::Utility => match self.utility_tab {
                UtilityTab::Analysis => Vec::new(),
                UtilityTab::Ticket => self.submit_ticket(),
                UtilityTab::Filterizer => self.submit_filterizer(),
            },
        }
    }

    fn clamp_filter_selection(&mut self) {
        let total = self.filter_rows().len();
        self.filter_selected = clamp_index(self.filter_selected, total);
    }

    fn clamp_fixture_selection(&mut self) {
        let total = self.visible_fixtures().len();
        self.fixture_selected = clamp_index(self.fixture_selected, total);
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

enum FilterRowOwned {
    Country(Country),
    League(League),
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetCountries { token, result } => {
            let result = result.map(|mut countries| {
                countries.retain(is_listed_country);
                countries
            });
            match settle(&mut state.countries, token, result) {
                None => note_stale("countries", token),
                Some(Ok(())) => state.clamp_filter_selection(),
                Some(Err(err)) => state.push_log(format!("[WARN] Countries fetch error: {err}")),
            }
        }
        Delta::SetLeagues {
            token,
            country,
            result,
        } => match settle(&mut state.leagues, token, result) {
            None => note_stale("leagues", token),
            Some(Ok(())) => state.clamp_filter_selection(),
            Some(Err(err)) => {
                state.push_log(format!("[WARN] Leagues fetch error for {country}: {err}"))
            }
        },
        Delta::SetFixtures { token, result } => match settle(&mut state.fixtures, token, result) {
            None => note_stale("fixtures", token),
            Some(Ok(())) => state.clamp_fixture_selection(),
            Some(Err(err)) => {
                state.fixture_selected = 0;
                state.push_log(format!("[WARN] Fixtures fetch error: {err}"));
            }
        },
        Delta::SetAnalysis {
            token,
            fixture_id,
            result,
        } => match settle(&mut state.analysis, token, result) {
            None => note_stale("analysis", token),
            Some(Ok(())) => {}
            Some(Err(err)) => {
                state.push_log(format!("[WARN] Analysis fetch error for {fixture_id}: {err}"))
            }
        },
        Delta::SetTicket { token, result } => {
            if state.ticket.pending != Some(token) {
                note_stale("ticket", token);
                return;
            }
            state.ticket.pending = None;
            match result {
                Ok(slip) if slip.is_empty() => {
                    state.ticket.message = Some("No ticket matched this odd range".to_string());
                }
                Ok(slip) => {
                    state.push_log(format!(
                        "[INFO] Ticket ready: {} lines @ {}",
                        slip.lines.len(),
                        format_odd(slip.total_odd())
                    ));
                    state.ticket.message = None;
                    state.view = ViewMode::TicketView(slip);
                    state.utility_tab = UtilityTab::Ticket;
                    state.fixture_selected = 0;
                }
                Err(err) => {
                    state.ticket.message = Some("Ticket request failed".to_string());
                    state.push_log(format!("[WARN] Ticket error: {err}"));
                }
            }
        }
        Delta::SetFilterizer { token, result } => {
            if state.filterizer.pending != Some(token) {
                note_stale("filterizer", token);
                return;
            }
            state.filterizer.pending = None;
            match result {
                Ok(result) if result.fixtures.is_empty() => {
                    state.alert = Some(format!(
                        "No games matched {} {}",
                        result.query.category.label(),
                        result.query.odd_name()
                    ));
                }
                Ok(result) => {
                    state.push_log(format!(
                        "[INFO] Filterizer matched {} games",
                        result.fixtures.len()
                    ));
                    state.filterizer.message = None;
                    state.view = ViewMode::FilterizerView(result);
                    state.fixture_selected = 0;
                }
                Err(err) => {
                    state.filterizer.message = Some("Filter request failed".to_string());
                    state.push_log(format!("[WARN] Filterizer error: {err}"));
                }
            }
        }
        Delta::ImageStatus { url, ok } => state.images.record(&url, ok),
        Delta::Log(msg) => state.push_log(msg),
    }
}

/// Applies a response to the panel slot when its token is still current.
/// Returns `None` for a superseded response.
fn settle<K, T>(
    slot: &mut Option<Tracked<K, T>>,
    token: RequestToken,
    result: Result<T, String>,
) -> Option<Result<(), String>> {
    let tracked = slot.as_mut().filter(|t| t.token == token)?;
    match result {
        Ok(value) => {
            tracked.state = LoadState::Ready(value);
            Some(Ok(()))
        }
        Err(err) => {
            tracked.state = LoadState::Failed(err.clone());
            Some(Err(err))
        }
    }
}

fn note_stale(panel: &str, token: RequestToken) {
    tracing::debug!(panel, token = token.0, "dropped stale response");
}

pub fn is_listed_country(country: &Country) -> bool {
    !EXCLUDED_COUNTRIES.contains(&country.name.as_str())
}

fn step_index(current: usize, total: usize, forward: bool) -> usize {
    if total == 0 {
        return 0;
    }
    if forward {
        (current + 1) % total
    } else if current == 0 {
        total - 1
    } else {
        current - 1
    }
}

fn clamp_index(current: usize, total: usize) -> usize {
    if total == 0 { 0 } else { current.min(total - 1) }
}

/// Case-insensitive substring search. ASCII input avoids allocating.
fn contains_ci(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if !haystack.is_ascii() || !needle.is_ascii() {
        return haystack.to_lowercase().contains(&needle.to_lowercase());
    }
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.len() > h.len() {
        return false;
    }
    h.windows(n.len())
        .any(|window| window.iter().zip(n).all(|(a, b)| a.eq_ignore_ascii_case(b)))
}

pub fn pane_label(pane: Pane) -> &'static str {
    match pane {
        Pane::Filter => "FILTER",
        Pane::Fixtures => "GAMES",
        Pane::Utility => "UTILITY",
    }
}
