//! Upstream data sources.
//!
//! A [`StatsSource`] answers a [`Request`] with raw records. [`HttpSource`]
//! talks to the statistics provider and the secondary web source over HTTP.

use std::{fmt, future::Future, time::Duration};

use courtside_core::{
  entity::{PlayerId, TeamId},
  record::RawRecord,
  season::SeasonId,
};
use reqwest::{
  Client, Url,
  header::{ACCEPT, REFERER, USER_AGENT},
};
use serde::{Deserialize, Serialize};

use crate::{Result, error::FetchError};

// ─── Requests ────────────────────────────────────────────────────────────────

/// Which retry policy governs a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
  ProviderApi,
  WebPage,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Request {
  Teams,
  Players { season: SeasonId },
  PlayerDetail { player_id: PlayerId },
  TeamGames { team_id: TeamId, season: SeasonId },
  PlayerGameLog { player_id: PlayerId, season: SeasonId },
  PlayerCareer { player_id: PlayerId },
  SalaryCap { season: SeasonId },
  Contracts { season: SeasonId },
}

impl Request {
  pub fn class(&self) -> OperationClass {
    match self {
      Self::SalaryCap { .. } | Self::Contracts { .. } => OperationClass::WebPage,
      _ => OperationClass::ProviderApi,
    }
  }
}

impl fmt::Display for Request {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Teams => f.write_str("teams"),
      Self::Players { season } => write!(f, "players {season}"),
      Self::PlayerDetail { player_id } => write!(f, "player #{player_id}"),
      Self::TeamGames { team_id, season } => {
        write!(f, "games of team #{team_id} in {season}")
      }
      Self::PlayerGameLog { player_id, season } => {
        write!(f, "game log of player #{player_id} in {season}")
      }
      Self::PlayerCareer { player_id } => write!(f, "career of player #{player_id}"),
      Self::SalaryCap { season } => write!(f, "salary cap {season}"),
      Self::Contracts { season } => write!(f, "contracts {season}"),
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// One decoded response: the rows that decoded, and an error for each row
/// that did not.
pub type Page = courtside_normalize::Normalized<RawRecord>;

pub trait StatsSource: Send + Sync {
  /// Fetch the rows answering `request`. An empty page is a valid answer. A
  /// malformed row is reported in the page; only an unusable body fails.
  fn fetch(
    &self,
    request: &Request,
  ) -> impl Future<Output = Result<Page, FetchError>> + Send;
}

// ─── HTTP ────────────────────────────────────────────────────────────────────

/// Connection settings for one upstream host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
  pub base_url:         String,
  pub api_key:          Option<String>,
  pub api_key_header:   String,
  /// Refuse to start without `api_key`.
  pub api_key_required: bool,
  pub user_agent:       String,
  pub referer:          Option<String>,
  pub timeout_secs:     u64,
}

const DEFAULT_USER_AGENT: &str =
  concat!("courtside/", env!("CARGO_PKG_VERSION"));

impl EndpointConfig {
  pub fn provider() -> Self {
    Self {
      base_url: "https://stats.nba.com/stats/".into(),
      referer: Some("https://www.nba.com/".into()),
      ..Self::default()
    }
  }

  pub fn web() -> Self {
    Self {
      base_url: "https://www.basketball-reference.com/".into(),
      timeout_secs: 60,
      ..Self::default()
    }
  }

  /// The base URL with a trailing slash, so relative joins extend its path.
  pub fn base(&self) -> std::result::Result<Url, FetchError> {
    let base = format!("{}/", self.base_url.trim_end_matches('/'));
    Url::parse(&base).map_err(|e| FetchError::InvalidUrl(format!("{base}: {e}")))
  }
}

impl Default for EndpointConfig {
  fn default() -> Self {
    Self {
      base_url:         String::new(),
      api_key:          None,
      api_key_header:   "x-api-key".into(),
      api_key_required: false,
      user_agent:       DEFAULT_USER_AGENT.into(),
      referer:          None,
      timeout_secs:     30,
    }
  }
}

/// A path relative to one endpoint's base URL, with its query.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Route {
  class: OperationClass,
  path:  String,
  query: Vec<(&'static str, String)>,
}

impl Route {
  fn api(path: &str, query: Vec<(&'static str, String)>) -> Self {
    Self { class: OperationClass::ProviderApi, path: path.into(), query }
  }

  fn web(path: String) -> Self {
    Self { class: OperationClass::WebPage, path, query: Vec::new() }
  }
}

fn route(request: &Request) -> Route {
  let league = || ("LeagueID", "00".to_string());
  let regular = || ("SeasonType", "Regular Season".to_string());

  match request {
    // The static team list is served as a JSON array next to the
    // statistics endpoints.
    Request::Teams => Route::api("teams.json", Vec::new()),
    Request::Players { season } => Route::api("commonallplayers", vec![
      league(),
      ("Season", season.to_string()),
      ("IsOnlyCurrentSeason", "1".into()),
    ]),
    Request::PlayerDetail { player_id } => {
      Route::api("commonplayerinfo", vec![league(), ("PlayerID", player_id.to_string())])
    }
    Request::TeamGames { team_id, season } => Route::api("leaguegamefinder", vec![
      league(),
      ("PlayerOrTeam", "T".into()),
      ("TeamID", team_id.to_string()),
      ("Season", season.to_string()),
      regular(),
    ]),
    Request::PlayerGameLog { player_id, season } => Route::api("playergamelog", vec![
      ("PlayerID", player_id.to_string()),
      ("Season", season.to_string()),
      regular(),
    ]),
    Request::PlayerCareer { player_id } => Route::api("playercareerstats", vec![
      league(),
      ("PlayerID", player_id.to_string()),
      ("PerMode", "Totals".into()),
    ]),
    Request::SalaryCap { season } => Route::web(format!("salary-cap/{season}.json")),
    Request::Contracts { season } => Route::web(format!("contracts/{season}.json")),
  }
}

/// [`StatsSource`] over HTTP.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpSource {
  client:   Client,
  provider: EndpointConfig,
  web:      EndpointConfig,
}

impl HttpSource {
  pub fn new(provider: EndpointConfig, web: EndpointConfig) -> Result<Self> {
    let client = Client::builder().build()?;
    Ok(Self { client, provider, web })
  }

  fn endpoint(&self, class: OperationClass) -> &EndpointConfig {
    match class {
      OperationClass::ProviderApi => &self.provider,
      OperationClass::WebPage => &self.web,
    }
  }

  /// Absolute URL and endpoint settings for `request`.
  fn url(
    &self,
    request: &Request,
  ) -> std::result::Result<(Url, &EndpointConfig), FetchError> {
    let route = route(request);
    let endpoint = self.endpoint(route.class);
    let mut url = endpoint
      .base()?
      .join(&route.path)
      .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", route.path)))?;
    if !route.query.is_empty() {
      url.query_pairs_mut().extend_pairs(route.query.iter().map(|(k, v)| (*k, v)));
    }
    Ok((url, endpoint))
  }
}

impl StatsSource for HttpSource {
  async fn fetch(&self, request: &Request) -> Result<Page, FetchError> {
    let (url, endpoint) = self.url(request)?;
    let shown = url.to_string();

    let mut req = self
      .client
      .get(url)
      .timeout(Duration::from_secs(endpoint.timeout_secs))
      .header(ACCEPT, "application/json")
      .header(USER_AGENT, &endpoint.user_agent);
    if let Some(referer) = &endpoint.referer {
      req = req.header(REFERER, referer);
    }
    if let Some(key) = &endpoint.api_key {
      req = req.header(endpoint.api_key_header.as_str(), key);
    }

    let resp = req.send().await.map_err(|e| classify(&shown, e))?;
    let status = resp.status();
    if !status.is_success() {
      return Err(FetchError::Status { url: shown, status: status.as_u16() });
    }
    let body: serde_json::Value =
      resp.json().await.map_err(|e| classify(&shown, e))?;
    Ok(courtside_normalize::records_from_json(&body)?)
  }
}

fn classify(url: &str, e: reqwest::Error) -> FetchError {
  let url = url.to_string();
  if e.is_timeout() {
    FetchError::Timeout { url }
  } else if e.is_connect() {
    FetchError::Connect { url, message: e.to_string() }
  } else if e.is_decode() {
    FetchError::Decode { url, message: e.to_string() }
  } else if let Some(status) = e.status() {
    FetchError::Status { url, status: status.as_u16() }
  } else {
    FetchError::Transport { url, message: e.to_string() }
  }
}
