//! Value metrics derived from persisted season statistics and compensation.
//!
//! Pure functions only. The weights and per-position baselines are rough
//! approximations and are therefore configuration ([`MetricConfig`]) rather
//! than constants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  entity::{PlayerId, Shooting, StatCounts, ValueAnalysis},
  season::SeasonId,
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Per-game rates. `None` means the rate could not be derived.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerGameRates {
  pub points:    Option<f64>,
  pub rebounds:  Option<f64>,
  pub assists:   Option<f64>,
  pub steals:    Option<f64>,
  pub blocks:    Option<f64>,
  pub turnovers: Option<f64>,
}

impl PerGameRates {
  /// Divide season totals by games played; all rates are absent when no
  /// games were played.
  pub fn from_totals(totals: &StatCounts, games_played: i32) -> Self {
    if games_played <= 0 {
      return Self::default();
    }
    let gp = f64::from(games_played);
    let rate = |total: i64| Some(total as f64 / gp);
    Self {
      points:    rate(totals.points),
      rebounds:  rate(totals.rebounds),
      assists:   rate(totals.assists),
      steals:    rate(totals.steals),
      blocks:    rate(totals.blocks),
      turnovers: rate(totals.turnovers),
    }
  }
}

/// Everything the calculator needs for one `(player, season)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueInput {
  pub player_id:    PlayerId,
  pub season_id:    SeasonId,
  pub position:     Option<String>,
  pub games_played: i32,
  pub rates:        PerGameRates,
  pub shooting:     Shooting,
  /// Compensation in whole dollars; `None` when no contract is known.
  pub salary:       Option<i64>,
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Linear weights for the composite improvement score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImprovementWeights {
  pub points:    f64,
  pub rebounds:  f64,
  pub assists:   f64,
  pub steals:    f64,
  pub blocks:    f64,
  pub turnovers: f64,
}

impl Default for ImprovementWeights {
  fn default() -> Self {
    Self {
      points:    1.0,
      rebounds:  0.8,
      assists:   0.9,
      steals:    1.2,
      blocks:    1.1,
      turnovers: -0.8,
    }
  }
}

/// Weights for the efficiency blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EfficiencyWeights {
  pub field_goal:  f64,
  pub three_point: f64,
  pub free_throw:  f64,
  pub performance: f64,
}

impl Default for EfficiencyWeights {
  fn default() -> Self {
    Self {
      field_goal:  0.35,
      three_point: 0.15,
      free_throw:  0.10,
      performance: 0.40,
    }
  }
}

/// League-average improvement score per position group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionBaselines {
  pub guard:   f64,
  pub forward: f64,
  pub center:  f64,
  pub default: f64,
}

impl Default for PositionBaselines {
  fn default() -> Self {
    Self { guard: 18.0, forward: 17.0, center: 19.0, default: 17.5 }
  }
}

impl PositionBaselines {
  /// Baseline for a provider position string such as `"Guard-Forward"`,
  /// `"PG"`, or `"C"`. The first listed position wins.
  pub fn for_position(&self, position: Option<&str>) -> f64 {
    let primary = position
      .and_then(|p| p.split(['-', '/']).next())
      .map(|p| p.trim().to_ascii_uppercase())
      .unwrap_or_default();
    match primary.as_str() {
      "G" | "GUARD" | "PG" | "SG" => self.guard,
      "F" | "FORWARD" | "SF" | "PF" => self.forward,
      "C" | "CENTER" => self.center,
      _ => self.default,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
  pub improvement:       ImprovementWeights,
  pub efficiency:        EfficiencyWeights,
  pub baselines:         PositionBaselines,
  /// Improvement score that maps to a performance rating of 1.0.
  pub performance_scale: f64,
  /// Multiplier applied to `efficiency * value_per_dollar`.
  pub cost_scale:        f64,
  pub min_games_played:  i32,
}

impl Default for MetricConfig {
  fn default() -> Self {
    Self {
      improvement:       ImprovementWeights::default(),
      efficiency:        EfficiencyWeights::default(),
      baselines:         PositionBaselines::default(),
      performance_scale: 40.0,
      cost_scale:        1000.0,
      min_games_played:  10,
    }
  }
}

// ─── Calculation ─────────────────────────────────────────────────────────────

/// Why no metric was produced for a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
  TooFewGames(i32),
  MissingRate(&'static str),
  MissingCompensation,
  NonPositiveCompensation,
}

impl std::fmt::Display for Skip {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::TooFewGames(gp) => write!(f, "only {gp} games played"),
      Self::MissingRate(stat) => write!(f, "missing {stat} rate"),
      Self::MissingCompensation => f.write_str("no contract"),
      Self::NonPositiveCompensation => f.write_str("non-positive compensation"),
    }
  }
}

/// Weighted composite of the six rate statistics.
pub fn improvement_score(
  rates: &PerGameRates,
  weights: &ImprovementWeights,
) -> Result<f64, Skip> {
  let rate = |value: Option<f64>, name| value.ok_or(Skip::MissingRate(name));
  Ok(
    rate(rates.points, "points")? * weights.points
      + rate(rates.rebounds, "rebounds")? * weights.rebounds
      + rate(rates.assists, "assists")? * weights.assists
      + rate(rates.steals, "steals")? * weights.steals
      + rate(rates.blocks, "blocks")? * weights.blocks
      + rate(rates.turnovers, "turnovers")? * weights.turnovers,
  )
}

/// `value / cost`, or zero when the cost is not positive.
pub fn per_unit_cost(value: f64, cost: i64) -> f64 {
  if cost <= 0 { 0.0 } else { value / cost as f64 }
}

/// Blend of the shooting percentages that are present and the normalized
/// performance rating. Absent percentages drop out and the remaining weights
/// are renormalized.
pub fn efficiency_rating(
  shooting: &Shooting,
  improvement: f64,
  cfg: &MetricConfig,
) -> f64 {
  let w = &cfg.efficiency;
  let performance = if cfg.performance_scale > 0.0 {
    (improvement / cfg.performance_scale).clamp(0.0, 1.0)
  } else {
    0.0
  };

  let components = [
    (shooting.fg_pct.map(|p| p.get()), w.field_goal),
    (shooting.fg3_pct.map(|p| p.get()), w.three_point),
    (shooting.ft_pct.map(|p| p.get()), w.free_throw),
    (Some(performance), w.performance),
  ];

  let (sum, weight) = components
    .iter()
    .filter_map(|(value, weight)| value.map(|v| (v * weight, *weight)))
    .fold((0.0, 0.0), |(s, tw), (v, w)| (s + v, tw + w));

  if weight > 0.0 { sum / weight } else { 0.0 }
}

/// Compute the value analysis for one subject, or the reason it was skipped.
/// A skipped subject yields no row at all.
pub fn compute(
  input: &ValueInput,
  cfg: &MetricConfig,
  computed_at: DateTime<Utc>,
) -> Result<ValueAnalysis, Skip> {
  if input.games_played < cfg.min_games_played.max(1) {
    return Err(Skip::TooFewGames(input.games_played));
  }
  let salary = input.salary.ok_or(Skip::MissingCompensation)?;
  if salary <= 0 {
    return Err(Skip::NonPositiveCompensation);
  }

  let improvement = improvement_score(&input.rates, &cfg.improvement)?;
  let value_per_dollar = per_unit_cost(improvement, salary);
  let efficiency = efficiency_rating(&input.shooting, improvement, cfg);
  let baseline = cfg.baselines.for_position(input.position.as_deref());

  Ok(ValueAnalysis {
    player_id: input.player_id,
    season_id: input.season_id.clone(),
    salary,
    total_improvement: improvement,
    value_per_dollar,
    efficiency_rating: efficiency,
    cost_efficiency_score: efficiency * value_per_dollar * cfg.cost_scale,
    value_vs_average: improvement - baseline,
    computed_at,
  })
}
