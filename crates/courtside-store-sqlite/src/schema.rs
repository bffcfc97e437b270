//! SQL schema for the Courtside SQLite store.
//!
//! Bootstrapped once when a store is opened. Every statement is idempotent,
//! so opening an existing database leaves it untouched.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS teams (
    team_id       INTEGER PRIMARY KEY,
    full_name     TEXT NOT NULL,
    abbreviation  TEXT NOT NULL UNIQUE,
    nickname      TEXT,
    city          TEXT,
    state         TEXT,
    year_founded  INTEGER,
    updated_at    TEXT NOT NULL
);

-- Roster columns are overwritten on every sighting; biographical columns
-- keep their stored value when a sighting omits them.
CREATE TABLE IF NOT EXISTS players (
    player_id   INTEGER PRIMARY KEY,
    full_name   TEXT NOT NULL,
    is_active   INTEGER CHECK (is_active IN (0, 1)),
    team_id     INTEGER REFERENCES teams(team_id),
    first_name  TEXT,
    last_name   TEXT,
    birthdate   TEXT,             -- YYYY-MM-DD
    college     TEXT,
    country     TEXT,
    height      TEXT,
    weight      INTEGER,
    position    TEXT,
    jersey      TEXT,
    draft_year  INTEGER,
    from_year   INTEGER,
    to_year     INTEGER,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS games (
    game_id          TEXT PRIMARY KEY,
    season_id        TEXT NOT NULL,    -- YYYY-YY
    game_date        TEXT NOT NULL,
    home_team_id     INTEGER NOT NULL REFERENCES teams(team_id),
    away_team_id     INTEGER NOT NULL REFERENCES teams(team_id),
    home_team_score  INTEGER,
    away_team_score  INTEGER,
    updated_at       TEXT NOT NULL,
    CHECK (home_team_id != away_team_id)
);

CREATE TABLE IF NOT EXISTS player_game_stats (
    game_id     TEXT    NOT NULL REFERENCES games(game_id),
    player_id   INTEGER NOT NULL REFERENCES players(player_id),
    team_id     INTEGER NOT NULL REFERENCES teams(team_id),
    season_id   TEXT    NOT NULL,
    minutes     REAL    NOT NULL CHECK (minutes >= 0),
    points      INTEGER NOT NULL DEFAULT 0,
    rebounds    INTEGER NOT NULL DEFAULT 0,
    assists     INTEGER NOT NULL DEFAULT 0,
    steals      INTEGER NOT NULL DEFAULT 0,
    blocks      INTEGER NOT NULL DEFAULT 0,
    turnovers   INTEGER NOT NULL DEFAULT 0,
    fgm         INTEGER NOT NULL DEFAULT 0,
    fga         INTEGER NOT NULL DEFAULT 0,
    fg3m        INTEGER NOT NULL DEFAULT 0,
    fg3a        INTEGER NOT NULL DEFAULT 0,
    ftm         INTEGER NOT NULL DEFAULT 0,
    fta         INTEGER NOT NULL DEFAULT 0,
    fg_pct      REAL CHECK (fg_pct  IS NULL OR fg_pct  BETWEEN 0 AND 1),
    fg3_pct     REAL CHECK (fg3_pct IS NULL OR fg3_pct BETWEEN 0 AND 1),
    ft_pct      REAL CHECK (ft_pct  IS NULL OR ft_pct  BETWEEN 0 AND 1),
    plus_minus  INTEGER,
    updated_at  TEXT NOT NULL,
    PRIMARY KEY (game_id, player_id)
);

CREATE TABLE IF NOT EXISTS player_season_stats (
    player_id      INTEGER NOT NULL REFERENCES players(player_id),
    season_id      TEXT    NOT NULL,
    team_id        INTEGER REFERENCES teams(team_id),  -- NULL for a traded player's total
    games_played   INTEGER NOT NULL DEFAULT 0 CHECK (games_played >= 0),
    games_started  INTEGER NOT NULL DEFAULT 0 CHECK (games_started >= 0),
    minutes        REAL    NOT NULL DEFAULT 0 CHECK (minutes >= 0),
    points         INTEGER NOT NULL DEFAULT 0,
    rebounds       INTEGER NOT NULL DEFAULT 0,
    assists        INTEGER NOT NULL DEFAULT 0,
    steals         INTEGER NOT NULL DEFAULT 0,
    blocks         INTEGER NOT NULL DEFAULT 0,
    turnovers      INTEGER NOT NULL DEFAULT 0,
    fgm            INTEGER NOT NULL DEFAULT 0,
    fga            INTEGER NOT NULL DEFAULT 0,
    fg3m           INTEGER NOT NULL DEFAULT 0,
    fg3a           INTEGER NOT NULL DEFAULT 0,
    ftm            INTEGER NOT NULL DEFAULT 0,
    fta            INTEGER NOT NULL DEFAULT 0,
    fg_pct         REAL CHECK (fg_pct  IS NULL OR fg_pct  BETWEEN 0 AND 1),
    fg3_pct        REAL CHECK (fg3_pct IS NULL OR fg3_pct BETWEEN 0 AND 1),
    ft_pct         REAL CHECK (ft_pct  IS NULL OR ft_pct  BETWEEN 0 AND 1),
    updated_at     TEXT NOT NULL,
    PRIMARY KEY (player_id, season_id)
);

CREATE TABLE IF NOT EXISTS salary_caps (
    season_id       TEXT PRIMARY KEY,
    salary_cap      INTEGER NOT NULL CHECK (salary_cap > 0),
    luxury_tax      INTEGER,
    first_apron     INTEGER,
    second_apron    INTEGER,
    minimum_salary  INTEGER,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS player_contracts (
    player_id   INTEGER NOT NULL REFERENCES players(player_id),
    season_id   TEXT    NOT NULL,
    salary      INTEGER NOT NULL CHECK (salary >= 0),
    team_id     INTEGER REFERENCES teams(team_id),
    updated_at  TEXT NOT NULL,
    PRIMARY KEY (player_id, season_id)
);

-- Derived; every row for a season is replaced on recomputation.
CREATE TABLE IF NOT EXISTS player_value_analysis (
    player_id              INTEGER NOT NULL REFERENCES players(player_id),
    season_id              TEXT    NOT NULL,
    salary                 INTEGER NOT NULL CHECK (salary > 0),
    total_improvement      REAL    NOT NULL,
    value_per_dollar       REAL    NOT NULL,
    efficiency_rating      REAL    NOT NULL,
    cost_efficiency_score  REAL    NOT NULL,
    value_vs_average       REAL    NOT NULL,
    computed_at            TEXT    NOT NULL,
    PRIMARY KEY (player_id, season_id)
);

CREATE INDEX IF NOT EXISTS players_team_idx       ON players(team_id);
CREATE INDEX IF NOT EXISTS games_season_idx       ON games(season_id);
CREATE INDEX IF NOT EXISTS game_stats_player_idx  ON player_game_stats(player_id);
CREATE INDEX IF NOT EXISTS season_stats_season_idx ON player_season_stats(season_id);
CREATE INDEX IF NOT EXISTS contracts_season_idx   ON player_contracts(season_id);

PRAGMA user_version = 1;
";

/// Settings applied to every pooled connection. Foreign-key enforcement is
/// per connection in SQLite, so it cannot live in [`SCHEMA`] alone.
pub const CONNECTION_PRAGMAS: &str = "
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;
";

/// Tables the store reads or writes, in dependency order.
pub const REQUIRED_TABLES: &[&str] = &[
  "teams",
  "players",
  "games",
  "player_game_stats",
  "player_season_stats",
  "salary_caps",
  "player_contracts",
  "player_value_analysis",
];
