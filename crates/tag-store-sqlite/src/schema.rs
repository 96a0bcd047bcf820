//! SQL schema for the tag SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per signed-up identity. Never deleted.
CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    in_game       INTEGER NOT NULL DEFAULT 0,
    status        TEXT NOT NULL DEFAULT 'not it',  -- 'it' | 'not it'
    time_it_ms    INTEGER NOT NULL DEFAULT 0,
    time_caught   TEXT,                            -- RFC 3339 or NULL
    times_caught  INTEGER NOT NULL DEFAULT 0,
    game_pin      TEXT
);

CREATE TABLE IF NOT EXISTS games (
    pin         TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL,
    is_active   INTEGER NOT NULL DEFAULT 0,
    current_it  TEXT REFERENCES users(user_id),
    start_date  TEXT NOT NULL,
    end_date    TEXT NOT NULL,
    version     INTEGER NOT NULL DEFAULT 0,
    CHECK (start_date <= end_date)
);

-- Roster copy of each member's tag state. Join order is rowid order.
CREATE TABLE IF NOT EXISTS players (
    pin          TEXT NOT NULL REFERENCES games(pin),
    user_id      TEXT NOT NULL REFERENCES users(user_id),
    name         TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'not it',
    time_it_ms   INTEGER NOT NULL DEFAULT 0,
    time_caught  TEXT,
    times_caught INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (pin, user_id)
);

CREATE INDEX IF NOT EXISTS users_game_idx ON users(game_pin);

PRAGMA user_version = 1;
";
