//! [`SqliteStore`], the SQLite implementation of [`GameStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use tag_core::{
  game::Game,
  pin::Pin,
  player::{PlayerRecord, PlayerState},
  store::{GameStore, TagOutcome},
  transition,
  user::{Credentials, NewUser, UserProfile},
  window::GameWindow,
};

use crate::{
  encode::{
    GAME_COLUMNS, PLAYER_COLUMNS, RawGame, RawPlayer, RawState, RawUser,
    USER_COLUMNS, decode_uuid, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A tag game store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .run(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
  }

  /// Run `f` on the connection thread. Domain and decoding errors travel back
  /// inside the closure's own result.
  async fn run<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` inside an immediate transaction; commits only if `f` succeeds.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .run(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
      })
      .await
  }
}

// ─── Row access (connection thread) ─────────────────────────────────────────

fn read_user(conn: &Connection, user_id: Uuid) -> Result<Option<UserProfile>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
      rusqlite::params![encode_uuid(user_id)],
      RawUser::from_row,
    )
    .optional()?
    .map(RawUser::into_profile)
    .transpose()
}

fn read_game(conn: &Connection, pin: Pin) -> Result<Option<Game>> {
  conn
    .query_row(
      &format!("SELECT {GAME_COLUMNS} FROM games WHERE pin = ?1"),
      rusqlite::params![pin.to_string()],
      RawGame::from_row,
    )
    .optional()?
    .map(RawGame::into_game)
    .transpose()
}

fn require_game(conn: &Connection, pin: Pin) -> Result<Game> {
  read_game(conn, pin)?.ok_or_else(|| tag_core::Error::GameNotFound(pin).into())
}

fn read_player(
  conn: &Connection,
  pin: Pin,
  user_id: Uuid,
) -> Result<Option<PlayerRecord>> {
  conn
    .query_row(
      &format!("SELECT {PLAYER_COLUMNS} FROM players WHERE pin = ?1 AND user_id = ?2"),
      rusqlite::params![pin.to_string(), encode_uuid(user_id)],
      RawPlayer::from_row,
    )
    .optional()?
    .map(RawPlayer::into_record)
    .transpose()
}

fn require_player(conn: &Connection, pin: Pin, user_id: Uuid) -> Result<PlayerRecord> {
  read_player(conn, pin, user_id)?
    .ok_or_else(|| tag_core::Error::PlayerNotFound { pin, user_id }.into())
}

fn read_players(conn: &Connection, pin: Pin) -> Result<Vec<PlayerRecord>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {PLAYER_COLUMNS} FROM players WHERE pin = ?1 ORDER BY rowid"
  ))?;
  let raws = stmt
    .query_map(rusqlite::params![pin.to_string()], RawPlayer::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawPlayer::into_record).collect()
}

/// Write `state` to both the roster row and the member's profile.
fn write_state(
  conn: &Connection,
  pin: Pin,
  user_id: Uuid,
  state: &PlayerState,
) -> Result<()> {
  let raw = RawState::encode(state);
  let pin_str = pin.to_string();
  let id_str = encode_uuid(user_id);

  conn.execute(
    "UPDATE players
        SET status = ?3, time_it_ms = ?4, time_caught = ?5, times_caught = ?6
      WHERE pin = ?1 AND user_id = ?2",
    rusqlite::params![
      pin_str,
      id_str,
      raw.status,
      raw.time_it_ms,
      raw.time_caught,
      raw.times_caught,
    ],
  )?;
  conn.execute(
    "UPDATE users
        SET status = ?3, time_it_ms = ?4, time_caught = ?5, times_caught = ?6
      WHERE game_pin = ?1 AND user_id = ?2",
    rusqlite::params![
      pin_str,
      id_str,
      raw.status,
      raw.time_it_ms,
      raw.time_caught,
      raw.times_caught,
    ],
  )?;
  Ok(())
}

fn bump_version(conn: &Connection, pin: Pin) -> Result<()> {
  conn.execute(
    "UPDATE games SET version = version + 1 WHERE pin = ?1",
    rusqlite::params![pin.to_string()],
  )?;
  Ok(())
}

// ─── GameStore impl ──────────────────────────────────────────────────────────

impl GameStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<UserProfile> {
    let profile = UserProfile {
      user_id:    Uuid::new_v4(),
      name:       input.name,
      email:      input.email,
      created_at: Utc::now(),
      in_game:    false,
      state:      PlayerState::default(),
      game_pin:   None,
    };
    let password_hash = input.password_hash;
    let row = profile.clone();

    self
      .write(move |conn| {
        let taken: bool = conn
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![row.email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Err(tag_core::Error::EmailTaken(row.email).into());
        }

        conn.execute(
          "INSERT INTO users (user_id, name, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            encode_uuid(row.user_id),
            row.name,
            row.email,
            password_hash,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(profile)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<UserProfile>> {
    self.run(move |conn| read_user(conn, id)).await
  }

  async fn get_credentials(&self, email: &str) -> Result<Option<Credentials>> {
    let email = email.to_owned();

    let row: Option<(String, String)> = self
      .run(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, password_hash FROM users WHERE email = ?1",
              rusqlite::params![email],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    row
      .map(|(id, password_hash)| {
        Ok(Credentials { user_id: decode_uuid(&id)?, password_hash })
      })
      .transpose()
  }

  // ── Games ─────────────────────────────────────────────────────────────────

  async fn create_game(&self, pin: Pin, now: DateTime<Utc>) -> Result<Option<Game>> {
    let game = Game::new(pin, now);
    let row = game.clone();

    let inserted = self
      .write(move |conn| {
        let changed = conn.execute(
          "INSERT INTO games (pin, created_at, is_active, start_date, end_date, version)
           VALUES (?1, ?2, 0, ?3, ?4, 0)
           ON CONFLICT (pin) DO NOTHING",
          rusqlite::params![
            row.pin.to_string(),
            encode_dt(row.created_at),
            encode_dt(row.start_date),
            encode_dt(row.end_date),
          ],
        )?;
        Ok(changed == 1)
      })
      .await?;

    Ok(inserted.then_some(game))
  }

  async fn get_game(&self, pin: Pin) -> Result<Option<Game>> {
    self.run(move |conn| read_game(conn, pin)).await
  }

  async fn list_players(&self, pin: Pin) -> Result<Vec<PlayerRecord>> {
    self
      .run(move |conn| {
        require_game(conn, pin)?;
        read_players(conn, pin)
      })
      .await
  }

  // ── Membership ────────────────────────────────────────────────────────────

  async fn join_game(&self, pin: Pin, user_id: Uuid, name: String) -> Result<PlayerRecord> {
    self
      .write(move |conn| {
        let game = require_game(conn, pin)?;
        let user = read_user(conn, user_id)?
          .ok_or(tag_core::Error::UserNotFound(user_id))?;
        if let Some(other) = user.game_pin
          && other != pin
        {
          return Err(tag_core::Error::AlreadyInGame(other).into());
        }

        let record = PlayerRecord::joined(user_id, name);
        let pin_str = pin.to_string();
        let id_str = encode_uuid(user_id);

        conn.execute(
          "INSERT INTO players (pin, user_id, name) VALUES (?1, ?2, ?3)
           ON CONFLICT (pin, user_id) DO UPDATE SET name = excluded.name",
          rusqlite::params![pin_str, id_str, record.name],
        )?;
        conn.execute(
          "UPDATE users SET in_game = 1, game_pin = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, pin_str],
        )?;
        write_state(conn, pin, user_id, &record.state)?;

        // A rejoining "it" player has just been reset.
        if game.current_it == Some(user_id) {
          conn.execute(
            "UPDATE games SET current_it = NULL WHERE pin = ?1",
            rusqlite::params![pin_str],
          )?;
        }
        bump_version(conn, pin)?;

        Ok(record)
      })
      .await
  }

  async fn leave_game(&self, pin: Pin, user_id: Uuid) -> Result<()> {
    self
      .write(move |conn| {
        require_game(conn, pin)?;
        require_player(conn, pin, user_id)?;

        let pin_str = pin.to_string();
        let id_str = encode_uuid(user_id);
        let reset = RawState::encode(&PlayerState::default());

        conn.execute(
          "DELETE FROM players WHERE pin = ?1 AND user_id = ?2",
          rusqlite::params![pin_str, id_str],
        )?;
        conn.execute(
          "UPDATE users
              SET in_game = 0, game_pin = NULL, status = ?3, time_it_ms = ?4,
                  time_caught = ?5, times_caught = ?6
            WHERE user_id = ?1 AND game_pin = ?2",
          rusqlite::params![
            id_str,
            pin_str,
            reset.status,
            reset.time_it_ms,
            reset.time_caught,
            reset.times_caught,
          ],
        )?;
        conn.execute(
          "UPDATE games SET current_it = NULL WHERE pin = ?1 AND current_it = ?2",
          rusqlite::params![pin_str, id_str],
        )?;
        bump_version(conn, pin)?;
        Ok(())
      })
      .await
  }

  // ── Rounds ────────────────────────────────────────────────────────────────

  async fn start_round(&self, pin: Pin, it_player: Uuid, window: GameWindow) -> Result<Game> {
    self
      .write(move |conn| {
        require_game(conn, pin)?;
        let roster = read_players(conn, pin)?;
        if !roster.iter().any(|p| p.user_id == it_player) {
          return Err(tag_core::Error::PlayerNotFound { pin, user_id: it_player }.into());
        }

        for player in transition::start_round(&roster, it_player, window.start()) {
          write_state(conn, pin, player.user_id, &player.state)?;
        }

        conn.execute(
          "UPDATE games
              SET is_active = 1, current_it = ?2, start_date = ?3, end_date = ?4,
                  version = version + 1
            WHERE pin = ?1",
          rusqlite::params![
            pin.to_string(),
            encode_uuid(it_player),
            encode_dt(window.start()),
            encode_dt(window.end()),
          ],
        )?;

        require_game(conn, pin)
      })
      .await
  }

  async fn tag(
    &self,
    pin: Pin,
    tagger: Uuid,
    target: Uuid,
    now: DateTime<Utc>,
    expected_version: Option<u64>,
  ) -> Result<TagOutcome> {
    self
      .write(move |conn| {
        let game = require_game(conn, pin)?;
        if !game.is_active {
          return Err(tag_core::Error::RoundNotStarted(pin).into());
        }
        let phase = game.window()?.phase(now);
        if !phase.accepts_tags() {
          return Err(tag_core::Error::RoundNotActive(phase).into());
        }
        if let Some(expected) = expected_version
          && expected != game.version
        {
          return Err(
            tag_core::Error::VersionMismatch { expected, actual: game.version }.into(),
          );
        }

        let tagger_before = require_player(conn, pin, tagger)?;
        let target_before = require_player(conn, pin, target)?;
        let (tagger_after, target_after) =
          transition::tag(&tagger_before, &target_before, now)?;

        write_state(conn, pin, tagger, &tagger_after.state)?;
        write_state(conn, pin, target, &target_after.state)?;
        conn.execute(
          "UPDATE games SET current_it = ?2, version = version + 1 WHERE pin = ?1",
          rusqlite::params![pin.to_string(), encode_uuid(target)],
        )?;

        Ok(TagOutcome {
          game:   require_game(conn, pin)?,
          tagger: tagger_after,
          target: target_after,
          at:     now,
        })
      })
      .await
  }
}
