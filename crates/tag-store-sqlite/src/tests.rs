//! Integration tests for `SqliteStore` and the components running on it,
//! against an in-memory database.

use std::{
  collections::{BTreeSet, VecDeque},
  sync::{Arc, Mutex},
};

use chrono::{DateTime, TimeDelta, Utc};
use tag_core::{
  clock::Clock,
  directory::GameDirectory,
  engine::TagEngine,
  game::Game,
  membership::Membership,
  pin::{Pin, PinSource, RandomPins},
  player::{PlayerRecord, PlayerState, TagStatus},
  store::{GameStore, StoreError},
  user::{NewUser, UserProfile},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> Arc<SqliteStore> {
  Arc::new(
    SqliteStore::open_in_memory()
      .await
      .expect("in-memory store"),
  )
}

fn t0() -> DateTime<Utc> {
  DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn pin(v: u32) -> Pin { Pin::new(v).unwrap() }

/// A clock that only moves when told to.
#[derive(Clone)]
struct TestClock(Arc<Mutex<DateTime<Utc>>>);

impl TestClock {
  fn at(now: DateTime<Utc>) -> Self { Self(Arc::new(Mutex::new(now))) }

  fn advance(&self, by: TimeDelta) {
    let mut now = self.0.lock().unwrap();
    *now = *now + by;
  }
}

impl Clock for TestClock {
  fn now(&self) -> DateTime<Utc> { *self.0.lock().unwrap() }
}

/// Hands out a fixed sequence of PINs, then random ones.
struct ScriptedPins(Mutex<VecDeque<Pin>>);

impl ScriptedPins {
  fn new(pins: impl IntoIterator<Item = Pin>) -> Self {
    Self(Mutex::new(pins.into_iter().collect()))
  }
}

impl PinSource for ScriptedPins {
  fn sample(&self) -> Pin {
    self
      .0
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| RandomPins.sample())
  }
}

async fn sign_up(s: &SqliteStore, name: &str) -> UserProfile {
  s.create_user(NewUser {
    name:          name.into(),
    email:         format!("{}@example.com", name.to_lowercase()),
    password_hash: "$argon2id$placeholder".into(),
  })
  .await
  .unwrap()
}

fn domain(err: &crate::Error) -> &tag_core::Error {
  err.domain().expect("domain error")
}

/// Two players in an active round, `a` it since `t0`, window `t0..t0+1h`.
struct Round {
  store:  Arc<SqliteStore>,
  clock:  TestClock,
  engine: TagEngine<SqliteStore, TestClock>,
  pin:    Pin,
  a:      UserProfile,
  b:      UserProfile,
}

async fn started_round() -> Round {
  let store = store().await;
  let clock = TestClock::at(t0());
  let pin = pin(424_242);
  store.create_game(pin, t0()).await.unwrap().unwrap();

  let a = sign_up(&store, "Alice").await;
  let b = sign_up(&store, "Bob").await;
  let members = Membership::new(store.clone());
  members.join_game(pin, a.user_id, &a.name).await.unwrap();
  members.join_game(pin, b.user_id, &b.name).await.unwrap();

  let engine = TagEngine::with_clock(store.clone(), clock.clone());
  let players = members.roster(pin).await.unwrap();
  engine
    .start_round(&players, pin, 0, t0(), t0() + TimeDelta::hours(1))
    .await
    .unwrap();

  Round { store, clock, engine, pin, a, b }
}

/// Both copies of a player's state, asserting they agree.
async fn state_of(s: &SqliteStore, pin: Pin, user_id: Uuid) -> PlayerState {
  let profile = s.get_user(user_id).await.unwrap().unwrap();
  let record = s
    .list_players(pin)
    .await
    .unwrap()
    .into_iter()
    .find(|p| p.user_id == user_id)
    .unwrap();
  assert_eq!(profile.state, record.state, "profile and roster disagree");
  record.state
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_user() {
  let s = store().await;
  let user = sign_up(&s, "Alice").await;

  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched, user);
  assert!(!fetched.in_game);
  assert_eq!(fetched.game_pin, None);
  assert_eq!(fetched.state, PlayerState::default());
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  sign_up(&s, "Alice").await;
  let err = s
    .create_user(NewUser {
      name:          "Other Alice".into(),
      email:         "alice@example.com".into(),
      password_hash: "x".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), tag_core::Error::EmailTaken(_)));
}

#[tokio::test]
async fn credentials_lookup_by_email() {
  let s = store().await;
  let user = sign_up(&s, "Alice").await;

  let creds = s.get_credentials("alice@example.com").await.unwrap().unwrap();
  assert_eq!(creds.user_id, user.user_id);
  assert_eq!(creds.password_hash, "$argon2id$placeholder");
  assert!(s.get_credentials("nobody@example.com").await.unwrap().is_none());
}

// ─── Game directory ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_game_refuses_taken_pin() {
  let s = store().await;
  let first = s.create_game(pin(123_456), t0()).await.unwrap().unwrap();
  assert!(!first.is_active);
  assert_eq!(first.start_date, t0());
  assert_eq!(first.end_date, t0());

  let later = t0() + TimeDelta::minutes(5);
  assert!(s.create_game(pin(123_456), later).await.unwrap().is_none());

  let stored = s.get_game(pin(123_456)).await.unwrap().unwrap();
  assert_eq!(stored, first);
}

#[tokio::test]
async fn concurrent_create_under_collision_keeps_one_game_per_pin() {
  let s = store().await;
  let dir = GameDirectory::with_sources(
    s.clone(),
    ScriptedPins::new([pin(111_111), pin(111_111), pin(222_222)]),
    TestClock::at(t0()),
  );

  let (g1, g2) = tokio::join!(dir.create_game(), dir.create_game());
  let (g1, g2) = (g1.unwrap(), g2.unwrap());

  let pins: BTreeSet<_> = [g1.pin, g2.pin].into_iter().collect();
  assert_eq!(pins, BTreeSet::from([pin(111_111), pin(222_222)]));

  let survivor = s.get_game(pin(111_111)).await.unwrap().unwrap();
  assert_eq!(survivor, Game::new(pin(111_111), t0()));
}

#[tokio::test]
async fn directory_get_missing_game() {
  let s = store().await;
  let dir = GameDirectory::new(s);
  let err = dir.get_game(pin(999_999)).await.unwrap_err();
  assert!(matches!(domain(&err), tag_core::Error::GameNotFound(p) if *p == pin(999_999)));
}

// ─── Membership ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn join_unknown_game_fails() {
  let s = store().await;
  let user = sign_up(&s, "Alice").await;
  let err = Membership::new(s.clone())
    .join_game(pin(100_001), user.user_id, "Alice")
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), tag_core::Error::GameNotFound(_)));

  let profile = s.get_user(user.user_id).await.unwrap().unwrap();
  assert!(!profile.in_game);
}

#[tokio::test]
async fn join_twice_converges() {
  let s = store().await;
  s.create_game(pin(100_002), t0()).await.unwrap();
  let user = sign_up(&s, "Alice").await;
  let members = Membership::new(s.clone());

  let first = members.join_game(pin(100_002), user.user_id, "Alice").await.unwrap();
  let second = members.join_game(pin(100_002), user.user_id, "Alice").await.unwrap();
  assert_eq!(first, second);
  assert_eq!(first, PlayerRecord::joined(user.user_id, "Alice"));

  let roster = members.roster(pin(100_002)).await.unwrap();
  assert_eq!(roster, vec![first]);

  let profile = s.get_user(user.user_id).await.unwrap().unwrap();
  assert!(profile.in_game);
  assert_eq!(profile.game_pin, Some(pin(100_002)));
}

#[tokio::test]
async fn rejoin_resets_statistics_in_both_copies() {
  let r = started_round().await;
  r.clock.advance(TimeDelta::seconds(30));
  r.engine.tag(r.pin, r.a.user_id, r.b.user_id, None).await.unwrap();

  Membership::new(r.store.clone())
    .join_game(r.pin, r.b.user_id, &r.b.name)
    .await
    .unwrap();

  assert_eq!(state_of(&r.store, r.pin, r.b.user_id).await, PlayerState::default());
  let game = r.store.get_game(r.pin).await.unwrap().unwrap();
  assert_eq!(game.current_it, None);
}

#[tokio::test]
async fn cannot_join_a_second_game() {
  let s = store().await;
  s.create_game(pin(100_003), t0()).await.unwrap();
  s.create_game(pin(100_004), t0()).await.unwrap();
  let user = sign_up(&s, "Alice").await;
  let members = Membership::new(s.clone());

  members.join_game(pin(100_003), user.user_id, "Alice").await.unwrap();
  let err = members
    .join_game(pin(100_004), user.user_id, "Alice")
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), tag_core::Error::AlreadyInGame(p) if *p == pin(100_003)));
  assert!(members.roster(pin(100_004)).await.unwrap().is_empty());
}

#[tokio::test]
async fn roster_keeps_join_order() {
  let s = store().await;
  s.create_game(pin(100_005), t0()).await.unwrap();
  let members = Membership::new(s.clone());
  let mut ids = Vec::new();
  for name in ["Ann", "Ben", "Cat", "Dan"] {
    let u = sign_up(&s, name).await;
    members.join_game(pin(100_005), u.user_id, name).await.unwrap();
    ids.push(u.user_id);
  }
  let roster: Vec<_> = members
    .roster(pin(100_005))
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.user_id)
    .collect();
  assert_eq!(roster, ids);
}

#[tokio::test]
async fn leave_resets_profile_and_removes_roster_entry() {
  let r = started_round().await;
  let members = Membership::new(r.store.clone());

  members.leave_game(r.pin, r.a.user_id).await.unwrap();

  let profile = r.store.get_user(r.a.user_id).await.unwrap().unwrap();
  assert!(!profile.in_game);
  assert_eq!(profile.game_pin, None);
  assert_eq!(profile.state, PlayerState::default());

  let roster = members.roster(r.pin).await.unwrap();
  assert_eq!(roster.len(), 1);
  assert_eq!(roster[0].user_id, r.b.user_id);

  // `a` was it. The round stays active with nobody it.
  let game = r.store.get_game(r.pin).await.unwrap().unwrap();
  assert_eq!(game.current_it, None);
  assert!(game.is_active);
  assert!(roster.iter().all(|p| !p.state.status.is_it()));

  let err = members.leave_game(r.pin, r.a.user_id).await.unwrap_err();
  assert!(matches!(domain(&err), tag_core::Error::PlayerNotFound { .. }));
}

// ─── Rounds ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn start_round_makes_exactly_one_it() {
  let r = started_round().await;

  let game = r.store.get_game(r.pin).await.unwrap().unwrap();
  assert!(game.is_active);
  assert_eq!(game.current_it, Some(r.a.user_id));
  assert_eq!(game.start_date, t0());
  assert_eq!(game.end_date, t0() + TimeDelta::hours(1));

  assert_eq!(state_of(&r.store, r.pin, r.a.user_id).await, PlayerState::it_from(t0()));
  assert_eq!(state_of(&r.store, r.pin, r.b.user_id).await, PlayerState::default());
}

#[tokio::test]
async fn restarting_moves_it_to_the_new_choice() {
  let r = started_round().await;
  let players = r.store.list_players(r.pin).await.unwrap();
  let start = t0() + TimeDelta::days(1);

  r.engine
    .start_round(&players, r.pin, 1, start, start + TimeDelta::hours(2))
    .await
    .unwrap();

  let roster = r.store.list_players(r.pin).await.unwrap();
  let its: Vec<_> = roster.iter().filter(|p| p.state.status.is_it()).collect();
  assert_eq!(its.len(), 1);
  assert_eq!(its[0].user_id, r.b.user_id);
  assert_eq!(its[0].state.time_caught, Some(start));
  assert_eq!(state_of(&r.store, r.pin, r.a.user_id).await, PlayerState::default());
}

#[tokio::test]
async fn start_round_for_non_member_fails() {
  let s = store().await;
  s.create_game(pin(100_006), t0()).await.unwrap();
  let window = tag_core::window::GameWindow::new(t0(), t0()).unwrap();
  let err = s
    .start_round(pin(100_006), Uuid::new_v4(), window)
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), tag_core::Error::PlayerNotFound { .. }));
  assert!(!s.get_game(pin(100_006)).await.unwrap().unwrap().is_active);
}

// ─── Tagging ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tag_after_65_seconds() {
  let r = started_round().await;
  let before = r.store.get_game(r.pin).await.unwrap().unwrap();
  r.clock.advance(TimeDelta::milliseconds(65_000));

  let outcome = r
    .engine
    .tag(r.pin, r.a.user_id, r.b.user_id, Some(before.version))
    .await
    .unwrap();

  let a = state_of(&r.store, r.pin, r.a.user_id).await;
  assert_eq!(a.time_it_ms, 65_000);
  assert_eq!(a.status, TagStatus::NotIt);

  let b = state_of(&r.store, r.pin, r.b.user_id).await;
  assert_eq!(b.status, TagStatus::It);
  assert_eq!(b.time_caught, Some(t0() + TimeDelta::milliseconds(65_000)));
  assert_eq!(b.times_caught, 1);

  assert_eq!(outcome.tagger.state, a);
  assert_eq!(outcome.target.state, b);
  assert_eq!(outcome.game.current_it, Some(r.b.user_id));
  assert_eq!(outcome.game.version, before.version + 1);
}

#[tokio::test]
async fn self_tag_changes_nothing() {
  let r = started_round().await;
  let before = r.store.list_players(r.pin).await.unwrap();

  let err = r
    .engine
    .tag(r.pin, r.a.user_id, r.a.user_id, None)
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), tag_core::Error::SelfTag));
  assert_eq!(r.store.list_players(r.pin).await.unwrap(), before);
}

#[tokio::test]
async fn tagger_must_hold_it() {
  let r = started_round().await;
  let before = r.store.list_players(r.pin).await.unwrap();

  let err = r
    .engine
    .tag(r.pin, r.b.user_id, r.a.user_id, None)
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), tag_core::Error::NotIt(id) if *id == r.b.user_id));
  assert_eq!(r.store.list_players(r.pin).await.unwrap(), before);
}

#[tokio::test]
async fn stale_version_is_rejected() {
  let r = started_round().await;
  let game = r.store.get_game(r.pin).await.unwrap().unwrap();

  let err = r
    .engine
    .tag(r.pin, r.a.user_id, r.b.user_id, Some(game.version - 1))
    .await
    .unwrap_err();
  assert!(matches!(
    domain(&err),
    tag_core::Error::VersionMismatch { actual, .. } if *actual == game.version
  ));
  assert_eq!(state_of(&r.store, r.pin, r.a.user_id).await.status, TagStatus::It);
}

#[tokio::test]
async fn tag_before_start_is_rejected() {
  let s = store().await;
  s.create_game(pin(100_007), t0()).await.unwrap();
  let a = sign_up(&s, "Alice").await;
  let b = sign_up(&s, "Bob").await;
  s.join_game(pin(100_007), a.user_id, a.name.clone()).await.unwrap();
  s.join_game(pin(100_007), b.user_id, b.name.clone()).await.unwrap();

  let err = s
    .tag(pin(100_007), a.user_id, b.user_id, t0(), None)
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), tag_core::Error::RoundNotStarted(_)));
}

#[tokio::test]
async fn tagging_a_non_member_fails() {
  let r = started_round().await;
  let err = r
    .engine
    .tag(r.pin, r.a.user_id, Uuid::new_v4(), None)
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), tag_core::Error::PlayerNotFound { .. }));
}

#[tokio::test]
async fn concurrent_tags_by_same_tagger_apply_once() {
  let r = started_round().await;
  let c = sign_up(&r.store, "Cat").await;
  Membership::new(r.store.clone())
    .join_game(r.pin, c.user_id, &c.name)
    .await
    .unwrap();
  r.clock.advance(TimeDelta::seconds(10));

  let (to_b, to_c) = tokio::join!(
    r.engine.tag(r.pin, r.a.user_id, r.b.user_id, None),
    r.engine.tag(r.pin, r.a.user_id, c.user_id, None),
  );
  assert!(to_b.is_ok() ^ to_c.is_ok());
  let loser = to_b.err().or(to_c.err()).unwrap();
  assert!(matches!(domain(&loser), tag_core::Error::NotIt(_)));

  let roster = r.store.list_players(r.pin).await.unwrap();
  assert_eq!(roster.iter().filter(|p| p.state.status.is_it()).count(), 1);
  assert_eq!(roster.iter().map(|p| p.state.times_caught).sum::<u32>(), 1);
  assert_eq!(state_of(&r.store, r.pin, r.a.user_id).await.time_it_ms, 10_000);
}

#[tokio::test]
async fn tag_racing_a_leave_never_resurrects_the_leaver() {
  for _ in 0..20 {
    let r = started_round().await;
    r.clock.advance(TimeDelta::seconds(5));
    let members = Membership::new(r.store.clone());

    let (tagged, left) = tokio::join!(
      r.engine.tag(r.pin, r.a.user_id, r.b.user_id, None),
      members.leave_game(r.pin, r.b.user_id),
    );
    left.unwrap();
    if let Err(err) = &tagged {
      assert!(matches!(domain(err), tag_core::Error::PlayerNotFound { .. }));
    }

    let roster = r.store.list_players(r.pin).await.unwrap();
    assert!(roster.iter().all(|p| p.user_id != r.b.user_id));

    let profile = r.store.get_user(r.b.user_id).await.unwrap().unwrap();
    assert!(!profile.in_game);
    assert_eq!(profile.game_pin, None);
    assert_eq!(profile.state, PlayerState::default());
  }
}

#[tokio::test]
async fn tag_after_window_end_is_refused() {
  let r = started_round().await;
  let before = r.store.get_game(r.pin).await.unwrap().unwrap();
  r.clock.advance(TimeDelta::hours(1) + TimeDelta::milliseconds(1));

  let err = r
    .engine
    .tag(r.pin, r.a.user_id, r.b.user_id, None)
    .await
    .unwrap_err();
  assert!(matches!(
    domain(&err),
    tag_core::Error::RoundNotActive(tag_core::window::GamePhase::Ended)
  ));
  assert_eq!(state_of(&r.store, r.pin, r.a.user_id).await, PlayerState::it_from(t0()));
  assert_eq!(r.store.get_game(r.pin).await.unwrap().unwrap(), before);
}

#[tokio::test]
async fn roster_view_resolves_it_time() {
  let r = started_round().await;
  r.clock.advance(TimeDelta::seconds(20));
  r.engine.tag(r.pin, r.a.user_id, r.b.user_id, None).await.unwrap();
  r.clock.advance(TimeDelta::seconds(45));

  let view = r.engine.roster_view(r.pin, r.a.user_id).await.unwrap();
  assert_eq!(view.my_status, Some(TagStatus::NotIt));
  assert_eq!(view.phase, Some(tag_core::window::GamePhase::Active));

  let a = view.players.iter().find(|e| e.is_me).unwrap();
  assert_eq!(a.effective_it_ms, 20_000);
  let b = view.it().unwrap();
  assert_eq!(b.record.user_id, r.b.user_id);
  assert_eq!(b.effective_it_ms, 45_000);
  assert_eq!(b.time_it.to_string(), "0d 0h 0m 45s");
}
