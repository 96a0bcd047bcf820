//! Game PINs, the six-digit primary key of every game.

use std::{fmt, str::FromStr};

use rand::Rng as _;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Smallest valid PIN. PINs never start with a zero.
pub const PIN_MIN: u32 = 100_000;
/// Largest valid PIN.
pub const PIN_MAX: u32 = 999_999;

/// A six-digit decimal game PIN, serialised as a string (e.g. `"482913"`).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Pin(u32);

impl Pin {
  /// Build a PIN from its numeric value; `None` outside `PIN_MIN..=PIN_MAX`.
  pub fn new(value: u32) -> Option<Self> {
    (PIN_MIN..=PIN_MAX).contains(&value).then_some(Self(value))
  }

  pub fn value(self) -> u32 { self.0 }
}

impl fmt::Display for Pin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:06}", self.0)
  }
}

impl FromStr for Pin {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
      return Err(Error::InvalidPin(s.to_owned()));
    }
    s.parse::<u32>()
      .ok()
      .and_then(Pin::new)
      .ok_or_else(|| Error::InvalidPin(s.to_owned()))
  }
}

impl TryFrom<String> for Pin {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<Pin> for String {
  fn from(pin: Pin) -> Self { pin.to_string() }
}

// ─── Sampling ────────────────────────────────────────────────────────────────

/// Source of candidate PINs for [`crate::directory::GameDirectory`].
pub trait PinSource: Send + Sync {
  fn sample(&self) -> Pin;
}

/// Uniformly random PINs from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPins;

impl PinSource for RandomPins {
  fn sample(&self) -> Pin {
    Pin(rand::thread_rng().gen_range(PIN_MIN..=PIN_MAX))
  }
}
