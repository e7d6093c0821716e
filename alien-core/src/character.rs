//! Player character traits.

use crate::session::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TRAIT_MIN: u8 = 1;
pub const TRAIT_MAX: u8 = 10;

/// Trait values above this threshold make a trait the narrative emphasis.
pub const EMPHASIS_THRESHOLD: u8 = 8;

/// The three character traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trait {
    Strength,
    Intelligence,
    Agility,
}

impl Trait {
    pub const ALL: [Trait; 3] = [Trait::Strength, Trait::Intelligence, Trait::Agility];

    pub fn name(self) -> &'static str {
        match self {
            Trait::Strength => "strength",
            Trait::Intelligence => "intelligence",
            Trait::Agility => "agility",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Trait::Strength => "Strength",
            Trait::Intelligence => "Intelligence",
            Trait::Agility => "Agility",
        }
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated set of trait values, each within `[1, 10]`.
///
/// Fields are private so a `TraitSet` can only be built through
/// [`TraitSet::new`] and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TraitSet {
    strength: u8,
    intelligence: u8,
    agility: u8,
}

impl TraitSet {
    pub fn new(strength: u8, intelligence: u8, agility: u8) -> Result<Self, ConfigError> {
        for (t, value) in [
            (Trait::Strength, strength),
            (Trait::Intelligence, intelligence),
            (Trait::Agility, agility),
        ] {
            if !(TRAIT_MIN..=TRAIT_MAX).contains(&value) {
                return Err(ConfigError::TraitOutOfRange {
                    name: t.name(),
                    value: i64::from(value),
                });
            }
        }

        Ok(Self {
            strength,
            intelligence,
            agility,
        })
    }

    /// Build from wider integers, e.g. values typed on a command line.
    pub fn from_values(strength: i64, intelligence: i64, agility: i64) -> Result<Self, ConfigError> {
        let narrow = |t: Trait, v: i64| {
            u8::try_from(v).map_err(|_| ConfigError::TraitOutOfRange {
                name: t.name(),
                value: v,
            })
        };
        Self::new(
            narrow(Trait::Strength, strength)?,
            narrow(Trait::Intelligence, intelligence)?,
            narrow(Trait::Agility, agility)?,
        )
    }

    pub fn strength(&self) -> u8 {
        self.strength
    }

    pub fn intelligence(&self) -> u8 {
        self.intelligence
    }

    pub fn agility(&self) -> u8 {
        self.agility
    }

    pub fn get(&self, t: Trait) -> u8 {
        match t {
            Trait::Strength => self.strength,
            Trait::Intelligence => self.intelligence,
            Trait::Agility => self.agility,
        }
    }

    /// The trait the narrator should lean on.
    ///
    /// Strength wins if above 8, then intelligence; agility otherwise,
    /// whether or not agility itself is above 8.
    pub fn emphasis(&self) -> Trait {
        if self.strength > EMPHASIS_THRESHOLD {
            Trait::Strength
        } else if self.intelligence > EMPHASIS_THRESHOLD {
            Trait::Intelligence
        } else {
            Trait::Agility
        }
    }
}

impl Default for TraitSet {
    fn default() -> Self {
        Self {
            strength: 5,
            intelligence: 5,
            agility: 5,
        }
    }
}

impl fmt::Display for TraitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Strength: {}, Intelligence: {}, Agility: {}",
            self.strength, self.intelligence, self.agility
        )
    }
}
