// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator tri-state configuration flags.
//!
//! A flag distinguishes "operator said nothing" from an explicit override,
//! which a plain bool cannot represent. Two default polarities exist:
//! [`BooleanDefaultFalse`] (unset resolves to false) and
//! [`BooleanDefaultTrue`] (unset resolves to true).

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Three-valued operator override state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    /// Operator said nothing; defer to the flag's default polarity.
    #[default]
    NotSet,
    ExplicitlyEnabled,
    ExplicitlyDisabled,
}

impl TriState {
    fn from_bool(v: bool) -> Self {
        if v {
            TriState::ExplicitlyEnabled
        } else {
            TriState::ExplicitlyDisabled
        }
    }
}

/// The operator explicitly enabled a feature the runtime cannot provide.
///
/// A hard configuration/runtime mismatch, as opposed to the silent
/// downgrade applied when the flag was never set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("feature explicitly enabled but not supported by the container engine")]
pub struct UnsupportedOverride;

/// Tri-state flag where unset resolves to false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BooleanDefaultFalse {
    pub state: TriState,
}

impl BooleanDefaultFalse {
    pub const fn new(state: TriState) -> Self {
        Self { state }
    }

    /// Resolve the flag against its default polarity. Pure.
    pub fn enabled(&self) -> bool {
        self.state == TriState::ExplicitlyEnabled
    }
}

/// Tri-state flag where unset resolves to true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BooleanDefaultTrue {
    pub state: TriState,
}

impl BooleanDefaultTrue {
    pub const fn new(state: TriState) -> Self {
        Self { state }
    }

    /// Resolve the flag against its default polarity. Pure.
    pub fn enabled(&self) -> bool {
        self.state != TriState::ExplicitlyDisabled
    }

    /// Resolve the flag against a feature prerequisite.
    ///
    /// With the prerequisite met this is just [`enabled`](Self::enabled).
    /// With it unmet:
    /// - explicitly enabled → [`UnsupportedOverride`] (the caller treats
    ///   this as fatal rather than silently dropping an operator mandate)
    /// - unset → the flag is mutated to explicitly disabled and resolves
    ///   false, so every later read in the process sees the corrected
    ///   value (durable downgrade)
    /// - explicitly disabled → false, no mutation
    pub fn enable_only_if(&mut self, prerequisite_met: bool) -> Result<bool, UnsupportedOverride> {
        if prerequisite_met {
            return Ok(self.enabled());
        }
        match self.state {
            TriState::ExplicitlyEnabled => Err(UnsupportedOverride),
            TriState::NotSet => {
                self.state = TriState::ExplicitlyDisabled;
                Ok(false)
            }
            TriState::ExplicitlyDisabled => Ok(false),
        }
    }
}

// Config files write flags as bare booleans; an absent field stays NotSet
// via #[serde(default)] on the containing struct.
impl<'de> Deserialize<'de> for BooleanDefaultFalse {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(Self::new(TriState::from_bool(bool::deserialize(d)?)))
    }
}

impl<'de> Deserialize<'de> for BooleanDefaultTrue {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(Self::new(TriState::from_bool(bool::deserialize(d)?)))
    }
}

#[cfg(test)]
#[path = "flag_tests.rs"]
mod tests;
