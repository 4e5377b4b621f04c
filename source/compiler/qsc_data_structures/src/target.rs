// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// The QIR profile a generated module declares itself to honor.
/// The profile is recorded in the `qir_profiles` entry point attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    #[default]
    Base,
    Adaptive,
    Custom,
}

impl Profile {
    /// The value written for the `qir_profiles` attribute.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Base => "base_profile",
            Self::Adaptive => "adaptive_profile",
            Self::Custom => "custom",
        }
    }
}

impl Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Profile {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base_profile" | "Base" | "base" => Ok(Self::Base),
            "adaptive_profile" | "Adaptive" | "adaptive" => Ok(Self::Adaptive),
            "custom" | "Custom" => Ok(Self::Custom),
            _ => Err(()),
        }
    }
}
