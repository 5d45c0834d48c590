//! VM implementation selection.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The active VM implementation. Exactly one is selected at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VmSelection {
    #[default]
    Interpreter,
    Jit,
    Smart,
}

impl VmSelection {
    pub const ALL: [VmSelection; 3] = [VmSelection::Interpreter, VmSelection::Jit, VmSelection::Smart];

    pub fn as_str(&self) -> &'static str {
        match self {
            VmSelection::Interpreter => "interpreter",
            VmSelection::Jit => "jit",
            VmSelection::Smart => "smart",
        }
    }
}

impl fmt::Display for VmSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VmSelection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interpreter" | "interp" => Ok(VmSelection::Interpreter),
            "jit" => Ok(VmSelection::Jit),
            "smart" => Ok(VmSelection::Smart),
            other => Err(CoreError::UnknownVm(other.to_string())),
        }
    }
}
