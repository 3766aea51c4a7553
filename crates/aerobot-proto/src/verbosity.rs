use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verbosity {
    #[default]
    NonVerbose,
    Verbose,
    VeryVerbose,
}

impl Verbosity {
    /// Maps a repeated `-v` flag count onto a level.
    pub fn from_count(n: u8) -> Self {
        match n {
            0 => Verbosity::NonVerbose,
            1 => Verbosity::Verbose,
            _ => Verbosity::VeryVerbose,
        }
    }
}
