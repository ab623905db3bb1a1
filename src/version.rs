//! Mapping from a solution file's format version to the Visual Studio release that reads it.

use core::fmt;
use core::str::FromStr;
use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// The Visual Studio release a solution file was written for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VersionTag {
    Vc70,
    Vc71,
    Vc80,
    Vc90,
    Vc100,
    Vc140,
}

impl VersionTag {
    pub const ALL: [VersionTag; 6] = [
        Self::Vc70,
        Self::Vc71,
        Self::Vc80,
        Self::Vc90,
        Self::Vc100,
        Self::Vc140,
    ];

    /// Convert from the format version found in a solution file header.
    pub fn from_format(format: &str) -> Option<Self> {
        Some(match format {
            "7.00" => Self::Vc70,
            "8.00" => Self::Vc71,
            "9.00" => Self::Vc80,
            "10.00" => Self::Vc90,
            "11.00" => Self::Vc100,
            "12.00" => Self::Vc140,
            _ => return None,
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vc70 => "VC70",
            Self::Vc71 => "VC71",
            Self::Vc80 => "VC80",
            Self::Vc90 => "VC90",
            Self::Vc100 => "VC100",
            Self::Vc140 => "VC140",
        }
    }

    /// The ProgID used to start this version of the IDE.
    pub const fn prog_id(self) -> &'static str {
        match self {
            Self::Vc70 => "VisualStudio.DTE.7",
            Self::Vc71 => "VisualStudio.DTE.7.1",
            Self::Vc80 => "VisualStudio.DTE.8.0",
            Self::Vc90 => "VisualStudio.DTE.9.0",
            Self::Vc100 => "VisualStudio.DTE.10.0",
            Self::Vc140 => "VisualStudio.DTE.14.0",
        }
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| Error::UnknownVersionTag(s.into()))
    }
}

/// Look up the ProgID for a version tag given by name, e.g. `"VC90"`.
pub fn prog_id_for(tag: &str) -> Result<&'static str> {
    tag.parse::<VersionTag>().map(VersionTag::prog_id)
}

/// Read the format version from the header of a solution file.
///
/// The header is the first non-blank line, e.g.
/// `Microsoft Visual Studio Solution File, Format Version 12.00`,
/// and the version is its last word.
pub fn detect_version(solution: &Path) -> Result<VersionTag> {
    let text = fs::read_to_string(solution).map_err(|source| Error::ReadSolution {
        path: solution.into(),
        source,
    })?;
    version_from_header(&text).ok_or_else(|| Error::EmptySolution(solution.into()))?
}

fn version_from_header(text: &str) -> Option<Result<VersionTag>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let header = text.lines().find(|line| !line.trim().is_empty())?;
    let format = header.split_whitespace().next_back()?;
    Some(
        VersionTag::from_format(format)
            .ok_or_else(|| Error::UnknownSolutionVersion(format.into())),
    )
}
