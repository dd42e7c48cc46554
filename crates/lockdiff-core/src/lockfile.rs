use std::collections::BTreeMap;
use std::sync::Arc;

use nom::{
  IResult, Parser,
  bytes::complete::{is_not, take_while},
  character::complete::{char, digit1, space0, space1},
  combinator::map_res,
  sequence::{pair, preceded, separated_pair},
};
use serde::Serialize;

use crate::package::LockEntry;

/// Lines before the first entry of a yarn v1 lockfile:
/// two comment lines followed by two blank lines
const CLASSIC_HEADER_LINES: usize = 4;

/// Lines before the first entry of a berry lockfile: two comment lines, a
/// blank line, the three line `__metadata` block and a blank line
const BERRY_HEADER_LINES: usize = 7;

/// The highest `__metadata.version` still written by yarn 2
const BERRY_V2_MAX_VERSION: u32 = 4;

/// The dialect of a lockfile, decided once per file from its header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum LockFormat {
  /// `# yarn lockfile v1`
  Classic,
  /// yarn 2, `__metadata.version` up to 4
  BerryV2,
  /// yarn 3 and 4
  BerryV3Plus,
  #[default]
  Unsupported,
}

impl LockFormat {
  pub fn is_berry(self) -> bool {
    matches!(self, Self::BerryV2 | Self::BerryV3Plus)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LockStatus {
  Success,
  /// The header matched no known lockfile dialect, there are no entries
  Unsupported,
}

/// Result of [`detect_format`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
  pub format: LockFormat,
  /// Number of leading lines that hold no entries
  pub skip_lines: usize,
}

/// The start of the metadata block of a berry lockfile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
  pub version: String,
  pub cache_key: Option<String>,
}

impl Metadata {
  pub fn new(version: String, cache_key: Option<String>) -> Self {
    Self { version, cache_key }
  }
}

/// A parsed lockfile: every lock key mapped to the entry it resolved to.
///
/// Alias keys of one entry (`pkg@^1.0.0, pkg@^1.2.0:`) share the same
/// [`Arc`], so `Arc::ptr_eq` holds between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedLock {
  pub format: LockFormat,
  pub metadata: Option<Metadata>,
  pub entries: BTreeMap<String, Arc<LockEntry>>,
}

impl ParsedLock {
  /// The empty lock handed out for files in an unknown dialect
  pub fn unsupported() -> Self {
    Self::default()
  }

  pub fn status(&self) -> LockStatus {
    match self.format {
      LockFormat::Unsupported => LockStatus::Unsupported,
      _ => LockStatus::Success,
    }
  }

  pub fn is_supported(&self) -> bool {
    self.status() == LockStatus::Success
  }

  pub fn get(&self, key: &str) -> Option<&Arc<LockEntry>> {
    self.entries.get(key)
  }

  /// Number of lock keys, not of distinct entries
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// A leading integer, the way `parseInt` reads `6` out of `6` or ` 6 # comment`
fn leading_number(input: &str) -> IResult<&str, u32> {
  preceded(space0, map_res(digit1, str::parse::<u32>)).parse(input)
}

/// Decide the dialect by probing the fixed header lines.
///
/// Classic files say `yarn lockfile v1` on their second line, berry files
/// carry `version: N` on the first line of the `__metadata` block.
pub fn detect_format(lines: &[&str]) -> Header {
  if lines.get(1).is_some_and(|line| line.contains("v1")) {
    return Header {
      format: LockFormat::Classic,
      skip_lines: CLASSIC_HEADER_LINES,
    };
  }

  if let Some(line) = lines.get(4).filter(|line| line.contains("version:")) {
    let lock_version = line
      .split_once("version: ")
      .and_then(|(_, value)| leading_number(value).ok())
      .map(|(_, number)| number);

    // a version we cannot read is assumed to be a recent one
    let format = match lock_version {
      Some(number) if number <= BERRY_V2_MAX_VERSION => LockFormat::BerryV2,
      _ => LockFormat::BerryV3Plus,
    };

    return Header {
      format,
      skip_lines: BERRY_HEADER_LINES,
    };
  }

  Header {
    format: LockFormat::Unsupported,
    skip_lines: 0,
  }
}

/// A line of metadata is a key-value pair, with a space-based indent
/// e.g. `  version: 8`
pub(crate) fn parse_metadata_line(input: &str) -> IResult<&str, (&str, &str)> {
  preceded(
    space1,
    separated_pair(
      take_while(|c: char| c.is_alphabetic() || c == '_'),
      pair(char(':'), space1),
      is_not("\r\n"),
    ),
  )
  .parse(input)
}

/// Reads the `__metadata` block of a berry lockfile
/// e.g.
/// __metadata:
///   version: 8
///   cacheKey: 10c0
pub(crate) fn parse_metadata(lines: &[&str]) -> Option<Metadata> {
  let start = lines
    .iter()
    .position(|line| line.trim_end() == "__metadata:")?;

  let mut version = None;
  let mut cache_key = None;

  for line in lines[start + 1..].iter().take_while(|line| !line.is_empty()) {
    let Ok((_, (key, value))) = parse_metadata_line(line) else {
      continue;
    };

    match key {
      "version" => version = Some(value.trim().to_string()),
      "cacheKey" => cache_key = Some(value.trim().to_string()),
      _ => {}
    }
  }

  version.map(|version| Metadata::new(version, cache_key))
}
