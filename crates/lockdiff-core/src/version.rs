//! Loose semantic version handling.
//!
//! Lockfiles carry both exact versions (`4.17.21`, `0.0.0-use.local`) and
//! ranges (`^4.17.0`, `>= 2.1.2 < 3`, `packages/a`). Ranges are only ever
//! needed as a sort key, so they are coerced down to the first
//! `MAJOR.MINOR.PATCH`-looking run of digits in them.

use std::cmp::Ordering;

use nom::{
  IResult, Parser,
  character::complete::{char, digit1},
  combinator::{map_res, opt, verify},
  sequence::preceded,
};
use semver::{BuildMetadata, Version};

/// Longer digit runs are not treated as version components.
const MAX_COMPONENT_DIGITS: usize = 16;

fn component(input: &str) -> IResult<&str, u64> {
  map_res(
    verify(digit1, |digits: &str| digits.len() <= MAX_COMPONENT_DIGITS),
    str::parse::<u64>,
  )
  .parse(input)
}

/// `MAJOR[.MINOR[.PATCH]]`, each part a full run of digits
fn coerced_triple(input: &str) -> IResult<&str, (u64, Option<u64>, Option<u64>)> {
  (
    component,
    opt(preceded(char('.'), component)),
    opt(preceded(char('.'), component)),
  )
    .parse(input)
}

/// Find the first version-like run of digits in `text`, filling missing
/// minor/patch parts with zero.
///
/// `^4.17` coerces to `4.17.0`, `>= 2.1.2 < 3` to `2.1.2`; text without any
/// usable digits (`packages/a`) yields `None`.
pub fn coerce(text: &str) -> Option<Version> {
  let mut rest = text;

  while let Some(start) = rest.find(|c: char| c.is_ascii_digit()) {
    let candidate = &rest[start..];
    if let Ok((_, (major, minor, patch))) = coerced_triple(candidate) {
      return Some(Version::new(
        major,
        minor.unwrap_or(0),
        patch.unwrap_or(0),
      ));
    }

    // the run was too long to be a component, move past all of it
    let run_len = candidate
      .find(|c: char| !c.is_ascii_digit())
      .unwrap_or(candidate.len());
    rest = &candidate[run_len..];
  }

  None
}

/// [`coerce`], defaulting to `0.0.0`
pub fn coerce_or_zero(text: &str) -> Version {
  coerce(text).unwrap_or_else(|| Version::new(0, 0, 0))
}

/// The version used to order two resolved versions. Valid semver keeps its
/// pre-release tag, build metadata never takes part in ordering, and anything
/// else falls back to coercion.
pub fn semantic_version(text: &str) -> Version {
  Version::parse(text.trim()).map_or_else(
    |_| coerce_or_zero(text),
    |mut version| {
      version.build = BuildMetadata::EMPTY;
      version
    },
  )
}

/// Semantic precedence of two version strings
pub fn compare_versions(a: &str, b: &str) -> Ordering {
  semantic_version(a).cmp(&semantic_version(b))
}
