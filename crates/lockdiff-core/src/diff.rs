//! Package level comparison of two parsed lockfiles.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::Serialize;
use tracing::debug;

use crate::error::Error;
use crate::ident::{Descriptor, compare_names};
use crate::lockfile::ParsedLock;
use crate::version::{coerce_or_zero, compare_versions};

/// Stands in for the version on the side where a package does not exist
pub const MISSING: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeStatus {
  Added,
  Updated,
  Downgraded,
  Removed,
}

impl ChangeStatus {
  /// Order in which grouped reports list the statuses
  pub const ORDER: [Self; 4] = [Self::Added, Self::Updated, Self::Downgraded, Self::Removed];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Added => "ADDED",
      Self::Updated => "UPDATED",
      Self::Downgraded => "DOWNGRADED",
      Self::Removed => "REMOVED",
    }
  }

  /// Position in [`ChangeStatus::ORDER`]
  pub fn rank(self) -> usize {
    self as usize
  }
}

impl fmt::Display for ChangeStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ChangeStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ORDER
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| Error::UnknownStatus(s.to_string()))
  }
}

/// One changed package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockChange {
  /// Version in the previous lockfile, or [`MISSING`]
  pub previous: String,
  /// Version in the current lockfile, or [`MISSING`]
  pub current: String,
  pub status: ChangeStatus,
}

/// Changed packages by bare name, unchanged packages are never present
pub type LockChanges = BTreeMap<String, LockChange>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageVersion {
  pub name: String,
  pub version: String,
}

/// One version per bare package name
pub type PackageView = BTreeMap<String, PackageVersion>;

/// The part of a lock key that orders it against others: everything before
/// the last `@`, so `foo@npm:bar@^1.0.0` sorts after every plain `foo@...` key
fn key_prefix(key: &str) -> &str {
  key.rfind('@').map_or(key, |idx| &key[..idx])
}

/// Collapse the lock keys of a parsed lockfile into one version per package.
///
/// Keys are ordered by their text up to the last `@`, then by coerced range,
/// and folded into their bare name with the last one winning:
/// `lodash@^3.0.0` and `lodash@^4.0.0` collapse to the version locked for
/// `^4.0.0`, and an alias key `foo@npm:bar@^0.5.0` wins over `foo@^1.0.0`.
/// Keys that tie stay in key order.
pub fn package_view(lock: &ParsedLock) -> PackageView {
  let mut keys: Vec<(&str, Version, &str)> = lock
    .entries
    .iter()
    .map(|(key, entry)| {
      let range = coerce_or_zero(Descriptor::from_lock_key(key).range());
      (key.as_str(), range, entry.version().unwrap_or_default())
    })
    .collect();

  // stable, `entries` already iterates in key order
  keys.sort_by(|(a, a_range, _), (b, b_range, _)| {
    compare_names(key_prefix(a), key_prefix(b)).then_with(|| a_range.cmp(b_range))
  });

  let mut view = PackageView::new();
  for (key, _, version) in keys {
    let name = Descriptor::from_lock_key(key).ident().full_name();
    let package = PackageVersion {
      name: name.clone(),
      version: version.to_string(),
    };
    view.insert(name, package);
  }

  view
}

/// Compare two lockfiles package by package.
///
/// Packages whose version strings are identical are left out. Any textual
/// difference is a change, even one semver considers equal (`1.0.0+a` vs
/// `1.0.0+b`); semantic ordering only decides between updated and downgraded.
pub fn diff_locks(previous: &ParsedLock, current: &ParsedLock) -> LockChanges {
  let previous_packages = package_view(previous);
  let current_packages = package_view(current);

  let mut changes: LockChanges = previous_packages
    .into_iter()
    .map(|(name, package)| {
      let change = LockChange {
        previous: package.version,
        current: MISSING.to_string(),
        status: ChangeStatus::Removed,
      };
      (name, change)
    })
    .collect();

  for (name, package) in current_packages {
    match changes.entry(name) {
      Entry::Vacant(slot) => {
        slot.insert(LockChange {
          previous: MISSING.to_string(),
          current: package.version,
          status: ChangeStatus::Added,
        });
      }
      Entry::Occupied(slot) if slot.get().previous == package.version => {
        slot.remove();
      }
      Entry::Occupied(mut slot) => {
        let change = slot.get_mut();
        change.status = match compare_versions(&change.previous, &package.version) {
          Ordering::Greater => ChangeStatus::Downgraded,
          Ordering::Less | Ordering::Equal => ChangeStatus::Updated,
        };
        change.current = package.version;
      }
    }
  }

  debug!(changes = changes.len(), "diffed lockfiles");
  changes
}

/// Number of changes with the given status
pub fn count_statuses(changes: &LockChanges, status: ChangeStatus) -> usize {
  changes
    .values()
    .filter(|change| change.status == status)
    .count()
}
