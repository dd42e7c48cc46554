use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Error;
use crate::metadata::PeerDependencyMeta;

/// Name -> requested range, e.g. `ms` -> `^2.1.1`
pub type DependencyMap = BTreeMap<String, String>;

/// Value of a berry `resolution:` field that points into the repository
pub const WORKSPACE_RESOLUTION: &str = "workspace";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// The type of link to use for a package
pub enum LinkType {
  /// The package manager owns the location (typically things within the cache)
  /// e.g. `PnP` linker may unplug packages
  Hard,

  /// The package manager doesn't own the location (symlinks, workspaces, etc),
  /// so the linkers aren't allowed to do anything with them except use them as
  /// they are.
  Soft,
}

impl TryFrom<&str> for LinkType {
  type Error = Error;

  fn try_from(s: &str) -> Result<Self, Self::Error> {
    match s {
      "hard" => Ok(Self::Hard),
      "soft" => Ok(Self::Soft),
      other => Err(Error::UnknownLinkType(other.to_string())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LanguageName(String);

impl LanguageName {
  pub fn new(name: String) -> Self {
    Self(name)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl AsRef<str> for LanguageName {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

/// An entry of a yarn v1 lockfile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassicEntry {
  pub version: Option<String>,
  /// Tarball URL the package was fetched from
  pub resolved: Option<String>,
  pub integrity: Option<String>,
  /// Only the `dependencies:` block, `optionalDependencies:` is kept apart
  pub dependencies: Option<DependencyMap>,
  /// The `optionalDependencies:` block. Not part of
  /// [`LockEntry::dependencies`], chain the two for every dependency line of
  /// the entry
  pub optional_dependencies: Option<DependencyMap>,
}

/// An entry of a yarn berry (v2+) lockfile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BerryEntry {
  /// Version of the package, `0.0.0-use.local` for workspaces
  pub version: Option<String>,

  /// The locator the entry resolved to, or [`WORKSPACE_RESOLUTION`] for
  /// packages that live in the repository
  pub resolved: Option<String>,

  /// Checksum of the package archive, absent for local packages
  pub integrity: Option<String>,

  /// The "language" of the package (eg. `node`), for use with multi-linkers.
  pub language: Option<LanguageName>,

  /// Type of filesystem link for a package
  pub link: Option<LinkType>,

  /// A set of constraints indicating whether the package supports the host environments
  pub conditions: Option<String>,

  /// There's no distinction between prod dependencies and dev dependencies,
  /// because those have already been merged during the resolution process
  pub dependencies: Option<DependencyMap>,

  pub peer_dependencies: Option<DependencyMap>,

  /// Map with additional information about peer dependencies
  pub peer_dependencies_meta: Option<BTreeMap<String, PeerDependencyMeta>>,
}

impl BerryEntry {
  /// Workspaces and `portal:`/`link:` packages are resolved in place
  pub fn is_local(&self) -> bool {
    self
      .version
      .as_deref()
      .is_some_and(|version| version.contains("use.local"))
  }
}

/// A resolved package, shared by every lock key that resolved to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LockEntry {
  Classic(ClassicEntry),
  Berry(BerryEntry),
}

impl LockEntry {
  pub fn version(&self) -> Option<&str> {
    match self {
      Self::Classic(entry) => entry.version.as_deref(),
      Self::Berry(entry) => entry.version.as_deref(),
    }
  }

  pub fn resolved(&self) -> Option<&str> {
    match self {
      Self::Classic(entry) => entry.resolved.as_deref(),
      Self::Berry(entry) => entry.resolved.as_deref(),
    }
  }

  pub fn integrity(&self) -> Option<&str> {
    match self {
      Self::Classic(entry) => entry.integrity.as_deref(),
      Self::Berry(entry) => entry.integrity.as_deref(),
    }
  }

  pub fn dependencies(&self) -> Option<&DependencyMap> {
    match self {
      Self::Classic(entry) => entry.dependencies.as_ref(),
      Self::Berry(entry) => entry.dependencies.as_ref(),
    }
  }

  pub fn as_berry(&self) -> Option<&BerryEntry> {
    match self {
      Self::Berry(entry) => Some(entry),
      Self::Classic(_) => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_link_type_from_str() {
    assert_eq!(LinkType::try_from("hard"), Ok(LinkType::Hard));
    assert_eq!(LinkType::try_from("soft"), Ok(LinkType::Soft));
    assert_eq!(
      LinkType::try_from("symlink"),
      Err(Error::UnknownLinkType("symlink".to_string()))
    );
  }

  #[test]
  fn test_common_accessors() {
    let entry = LockEntry::Berry(BerryEntry {
      version: Some("0.0.0-use.local".to_string()),
      resolved: Some(WORKSPACE_RESOLUTION.to_string()),
      ..BerryEntry::default()
    });

    assert_eq!(entry.version(), Some("0.0.0-use.local"));
    assert_eq!(entry.resolved(), Some("workspace"));
    assert_eq!(entry.integrity(), None);
    assert!(entry.dependencies().is_none());
    assert!(entry.as_berry().is_some_and(BerryEntry::is_local));
  }
}
