#![deny(clippy::all)]
//! End-to-end tests for the lockfile parser and differ
//!
//! Fixtures live in the repository's `fixtures/` directory, one directory
//! per scenario holding the previous (`a.lock`) and current (`b.lock`)
//! version of a lockfile.

use std::path::{Path, PathBuf};

/// The repository's `fixtures/` directory
pub fn fixtures_dir() -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR"))
    .parent()
    .and_then(Path::parent)
    .expect("test crate lives two levels below the workspace root")
    .join("fixtures")
}

/// Load a fixture file, relative to the fixtures directory
pub fn load_fixture(relative_path: &str) -> String {
  load_fixture_from_path(&fixtures_dir().join(relative_path))
}

/// Load a fixture file from a path
pub fn load_fixture_from_path(fixture_path: &Path) -> String {
  std::fs::read_to_string(fixture_path).unwrap_or_else(|e| {
    panic!(
      "Failed to read fixture file {}: {}",
      fixture_path.display(),
      e
    )
  })
}

/// The previous and current lockfile of a scenario
pub fn load_scenario(scenario: &str) -> (String, String) {
  (
    load_fixture(&format!("{scenario}/a.lock")),
    load_fixture(&format!("{scenario}/b.lock")),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use lockdiff_core::lockfile::{LockFormat, LockStatus};
  use lockdiff_core::{ChangeStatus, count_statuses, diff_locks, parse_lock};
  use pretty_assertions::assert_eq;
  use rstest::rstest;
  use std::sync::Arc;

  #[rstest]
  fn test_parse_lockfile_fixtures(#[files("../../fixtures/**/*.lock")] fixture_path: PathBuf) {
    let contents = load_fixture_from_path(&fixture_path);
    let display = fixture_path.display();

    assert!(!contents.is_empty(), "Fixture should not be empty");

    let lock = parse_lock(&contents);
    assert_eq!(
      lock.status(),
      LockStatus::Success,
      "Should recognise the format of {display}"
    );
    assert!(!lock.is_empty(), "Should parse entries from {display}");

    for (key, entry) in &lock.entries {
      assert!(
        entry.version().is_some_and(|v| !v.is_empty()),
        "{key} in {display} has no version"
      );
      assert!(entry.resolved().is_some(), "{key} in {display} has no resolution");
    }
  }

  #[rstest]
  fn test_fixture_diffed_with_itself_is_empty(
    #[files("../../fixtures/**/*.lock")] fixture_path: PathBuf,
  ) {
    let lock = parse_lock(&load_fixture_from_path(&fixture_path));
    assert!(diff_locks(&lock, &lock).is_empty());
  }

  #[rstest]
  #[case::classic("classic", LockFormat::Classic, [1, 2, 1, 1])]
  #[case::berry_v2("berry-v2", LockFormat::BerryV2, [1, 2, 0, 1])]
  #[case::berry_v3("berry-v3", LockFormat::BerryV3Plus, [1, 1, 1, 1])]
  #[case::berry_v4("berry-v4", LockFormat::BerryV3Plus, [1, 1, 1, 2])]
  fn test_scenario_changes(
    #[case] scenario: &str,
    #[case] format: LockFormat,
    #[case] counts: [usize; 4],
  ) {
    let (a, b) = load_scenario(scenario);
    let (previous, current) = (parse_lock(&a), parse_lock(&b));
    assert_eq!(previous.format, format);
    assert_eq!(current.format, format);

    let changes = diff_locks(&previous, &current);
    let found: Vec<usize> = ChangeStatus::ORDER
      .into_iter()
      .map(|status| count_statuses(&changes, status))
      .collect();

    assert_eq!(found, counts.to_vec());
    assert_eq!(changes.len(), counts.iter().sum::<usize>());
  }

  #[test]
  fn test_classic_scenario_details() {
    let (a, b) = load_scenario("classic");
    let changes = diff_locks(&parse_lock(&a), &parse_lock(&b));

    let rows: Vec<(&str, &str, &str, ChangeStatus)> = changes
      .iter()
      .map(|(name, change)| {
        (
          name.as_str(),
          change.previous.as_str(),
          change.current.as_str(),
          change.status,
        )
      })
      .collect();

    assert_eq!(
      rows,
      vec![
        ("@babel/code-frame", "7.10.4", "7.12.11", ChangeStatus::Updated),
        ("debug", "-", "4.3.1", ChangeStatus::Added),
        ("left-pad", "1.3.0", "-", ChangeStatus::Removed),
        ("lodash", "4.17.19", "4.17.21", ChangeStatus::Updated),
        ("ms", "2.1.2", "2.1.1", ChangeStatus::Downgraded),
      ]
    );
  }

  #[test]
  fn test_classic_alias_entries_are_shared() {
    let lock = parse_lock(&load_fixture("classic/b.lock"));

    let first = lock.get("ms@2.1.1").unwrap();
    let second = lock.get("ms@2.1.2").unwrap();
    assert!(Arc::ptr_eq(first, second));
    assert_eq!(lock.len(), 11);
  }

  #[test]
  fn test_berry_v3_scenario_details() {
    let (a, b) = load_scenario("berry-v3");
    let (previous, current) = (parse_lock(&a), parse_lock(&b));

    assert_eq!(
      current.metadata.as_ref().map(|m| m.version.as_str()),
      Some("6")
    );
    assert_eq!(previous.len(), 5);
    assert_eq!(current.len(), 6);

    let changes = diff_locks(&previous, &current);
    let rows: Vec<(&str, &str, &str, ChangeStatus)> = changes
      .iter()
      .map(|(name, change)| {
        (
          name.as_str(),
          change.previous.as_str(),
          change.current.as_str(),
          change.status,
        )
      })
      .collect();

    assert_eq!(
      rows,
      vec![
        ("ansi-styles", "4.3.0", "4.2.1", ChangeStatus::Downgraded),
        ("color-name", "-", "1.1.4", ChangeStatus::Added),
        ("ms", "2.1.3", "-", ChangeStatus::Removed),
        ("supports-color", "7.2.0", "8.1.1", ChangeStatus::Updated),
      ]
    );
  }

  #[test]
  fn test_berry_v4_entries() {
    let lock = parse_lock(&load_fixture("berry-v4/a.lock"));

    assert_eq!(
      lock.metadata.as_ref().and_then(|m| m.cache_key.as_deref()),
      Some("10c0")
    );
    assert_eq!(lock.len(), 9);

    let app = lock.get("app@.").unwrap().as_berry().unwrap();
    assert!(app.is_local());
    assert_eq!(app.resolved.as_deref(), Some("workspace"));
    assert_eq!(
      app
        .dependencies
        .as_ref()
        .and_then(|deps| deps.get("@types/node"))
        .map(String::as_str),
      Some("npm:^20.0.0")
    );

    let fsevents = lock
      .get("fsevents@patch:fsevents@npm%3A~2.3.2#optional!builtin<compat/fsevents>")
      .unwrap()
      .as_berry()
      .unwrap();
    assert_eq!(fsevents.conditions.as_deref(), Some("os=darwin"));
    assert_eq!(fsevents.integrity, None);
  }

  #[test]
  fn test_unsupported_fixture_end_to_end() {
    let unsupported = parse_lock(&load_fixture("unsupported/package-lock.json"));
    assert_eq!(unsupported.status(), LockStatus::Unsupported);
    assert!(unsupported.is_empty());

    let valid = parse_lock(&load_fixture("berry-v2/a.lock"));

    let removed = diff_locks(&valid, &unsupported);
    assert_eq!(count_statuses(&removed, ChangeStatus::Removed), removed.len());
    assert_eq!(removed.len(), 5);

    let added = diff_locks(&unsupported, &valid);
    assert_eq!(count_statuses(&added, ChangeStatus::Added), added.len());
    assert_eq!(added.len(), 5);
  }

  #[test]
  fn test_fixture_discovery() {
    let fixtures_dir = fixtures_dir();
    assert!(fixtures_dir.exists(), "Fixtures directory should exist");

    for scenario in ["classic", "berry-v2", "berry-v3", "berry-v4"] {
      for file in ["a.lock", "b.lock"] {
        let path = fixtures_dir.join(scenario).join(file);
        assert!(path.exists(), "missing fixture {}", path.display());
      }
    }
  }
}
