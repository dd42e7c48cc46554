// Naming follows yarn's own
// https://github.com/yarnpkg/berry/blob/master/packages/yarnpkg-core/sources/types.ts#L19

use std::cmp::Ordering;
use std::fmt;

/// Scope + name of the package
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident {
  /// The scope of the package, e.g. for `@scope/package`, this is `@scope`
  scope: Option<String>,
  /// The name of the package, e.g. for `@scope/package`, this is `package`
  name: String,
}

impl Ident {
  pub fn new(scope: Option<String>, name: String) -> Self {
    Self { scope, name }
  }

  /// Split a bare package name such as `@babel/core` or `lodash`
  pub fn parse(full_name: &str) -> Self {
    full_name
      .strip_prefix('@')
      .and_then(|stripped| stripped.split_once('/'))
      .map_or_else(
        || Self::new(None, full_name.to_string()),
        |(scope, name)| Self::new(Some(format!("@{scope}")), name.to_string()),
      )
  }

  pub fn scope(&self) -> Option<&str> {
    self.scope.as_deref()
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// `@scope/name` for scoped packages, `name` otherwise
  pub fn full_name(&self) -> String {
    self.to_string()
  }
}

impl fmt::Display for Ident {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.scope {
      Some(scope) => write!(f, "{scope}/{}", self.name),
      None => f.write_str(&self.name),
    }
  }
}

/// Descriptors are just like idents, except that they also carry the range
/// that requested the package, e.g. `lodash@^4.17.0`.
///
/// Every key of a parsed lockfile is a descriptor; several of them can point
/// at one resolved entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
  ident: Ident,
  range: String,
}

impl Descriptor {
  pub fn new(ident: Ident, range: String) -> Self {
    Self { ident, range }
  }

  /// Split a lock key into package name and range.
  ///
  /// The name ends at the first `@` that is not the leading scope marker, the
  /// range starts after the last `@`. Keys without a separator have an empty
  /// range.
  pub fn from_lock_key(key: &str) -> Self {
    let name_end = key
      .char_indices()
      .skip(1)
      .find_map(|(idx, c)| (c == '@').then_some(idx));

    let Some(name_end) = name_end else {
      return Self::new(Ident::parse(key), String::new());
    };

    let range = key.rfind('@').map_or("", |idx| &key[idx + 1..]);

    Self::new(Ident::parse(&key[..name_end]), range.to_string())
  }

  pub fn ident(&self) -> &Ident {
    &self.ident
  }

  pub fn range(&self) -> &str {
    &self.range
  }
}

fn collation_weight(c: char) -> (u8, char) {
  if c.is_alphabetic() {
    (2, c.to_lowercase().next().unwrap_or(c))
  } else if c.is_numeric() {
    (1, c)
  } else {
    (0, c)
  }
}

/// Order package names the way a root-locale string comparison does:
/// punctuation before digits before letters, letters compared without case.
/// Names equal under that order fall back to byte order.
pub fn compare_names(a: &str, b: &str) -> Ordering {
  a.chars()
    .map(collation_weight)
    .cmp(b.chars().map(collation_weight))
    .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
  use super::*;
  use rstest::rstest;

  #[rstest]
  #[case("lodash@^4.17.0", None, "lodash", "^4.17.0")]
  #[case("@babel/code-frame@^7.0.0", Some("@babel"), "code-frame", "^7.0.0")]
  #[case("a@packages/a", None, "a", "packages/a")]
  #[case(
    "string-width-cjs@npm:string-width@^4.2.0",
    None,
    "string-width-cjs",
    "^4.2.0"
  )]
  #[case("@types/node@*", Some("@types"), "node", "*")]
  fn test_descriptor_from_lock_key(
    #[case] key: &str,
    #[case] scope: Option<&str>,
    #[case] name: &str,
    #[case] range: &str,
  ) {
    let descriptor = Descriptor::from_lock_key(key);
    assert_eq!(descriptor.ident().scope(), scope);
    assert_eq!(descriptor.ident().name(), name);
    assert_eq!(descriptor.range(), range);
  }

  #[test]
  fn test_scoped_full_name_is_not_split_on_first_at() {
    let descriptor = Descriptor::from_lock_key("@scope/name@^1.0.0");
    assert_eq!(descriptor.ident().full_name(), "@scope/name");
  }

  #[test]
  fn test_key_without_range() {
    let descriptor = Descriptor::from_lock_key("lodash");
    assert_eq!(descriptor.ident().full_name(), "lodash");
    assert_eq!(descriptor.range(), "");
  }

  #[test]
  fn test_malformed_scope_is_kept_whole() {
    let ident = Ident::parse("@noslash");
    assert_eq!(ident.scope(), None);
    assert_eq!(ident.full_name(), "@noslash");
  }

  #[test]
  fn test_compare_names_orders_like_a_locale() {
    let mut names = vec![
      "lodash-es",
      "Lodash.get",
      "1pkg",
      "lodash",
      "_private",
      "@scope/a",
    ];
    names.sort_by(|a, b| compare_names(a, b));

    assert_eq!(
      names,
      vec!["@scope/a", "_private", "1pkg", "lodash", "lodash-es", "Lodash.get"]
    );
  }

  #[test]
  fn test_compare_names_only_equal_for_identical_text() {
    assert_eq!(compare_names("react", "react"), Ordering::Equal);
    assert_ne!(compare_names("React", "react"), Ordering::Equal);
  }
}
