use std::collections::BTreeMap;
use std::sync::Arc;

use nom::{
  IResult, Parser,
  branch::alt,
  bytes::complete::{is_not, take_while1},
  character::complete::{char, space1},
  combinator::{all_consuming, eof, rest},
  sequence::{separated_pair, terminated},
};
use tracing::debug;

use crate::lockfile::{LockFormat, ParsedLock, detect_format, parse_metadata};
use crate::metadata::PeerDependencyMeta;
use crate::package::{
  BerryEntry, ClassicEntry, DependencyMap, LanguageName, LinkType, LockEntry, WORKSPACE_RESOLUTION,
};

/// Chunks shorter than this, counting their terminating blank line, are
/// leftovers rather than entries
const MIN_CHUNK_LINES: usize = 4;

/// Berry protocols that are dropped from lock keys, `foo@npm:^1.0.0` is
/// keyed as `foo@^1.0.0`
const STRIPPED_PROTOCOLS: [&str; 3] = ["@npm:", "@yarn:", "@workspace:"];

/// Entrypoint for parsing a yarn lockfile, classic or berry.
///
/// Never fails: content in an unknown dialect yields an empty lock whose
/// status is [`crate::lockfile::LockStatus::Unsupported`].
pub fn parse_lock(content: &str) -> ParsedLock {
  let normalized = normalize(content);
  let lines: Vec<&str> = normalized.split('\n').collect();

  let header = detect_format(&lines);
  let construct: fn(&EntryFields<'_>) -> LockEntry = match header.format {
    LockFormat::Classic => construct_classic_entry,
    LockFormat::BerryV2 | LockFormat::BerryV3Plus => construct_berry_entry,
    LockFormat::Unsupported => {
      debug!("no known lockfile header found");
      return ParsedLock::unsupported();
    }
  };

  let metadata = if header.format.is_berry() {
    parse_metadata(&lines)
  } else {
    None
  };

  let body = lines.get(header.skip_lines..).unwrap_or_default();
  let chunks = split_chunks(body);

  let mut entries = BTreeMap::new();
  for chunk in &chunks {
    let Some((key_line, field_lines)) = chunk.split_first() else {
      continue;
    };

    let entry = Arc::new(construct(&EntryFields::read(field_lines)));
    // last write wins should two chunks ever claim the same key
    for key in alias_keys(key_line, header.format) {
      entries.insert(key, Arc::clone(&entry));
    }
  }

  debug!(
    format = ?header.format,
    chunks = chunks.len(),
    keys = entries.len(),
    "parsed lockfile"
  );

  ParsedLock {
    format: header.format,
    metadata,
    entries,
  }
}

/// Quoting carries no meaning for the fields we read, and `\r\n` files must
/// read the same as `\n` ones
fn normalize(content: &str) -> String {
  content.chars().filter(|c| !matches!(c, '\r' | '"')).collect()
}

/// Split the body of a lockfile into blank-line separated chunks.
///
/// A chunk ends at an empty line or at the end of input. The blank line
/// terminating a chunk counts towards [`MIN_CHUNK_LINES`] but is not part of
/// the returned slice.
fn split_chunks<'a, 'b>(lines: &'a [&'b str]) -> Vec<&'a [&'b str]> {
  let mut chunks = Vec::new();
  let mut start = 0;

  for (idx, line) in lines.iter().enumerate() {
    let blank = line.is_empty();
    if !blank && idx + 1 < lines.len() {
      continue;
    }

    if idx + 1 - start >= MIN_CHUNK_LINES {
      let end = if blank { idx } else { idx + 1 };
      chunks.push(&lines[start..end]);
    }
    start = idx + 1;
  }

  chunks
}

/// The comma separated lock keys on the first line of a chunk
fn alias_keys(key_line: &str, format: LockFormat) -> Vec<String> {
  let line = key_line.trim_end();
  let line = line.strip_suffix(':').unwrap_or(line);

  line
    .split(',')
    .map(str::trim)
    .filter(|key| !key.is_empty())
    .map(|key| {
      if format.is_berry() {
        strip_protocols(key)
      } else {
        key.to_string()
      }
    })
    .collect()
}

fn strip_protocols(key: &str) -> String {
  STRIPPED_PROTOCOLS
    .iter()
    .fold(key.to_string(), |key, protocol| key.replace(*protocol, "@"))
}

/// One line of an entry body, after its indentation
#[derive(Debug, PartialEq, Eq)]
enum FieldLine<'a> {
  /// `version: 1.0.0` (berry) or `version "1.0.0"` (classic)
  Scalar(&'a str, &'a str),
  /// `dependencies:`, the block's lines follow with a deeper indent
  BlockStart(&'a str),
}

fn field_label(input: &str) -> IResult<&str, &str> {
  take_while1(|c: char| c.is_alphanumeric() || c == '_').parse(input)
}

fn field_line(input: &str) -> IResult<&str, FieldLine<'_>> {
  alt((
    terminated(field_label, (char(':'), eof)).map(FieldLine::BlockStart),
    separated_pair(field_label, (char(':'), space1), rest)
      .map(|(label, value)| FieldLine::Scalar(label, value)),
    separated_pair(field_label, space1, rest).map(|(label, value)| FieldLine::Scalar(label, value)),
  ))
  .parse(input)
}

fn indentation(line: &str) -> usize {
  line.len() - line.trim_start_matches(' ').len()
}

/// The labelled fields of one entry, in file order.
///
/// Fields are looked up by label rather than by position, optional blocks
/// such as `dependencies:` shift everything after them.
#[derive(Debug, Default)]
struct EntryFields<'a> {
  scalars: Vec<(&'a str, &'a str)>,
  blocks: Vec<(&'a str, Vec<&'a str>)>,
}

impl<'a> EntryFields<'a> {
  fn read(lines: &[&'a str]) -> Self {
    let mut fields = Self::default();
    let Some(field_indent) = lines.first().map(|line| indentation(line)) else {
      return fields;
    };

    // index into `blocks` of the block currently collecting lines
    let mut open_block: Option<usize> = None;

    for &line in lines {
      if indentation(line) > field_indent {
        if let Some(block) = open_block.and_then(|idx| fields.blocks.get_mut(idx)) {
          block.1.push(line);
        }
        continue;
      }

      open_block = None;
      match field_line(line.trim()) {
        Ok((_, FieldLine::Scalar(label, value))) => fields.scalars.push((label, value)),
        Ok((_, FieldLine::BlockStart(label))) => {
          fields.blocks.push((label, Vec::new()));
          open_block = Some(fields.blocks.len() - 1);
        }
        Err(_) => debug!(line, "skipping unrecognised entry line"),
      }
    }

    fields
  }

  fn scalar(&self, label: &str) -> Option<&'a str> {
    self
      .scalars
      .iter()
      .find_map(|&(found, value)| (found == label).then_some(value))
  }

  fn block(&self, label: &str) -> Option<&[&'a str]> {
    self
      .blocks
      .iter()
      .find_map(|(found, lines)| (*found == label).then_some(lines.as_slice()))
  }

  fn dependency_block(&self, label: &str) -> Option<DependencyMap> {
    self.block(label).map(parse_dependency_block)
  }
}

/// A dependency line holds exactly two space separated tokens, the name
/// (with a trailing `:` in berry files) and the range
fn dependency_line(input: &str) -> IResult<&str, (&str, &str)> {
  all_consuming(separated_pair(is_not(" "), char(' '), is_not(" "))).parse(input)
}

fn parse_dependency_block(lines: &[&str]) -> DependencyMap {
  lines
    .iter()
    .copied()
    .filter_map(|line| dependency_line(line.trim()).ok())
    .map(|(_, (name, range))| {
      let name = name.strip_suffix(':').unwrap_or(name);
      (name.to_string(), range.to_string())
    })
    .collect()
}

/// `peerDependenciesMeta:` nests one level deeper than other blocks
/// ```text
///   peerDependenciesMeta:
///     react:
///       optional: true
/// ```
fn parse_peer_dependencies_meta(lines: &[&str]) -> BTreeMap<String, PeerDependencyMeta> {
  let mut meta = BTreeMap::new();
  let mut current: Option<&str> = None;

  for &line in lines {
    match field_line(line.trim()) {
      Ok((_, FieldLine::Scalar("optional", value))) => {
        if let Some(name) = current {
          meta.insert(
            name.to_string(),
            PeerDependencyMeta {
              optional: value.trim() == "true",
            },
          );
        }
      }
      // anything else opens the next package, `react:` or `@types/react:`
      _ => {
        let name = line.trim();
        current = name.strip_suffix(':');
        if let Some(name) = current {
          meta.entry(name.to_string()).or_default();
        }
      }
    }
  }

  meta
}

fn construct_classic_entry(fields: &EntryFields<'_>) -> LockEntry {
  LockEntry::Classic(ClassicEntry {
    version: fields.scalar("version").map(str::to_string),
    resolved: fields.scalar("resolved").map(str::to_string),
    integrity: fields.scalar("integrity").map(str::to_string),
    dependencies: fields.dependency_block("dependencies"),
    optional_dependencies: fields.dependency_block("optionalDependencies"),
  })
}

fn construct_berry_entry(fields: &EntryFields<'_>) -> LockEntry {
  let resolved = fields.scalar("resolution").map(|resolution| {
    if resolution.contains("@workspace:") {
      WORKSPACE_RESOLUTION.to_string()
    } else {
      resolution.to_string()
    }
  });

  let link = fields
    .scalar("linkType")
    .and_then(|link| match LinkType::try_from(link) {
      Ok(link) => Some(link),
      Err(err) => {
        debug!(%err, "ignoring link type");
        None
      }
    });

  let entry = BerryEntry {
    version: fields.scalar("version").map(str::to_string),
    resolved,
    integrity: fields.scalar("checksum").map(str::to_string),
    language: fields
      .scalar("languageName")
      .map(|name| LanguageName::new(name.to_string())),
    link,
    conditions: fields.scalar("conditions").map(str::to_string),
    dependencies: fields.dependency_block("dependencies"),
    peer_dependencies: fields.dependency_block("peerDependencies"),
    peer_dependencies_meta: fields
      .block("peerDependenciesMeta")
      .map(parse_peer_dependencies_meta),
  };

  LockEntry::Berry(entry)
}
