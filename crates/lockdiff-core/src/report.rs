//! Markdown rendering of a [`LockChanges`] set, the shape used for pull
//! request comments.

use std::cmp::Ordering;

use crate::diff::{ChangeStatus, LockChange, LockChanges, count_statuses};
use crate::ident::compare_names;

/// Tables longer than this do not fit in a comment once wrapped, and are
/// re-rendered with plain text statuses
pub const MAX_TABLE_LEN: usize = 64_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
  Left,
  Center,
}

impl Align {
  fn delimiter(self) -> &'static str {
    match self {
      Self::Left => ":-",
      Self::Center => ":-:",
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableOptions {
  /// List rows by [`ChangeStatus::ORDER`] first, then by name
  pub group_by_status: bool,
  /// Render `UPDATED` instead of a badge image
  pub plain_statuses: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
  /// Shown as the heading, usually the lockfile path
  pub title: String,
  pub table: TableOptions,
  /// From this many changes on, a summary is added and the table starts
  /// collapsed
  pub collapse_threshold: usize,
}

fn badge(status: ChangeStatus) -> (&'static str, u32) {
  match status {
    ChangeStatus::Added => ("https://git.io/J38HP", 53),
    ChangeStatus::Updated => ("https://git.io/J38dY", 60),
    ChangeStatus::Downgraded => ("https://git.io/J38ds", 89),
    ChangeStatus::Removed => ("https://git.io/J38dt", 66),
  }
}

fn status_label(status: ChangeStatus, plain: bool) -> String {
  if plain {
    return status.to_string();
  }

  let (url, width) = badge(status);
  format!(r#"[<sub><img alt="{status}" src="{url}" height="16" width="{width}" /></sub>](#)"#)
}

fn markdown_table(header: &[&str], align: &[Align], rows: &[Vec<String>]) -> String {
  let delimiters: Vec<&str> = align.iter().map(|a| a.delimiter()).collect();

  let mut lines = vec![
    format!("| {} |", header.join(" | ")),
    format!("| {} |", delimiters.join(" | ")),
  ];
  lines.extend(rows.iter().map(|row| format!("| {} |", row.join(" | "))));

  lines.join("\n")
}

/// `Name | Status | Previous | Current` table of every change
pub fn render_table(changes: &LockChanges, options: TableOptions) -> String {
  let mut rows: Vec<(&String, &LockChange)> = changes.iter().collect();
  rows.sort_by(|(a, a_change), (b, b_change)| {
    let by_status = if options.group_by_status {
      a_change.status.rank().cmp(&b_change.status.rank())
    } else {
      Ordering::Equal
    };
    by_status.then_with(|| compare_names(a, b))
  });

  let rows: Vec<Vec<String>> = rows
    .into_iter()
    .map(|(name, change)| {
      vec![
        format!("`{name}`"),
        status_label(change.status, options.plain_statuses),
        change.previous.clone(),
        change.current.clone(),
      ]
    })
    .collect();

  markdown_table(
    &["Name", "Status", "Previous", "Current"],
    &[Align::Left, Align::Center, Align::Center, Align::Center],
    &rows,
  )
}

/// `Status | Count` table, statuses without changes are left out
pub fn render_summary(changes: &LockChanges, plain_statuses: bool) -> String {
  let rows: Vec<Vec<String>> = ChangeStatus::ORDER
    .into_iter()
    .filter_map(|status| {
      let count = count_statuses(changes, status);
      (count > 0).then(|| vec![status_label(status, plain_statuses), count.to_string()])
    })
    .collect();

  markdown_table(&["Status", "Count"], &[Align::Left, Align::Center], &rows)
}

/// The full comment body, or `None` when there is nothing to report
pub fn render_report(changes: &LockChanges, options: &ReportOptions) -> Option<String> {
  if changes.is_empty() {
    return None;
  }

  let mut table_options = options.table;
  let mut table = render_table(changes, table_options);
  if table.len() >= MAX_TABLE_LEN {
    table_options.plain_statuses = true;
    table = render_table(changes, table_options);
  }

  let collapsed = changes.len() >= options.collapse_threshold;
  let summary = if collapsed {
    format!(
      "### Summary\n{}",
      render_summary(changes, table_options.plain_statuses)
    )
  } else {
    String::new()
  };

  Some(format!(
    "## `{title}` changes\n{summary}\n<details{open}>\n<summary>Click to toggle table visibility</summary>\n<br/>\n\n{table}\n\n</details>",
    title = options.title,
    open = if collapsed { "" } else { " open" },
  ))
}
