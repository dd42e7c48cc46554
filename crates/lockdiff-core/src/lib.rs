//! # lockdiff
//!
//! Parses yarn lockfiles (classic v1 and berry v2+) and diffs the resolved
//! package versions of two of them.
//!
//! ```
//! use lockdiff_core::{ChangeStatus, diff_locks, parse_lock};
//!
//! let header = "# THIS IS AN AUTOGENERATED FILE. DO NOT EDIT THIS FILE DIRECTLY.\n# yarn lockfile v1\n\n\n";
//! let before = format!("{header}lodash@^4.17.0:\n  version \"4.17.20\"\n  resolved \"r\"\n  integrity i\n");
//! let after = format!("{header}lodash@^4.17.0:\n  version \"4.17.21\"\n  resolved \"r\"\n  integrity i\n");
//!
//! let changes = diff_locks(&parse_lock(&before), &parse_lock(&after));
//! assert_eq!(changes["lodash"].status, ChangeStatus::Updated);
//! ```
#![deny(clippy::all)]
pub mod diff;
pub mod error;
pub mod ident;
pub mod lockfile;
pub mod metadata;
pub mod package;
pub mod parse;
pub mod report;
pub mod version;

pub use diff::{ChangeStatus, LockChange, LockChanges, count_statuses, diff_locks};
pub use lockfile::{LockFormat, LockStatus, ParsedLock};
pub use package::LockEntry;
pub use parse::parse_lock;
