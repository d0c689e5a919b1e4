// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Remote directory listing.
//!
//! Listings come from `ls -la` on the remote host rather than an SFTP
//! `readdir`, so the output is whatever the host's `ls` prints. `LC_ALL=C`
//! pins the date columns to the three-token `Mon DD HH:MM` / `Mon DD YYYY`
//! form the parser expects.

use serde::Serialize;

use crate::error::Result;
use crate::executor::CommandExecutor;
use crate::utils::{quote_arg, validate_remote_path};

/// Number of whitespace-separated columns before the file name.
const LEADING_FIELDS: usize = 8;

const SYMLINK_ARROW: &str = " -> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

impl EntryKind {
    /// Derive the kind from the type character of an `ls` mode string.
    pub fn from_permissions(permissions: &str) -> Self {
        match permissions.chars().next() {
            Some('d') => EntryKind::Directory,
            Some('l') => EntryKind::Symlink,
            _ => EntryKind::File,
        }
    }
}

/// One row of a long-form listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    /// Exactly as printed, including any ` -> target` suffix for symlinks.
    /// Runs of whitespace inside the name are kept as `ls` printed them
    /// rather than collapsed to single spaces, so names with repeated
    /// spaces survive intact.
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub links: u64,
    pub permissions: String,
    pub owner: String,
    pub group: String,
    /// Month, day and time-or-year as printed, e.g. `Jan 1 00:00`.
    pub modified_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_target: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DirectoryLister {
    executor: CommandExecutor,
}

impl DirectoryLister {
    pub fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }

    /// List `path` on the remote host. An empty path lists `/`.
    ///
    /// Entries come back in the order `ls` printed them, `.` and `..`
    /// included. Executor failures propagate unchanged.
    pub async fn list(&self, path: &str) -> Result<Vec<DirectoryEntry>> {
        let path = if path.is_empty() { "/" } else { path };
        validate_remote_path(path)?;

        let command = list_command(path);
        let result = self.executor.run(&command).await?;
        let entries = parse_listing(&result.stdout_string());

        tracing::debug!("Listed {} entries under {}", entries.len(), path);
        Ok(entries)
    }
}

pub fn list_command(path: &str) -> String {
    format!("LC_ALL=C ls -la -- {}", quote_arg(path))
}

/// Parse `ls -la` output. The first non-empty line (`total N`) is skipped
/// and rows with too few columns are dropped.
pub fn parse_listing(output: &str) -> Vec<DirectoryEntry> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .skip(1)
        .filter_map(|line| {
            let entry = parse_line(line);
            if entry.is_none() {
                tracing::trace!("Skipping malformed listing line: {:?}", line);
            }
            entry
        })
        .collect()
}

/// Parse a single listing row, or `None` if it has fewer than nine columns.
pub fn parse_line(line: &str) -> Option<DirectoryEntry> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut fields: Vec<&str> = Vec::with_capacity(LEADING_FIELDS);
    let mut rest = line;

    while fields.len() < LEADING_FIELDS {
        let trimmed = rest.trim_start();
        let end = trimmed.find(char::is_whitespace)?;
        fields.push(&trimmed[..end]);
        rest = &trimmed[end..];
    }

    // The remainder keeps its internal spacing; only the separator run is dropped.
    let name = rest.trim_start();
    if name.trim().is_empty() {
        return None;
    }

    let permissions = fields[0];
    let kind = EntryKind::from_permissions(permissions);
    let link_target = match kind {
        EntryKind::Symlink => name
            .split_once(SYMLINK_ARROW)
            .map(|(_, target)| target.to_string()),
        _ => None,
    };

    Some(DirectoryEntry {
        name: name.to_string(),
        kind,
        size: fields[4].parse().unwrap_or(0),
        links: fields[1].parse().unwrap_or(0),
        permissions: permissions.to_string(),
        owner: fields[2].to_string(),
        group: fields[3].to_string(),
        modified_display: format!("{} {} {}", fields[5], fields[6], fields[7]),
        link_target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing_with_spaces_in_name() {
        let output = "total 12\n\
                      drwxr-xr-x 2 root root 4096 Jan 1 00:00 my folder\n\
                      -rw-r--r-- 1 root root 37 Jan 1 00:00 a.txt";
        let entries = parse_listing(output);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "my folder");
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[0].size, 4096);
        assert_eq!(entries[1].name, "a.txt");
        assert_eq!(entries[1].kind, EntryKind::File);
        assert_eq!(entries[1].size, 37);
        assert_eq!(entries[1].modified_display, "Jan 1 00:00");
    }

    #[test]
    fn test_name_keeps_internal_spacing() {
        let entry =
            parse_line("-rw-r--r--  1 alice staff   12 Mar 14  2023 two  spaces ").unwrap();
        assert_eq!(entry.name, "two  spaces ");
        assert_eq!(entry.owner, "alice");
        assert_eq!(entry.group, "staff");
        assert_eq!(entry.modified_display, "Mar 14 2023");
    }

    #[test]
    fn test_symlink_target() {
        let entry =
            parse_line("lrwxrwxrwx 1 root root 7 Feb 2 10:11 bin -> usr/bin").unwrap();
        assert_eq!(entry.kind, EntryKind::Symlink);
        assert_eq!(entry.name, "bin -> usr/bin");
        assert_eq!(entry.link_target.as_deref(), Some("usr/bin"));
    }

    #[test]
    fn test_short_lines_are_skipped() {
        let output = "total 0\nbroken line\n-rw-r--r-- 1 root root 0 Jan 1 00:00\n";
        assert!(parse_listing(output).is_empty());
    }

    #[test]
    fn test_unparseable_numbers_default_to_zero() {
        let entry = parse_line("crw-rw---- ? root tty 4, Jan 1 00:00 tty0").unwrap();
        assert_eq!(entry.links, 0);
        assert_eq!(entry.size, 0);
        assert_eq!(entry.kind, EntryKind::File);
    }

    #[test]
    fn test_blank_lines_and_dot_entries() {
        let output = "\ntotal 8\n\n\
                      drwxr-xr-x 2 root root 4096 Jan 1 00:00 .\n\
                      drwxr-xr-x 3 root root 4096 Jan 1 00:00 ..\r\n";
        let names: Vec<_> = parse_listing(output).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec![".", ".."]);
    }

    #[test]
    fn test_list_command_quotes_path() {
        assert_eq!(list_command("/tmp/it's"), "LC_ALL=C ls -la -- '/tmp/it'\\''s'");
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = parse_line("-rw-r--r-- 1 root root 37 Jan 1 00:00 a.txt").unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "file");
        assert_eq!(json["modifiedDisplay"], "Jan 1 00:00");
        assert!(json.get("linkTarget").is_none());
    }
}
