//! LIST / MLSD response parser.
//!
//! Three line formats are recognised, in this order:
//! 1. **MLSD facts** (RFC 3659): `type=file;size=1234;modify=20260101120000; file.txt`
//! 2. **Unix-style** (`ls -l`): `-rwxr-xr-x 1 owner group 1234 Jan  1 12:00 file.txt`
//! 3. **Windows/IIS-style**: `01-01-26  12:00AM       1234 file.txt`
//!
//! Anything else becomes an `Unknown` record named after the whole line.

use crate::ftp::types::{FtpEntry, FtpEntryKind};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref UNIX_LINE: Regex = Regex::new(
        r"(?x)
        ^([dlcbps-][rwxsStT-]{9})[+@.]?\s+  # permissions
        (\d+)\s+                            # link count
        (\S+)\s+                            # owner
        (\S+)\s+                            # group
        (\d+)\s+                            # size
        (\w{3}\s+\d{1,2}\s+[\d:]+)\s+       # date
        (.+)$                               # name (possibly with -> target)
        ",
    )
    .expect("static unix listing pattern");
    static ref WINDOWS_LINE: Regex = Regex::new(
        r"(?x)
        ^(\d{2}-\d{2}-\d{2})\s+             # date
        (\d{1,2}:\d{2}(?:AM|PM)?)\s+        # time
        (<DIR>|\d+)\s+                      # size or <DIR>
        (.+)$                               # name
        ",
    )
    .expect("static windows listing pattern");
}

/// Parse a full multi-line LIST or MLSD response body.
///
/// Only line terminators are stripped, so names keep their edge spaces.
/// MLSD `cdir`/`pdir` records describe the listed directory and its parent,
/// not children, and are dropped along with `.` and `..`.
pub fn parse_listing(raw: &str) -> Vec<FtpEntry> {
    raw.lines()
        .map(|l| l.trim_end_matches(['\r', '\n']))
        .filter(|l| !l.trim().is_empty() && !l.starts_with("total "))
        .map(parse_line)
        .filter(|e| e.name != "." && e.name != ".." && !is_self_or_parent(e))
        .collect()
}

fn is_self_or_parent(entry: &FtpEntry) -> bool {
    entry
        .facts
        .get("type")
        .map(|t| t.eq_ignore_ascii_case("cdir") || t.eq_ignore_ascii_case("pdir"))
        .unwrap_or(false)
}

/// Parse a single non-empty line from a listing.
pub fn parse_line(line: &str) -> FtpEntry {
    let parsed = if line.contains(';') && line.contains('=') {
        parse_mlsd(line)
    } else {
        None
    };

    let mut entry = parsed
        .or_else(|| parse_unix(line))
        .or_else(|| parse_windows(line))
        .unwrap_or_else(|| FtpEntry::new(line, FtpEntryKind::Unknown));
    entry.raw = Some(line.to_string());
    entry
}

// ─── MLSD ────────────────────────────────────────────────────────────

/// `fact1=val1;fact2=val2; filename`
fn parse_mlsd(line: &str) -> Option<FtpEntry> {
    let (facts_str, name) = match line.find("; ") {
        Some(pos) => (&line[..pos + 1], &line[pos + 2..]),
        None => {
            let last_fact = line.rfind(';')?;
            let pos = last_fact + line[last_fact..].find(' ')?;
            (&line[..pos], &line[pos + 1..])
        }
    };
    if name.is_empty() {
        return None;
    }

    let facts: HashMap<String, String> = facts_str
        .split(';')
        .filter_map(|segment| segment.trim().split_once('='))
        .map(|(k, v)| (k.to_lowercase(), v.to_string()))
        .collect();

    let kind = match facts.get("type").map(|s| s.to_lowercase()).as_deref() {
        Some("dir") | Some("cdir") | Some("pdir") => FtpEntryKind::Directory,
        Some("file") => FtpEntryKind::File,
        Some(t) if t.contains("symlink") || t.contains("slink") => FtpEntryKind::Symlink,
        _ => FtpEntryKind::Unknown,
    };

    let mut entry = FtpEntry::new(name, kind);
    entry.size = facts
        .get("size")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    entry.modified = facts.get("modify").and_then(|v| parse_mlsd_time(v));
    entry.permissions = facts.get("unix.mode").cloned();
    entry.owner = facts.get("unix.owner").cloned();
    entry.group = facts.get("unix.group").cloned();
    entry.facts = facts;
    Some(entry)
}

/// `YYYYMMDDHHmmSS[.fraction]`
fn parse_mlsd_time(s: &str) -> Option<DateTime<Utc>> {
    let base = s.get(..14).unwrap_or(s);
    NaiveDateTime::parse_from_str(base, "%Y%m%d%H%M%S")
        .ok()
        .map(|dt| Utc.from_utc_datetime(&dt))
}

// ─── Unix ────────────────────────────────────────────────────────────

/// ```text
/// drwxr-xr-x   2 user group  4096 Jan  1 12:00 dirname
/// -rw-r--r--   1 user group  1234 Jan  1  2025 file.txt
/// lrwxrwxrwx   1 user group    42 Jan  1 12:00 link -> target
/// ```
fn parse_unix(line: &str) -> Option<FtpEntry> {
    let caps = UNIX_LINE.captures(line)?;

    let perms = caps.get(1)?.as_str();
    let name_raw = caps.get(7)?.as_str();

    let kind = match perms.as_bytes()[0] {
        b'd' => FtpEntryKind::Directory,
        b'l' => FtpEntryKind::Symlink,
        b'-' => FtpEntryKind::File,
        _ => FtpEntryKind::Unknown,
    };

    let (name, link_target) = match (kind, name_raw.split_once(" -> ")) {
        (FtpEntryKind::Symlink, Some((name, target))) => (name, Some(target.to_string())),
        _ => (name_raw, None),
    };

    let mut entry = FtpEntry::new(name, kind);
    entry.size = caps.get(5)?.as_str().parse::<u64>().unwrap_or(0);
    entry.modified = parse_unix_date(caps.get(6)?.as_str());
    entry.permissions = Some(perms.to_string());
    entry.owner = Some(caps.get(3)?.as_str().to_string());
    entry.group = Some(caps.get(4)?.as_str().to_string());
    entry.link_target = link_target;
    Some(entry)
}

/// "Jan  1 12:00" (current year implied) or "Jan  1  2025".
fn parse_unix_date(s: &str) -> Option<DateTime<Utc>> {
    let normalised = s.split_whitespace().collect::<Vec<_>>().join(" ");

    if normalised.contains(':') {
        let with_year = format!("{} {}", Utc::now().year(), normalised);
        return NaiveDateTime::parse_from_str(&with_year, "%Y %b %d %H:%M")
            .ok()
            .map(|dt| Utc.from_utc_datetime(&dt));
    }

    NaiveDate::parse_from_str(&normalised, "%b %d %Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

// ─── Windows ─────────────────────────────────────────────────────────

/// ```text
/// 01-01-26  12:00AM       1234 file.txt
/// 01-01-26  12:00PM      <DIR> Directory Name
/// ```
fn parse_windows(line: &str) -> Option<FtpEntry> {
    let caps = WINDOWS_LINE.captures(line)?;

    let size_or_dir = caps.get(3)?.as_str();
    let name = caps.get(4)?.as_str();

    let mut entry = if size_or_dir == "<DIR>" {
        FtpEntry::new(name, FtpEntryKind::Directory)
    } else {
        FtpEntry::new(name, FtpEntryKind::File).with_size(size_or_dir.parse().unwrap_or(0))
    };
    entry.modified = parse_windows_date(caps.get(1)?.as_str(), caps.get(2)?.as_str());
    Some(entry)
}

fn parse_windows_date(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let combined = format!("{} {}", date, time);
    ["%m-%d-%y %I:%M%p", "%m-%d-%y %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&combined, fmt).ok())
        .map(|dt| Utc.from_utc_datetime(&dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_file() {
        let entries = parse_listing("-rw-r--r--   1 user group  1234 Jan  1 12:00 readme.txt");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "readme.txt");
        assert_eq!(entries[0].kind, FtpEntryKind::File);
        assert_eq!(entries[0].size, 1234);
        assert_eq!(entries[0].owner.as_deref(), Some("user"));
        assert!(entries[0].modified.is_some());
    }

    #[test]
    fn unix_dir_with_year() {
        let entries = parse_listing("drwxr-xr-x   2 root root  4096 Mar  1  2024 subdir");
        assert_eq!(entries[0].kind, FtpEntryKind::Directory);
        let modified = entries[0].modified.unwrap();
        assert_eq!(modified.year(), 2024);
    }

    #[test]
    fn unix_symlink_splits_target() {
        let entries = parse_listing("lrwxrwxrwx   1 root root    22 Jan  5 08:00 link -> /var/target");
        assert_eq!(entries[0].kind, FtpEntryKind::Symlink);
        assert_eq!(entries[0].name, "link");
        assert_eq!(entries[0].link_target.as_deref(), Some("/var/target"));
    }

    #[test]
    fn names_with_spaces_survive() {
        let entries = parse_listing("-rw-r--r--   1 u g  5 Jan  1 12:00 my notes.txt");
        assert_eq!(entries[0].name, "my notes.txt");
    }

    #[test]
    fn mlsd_facts() {
        let entries = parse_listing("type=file;size=1024;modify=20260101120000;unix.mode=0644; example.bin");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "example.bin");
        assert_eq!(entries[0].kind, FtpEntryKind::File);
        assert_eq!(entries[0].size, 1024);
        assert_eq!(entries[0].permissions.as_deref(), Some("0644"));
        assert_eq!(entries[0].facts.get("type").map(String::as_str), Some("file"));
    }

    #[test]
    fn dots_and_totals_are_dropped() {
        let raw = "total 12\r\ntype=cdir; .\ntype=pdir; ..\ntype=file;size=10; real.txt\n\n";
        let entries = parse_listing(raw);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "real.txt");
    }

    #[test]
    fn mlsd_current_and_parent_records_are_dropped() {
        let raw = "type=cdir;modify=20260101120000;perm=el; /tmp\r\n\
                   type=pdir;perm=el; /\r\n\
                   type=Dir;perm=el; sub\r\n\
                   type=file;size=3; a.txt\r\n";
        let entries = parse_listing(raw);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["sub", "a.txt"]);
        assert_eq!(entries[0].kind, FtpEntryKind::Directory);
    }

    #[test]
    fn mlsd_names_keep_edge_spaces() {
        let entries = parse_listing("type=file;size=1;  spaced.txt \r\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, " spaced.txt ");
        assert_eq!(entries[0].size, 1);
    }

    #[test]
    fn mlsd_without_separator_space_keeps_whole_name() {
        let entry = parse_line("type=file;size=4 my file.txt");
        assert_eq!(entry.kind, FtpEntryKind::File);
        assert_eq!(entry.name, "my file.txt");
        assert_eq!(entry.size, 4);
    }

    #[test]
    fn windows_dir_and_file() {
        let raw = "01-01-26  12:00AM      <DIR> My Documents\n02-14-25  03:30PM       2048 report.doc";
        let entries = parse_listing(raw);
        assert_eq!(entries[0].kind, FtpEntryKind::Directory);
        assert_eq!(entries[0].name, "My Documents");
        assert_eq!(entries[1].kind, FtpEntryKind::File);
        assert_eq!(entries[1].size, 2048);
        assert!(entries[1].modified.is_some());
    }

    #[test]
    fn unrecognised_line_falls_back_to_unknown() {
        let entry = parse_line("just-a-name");
        assert_eq!(entry.kind, FtpEntryKind::Unknown);
        assert_eq!(entry.name, "just-a-name");
        assert_eq!(entry.raw.as_deref(), Some("just-a-name"));
    }
}
