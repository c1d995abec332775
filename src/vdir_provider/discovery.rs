//! Discovery of live virtual directories.
//!
//! One listing script enumerates every virtual directory of every site and
//! prints them as JSON. Anything the parser cannot make sense of reads as "no
//! directories": a host without virtual directories and a host that printed
//! nothing look the same from here.

use crate::domain::{ResourceDescriptor, VirtualDirectory};
use crate::framework::{CommandRunner, Script};
use crate::vdir_provider::path::PathCache;
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Statements that print every virtual directory as a JSON list.
///
/// Each record's `name` is `site/[application/]directory`, which is also the
/// shape [`resolve`](crate::vdir_provider::path::resolve) folds back to a canonical path.
pub const LIST_STATEMENTS: &[&str] = &[
    "$records = @(Get-Website | ForEach-Object { \
        $site = $_.Name; \
        Get-WebVirtualDirectory -Site $site | ForEach-Object { \
            $app = $null; \
            if ($_.ItemXPath -match \"application\\[@path='([^']*)'\\]\") { $app = $Matches[1].Trim('/') }; \
            if (-not $app) { $app = $null }; \
            $parts = @($site); \
            if ($app) { $parts += $app }; \
            $parts += $_.path.Trim('/'); \
            [pscustomobject]@{ \
                name = ($parts -join '/'); \
                physicalpath = $_.physicalPath; \
                user_name = $_.userName; \
                password = $_.password; \
                application = $app; \
                sitename = $site \
            } \
        } \
    })",
    "if ($records.Count -gt 0) { ConvertTo-Json -InputObject $records -Depth 3 -Compress }",
];

/// The listing script as sent to the execution channel.
pub fn list_script() -> Script {
    Script::from_statements(LIST_STATEMENTS.iter().copied())
}

/// Runs the listing script and parses whatever comes back.
///
/// Never fails: a channel error or unreadable output yields no records.
#[instrument(skip(runner))]
pub async fn discover(runner: &dyn CommandRunner) -> Vec<VirtualDirectory> {
    let output = match runner.run(&list_script()).await {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "Discovery could not run; treating as no virtual directories");
            return Vec::new();
        }
    };

    if !output.is_success() {
        warn!(exit_code = output.exit_code, error = %output.error_text(), "Discovery script failed");
    }

    let records = parse_records(&output.stdout);
    debug!(count = records.len(), "Discovered virtual directories");
    records
}

/// Parses the JSON printed by the listing script.
///
/// Tolerates the shapes PowerShell actually produces: a bare object instead of
/// a one-element list, a `{"value": [...]}` wrapper, and line breaks inserted
/// at the console width.
pub fn parse_records(raw: &str) -> Vec<VirtualDirectory> {
    let cleaned: String = raw.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Vec::new();
    }

    let value: Value = match serde_json::from_str(cleaned) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Discovery output is not JSON");
            return Vec::new();
        }
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("value") {
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
            None => vec![Value::Object(map)],
        },
        _ => return Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<VirtualDirectory>(item) {
            Ok(record) if !record.name.is_empty() => Some(record),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable discovery record");
                None
            }
        })
        .collect()
}

/// Whether `record` is the live counterpart of `desired`.
///
/// Names are compared case-insensitively; failing that, two spellings that
/// resolve to the same canonical path are the same directory.
pub fn is_match(desired: &ResourceDescriptor, record: &VirtualDirectory, cache: &mut PathCache) -> bool {
    if desired.name.eq_ignore_ascii_case(&record.name) {
        return true;
    }
    let wanted = cache.for_descriptor(desired);
    wanted.has_leaf() && wanted.same_as(&cache.for_record(record))
}

/// First record matching `desired`, if any. Duplicates resolve to the first one seen.
pub fn find_match<'a>(
    desired: &ResourceDescriptor,
    records: &'a [VirtualDirectory],
    cache: &mut PathCache,
) -> Option<&'a VirtualDirectory> {
    records.iter().find(|record| is_match(desired, record, cache))
}
