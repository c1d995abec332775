//! Canonical path resolution for virtual directories.
//!
//! A virtual directory is addressed in commands as `site\application\...name`.
//! Callers are loose about how they spell `name`: it may or may not repeat the
//! site and application, and may use either separator. [`resolve`] folds all of
//! those spellings into one [`CanonicalPath`]; [`PathCache`] memoizes it for the
//! length of a single pass.

use crate::domain::{ResourceDescriptor, VirtualDirectory};
use std::collections::HashMap;
use std::fmt;

/// Separator used when rendering a canonical path.
pub const SEPARATOR: char = '\\';

/// Root of the IIS provider drive that canonical paths hang off.
pub const IIS_SITES_ROOT: &str = "IIS:\\Sites\\";

/// Normalized `site\application?\...` identifier of a virtual directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPath {
    segments: Vec<String>,
    /// How many leading segments are site/application rather than the directory itself.
    scope: usize,
}

impl CanonicalPath {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Segments below the site and application, joined with `/`.
    pub fn relative(&self) -> String {
        self.segments[self.scope..].join("/")
    }

    /// Whether the path names something below a site, not the site itself.
    ///
    /// Without a known site the first segment is taken to be the site.
    pub fn has_leaf(&self) -> bool {
        self.segments.len() > self.scope.max(1)
    }

    /// Case-insensitive comparison, the way IIS compares paths.
    pub fn same_as(&self, other: &CanonicalPath) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// The path on the `IIS:` drive, e.g. `IIS:\Sites\Site1\App1\assets`.
    pub fn drive_path(&self) -> String {
        format!("{IIS_SITES_ROOT}{self}")
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl PartialEq<str> for CanonicalPath {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for CanonicalPath {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

fn split_segments(value: &str) -> Vec<&str> {
    value
        .split(|c: char| c == '/' || c == '\\')
        .filter(|s| !s.is_empty())
        .collect()
}

fn strip_prefix<'a>(rest: &'a [&'a str], prefix: &[&str]) -> &'a [&'a str] {
    let matched = rest.len() >= prefix.len()
        && rest
            .iter()
            .zip(prefix)
            .all(|(a, b)| a.eq_ignore_ascii_case(b));
    if matched && !prefix.is_empty() {
        &rest[prefix.len()..]
    } else {
        rest
    }
}

/// Resolves `(site, name, application)` to a canonical path.
///
/// A leading site segment in `name` is dropped, then a leading application
/// segment, before both are re-prepended, so the result never repeats either.
/// Without a site, the first segment of `name` is the site.
pub fn resolve(site: Option<&str>, name: &str, application: Option<&str>) -> CanonicalPath {
    let parts = split_segments(name);

    let (site, rest) = match site {
        Some(site) => (site, strip_prefix(&parts, &[site])),
        None => match parts.split_first() {
            Some((first, rest)) => (*first, rest),
            None => {
                return CanonicalPath {
                    segments: Vec::new(),
                    scope: 0,
                }
            }
        },
    };

    let app_parts = application.map(split_segments).unwrap_or_default();
    let rest = strip_prefix(rest, &app_parts);

    let mut segments = Vec::with_capacity(1 + app_parts.len() + rest.len());
    segments.push(site.to_owned());
    segments.extend(app_parts.iter().map(|s| (*s).to_owned()));
    let scope = segments.len();
    segments.extend(rest.iter().map(|s| (*s).to_owned()));

    CanonicalPath { segments, scope }
}

/// Whether two application values name the same application.
///
/// Compared segment by segment, so `/App1`, `App1/` and `app1` are all the same.
pub fn same_application(a: &str, b: &str) -> bool {
    let a = split_segments(a);
    let b = split_segments(b);
    a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| x.eq_ignore_ascii_case(y))
}

type PathKey = (Option<String>, String, Option<String>);

/// Memo table for [`resolve`], owned by one reconciliation pass.
///
/// Keyed on the exact `(site, name, application)` strings; a new pass starts
/// with an empty cache, so edits to a resource between passes are always seen.
#[derive(Debug, Default)]
pub struct PathCache {
    entries: HashMap<PathKey, CanonicalPath>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, site: Option<&str>, name: &str, application: Option<&str>) -> CanonicalPath {
        let key = (
            site.map(str::to_owned),
            name.to_owned(),
            application.map(str::to_owned),
        );
        self.entries
            .entry(key)
            .or_insert_with(|| resolve(site, name, application))
            .clone()
    }

    pub fn for_descriptor(&mut self, desired: &ResourceDescriptor) -> CanonicalPath {
        self.resolve(desired.site(), &desired.name, desired.application())
    }

    pub fn for_record(&mut self, record: &VirtualDirectory) -> CanonicalPath {
        self.resolve(record.site(), &record.name, record.application())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
