//! Line-oriented requirement matching.
//!
//! Recognizes `name[extras] (comparator version)?` at the start of a line and
//! nothing more: environment markers, hashes and options after the match are
//! ignored. Matching is total: a line that does not look like a requirement
//! yields [`LineMatch::NotApplicable`], never an error.

use once_cell::sync::Lazy;
use regex::Regex;
use reqlens_core::{Declaration, Requirement, utf16_len};
use tower_lsp_server::ls_types::{Position, Range};

static REQUIREMENT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:\[([^\]]*)\])?\s*(?:(===|==|~=|!=|>=|<=|>|<)\s*([A-Za-z0-9.*+!_-]+))?",
    )
    .unwrap()
});

/// Text flavor a line comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    /// A line of a pip requirements file.
    Requirements,
    /// A string element of a TOML array written on its own line, such as
    /// `    "requests>=2.0",`.
    TomlArrayElement,
}

/// Result of matching one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMatch {
    Matched {
        requirement: Requirement,
        /// Version text after the first comparator, if present.
        version: Option<String>,
    },
    NotApplicable,
}

/// Matches a single line against the requirement pattern.
///
/// # Examples
///
/// ```
/// use reqlens_pypi::line_grammar::{LineFormat, LineMatch, match_line};
///
/// match match_line("requests[socks]==2.0.0  # pinned", LineFormat::Requirements) {
///     LineMatch::Matched { requirement, version } => {
///         assert_eq!(requirement.name, "requests");
///         assert_eq!(requirement.extras, vec!["socks"]);
///         assert_eq!(version.as_deref(), Some("2.0.0"));
///     }
///     LineMatch::NotApplicable => unreachable!(),
/// }
///
/// assert_eq!(match_line("# comment", LineFormat::Requirements), LineMatch::NotApplicable);
/// ```
pub fn match_line(line: &str, format: LineFormat) -> LineMatch {
    let owned;
    let mut text = line.trim();

    if format == LineFormat::TomlArrayElement {
        owned = text.trim_end_matches(',').replace(['"', '\''], "");
        text = owned.trim();
    }

    if text.is_empty() || text.starts_with('#') {
        return LineMatch::NotApplicable;
    }

    let Some(captures) = REQUIREMENT_LINE.captures(text) else {
        return LineMatch::NotApplicable;
    };

    // `git+https://...` and `name:...` are URLs, not project names.
    let rest = &text[captures.get(0).map_or(0, |m| m.end())..];
    if rest.starts_with(['+', ':', '/']) {
        return LineMatch::NotApplicable;
    }

    let name = captures[1].to_string();
    let extras = captures
        .get(2)
        .map(|m| {
            m.as_str()
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    let version = captures.get(4).map(|m| m.as_str().to_string());

    LineMatch::Matched {
        requirement: Requirement::new(name).with_extras(extras),
        version,
    }
}

/// Extracts every requirement of a pip requirements file.
///
/// Each declaration's range covers its whole line.
pub fn extract_requirements_file(text: &str) -> Vec<Declaration> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            declaration_for_line(index as u32, line, LineFormat::Requirements)
        })
        .collect()
}

/// Scans `dependencies = [ ... ]` blocks of a TOML file line by line.
///
/// Used when the structural parse of a manifest fails. Tracks whether the
/// scan is inside a multi-line dependency array: a line starting with
/// `dependencies` that opens `[` without closing it enters the block, and a
/// line starting with `]` leaves it.
pub fn scan_dependency_blocks(text: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    let mut in_block = false;

    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();

        if in_block {
            if trimmed.starts_with(']') {
                in_block = false;
                continue;
            }
            declarations.extend(declaration_for_line(
                index as u32,
                line,
                LineFormat::TomlArrayElement,
            ));
        } else if trimmed.starts_with("dependencies")
            && let Some(open) = trimmed.find('[')
        {
            in_block = !trimmed[open..].contains(']');
        }
    }

    declarations
}

fn declaration_for_line(line_number: u32, line: &str, format: LineFormat) -> Option<Declaration> {
    match match_line(line, format) {
        LineMatch::Matched {
            requirement,
            version,
        } => {
            let range = Range::new(
                Position::new(line_number, 0),
                Position::new(line_number, utf16_len(line)),
            );
            Some(Declaration::new(requirement, range, version))
        }
        LineMatch::NotApplicable => None,
    }
}
