//! Structural `pyproject.toml` extraction.
//!
//! The document is parsed with `toml_edit` (keeping spans) and walked by a
//! recursive descent that threads the key path of the current node. At each
//! node the path is tested against the known declaration shapes:
//!
//! | Shape | Key path | Registered |
//! |---|---|---|
//! | Table entries | `tool.<ns>.dependencies.<name>`, `tool.<ns>.dev-dependencies.<name>` | key/value node |
//! | Grouped table entries | `tool.<ns>.group.<g>.dependencies.<name>` | key/value node |
//! | Namespaced direct entries | `tool.<ns>.pypi-dependencies.<name>` | key/value node |
//! | Required list | `project.dependencies[]` | each element |
//! | Optional-group list | `project.optional-dependencies.<extra>[]` | each element |
//! | Tool-scoped lists | `tool.<ns>.{constraint,dev,override}-dependencies[]` | each element |
//! | Dev-group lists | `tool.<ns>.dev-dependencies.<group>[]` | each element |
//! | Dependency groups | `dependency-groups.<g>[]` | each element |
//! | Build requirements | `build-system.requires[]` | each element |
//!
//! Array elements must be PEP 508 requirements naming a project. Anything
//! else (malformed strings, direct URL references, include tables) is
//! skipped on its own without affecting its siblings.

use crate::error::{PypiError, Result};
use pep508_rs::{Requirement as Pep508Requirement, VersionOrUrl};
use reqlens_core::{Declaration, Requirement};
use toml_edit::{Document, Item, Table, TableLike, Value};
use tower_lsp_server::ls_types::{Position, Range};

/// Pre-computed line start offsets for byte offset to LSP position conversion.
struct LineOffsetTable {
    line_starts: Vec<usize>,
}

impl LineOffsetTable {
    fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in content.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    fn position(&self, content: &str, offset: usize) -> Position {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line];

        let character = content[line_start..offset]
            .chars()
            .map(|c| c.len_utf16() as u32)
            .sum();

        Position::new(line as u32, character)
    }
}

struct Source<'s> {
    content: &'s str,
    lines: LineOffsetTable,
}

impl Source<'_> {
    fn range(&self, span: std::ops::Range<usize>) -> Range {
        Range::new(
            self.lines.position(self.content, span.start),
            self.lines.position(self.content, span.end),
        )
    }
}

/// A declaration plus its byte offset, for restoring document order.
struct Located {
    offset: usize,
    declaration: Declaration,
}

/// Extracts all declarations from `pyproject.toml` content, in document order.
///
/// # Errors
///
/// Returns [`PypiError::TomlParse`] when the document is not valid TOML.
/// Individual declarations that do not match a shape are skipped.
///
/// # Examples
///
/// ```
/// use reqlens_pypi::tree_grammar::extract_pyproject;
///
/// let content = r#"
/// [project]
/// dependencies = ["requests>=2.28.0", "flask[async]>=3.0"]
///
/// [tool.poetry.dependencies]
/// httpx = "^0.25"
/// "#;
///
/// let declarations = extract_pyproject(content).unwrap();
/// let names: Vec<_> = declarations.iter().map(|d| d.name()).collect();
/// assert_eq!(names, vec!["requests", "flask", "httpx"]);
/// ```
pub fn extract_pyproject(content: &str) -> Result<Vec<Declaration>> {
    // Document (not DocumentMut) keeps span information
    let doc: Document<&str> =
        Document::parse(content).map_err(|source| PypiError::TomlParse { source })?;

    let source = Source {
        content,
        lines: LineOffsetTable::new(content),
    };

    let mut found = walk(doc.as_table(), &[], &source);
    found.sort_by_key(|located| located.offset);

    Ok(found.into_iter().map(|l| l.declaration).collect())
}

fn walk<'a>(table: &'a dyn TableLike, path: &[&'a str], source: &Source<'_>) -> Vec<Located> {
    table
        .iter()
        .flat_map(|(key, item)| {
            let child: Vec<&'a str> = path.iter().copied().chain(std::iter::once(key)).collect();
            visit(table, key, item, &child, source)
        })
        .collect()
}

fn visit<'a>(
    parent: &'a dyn TableLike,
    key: &'a str,
    item: &'a Item,
    path: &[&'a str],
    source: &Source<'_>,
) -> Vec<Located> {
    if let Some(array) = item.as_array()
        && is_list_path(path)
    {
        return array
            .iter()
            .filter_map(|value| array_element(value, source))
            .collect();
    }

    if is_entry_path(path) {
        return table_entry(parent, key, item, source).into_iter().collect();
    }

    match item.as_table_like() {
        Some(table) => walk(table, path, source),
        None => Vec::new(),
    }
}

fn is_list_path(path: &[&str]) -> bool {
    matches!(
        path,
        ["project", "dependencies"]
            | ["project", "optional-dependencies", _]
            | [
                "tool",
                _,
                "constraint-dependencies" | "dev-dependencies" | "override-dependencies"
            ]
            | ["tool", _, "dev-dependencies", _]
            | ["dependency-groups", _]
            | ["build-system", "requires"]
    )
}

fn is_entry_path(path: &[&str]) -> bool {
    matches!(
        path,
        [
            "tool",
            _,
            "dependencies" | "dev-dependencies" | "pypi-dependencies",
            _
        ] | ["tool", _, "group", _, "dependencies", _]
    )
}

/// Registers `name = <anything>` under a dependency table.
///
/// The range covers the key through the end of its value. For a header
/// table (`[tool.poetry.dependencies.name]`) the value is the table body.
fn table_entry(
    parent: &dyn TableLike,
    name: &str,
    item: &Item,
    source: &Source<'_>,
) -> Option<Located> {
    if name.trim().is_empty() {
        return None;
    }

    let (key, _) = parent.get_key_value(name)?;
    let key_span = key.span();
    let item_span = item.span();

    let start = key_span.clone().or_else(|| item_span.clone())?.start;
    let body_end = item.as_table().and_then(table_body_end);
    let end = item_span
        .or(key_span)?
        .end
        .max(body_end.unwrap_or(0))
        .max(start);

    let requirement = Requirement::new(name).with_extras(entry_extras(item));
    Some(Located {
        offset: start,
        declaration: Declaration::new(requirement, source.range(start..end), entry_version(item)),
    })
}

/// End offset of the last key/value written under a header table.
fn table_body_end(table: &Table) -> Option<usize> {
    table
        .iter()
        .filter_map(|(key, item)| {
            let nested = item.as_table().and_then(table_body_end);
            let own = item
                .span()
                .or_else(|| table.get_key_value(key).and_then(|(k, _)| k.span()))
                .map(|span| span.end);
            nested.max(own)
        })
        .max()
}

/// `"^2.0"` or `{ version = "^2.0", ... }`.
fn entry_version(item: &Item) -> Option<String> {
    if let Some(version) = item.as_str() {
        return Some(version.to_string());
    }
    item.as_table_like()?
        .get("version")?
        .as_str()
        .map(String::from)
}

fn entry_extras(item: &Item) -> Vec<String> {
    item.as_table_like()
        .and_then(|table| table.get("extras"))
        .and_then(Item::as_array)
        .map(|extras| {
            extras
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn array_element(value: &Value, source: &Source<'_>) -> Option<Located> {
    let text = value.as_str()?.trim();
    if text.is_empty() {
        return None;
    }

    let (requirement, declared_version) = parse_specifier(text)?;
    let span = value.span()?;

    Some(Located {
        offset: span.start,
        declaration: Declaration::new(requirement, source.range(span), declared_version),
    })
}

/// Parses a loose dependency specifier such as `flask[async]>=3.0; python_version>'3.8'`.
///
/// Returns `None` for malformed specifiers and for direct URL references,
/// which do not name a registry project. The declared version is the
/// version of the first specifier clause.
///
/// # Examples
///
/// ```
/// use reqlens_pypi::tree_grammar::parse_specifier;
///
/// let (requirement, version) = parse_specifier("Flask[async]>=3.0,<4").unwrap();
/// assert_eq!(requirement.name, "flask");
/// assert_eq!(requirement.extras, vec!["async"]);
/// assert_eq!(version.as_deref(), Some("3.0"));
///
/// assert!(parse_specifier("pkg @ https://example.com/pkg.whl").is_none());
/// assert!(parse_specifier("not a requirement!").is_none());
/// ```
pub fn parse_specifier(text: &str) -> Option<(Requirement, Option<String>)> {
    let parsed: Pep508Requirement = match text.parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(specifier = text, error = %e, "skipping malformed dependency");
            return None;
        }
    };

    if matches!(parsed.version_or_url, Some(VersionOrUrl::Url(_))) {
        tracing::debug!(specifier = text, "skipping direct reference");
        return None;
    }

    let declared_version = match &parsed.version_or_url {
        Some(VersionOrUrl::VersionSpecifier(specifiers)) => specifiers
            .iter()
            .next()
            .map(|specifier| specifier.version().to_string()),
        _ => None,
    };
    let extras = parsed.extras.iter().map(ToString::to_string).collect();

    Some((
        Requirement::new(parsed.name.to_string()).with_extras(extras),
        declared_version,
    ))
}
