//! Human-readable summaries of package metadata.
//!
//! Two surfaces consume these: hover (full markdown card) and inline
//! annotations (one short line after the declaration).

use chrono::NaiveDateTime;
use reqlens_core::PackageMetadata;

/// Label for a declaration older than the latest release.
pub const OUTDATED_LABEL: &str = "🟡 Outdated version";

/// Label for a declaration at (or past) the latest release.
pub const UP_TO_DATE_LABEL: &str = "🟢 Updated version";

/// Virtual column inline labels are right-aligned to.
pub const DEFAULT_ANNOTATION_COLUMN: u32 = 80;

const UPLOAD_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Formats metadata as a markdown hover card.
///
/// # Examples
///
/// ```
/// use reqlens_core::PackageMetadata;
/// use reqlens_pypi::formatter::format_hover;
///
/// let metadata = PackageMetadata {
///     name: "requests".into(),
///     latest_version: "2.31.0".into(),
///     summary: Some("Python HTTP for Humans.".into()),
///     release_date: Some("2023-05-22T15:12:42".into()),
///     ..Default::default()
/// };
///
/// let hover = format_hover(&metadata);
/// assert!(hover.starts_with("**requests – Python HTTP for Humans.**\n\n"));
/// assert!(hover.ends_with("Latest version: 2.31.0 (released on 22 May 2023)."));
/// ```
pub fn format_hover(metadata: &PackageMetadata) -> String {
    let mut title = linkify(&metadata.name, metadata.package_url.as_deref());
    if let Some(summary) = &metadata.summary {
        title.push_str(" – ");
        title.push_str(&linkify(summary, metadata.homepage.as_deref()));
    }

    let mut blocks = vec![format!("**{title}**")];

    let byline = metadata.author.as_ref().map(|author| match &metadata.author_email {
        Some(email) => format!("By {author} ({email})."),
        None => format!("By {author}."),
    });
    let license = metadata
        .license
        .as_ref()
        .map(|license| format!("License: {license}."));
    let credits: Vec<String> = byline.into_iter().chain(license).collect();
    if !credits.is_empty() {
        blocks.push(credits.join(" "));
    }

    let mut latest = format!(
        "Latest version: {}",
        linkify(&metadata.latest_version, metadata.release_url.as_deref())
    );
    if let Some(date) = metadata
        .release_date
        .as_deref()
        .and_then(format_release_date)
    {
        latest.push_str(&format!(" (released on {date})"));
    }
    latest.push('.');
    blocks.push(latest);

    blocks.join("\n\n")
}

/// One-line summary used for code lens titles.
pub fn latest_version_summary(metadata: &PackageMetadata) -> String {
    format!("Latest version: {}", metadata.latest_version)
}

/// Formats a PyPI `upload_time` as `22 May 2023`.
///
/// Returns `None` for timestamps that do not parse.
pub fn format_release_date(upload_time: &str) -> Option<String> {
    // Newer responses carry fractional seconds and a zone suffix.
    let trimmed = upload_time.get(..19).unwrap_or(upload_time);
    NaiveDateTime::parse_from_str(trimmed, UPLOAD_TIME_FORMAT)
        .ok()
        .map(|timestamp| timestamp.format("%-d %B %Y").to_string())
}

/// Prefixes `label` with enough spaces to start at `column`.
///
/// At least one space is always inserted, so a long line never touches its
/// label.
pub fn padded_label(label: &str, line_width: u32, column: u32) -> String {
    let padding = column.saturating_sub(line_width).max(1) as usize;
    format!("{}{label}", " ".repeat(padding))
}

fn linkify(text: &str, link: Option<&str>) -> String {
    match link {
        Some(link) => format!("[{text}]({link})"),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requests() -> PackageMetadata {
        PackageMetadata {
            name: "requests".into(),
            latest_version: "2.31.0".into(),
            summary: Some("Python HTTP for Humans.".into()),
            homepage: Some("https://requests.readthedocs.io".into()),
            author: Some("Kenneth Reitz".into()),
            author_email: Some("me@kennethreitz.org".into()),
            license: Some("Apache 2.0".into()),
            package_url: Some("https://pypi.org/project/requests/".into()),
            release_url: Some("https://pypi.org/project/requests/2.31.0/".into()),
            release_date: Some("2023-05-22T15:12:42".into()),
        }
    }

    #[test]
    fn test_format_hover_full() {
        let expected = "**[requests](https://pypi.org/project/requests/) – [Python HTTP for Humans.](https://requests.readthedocs.io)**\n\n\
By Kenneth Reitz (me@kennethreitz.org). License: Apache 2.0.\n\n\
Latest version: [2.31.0](https://pypi.org/project/requests/2.31.0/) (released on 22 May 2023).";

        assert_eq!(format_hover(&requests()), expected);
    }

    #[test]
    fn test_format_hover_minimal() {
        let metadata = PackageMetadata {
            name: "tiny".into(),
            latest_version: "0.1".into(),
            ..Default::default()
        };

        assert_eq!(format_hover(&metadata), "**tiny**\n\nLatest version: 0.1.");
    }

    #[test]
    fn test_format_hover_license_only() {
        let metadata = PackageMetadata {
            name: "tiny".into(),
            latest_version: "0.1".into(),
            license: Some("MIT".into()),
            ..Default::default()
        };

        assert_eq!(
            format_hover(&metadata),
            "**tiny**\n\nLicense: MIT.\n\nLatest version: 0.1."
        );
    }

    #[test]
    fn test_format_hover_unparseable_date_is_omitted() {
        let metadata = PackageMetadata {
            release_date: Some("yesterday".into()),
            ..requests()
        };

        assert!(format_hover(&metadata).ends_with("(https://pypi.org/project/requests/2.31.0/)."));
    }

    #[test]
    fn test_latest_version_summary() {
        assert_eq!(latest_version_summary(&requests()), "Latest version: 2.31.0");
    }

    #[test]
    fn test_format_release_date() {
        assert_eq!(
            format_release_date("2023-05-22T15:12:42").as_deref(),
            Some("22 May 2023")
        );
        assert_eq!(
            format_release_date("2024-01-05T09:00:00.123456Z").as_deref(),
            Some("5 January 2024")
        );
        assert_eq!(format_release_date("not a date"), None);
        assert_eq!(format_release_date(""), None);
    }

    #[test]
    fn test_padded_label() {
        assert_eq!(padded_label("x", 75, 80), "     x");
        assert_eq!(padded_label("x", 80, 80), " x");
        assert_eq!(padded_label("x", 120, 80), " x");
        assert_eq!(padded_label(OUTDATED_LABEL, 0, 3), format!("   {OUTDATED_LABEL}"));
    }
}
