//! Declared-vs-latest version comparison.
//!
//! Both sides are coerced to a plain `major.minor.patch` before comparing:
//! the first numeric run in the string wins, missing components become zero,
//! and anything after it (pre-release tags, local versions, comparators) is
//! dropped.

use crate::types::AnnotationStatus;
use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;

static COERCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").unwrap());

/// Coerces a loosely formatted version string into a three-part version.
///
/// # Examples
///
/// ```
/// use reqlens_core::version::coerce;
///
/// assert_eq!(coerce("^2.0").unwrap().to_string(), "2.0.0");
/// assert_eq!(coerce("v1.4.2rc1").unwrap().to_string(), "1.4.2");
/// assert!(coerce("abc").is_none());
/// ```
pub fn coerce(raw: &str) -> Option<Version> {
    let captures = COERCE_PATTERN.captures(raw)?;
    let component = |index: usize| -> Option<u64> {
        captures
            .get(index)
            .map_or(Some(0), |m| m.as_str().parse().ok())
    };

    Some(Version::new(component(1)?, component(2)?, component(3)?))
}

/// Classifies a declaration against the latest published version.
///
/// Returns `None` when nothing is declared (unpinned dependency) or when
/// either side cannot be coerced. A declared version newer than the
/// registry's latest counts as up to date.
///
/// # Examples
///
/// ```
/// use reqlens_core::AnnotationStatus;
/// use reqlens_core::version::classify;
///
/// assert_eq!(classify(Some("1.2.0"), "1.3.0"), Some(AnnotationStatus::Outdated));
/// assert_eq!(classify(None, "1.0.0"), None);
/// ```
pub fn classify(declared: Option<&str>, latest: &str) -> Option<AnnotationStatus> {
    let declared = coerce(declared?)?;
    let latest = coerce(latest)?;

    if declared < latest {
        Some(AnnotationStatus::Outdated)
    } else {
        Some(AnnotationStatus::UpToDate)
    }
}
