//! Plugin version comparison.
//!
//! Versions are `major[.minor[.micro[extra]]]`. Anything that does not
//! match, including a missing version, compares as major `-1`, so it sorts
//! before every real version. The extra suffix never affects ordering.

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<major>\d+)(\.(?P<minor>\d+)(\.(?P<micro>\d+)(?P<extra>.*))?)?$")
            .expect("version pattern is valid")
    })
}

fn parse(version: Option<&str>) -> (i64, i64, i64) {
    let Some(caps) = version.and_then(|v| version_regex().captures(v)) else {
        return (-1, 0, 0);
    };
    let field = |name: &str| {
        caps.name(name)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(0)
    };
    (field("major"), field("minor"), field("micro"))
}

/// Compare two versions.
///
/// ```
/// use std::cmp::Ordering;
/// use purple_plugin::version::compare;
///
/// assert_eq!(compare(Some("1.0"), Some("0.1")), Ordering::Greater);
/// assert_eq!(compare(Some("1.2.3beta"), Some("1.2.3")), Ordering::Equal);
/// assert_eq!(compare(None, Some("1.2.3")), Ordering::Less);
/// assert_eq!(compare(Some("abc"), Some("1.2.3")), Ordering::Less);
/// ```
pub fn compare(a: Option<&str>, b: Option<&str>) -> Ordering {
    parse(a).cmp(&parse(b))
}

/// Comparison operator used by dependency specs and version filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionOp {
    Less,
    LessEqual,
    Equal,
    GreaterEqual,
    Greater,
}

impl VersionOp {
    /// Whether a comparison result of `found` against the wanted version
    /// satisfies this operator.
    pub fn accepts(self, result: Ordering) -> bool {
        match result {
            Ordering::Less => matches!(self, Self::Less | Self::LessEqual),
            Ordering::Equal => matches!(self, Self::Equal | Self::LessEqual | Self::GreaterEqual),
            Ordering::Greater => matches!(self, Self::Greater | Self::GreaterEqual),
        }
    }
}

impl FromStr for VersionOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Self::Less),
            "<=" => Ok(Self::LessEqual),
            "=" | "==" => Ok(Self::Equal),
            ">=" => Ok(Self::GreaterEqual),
            ">" => Ok(Self::Greater),
            _ => Err(()),
        }
    }
}
