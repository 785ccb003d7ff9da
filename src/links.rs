//! Link generation with path-join semantics.

use std::fmt;

/// Normalized prefix prepended to every generated link.
///
/// Duplicate and trailing separators are dropped; a URL scheme such as
/// `https://` is kept intact.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BaseUrl(String);

impl BaseUrl {
    pub fn new(base: impl AsRef<str>) -> Self {
        BaseUrl(normalize(base.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join path segments onto the base URL.
    ///
    /// Each segment may itself contain separators; empty pieces are skipped.
    pub fn join<I, S>(&self, segments: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = self.0.clone();
        for segment in segments {
            for piece in segment.as_ref().split('/').filter(|p| !p.is_empty()) {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(piece);
            }
        }
        out
    }

    /// Like [`join`](BaseUrl::join), but always starts with `/` when the
    /// base is empty.
    pub fn rooted<I, S>(&self, segments: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = self.join(segments);
        if self.0.is_empty() {
            format!("/{}", joined)
        } else {
            joined
        }
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Join `segments` onto `base` with path-join semantics.
pub fn join_path<I, S>(base: &str, segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    BaseUrl::new(base).join(segments)
}

fn normalize(base: &str) -> String {
    let (scheme, rest) = match base.find("://") {
        Some(idx) => base.split_at(idx + 3),
        None => ("", base),
    };

    let mut out = String::from(scheme);
    if scheme.is_empty() && rest.starts_with('/') {
        out.push('/');
    }
    let pieces: Vec<&str> = rest.split('/').filter(|p| !p.is_empty()).collect();
    out.push_str(&pieces.join("/"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_absolute_base() {
        let base = BaseUrl::new("/api");
        assert_eq!(base.join(["things", "1"]), "/api/things/1");
    }

    #[test]
    fn join_normalizes_separators() {
        assert_eq!(join_path("/api/", ["/things/"]), "/api/things");
        assert_eq!(join_path("//api//v1/", ["things//1"]), "/api/v1/things/1");
        assert_eq!(
            join_path("/api", ["/things/1/relationships/stuffs"]),
            "/api/things/1/relationships/stuffs"
        );
    }

    #[test]
    fn join_empty_and_root_base() {
        assert_eq!(join_path("", ["things", "1"]), "things/1");
        assert_eq!(join_path("/", ["things"]), "/things");
    }

    #[test]
    fn rooted_join_on_empty_base() {
        assert_eq!(BaseUrl::new("").rooted(["things", "1"]), "/things/1");
        assert_eq!(BaseUrl::new("/").rooted(["things", "1"]), "/things/1");
        assert_eq!(BaseUrl::new("/api").rooted(["things", "1"]), "/api/things/1");
        assert_eq!(
            BaseUrl::new("https://example.com").rooted(["things"]),
            "https://example.com/things"
        );
    }

    #[test]
    fn join_keeps_scheme() {
        assert_eq!(
            join_path("https://example.com/api/", ["users", "3"]),
            "https://example.com/api/users/3"
        );
    }

    #[test]
    fn join_skips_empty_segments() {
        assert_eq!(join_path("/api", ["", "things", ""]), "/api/things");
    }
}
