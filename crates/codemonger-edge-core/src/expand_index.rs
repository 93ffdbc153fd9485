//! Directory-style URI expansion.
//!
//! A request URI whose last path segment has no `.` is treated as a directory
//! reference and rewritten to address the `index.html` document inside it:
//!
//! ```text
//! /blog/post001?x=1#top   ->   /blog/post001/index.html?x=1#top
//! /blog/post001/          ->   /blog/post001/index.html
//! /codemonger.svg         ->   /codemonger.svg
//! ```
//!
//! The expansion works on raw characters only. Nothing is percent-decoded or
//! validated, and every input string has a result.

use std::fmt;

/// Name of the document a directory-style URI is expanded to.
pub const INDEX_DOCUMENT: &str = "index.html";

/// [`INDEX_DOCUMENT`] preceded by a path separator, appended to a last segment
/// without a trailing `/`. Must stay equal to `"/" + INDEX_DOCUMENT`.
pub const SEPARATED_INDEX_DOCUMENT: &str = "/index.html";

/// Split `s` at `index`.
///
/// The second part starts at `index` (inclusive). If `index` is `None`, the
/// first part is `s` itself and the second part is empty.
///
/// `index` must lie on a char boundary of `s`, which is always the case for
/// indices returned by [`str::find`] and [`str::rfind`].
#[must_use]
pub fn split_at_index(s: &str, index: Option<usize>) -> (&str, &str) {
    match index {
        Some(i) => s.split_at(i),
        None => (s, ""),
    }
}

/// Split `s` at the first occurrence of `delimiter`.
///
/// The second part includes the delimiter.
///
/// # Examples
///
/// ```
/// use codemonger_edge_core::expand_index::split_at_first;
///
/// assert_eq!(split_at_first("/abc#def#ghi", '#'), ("/abc", "#def#ghi"));
/// assert_eq!(split_at_first("/abc", '?'), ("/abc", ""));
/// ```
#[must_use]
pub fn split_at_first(s: &str, delimiter: char) -> (&str, &str) {
    split_at_index(s, s.find(delimiter))
}

/// Split `s` at the last occurrence of `delimiter`.
///
/// The second part includes the delimiter.
///
/// # Examples
///
/// ```
/// use codemonger_edge_core::expand_index::split_at_last;
///
/// assert_eq!(split_at_last("/abc/def/ghi", '/'), ("/abc/def", "/ghi"));
/// assert_eq!(split_at_last("/abc/", '/'), ("/abc", "/"));
/// ```
#[must_use]
pub fn split_at_last(s: &str, delimiter: char) -> (&str, &str) {
    split_at_index(s, s.rfind(delimiter))
}

/// A request URI broken into the parts the expansion looks at.
///
/// Concatenating the four fields in declaration order gives back the original
/// URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UriComponents<'a> {
    /// Path up to (not including) the last `/`.
    pub head_path: &'a str,
    /// Last path segment, including its leading `/` when there is one.
    pub last_segment: &'a str,
    /// Query string, empty or starting with `?`.
    pub query: &'a str,
    /// Fragment, empty or starting with `#`.
    pub fragment: &'a str,
}

impl<'a> UriComponents<'a> {
    /// Decompose `uri`.
    ///
    /// The fragment is split off first (at the first `#`), then the query (at
    /// the first `?`), then the last path segment (at the last `/`). A path
    /// without any `/` is a single segment.
    #[must_use]
    pub fn parse(uri: &'a str) -> Self {
        let (rest, fragment) = split_at_first(uri, '#');
        let (path, query) = split_at_first(rest, '?');
        let (head_path, last_segment) = if path.contains('/') {
            split_at_last(path, '/')
        } else {
            ("", path)
        };

        Self {
            head_path,
            last_segment,
            query,
            fragment,
        }
    }

    /// Whether the last segment names a directory rather than a file.
    ///
    /// Any `.` in the segment counts as an extension marker.
    #[must_use]
    pub fn is_directory_style(&self) -> bool {
        !self.last_segment.contains('.')
    }

    /// The text to append to the last segment, if any.
    #[must_use]
    pub fn expansion_suffix(&self) -> Option<&'static str> {
        if !self.is_directory_style() {
            None
        } else if self.last_segment.ends_with('/') {
            Some(INDEX_DOCUMENT)
        } else {
            Some(SEPARATED_INDEX_DOCUMENT)
        }
    }

    /// Reassemble the URI, inserting the index document when the last segment
    /// is directory-style.
    #[must_use]
    pub fn expand(&self) -> String {
        let suffix = self.expansion_suffix().unwrap_or_default();
        let mut uri = String::with_capacity(
            self.head_path.len()
                + self.last_segment.len()
                + suffix.len()
                + self.query.len()
                + self.fragment.len(),
        );
        uri.push_str(self.head_path);
        uri.push_str(self.last_segment);
        uri.push_str(suffix);
        uri.push_str(self.query);
        uri.push_str(self.fragment);
        uri
    }
}

impl fmt::Display for UriComponents<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            self.head_path, self.last_segment, self.query, self.fragment
        )
    }
}

/// Expand a directory-style `uri` so that it addresses `index.html`.
///
/// Query and fragment are carried over verbatim. URIs whose last segment
/// contains a `.` are returned unchanged.
///
/// # Examples
///
/// ```
/// use codemonger_edge_core::expand_uri;
///
/// assert_eq!(expand_uri("/blog"), "/blog/index.html");
/// assert_eq!(expand_uri("/blog/#top"), "/blog/index.html#top");
/// assert_eq!(expand_uri("/codemonger.svg"), "/codemonger.svg");
/// ```
#[must_use]
pub fn expand_uri(uri: &str) -> String {
    UriComponents::parse(uri).expand()
}
