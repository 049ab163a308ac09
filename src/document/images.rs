//! Rewriting image sources for the rendering surface.
//!
//! Remote and inline images pass through untouched. Local files are routed
//! through a custom URI scheme so the host shell can serve their bytes.

use std::path::{Component, Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// Scheme used for local images unless configured otherwise.
pub const DEFAULT_LOCAL_SCHEME: &str = "mv-file";

/// Characters escaped when a filesystem path becomes a URI path.
const PATH_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Resolves image `src` values against a document's directory.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    base_dir: Option<PathBuf>,
    scheme: String,
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ImageResolver {
    /// Create a resolver; relative sources stay untouched without a base directory.
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self {
            base_dir,
            scheme: DEFAULT_LOCAL_SCHEME.to_string(),
        }
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Get the base directory.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Rewrite one image source.
    pub fn resolve(&self, src: &str) -> String {
        let src = src.trim();
        let lower = src.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
        {
            return src.to_string();
        }
        if lower.starts_with("file://") {
            return format!("{}://{}", self.scheme, &src["file://".len()..]);
        }
        if has_scheme(src) || src.is_empty() {
            return src.to_string();
        }

        let decoded = percent_decode_str(src).decode_utf8_lossy();
        let path = Path::new(decoded.as_ref());
        let full_path = if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(base) = &self.base_dir {
            normalize(&base.join(path))
        } else {
            return src.to_string();
        };
        self.local_uri(&full_path)
    }

    fn local_uri(&self, path: &Path) -> String {
        let raw = path.to_string_lossy().replace('\\', "/");
        let encoded = utf8_percent_encode(&raw, PATH_ESCAPES);
        if raw.starts_with('/') {
            format!("{}://{encoded}", self.scheme)
        } else {
            format!("{}:///{encoded}", self.scheme)
        }
    }
}

/// True for `scheme:` prefixes such as `mailto:`; Windows drive letters are not schemes.
fn has_scheme(src: &str) -> bool {
    let Some((scheme, _)) = src.split_once(':') else {
        return false;
    };
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Collapse `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ImageResolver {
        ImageResolver::new(Some(PathBuf::from("/docs/guide")))
    }

    #[test]
    fn test_remote_sources_pass_through() {
        let r = resolver();
        assert_eq!(r.resolve("https://example.com/a.png"), "https://example.com/a.png");
        assert_eq!(r.resolve("http://example.com/a.png"), "http://example.com/a.png");
        assert_eq!(r.resolve("data:image/png;base64,AAAA"), "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_file_uri_is_rewritten_to_local_scheme() {
        assert_eq!(
            resolver().resolve("file:///Users/me/pic.png"),
            "mv-file:///Users/me/pic.png"
        );
    }

    #[test]
    fn test_relative_path_resolves_against_base() {
        assert_eq!(
            resolver().resolve("img/diagram.png"),
            "mv-file:///docs/guide/img/diagram.png"
        );
    }

    #[test]
    fn test_parent_components_are_collapsed() {
        assert_eq!(
            resolver().resolve("../shared/logo.svg"),
            "mv-file:///docs/shared/logo.svg"
        );
    }

    #[test]
    fn test_spaces_are_percent_encoded_once() {
        assert_eq!(
            resolver().resolve("my%20photo.png"),
            "mv-file:///docs/guide/my%20photo.png"
        );
        assert_eq!(
            resolver().resolve("my photo.png"),
            "mv-file:///docs/guide/my%20photo.png"
        );
    }

    #[test]
    fn test_absolute_path_uses_local_scheme() {
        assert_eq!(resolver().resolve("/tmp/x.png"), "mv-file:///tmp/x.png");
    }

    #[test]
    fn test_relative_path_without_base_is_unchanged() {
        let r = ImageResolver::default();
        assert_eq!(r.resolve("img/a.png"), "img/a.png");
    }

    #[test]
    fn test_other_schemes_pass_through() {
        assert_eq!(resolver().resolve("mailto:me@example.com"), "mailto:me@example.com");
    }

    #[test]
    fn test_custom_scheme() {
        let r = resolver().with_scheme("app-img");
        assert_eq!(r.resolve("a.png"), "app-img:///docs/guide/a.png");
    }
}
