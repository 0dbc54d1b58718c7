use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, VidnotesError};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Identifier of a YouTube video, parsed from a link or taken verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    /// Parse a user supplied link or bare id.
    ///
    /// Accepted shapes:
    /// - bare ids (`dQw4w9WgXcQ`)
    /// - watch links with a `v` query parameter anywhere in the query string
    /// - `youtu.be/<id>` short links
    /// - `/embed/<id>`, `/shorts/<id>`, `/live/<id>` and `/v/<id>` paths
    ///
    /// Links may omit the scheme. Any other host is rejected.
    pub fn parse(reference: &str) -> Result<Self> {
        let input = reference.trim();
        let invalid = || VidnotesError::InvalidVideoReference {
            reference: reference.to_string(),
        };

        if input.is_empty() {
            return Err(invalid());
        }

        if is_valid_id(input) {
            return Ok(Self(input.to_string()));
        }

        let url_str = if input.starts_with("http://") || input.starts_with("https://") {
            input.to_string()
        } else {
            format!("https://{}", input)
        };
        let url = Url::parse(&url_str).map_err(|_| invalid())?;

        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(host.as_str());

        let candidate = match host {
            "youtu.be" => query_id(&url).or_else(|| {
                url.path_segments()
                    .and_then(|mut s| s.next())
                    .map(str::to_string)
            }),
            "youtube.com" | "m.youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
                query_id(&url).or_else(|| path_id(&url))
            }
            _ => None,
        };

        match candidate {
            Some(id) if is_valid_id(&id) => Ok(Self(id)),
            _ => Err(invalid()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("{}{}", WATCH_URL, self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_valid_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn query_id(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
}

fn path_id(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    match segments.as_slice() {
        [kind, id, ..] if matches!(*kind, "embed" | "shorts" | "live" | "v") => {
            Some(id.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> String {
        VideoId::parse(input).unwrap().as_str().to_string()
    }

    #[test]
    fn test_bare_id() {
        assert_eq!(parse("dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(parse("  dQw4w9WgXcQ \n"), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(
            parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_watch_url_with_trailing_parameters() {
        assert_eq!(
            parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s&list=PL123"),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            parse("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ"),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_short_links() {
        assert_eq!(parse("https://youtu.be/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(
            parse("https://youtu.be/_NuH3D4SN-c?si=VSFea_rMwtaiR8Q7"),
            "_NuH3D4SN-c"
        );
        assert_eq!(parse("https://youtu.be/watch?v=abc123"), "abc123");
    }

    #[test]
    fn test_path_forms() {
        assert_eq!(
            parse("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            parse("https://youtube.com/shorts/dQw4w9WgXcQ?feature=share"),
            "dQw4w9WgXcQ"
        );
        assert_eq!(parse("https://m.youtube.com/live/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_without_scheme() {
        assert_eq!(parse("youtube.com/watch?v=dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(parse("youtu.be/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_invalid_references() {
        for input in [
            "",
            "   ",
            "https://example.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch",
            "https://www.youtube.com/watch?v=",
            "https://www.youtube.com/watch?v=bad id!",
            "https://youtu.be/",
        ] {
            let err = VideoId::parse(input).unwrap_err();
            assert!(
                matches!(err, VidnotesError::InvalidVideoReference { .. }),
                "{input:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_watch_url_roundtrip() {
        let id = VideoId::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(id.watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }
}
