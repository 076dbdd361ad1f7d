//! Media source resolution: inline payloads, remote URLs and local files.

use std::path::{Path, PathBuf};

use {
    bytes::Bytes,
    reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE},
    tracing::debug,
    url::Url,
};

use crate::{Error, Result, mime::sniff_mime};

/// Bytes plus descriptive metadata, produced once per upload call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub content: Bytes,
    pub name: String,
    pub size: u64,
    pub mime: String,
}

/// A payload the caller already holds in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMedia {
    pub content: Bytes,
    pub name: String,
    pub size: u64,
    pub mime: String,
}

/// Where the media for an upload comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaReference {
    Inline(InlineMedia),
    RemoteUrl(Url),
    LocalPath(PathBuf),
}

impl MediaReference {
    pub fn inline(
        content: impl Into<Bytes>,
        name: impl Into<String>,
        size: u64,
        mime: impl Into<String>,
    ) -> Self {
        Self::Inline(InlineMedia {
            content: content.into(),
            name: name.into(),
            size,
            mime: mime.into(),
        })
    }

    /// Classify a string reference.
    ///
    /// URLs win over paths: a URL-shaped string is never checked on the
    /// filesystem. Anything that is neither a URL nor an existing path is
    /// [`Error::SourceNotFound`].
    pub fn parse(reference: &str) -> Result<Self> {
        if let Some(url) = parse_remote_url(reference) {
            return Ok(Self::RemoteUrl(url));
        }
        let path = Path::new(reference);
        if path.exists() {
            return Ok(Self::LocalPath(path.to_path_buf()));
        }
        Err(Error::source_not_found(reference))
    }

    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Inline(_) => "inline",
            Self::RemoteUrl(_) => "url",
            Self::LocalPath(_) => "path",
        }
    }
}

impl std::str::FromStr for MediaReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_remote_url(reference: &str) -> Option<Url> {
    let url = Url::parse(reference).ok()?;
    let remote = matches!(url.scheme(), "http" | "https") && url.host_str().is_some();
    remote.then_some(url)
}

/// Tunables for [`SourceResolver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverOptions {
    /// Use the buffered body length when a response has no `Content-Length`.
    /// Off by default, in which case the size is reported as `0`.
    pub measure_missing_content_length: bool,
}

/// Turns a [`MediaReference`] into [`ResolvedMedia`].
#[derive(Debug, Clone, Default)]
pub struct SourceResolver {
    client: reqwest::Client,
    options: ResolverOptions,
}

impl SourceResolver {
    #[must_use]
    pub fn new(client: reqwest::Client, options: ResolverOptions) -> Self {
        Self { client, options }
    }

    pub async fn resolve(&self, reference: &MediaReference) -> Result<ResolvedMedia> {
        match reference {
            MediaReference::Inline(inline) => Ok(ResolvedMedia {
                content: inline.content.clone(),
                name: inline.name.clone(),
                size: inline.size,
                mime: inline.mime.clone(),
            }),
            MediaReference::RemoteUrl(url) => self.fetch_remote(url).await,
            MediaReference::LocalPath(path) => read_local(path).await,
        }
    }

    async fn fetch_remote(&self, url: &Url) -> Result<ResolvedMedia> {
        let fetch_err = |source| Error::Fetch {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fetch_err)?;

        let header_mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let header_size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let content = response.bytes().await.map_err(fetch_err)?;

        let size = match header_size {
            Some(size) => size,
            None if self.options.measure_missing_content_length => content.len() as u64,
            None => 0,
        };
        let mime = header_mime.unwrap_or_else(|| sniff_mime(&content));
        let name = name_from_url(url);

        debug!(%url, %name, size, %mime, body_len = content.len(), "fetched remote media");
        Ok(ResolvedMedia {
            content,
            name,
            size,
            mime,
        })
    }
}

async fn read_local(path: &Path) -> Result<ResolvedMedia> {
    let io_err = |source: std::io::Error| {
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::source_not_found(path.display().to_string())
        } else {
            Error::Io {
                path: path.display().to_string(),
                source,
            }
        }
    };

    let size = tokio::fs::metadata(path).await.map_err(io_err)?.len();
    let content = Bytes::from(tokio::fs::read(path).await.map_err(io_err)?);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime = sniff_mime(&content);

    debug!(path = %path.display(), %name, size, %mime, "read local media");
    Ok(ResolvedMedia {
        content,
        name,
        size,
        mime,
    })
}

/// Last non-empty path segment, falling back to the host.
fn name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_default()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[tokio::test]
    async fn inline_is_identity() {
        let reference = MediaReference::inline(vec![1u8, 2, 3], "clip.bin", 99, "x/unknown");
        let resolved = SourceResolver::default().resolve(&reference).await.unwrap();
        assert_eq!(resolved.content.as_ref(), &[1, 2, 3]);
        assert_eq!(resolved.name, "clip.bin");
        assert_eq!(resolved.size, 99);
        assert_eq!(resolved.mime, "x/unknown");
    }

    #[test]
    fn parse_prefers_urls() {
        let reference = MediaReference::parse("https://example.org/a/cat.png").unwrap();
        assert_eq!(reference.kind(), "url");
    }

    #[test]
    fn parse_existing_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let reference = MediaReference::parse(file.path().to_str().unwrap()).unwrap();
        assert_eq!(
            reference,
            MediaReference::LocalPath(file.path().to_path_buf())
        );
    }

    #[test]
    fn parse_missing_path_is_source_not_found() {
        let err = MediaReference::parse("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, Error::SourceNotFound { .. }));
    }

    #[test]
    fn parse_rejects_non_http_schemes_as_urls() {
        // `mailto:` parses as a URL but is not fetchable; it is treated as a
        // path and does not exist.
        let err = MediaReference::parse("mailto:bot@example.org").unwrap_err();
        assert!(matches!(err, Error::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn local_file_is_sniffed_not_guessed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("really-an-image.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(PNG_MAGIC)
            .unwrap();

        let resolved = SourceResolver::default()
            .resolve(&MediaReference::LocalPath(path))
            .await
            .unwrap();
        assert_eq!(resolved.name, "really-an-image.txt");
        assert_eq!(resolved.size, PNG_MAGIC.len() as u64);
        assert_eq!(resolved.mime, "image/png");
        assert_eq!(resolved.content.as_ref(), PNG_MAGIC);
    }

    #[tokio::test]
    async fn vanished_local_file_is_source_not_found() {
        let reference = MediaReference::LocalPath(PathBuf::from("/nope/gone.bin"));
        let err = SourceResolver::default().resolve(&reference).await.unwrap_err();
        assert!(matches!(err, Error::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn remote_uses_headers() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/media/song.mp3")
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(b"ID3 not really a song")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/media/song.mp3", server.url())).unwrap();
        let resolved = SourceResolver::default()
            .resolve(&MediaReference::RemoteUrl(url))
            .await
            .unwrap();
        assert_eq!(resolved.name, "song.mp3");
        assert_eq!(resolved.mime, "audio/mpeg");
        assert_eq!(resolved.content.as_ref(), b"ID3 not really a song");
    }

    #[tokio::test]
    async fn remote_missing_content_length_reports_zero() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/stream.mp3")
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_chunked_body(|w| w.write_all(b"chunked audio bytes"))
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/stream.mp3", server.url())).unwrap();
        let reference = MediaReference::RemoteUrl(url);

        let resolved = SourceResolver::default().resolve(&reference).await.unwrap();
        assert_eq!(resolved.size, 0);
        assert_eq!(resolved.mime, "audio/mpeg");

        let measuring = SourceResolver::new(reqwest::Client::new(), ResolverOptions {
            measure_missing_content_length: true,
        });
        let resolved = measuring.resolve(&reference).await.unwrap();
        assert_eq!(resolved.size, b"chunked audio bytes".len() as u64);
    }

    #[tokio::test]
    async fn remote_without_content_type_is_sniffed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/blob")
            .with_status(200)
            .with_body(PNG_MAGIC)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/blob", server.url())).unwrap();
        let resolved = SourceResolver::default()
            .resolve(&MediaReference::RemoteUrl(url))
            .await
            .unwrap();
        assert_eq!(resolved.mime, "image/png");
        assert_eq!(resolved.size, PNG_MAGIC.len() as u64);
    }

    #[tokio::test]
    async fn remote_error_status_is_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.png")
            .with_status(404)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/missing.png", server.url())).unwrap();
        let err = SourceResolver::default()
            .resolve(&MediaReference::RemoteUrl(url))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[test]
    fn url_names() {
        let name = |s: &str| name_from_url(&Url::parse(s).unwrap());
        assert_eq!(name("https://example.org/a/b/cat%20photo.png"), "cat photo.png");
        assert_eq!(name("https://example.org/dir/"), "dir");
        assert_eq!(name("https://example.org/"), "example.org");
        assert_eq!(name("https://example.org/x.gif?size=2"), "x.gif");
    }
}
