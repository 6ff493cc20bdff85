//! Font fetching for fontdl
//!
//! Downloads the fonts referenced by a stylesheet, one file at a time. Each file
//! is isolated: a failure is recorded and the next file is attempted.

use std::path::{Path, PathBuf};

use futures::TryStreamExt;
use log::{debug, error, info, warn};
use reqwest::{Client, ClientBuilder};
use tokio::io::AsyncWriteExt;

use crate::core::config::FetchConfig;
use crate::core::error::{Error, Result};
use crate::core::outcome::{FetchOptions, FetchOutcome, FetchProgress, ProjectReport, StylesheetReport};
use crate::core::stylesheet::{parse_stylesheet, FontDescriptor};

/// Suffix of files still being written
const PARTIAL_SUFFIX: &str = "part";

/// Groups descriptors by family, keeping first-seen order of families and fonts
pub fn group_by_family(fonts: &[FontDescriptor]) -> Vec<(&str, Vec<&FontDescriptor>)> {
    let mut groups: Vec<(&str, Vec<&FontDescriptor>)> = Vec::new();

    for font in fonts {
        match groups.iter_mut().find(|(family, _)| *family == font.family()) {
            Some((_, members)) => members.push(font),
            None => groups.push((font.family(), vec![font])),
        }
    }

    groups
}

/// Fetches stylesheets and the font files they reference
pub struct FontFetcher {
    client: Client,
    config: FetchConfig,
}

impl FontFetcher {
    /// Create a fetcher with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::default())
    }

    /// Create a fetcher with custom configuration
    pub fn with_config(config: FetchConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch stylesheet text
    pub async fn fetch_stylesheet(&self, url: &str) -> Result<String> {
        info!("Fetching stylesheet: {url}");

        let response = self
            .client
            .get(url)
            .timeout(self.config.css_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    /// Fetch and parse a stylesheet, returning the fonts a run would attempt
    pub async fn plan(&self, url: &str, options: &FetchOptions) -> Result<Vec<FontDescriptor>> {
        let css = self.fetch_stylesheet(url).await?;
        Ok(parse_stylesheet(&css)
            .into_iter()
            .filter(|font| options.accepts(font.weight()))
            .collect())
    }

    /// Fetch a stylesheet and download every font it references.
    ///
    /// Only a failure to obtain the stylesheet itself is returned as an error;
    /// per-file failures are counted in the report.
    pub async fn process_stylesheet(
        &self,
        url: &str,
        output_dir: &Path,
        options: &FetchOptions,
    ) -> Result<StylesheetReport> {
        let css = self.fetch_stylesheet(url).await?;
        let fonts = parse_stylesheet(&css);

        if fonts.is_empty() {
            warn!("No font files found in {url}");
            return Ok(StylesheetReport::default());
        }

        Ok(self.fetch_fonts(&fonts, output_dir, options).await)
    }

    /// Download a batch of fonts grouped by family
    pub async fn fetch_fonts(
        &self,
        fonts: &[FontDescriptor],
        output_dir: &Path,
        options: &FetchOptions,
    ) -> StylesheetReport {
        let groups = group_by_family(fonts);
        let total = fonts.iter().filter(|font| options.accepts(font.weight())).count();

        let mut report = StylesheetReport {
            families: groups.len(),
            found: fonts.len(),
            filtered: fonts.len() - total,
            ..Default::default()
        };

        info!("Found {} families, {} files", groups.len(), fonts.len());
        if let Some(ref weights) = options.weights {
            debug!("Keeping weights: {}", weights.iter().collect::<Vec<_>>().join(", "));
        }

        for (family, members) in groups {
            info!("Family: {family}");

            for font in members {
                if !options.accepts(font.weight()) {
                    debug!("Skipping weight {} of {family}", font.weight());
                    continue;
                }

                let outcome = self.download_font(font, output_dir).await;
                report.record(&outcome);

                if let Some(ref progress) = options.progress {
                    progress(&FetchProgress {
                        completed: report.attempted(),
                        total,
                        filename: font.target_filename().to_string(),
                        succeeded: outcome.is_success(),
                    });
                }
            }
        }

        info!(
            "Downloaded {} files ({} already present, {} failed)",
            report.downloaded, report.already_present, report.failed
        );

        report
    }

    /// Download one font unless it is already on disk
    pub async fn download_font(&self, font: &FontDescriptor, output_dir: &Path) -> FetchOutcome {
        let target = output_dir.join(font.target_filename());

        if is_complete_file(&target).await {
            debug!("Already present: {}", font.target_filename());
            return FetchOutcome::AlreadyPresent;
        }

        debug!("Downloading {} from {}", font.target_filename(), font.source_url());

        match self.write_font(font, output_dir, &target).await {
            Ok(bytes) => {
                debug!("Saved {} ({:.1} KB)", font.target_filename(), bytes as f64 / 1024.0);
                FetchOutcome::Downloaded { bytes }
            }
            Err(e) if e.is_fetch_failure() => {
                warn!("Failed to download {}: {e}", font.target_filename());
                FetchOutcome::Failed(e)
            }
            Err(e) => {
                error!("Cannot write {}: {e}", target.display());
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Process every project stylesheet with the project weight filter
    pub async fn download_project_fonts(&self, output_dir: &Path, options: &FetchOptions) -> ProjectReport {
        let options = FetchOptions {
            weights: Some(self.config.project_weights.clone()),
            ..options.clone()
        };

        let mut report = ProjectReport::default();
        for url in &self.config.project_stylesheets {
            let result = self.process_stylesheet(url, output_dir, &options).await;
            if let Err(ref e) = result {
                warn!("Failed to process {url}: {e}");
            }
            report.sources.push((url.clone(), result));
        }

        info!(
            "Processed {}/{} stylesheets successfully",
            report.successful_sources(),
            report.total_sources()
        );

        report
    }

    /// Stream the font into a partial file, then move it into place
    async fn write_font(&self, font: &FontDescriptor, output_dir: &Path, target: &Path) -> Result<u64> {
        let response = self
            .client
            .get(font.source_url())
            .timeout(self.config.font_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: font.source_url().to_string(),
                status: status.as_u16(),
            });
        }

        tokio::fs::create_dir_all(output_dir).await?;
        let partial = partial_path(target);

        // A body shorter than its Content-Length surfaces as a stream error
        let result = match stream_to_file(response, &partial).await {
            Ok(received) => tokio::fs::rename(&partial, target)
                .await
                .map(|()| received)
                .map_err(Error::from),
            Err(e) => Err(e),
        };

        if result.is_err() {
            let _ = tokio::fs::remove_file(&partial).await;
        }

        result
    }
}

/// Copy a response body to `path`, returning the byte count
async fn stream_to_file(response: reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut received = 0u64;

    while let Some(chunk) = stream.try_next().await? {
        file.write_all(&chunk).await?;
        received += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(received)
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// A non-empty regular file counts as fully downloaded
async fn is_complete_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::WeightFilter;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn font(family: &str, weight: &str, url: &str) -> FontDescriptor {
        FontDescriptor::new(family, weight, "normal", url).unwrap()
    }

    #[test]
    fn test_group_by_family_keeps_first_seen_order() {
        let fonts = vec![
            font("Nunito", "400", "https://f.example/n4.woff2"),
            font("Comfortaa", "300", "https://f.example/c3.woff2"),
            font("Nunito", "700", "https://f.example/n7.woff2"),
        ];

        let groups = group_by_family(&fonts);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Nunito");
        assert_eq!(groups[1].0, "Comfortaa");
        let weights: Vec<_> = groups[0].1.iter().map(|f| f.weight()).collect();
        assert_eq!(weights, ["400", "700"]);
    }

    #[test]
    fn test_partial_path() {
        let path = partial_path(Path::new("/tmp/fonts/OpenSans-Regular.woff2"));
        assert_eq!(path, PathBuf::from("/tmp/fonts/OpenSans-Regular.woff2.part"));
    }

    #[tokio::test]
    async fn test_download_font_writes_file() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/n.woff2"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"wOF2font".to_vec()))
            .mount(&mock_server)
            .await;

        let dir = tempdir().unwrap();
        let output = dir.path().join("nested/fonts");
        let fetcher = FontFetcher::new().unwrap();
        let descriptor = font("Nunito", "400", &format!("{}/n.woff2", mock_server.uri()));

        let outcome = fetcher.download_font(&descriptor, &output).await;

        assert!(matches!(outcome, FetchOutcome::Downloaded { bytes: 8 }), "{outcome:?}");
        assert_eq!(std::fs::read(output.join("Nunito-Regular.woff2")).unwrap(), b"wOF2font");
        assert!(!output.join("Nunito-Regular.woff2.part").exists());
    }

    #[tokio::test]
    async fn test_download_font_http_error_leaves_nothing() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let dir = tempdir().unwrap();
        let fetcher = FontFetcher::new().unwrap();
        let descriptor = font("Nunito", "400", &format!("{}/missing.woff2", mock_server.uri()));

        let outcome = fetcher.download_font(&descriptor, dir.path()).await;

        match outcome {
            FetchOutcome::Failed(Error::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected HTTP 404 failure, got {other:?}"),
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    /// Serve one response that promises more bytes than it sends
    async fn serve_short_body() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\nwOF2x")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}/short.woff2")
    }

    #[tokio::test]
    async fn test_short_body_fails_and_removes_partial_file() {
        let url = serve_short_body().await;

        let dir = tempdir().unwrap();
        let fetcher = FontFetcher::new().unwrap();
        let descriptor = font("Nunito", "400", &url);

        let outcome = fetcher.download_font(&descriptor, dir.path()).await;

        match outcome {
            FetchOutcome::Failed(ref e) => assert!(e.is_fetch_failure(), "{e:?}"),
            other => panic!("Expected failure for short body, got {other:?}"),
        }
        assert!(!dir.path().join("Nunito-Regular.woff2").exists());
        assert!(!dir.path().join("Nunito-Regular.woff2.part").exists());
    }

    #[tokio::test]
    async fn test_stale_partial_file_is_overwritten() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh".to_vec()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Nunito-Regular.woff2.part"), b"stale leftover bytes").unwrap();

        let fetcher = FontFetcher::new().unwrap();
        let descriptor = font("Nunito", "400", &format!("{}/n.woff2", mock_server.uri()));
        let outcome = fetcher.download_font(&descriptor, dir.path()).await;

        assert!(matches!(outcome, FetchOutcome::Downloaded { bytes: 5 }), "{outcome:?}");
        assert_eq!(std::fs::read(dir.path().join("Nunito-Regular.woff2")).unwrap(), b"fresh");
        assert!(!dir.path().join("Nunito-Regular.woff2.part").exists());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_partial_file() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"font".to_vec()))
            .mount(&mock_server)
            .await;

        // A non-empty directory squatting on the target name blocks the rename
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("Nunito-Regular.woff2");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), b"x").unwrap();

        let fetcher = FontFetcher::new().unwrap();
        let descriptor = font("Nunito", "400", &format!("{}/n.woff2", mock_server.uri()));
        let outcome = fetcher.download_font(&descriptor, dir.path()).await;

        match outcome {
            FetchOutcome::Failed(Error::IoError(_)) => {}
            other => panic!("Expected I/O failure, got {other:?}"),
        }
        assert!(blocker.is_dir());
        assert!(!dir.path().join("Nunito-Regular.woff2.part").exists());
    }

    #[tokio::test]
    async fn test_existing_file_is_not_fetched() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Nunito-Regular.woff2"), b"old").unwrap();

        let fetcher = FontFetcher::new().unwrap();
        let descriptor = font("Nunito", "400", &format!("{}/n.woff2", mock_server.uri()));
        let outcome = fetcher.download_font(&descriptor, dir.path()).await;

        assert!(matches!(outcome, FetchOutcome::AlreadyPresent));
        assert_eq!(std::fs::read(dir.path().join("Nunito-Regular.woff2")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_empty_file_is_downloaded_again() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"full".to_vec()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Nunito-Regular.woff2"), b"").unwrap();

        let fetcher = FontFetcher::new().unwrap();
        let descriptor = font("Nunito", "400", &format!("{}/n.woff2", mock_server.uri()));
        let outcome = fetcher.download_font(&descriptor, dir.path()).await;

        assert!(matches!(outcome, FetchOutcome::Downloaded { bytes: 4 }));
        assert_eq!(std::fs::read(dir.path().join("Nunito-Regular.woff2")).unwrap(), b"full");
    }

    #[tokio::test]
    async fn test_weight_filter_and_progress() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"font".to_vec()))
            .expect(2)
            .mount(&mock_server)
            .await;

        let base = mock_server.uri();
        let fonts = vec![
            font("Open Sans", "300", &format!("{base}/300.woff2")),
            font("Open Sans", "400", &format!("{base}/400.woff2")),
            font("Open Sans", "500", &format!("{base}/500.woff2")),
        ];

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let options = FetchOptions {
            weights: Some(WeightFilter::new(["400", "500"])),
            progress: Some(Arc::new(move |progress: &FetchProgress| {
                assert_eq!(progress.total, 2);
                calls_clone.fetch_add(1, Ordering::SeqCst);
            })),
        };

        let dir = tempdir().unwrap();
        let fetcher = FontFetcher::new().unwrap();
        let report = fetcher.fetch_fonts(&fonts, dir.path(), &options).await;

        assert_eq!(report.found, 3);
        assert_eq!(report.filtered, 1);
        assert_eq!(report.attempted(), 2);
        assert_eq!(report.downloaded, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!dir.path().join("OpenSans-Light.woff2").exists());
    }

    #[tokio::test]
    async fn test_stylesheet_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/css2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let dir = tempdir().unwrap();
        let fetcher = FontFetcher::new().unwrap();
        let url = format!("{}/css2", mock_server.uri());
        let result = fetcher.process_stylesheet(&url, dir.path(), &FetchOptions::default()).await;

        match result {
            Err(Error::HttpStatus { status, .. }) => assert_eq!(status, 500),
            other => panic!("Expected HTTP 500 error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_user_agent_is_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/css2"))
            .and(wiremock::matchers::header("user-agent", "fontdl-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("/* empty */"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = FontFetcher::with_config(FetchConfig::default().with_user_agent("fontdl-test/1.0")).unwrap();
        let css = fetcher.fetch_stylesheet(&format!("{}/css2", mock_server.uri())).await.unwrap();
        assert_eq!(css, "/* empty */");
    }
}
