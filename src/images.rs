//! Remote image embedding: each distinct source URL is fetched once, gets
//! a deterministic sequential filename, and every reference to it is
//! rewritten to the packaged path. Fetch failures are logged and skipped;
//! a missing picture never sinks a chapter.

use crate::dom;
use kuchiki::NodeRef;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub struct FetchedImage {
    pub bytes: Vec<u8>,
    /// Declared content type, if the transport supplied one.
    pub media_type: Option<String>,
}

/// Seam between the pipeline and the network, so the store can be
/// exercised with a hand-built fetcher.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedImage, String>;
}

pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(20)))
            .user_agent(concat!("bindery/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedImage, String> {
        let mut response = self.agent.get(url).call().map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }
        let media_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_lowercase());
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| e.to_string())?;
        Ok(FetchedImage { bytes, media_type })
    }
}

/// One embedded image. The same source URL always resolves to exactly one
/// record, one file, and one manifest entry.
pub struct ImageRecord {
    /// Packaged path, e.g. `images/image_3.png`.
    pub local_path: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Dedup map plus fetch-order record list, threaded through the chapters
/// by parameter. Filenames are `image_<n>.<ext>` with `n` counting
/// distinct images in first-encountered document order.
pub struct ImageStore<F> {
    fetcher: F,
    by_url: HashMap<String, usize>,
    records: Vec<ImageRecord>,
    /// When set, fetched bytes are also written here on disk.
    image_dir: Option<PathBuf>,
}

impl<F: ImageFetcher> ImageStore<F> {
    pub fn new(fetcher: F, image_dir: Option<PathBuf>) -> Self {
        Self {
            fetcher,
            by_url: HashMap::new(),
            records: Vec::new(),
            image_dir,
        }
    }

    /// Rewrite every remote `img` in the chapter to its packaged path,
    /// fetching sources not seen before. Local/relative sources are left
    /// alone; so are elements whose fetch failed.
    pub fn process_chapter(&mut self, content: &NodeRef) {
        for img in dom::select_all(content, "img") {
            let Some(src) = dom::get_attr(&img, "src") else {
                continue;
            };
            if !src.starts_with("http") {
                continue;
            }
            match self.local_path_for(&src) {
                Ok(local) => {
                    dom::set_attr(&img, "src", &local);
                    if dom::get_attr(&img, "alt").is_none() {
                        dom::set_attr(&img, "alt", "Image");
                    }
                }
                Err(err) => {
                    warn!("failed to fetch image {src}: {err}");
                }
            }
        }
    }

    fn local_path_for(&mut self, url: &str) -> Result<String, String> {
        if let Some(&idx) = self.by_url.get(url) {
            return Ok(self.records[idx].local_path.clone());
        }

        let fetched = self.fetcher.fetch(url)?;
        let ext = extension_for(url, fetched.media_type.as_deref());
        let filename = format!("image_{}.{ext}", self.records.len() + 1);
        let local_path = format!("images/{filename}");
        let media_type = fetched
            .media_type
            .filter(|mt| mt.starts_with("image/"))
            .unwrap_or_else(|| media_type_for_extension(&ext).to_string());
        debug!("embedded {url} as {local_path} ({media_type})");

        if let Some(dir) = &self.image_dir {
            if let Err(err) = std::fs::create_dir_all(dir)
                .and_then(|()| std::fs::write(dir.join(&filename), &fetched.bytes))
            {
                warn!("failed to write {filename} to {}: {err}", dir.display());
            }
        }

        self.by_url.insert(url.to_string(), self.records.len());
        self.records.push(ImageRecord {
            local_path: local_path.clone(),
            media_type,
            bytes: fetched.bytes,
        });
        Ok(local_path)
    }

    /// All embedded images in fetch order.
    pub fn into_records(self) -> Vec<ImageRecord> {
        self.records
    }
}

/// File extension for a fetched image: declared content type first, then
/// the URL's path extension, then `jpg`.
fn extension_for(source_url: &str, media_type: Option<&str>) -> String {
    match media_type {
        Some("image/jpeg") | Some("image/jpg") => return "jpg".to_string(),
        Some("image/png") => return "png".to_string(),
        Some("image/gif") => return "gif".to_string(),
        Some("image/webp") => return "webp".to_string(),
        Some("image/svg+xml") => return "svg".to_string(),
        _ => {}
    }
    if let Ok(parsed) = url::Url::parse(source_url) {
        let path = parsed.path().to_ascii_lowercase();
        for ext in ["jpg", "jpeg", "png", "gif", "webp", "svg"] {
            if path.ends_with(&format!(".{ext}")) {
                return if ext == "jpeg" { "jpg".to_string() } else { ext.to_string() };
            }
        }
    }
    "jpg".to_string()
}

pub fn media_type_for_extension(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{get_attr, parse_html, select_all};

    /// Canned fetcher: URLs in the map succeed, everything else errors.
    struct StubFetcher {
        responses: HashMap<String, (Vec<u8>, Option<String>)>,
    }

    impl StubFetcher {
        fn new(entries: &[(&str, &[u8], Option<&str>)]) -> Self {
            let responses = entries
                .iter()
                .map(|(url, bytes, mt)| {
                    (
                        url.to_string(),
                        (bytes.to_vec(), mt.map(|m| m.to_string())),
                    )
                })
                .collect();
            Self { responses }
        }
    }

    impl ImageFetcher for StubFetcher {
        fn fetch(&self, url: &str) -> Result<FetchedImage, String> {
            self.responses
                .get(url)
                .map(|(bytes, media_type)| FetchedImage {
                    bytes: bytes.clone(),
                    media_type: media_type.clone(),
                })
                .ok_or_else(|| "connection refused".to_string())
        }
    }

    #[test]
    fn same_url_across_chapters_is_fetched_once() {
        let fetcher = StubFetcher::new(&[(
            "http://example.com/pic.png",
            b"PNG",
            Some("image/png"),
        )]);
        let mut store = ImageStore::new(fetcher, None);

        let ch1 = parse_html("<div><img src='http://example.com/pic.png'></div>");
        let ch2 = parse_html("<div><img src='http://example.com/pic.png'></div>");
        store.process_chapter(&ch1);
        store.process_chapter(&ch2);

        let records = store.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].local_path, "images/image_1.png");
        assert_eq!(records[0].media_type, "image/png");

        for doc in [&ch1, &ch2] {
            let img = &select_all(doc, "img")[0];
            assert_eq!(
                get_attr(img, "src").as_deref(),
                Some("images/image_1.png")
            );
        }
    }

    #[test]
    fn filenames_are_sequential_in_document_order() {
        let fetcher = StubFetcher::new(&[
            ("http://e.com/a.png", b"A", Some("image/png")),
            ("http://e.com/b", b"B", Some("image/gif")),
        ]);
        let mut store = ImageStore::new(fetcher, None);
        let doc = parse_html(
            "<div><img src='http://e.com/a.png'><img src='http://e.com/b'></div>",
        );
        store.process_chapter(&doc);
        let records = store.into_records();
        assert_eq!(records[0].local_path, "images/image_1.png");
        assert_eq!(records[1].local_path, "images/image_2.gif");
    }

    #[test]
    fn extension_falls_back_to_url_path() {
        let fetcher = StubFetcher::new(&[("http://e.com/photo.JPEG?w=100", b"J", None)]);
        let mut store = ImageStore::new(fetcher, None);
        let doc = parse_html("<div><img src='http://e.com/photo.JPEG?w=100'></div>");
        store.process_chapter(&doc);
        let records = store.into_records();
        assert_eq!(records[0].local_path, "images/image_1.jpg");
        assert_eq!(records[0].media_type, "image/jpeg");
    }

    #[test]
    fn fetch_failure_leaves_element_untouched() {
        let fetcher = StubFetcher::new(&[("http://e.com/ok.png", b"P", Some("image/png"))]);
        let mut store = ImageStore::new(fetcher, None);
        let doc = parse_html(
            "<div><img src='http://e.com/dead.png'><img src='http://e.com/ok.png'></div>",
        );
        store.process_chapter(&doc);

        let imgs = select_all(&doc, "img");
        assert_eq!(
            get_attr(&imgs[0], "src").as_deref(),
            Some("http://e.com/dead.png")
        );
        assert_eq!(
            get_attr(&imgs[1], "src").as_deref(),
            Some("images/image_1.png")
        );
        assert_eq!(store.into_records().len(), 1);
    }

    #[test]
    fn alt_attribute_is_defaulted_only_on_rewrite() {
        let fetcher = StubFetcher::new(&[("http://e.com/a.png", b"A", Some("image/png"))]);
        let mut store = ImageStore::new(fetcher, None);
        let doc = parse_html(
            "<div><img src='http://e.com/a.png'><img src='local.png'></div>",
        );
        store.process_chapter(&doc);
        let imgs = select_all(&doc, "img");
        assert_eq!(get_attr(&imgs[0], "alt").as_deref(), Some("Image"));
        assert_eq!(get_attr(&imgs[1], "src").as_deref(), Some("local.png"));
        assert_eq!(get_attr(&imgs[1], "alt"), None);
    }

    #[test]
    fn existing_alt_is_preserved() {
        let fetcher = StubFetcher::new(&[("http://e.com/a.png", b"A", Some("image/png"))]);
        let mut store = ImageStore::new(fetcher, None);
        let doc = parse_html("<div><img src='http://e.com/a.png' alt='Diagram'></div>");
        store.process_chapter(&doc);
        let img = &select_all(&doc, "img")[0];
        assert_eq!(get_attr(img, "alt").as_deref(), Some("Diagram"));
    }

    #[test]
    fn image_dir_persists_fetched_bytes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let fetcher = StubFetcher::new(&[("http://e.com/a.png", b"PNGDATA", Some("image/png"))]);
        let mut store = ImageStore::new(fetcher, Some(tmp.path().to_path_buf()));
        let doc = parse_html("<div><img src='http://e.com/a.png'></div>");
        store.process_chapter(&doc);
        let written = std::fs::read(tmp.path().join("image_1.png")).unwrap();
        assert_eq!(written, b"PNGDATA");
    }
}
