//! Super-resolution weights: where they live, how they are fetched, and
//! how a cached copy is trusted.
//!
//! A [`ModelStore`] maps `(architecture, scale, format)` to a file in a
//! local cache directory and to the URL it is fetched from. Downloads are
//! written next to their final name with a `.part` suffix, hashed with
//! BLAKE3, renamed into place and accompanied by a `.blake3` record. A
//! file found without a record is adopted and recorded on first use. A
//! file whose record no longer matches is discarded and fetched again.
//!
//! [`ModelResolver`] ties a store, a [`Fetcher`] and a [`BackendLoader`]
//! together and implements [`ModelSource`] for the enhancer.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use restora_pipeline::{ModelArch, ModelSource, ModelUnavailable, ResolvedModel};

use crate::backend::{BackendLoader, default_loader};

/// Weight format published by the upstream repositories.
pub const UPSTREAM_FORMAT: &str = "pb";

/// Suffix of the integrity record written beside each cached file.
pub const RECORD_SUFFIX: &str = "blake3";

/// Suffix of a download in progress.
pub const PART_SUFFIX: &str = "part";

/// Redirects followed before a download is abandoned.
const MAX_REDIRECTS: usize = 10;

// ───────────────────────── Fetching ────────────────────────────────

/// Failure to retrieve a remote artifact.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be made or the body could not be read.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Retrieves the bytes behind a URL.
///
/// The resolver only talks to the network through this trait, so tests
/// and offline setups can substitute their own source of bytes.
pub trait Fetcher {
    /// Fetch `url` in full.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the artifact cannot be retrieved.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP(S) fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            user_agent: concat!("restora/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let request_error = |e: reqwest::Error| FetchError::Request {
            url: url.to_owned(),
            message: e.to_string(),
        };

        let client = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(request_error)?;

        let response = client.get(url).send().map_err(request_error)?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status: response.status().as_u16(),
            });
        }
        let body = response.bytes().map_err(request_error)?;
        Ok(body.to_vec())
    }
}

// ───────────────────────── Store ───────────────────────────────────

/// Failure to produce a trusted local copy of an artifact.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Neither the mirror nor upstream serves this format.
    #[error("no source publishes {artifact}")]
    NoSource { artifact: String },

    /// Downloading failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The server returned an empty body.
    #[error("{url} returned no data")]
    EmptyDownload { url: String },

    /// Writing into the cache failed.
    #[error("cache write to {} failed: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Location of cached weights and the places they are fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStore {
    cache_dir: PathBuf,
    mirror: Option<String>,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(Self::default_cache_dir())
    }
}

impl ModelStore {
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            mirror: None,
        }
    }

    /// `<platform data dir>/restora/models`, or `./models` when the
    /// platform has no data directory.
    #[must_use]
    pub fn default_cache_dir() -> PathBuf {
        dirs::data_dir().map_or_else(
            || PathBuf::from("models"),
            |dir| dir.join("restora").join("models"),
        )
    }

    /// Fetch every artifact from `base_url` instead of upstream.
    ///
    /// The mirror serves files under the same names as the cache
    /// (`EDSR_x4.onnx`, ...), so it may carry formats upstream does not.
    #[must_use]
    pub fn with_mirror(mut self, base_url: impl Into<String>) -> Self {
        self.mirror = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    #[must_use]
    pub fn mirror(&self) -> Option<&str> {
        self.mirror.as_deref()
    }

    /// File name of an artifact, e.g. `LapSRN_x8.pb`.
    #[must_use]
    pub fn artifact_name(arch: ModelArch, scale: u32, format: &str) -> String {
        format!("{}_x{scale}.{format}", arch.artifact_stem())
    }

    /// Where the artifact lives once cached.
    #[must_use]
    pub fn path_for(&self, arch: ModelArch, scale: u32, format: &str) -> PathBuf {
        self.cache_dir.join(Self::artifact_name(arch, scale, format))
    }

    /// Where the artifact is fetched from, if anywhere.
    #[must_use]
    pub fn url_for(&self, arch: ModelArch, scale: u32, format: &str) -> Option<String> {
        let name = Self::artifact_name(arch, scale, format);
        match &self.mirror {
            Some(base) => Some(format!("{}/{name}", base.trim_end_matches('/'))),
            None if format == UPSTREAM_FORMAT => Some(format!("{}/{name}", upstream_base(arch))),
            None => None,
        }
    }

    /// The cached artifact, if present and consistent with its integrity
    /// record.
    ///
    /// A file placed in the cache without a record (a hand-converted
    /// export, say) is adopted: its digest is recorded and it is used.
    /// An entry whose record no longer matches is deleted so the next
    /// [`ensure`](Self::ensure) fetches it again.
    #[must_use]
    pub fn cached(&self, arch: ModelArch, scale: u32, format: &str) -> Option<PathBuf> {
        let path = self.path_for(arch, scale, format);
        if !path.is_file() {
            return None;
        }
        match verify(&path) {
            Ok(Integrity::Matches) => Some(path),
            Ok(Integrity::Adopted) => {
                info!("adopted {} into the model cache", path.display());
                Some(path)
            }
            Ok(Integrity::Mismatch) => {
                warn!(
                    "{} does not match its integrity record, discarding",
                    path.display(),
                );
                discard(&path);
                None
            }
            Err(e) => {
                warn!("cannot verify {}: {e}, discarding", path.display());
                discard(&path);
                None
            }
        }
    }

    /// Return a trusted local copy of the artifact, fetching it on a miss.
    ///
    /// A verified cache entry is never re-fetched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if no source publishes the artifact, the
    /// fetch fails, or the cache cannot be written.
    pub fn ensure(
        &self,
        arch: ModelArch,
        scale: u32,
        format: &str,
        fetcher: &dyn Fetcher,
    ) -> Result<PathBuf, StoreError> {
        if let Some(path) = self.cached(arch, scale, format) {
            debug!("cache hit: {}", path.display());
            return Ok(path);
        }

        let url = self
            .url_for(arch, scale, format)
            .ok_or_else(|| StoreError::NoSource {
                artifact: Self::artifact_name(arch, scale, format),
            })?;
        info!("fetching {url}");
        let bytes = fetcher.fetch(&url)?;
        if bytes.is_empty() {
            return Err(StoreError::EmptyDownload { url });
        }

        let path = self.path_for(arch, scale, format);
        store(&path, &bytes)?;
        info!("cached {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

/// Base URL of the repository publishing `arch`'s TensorFlow weights.
#[must_use]
pub const fn upstream_base(arch: ModelArch) -> &'static str {
    match arch {
        ModelArch::Edsr => "https://github.com/Saafke/EDSR_Tensorflow/raw/master/models",
        ModelArch::Fsrcnn => "https://github.com/Saafke/FSRCNN_Tensorflow/raw/master/models",
        ModelArch::Espcn => "https://github.com/fannymonori/TF-ESPCN/raw/master/export",
        ModelArch::Lapsrn => "https://github.com/fannymonori/TF-LapSRN/raw/master/export",
    }
}

/// `path` with `suffix` appended to its full file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// BLAKE3 hex digest of `data`.
#[must_use]
pub fn digest(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// How a cached file relates to its integrity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Integrity {
    /// The record names the file's current digest.
    Matches,
    /// There was no record; one has just been written for the file.
    Adopted,
    /// The record names a different digest.
    Mismatch,
}

fn verify(path: &Path) -> std::io::Result<Integrity> {
    let record_path = sibling(path, RECORD_SUFFIX);
    let data = fs::read(path)?;
    let record = match fs::read_to_string(&record_path) {
        Ok(record) => record,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if let Err(e) = fs::write(&record_path, digest(&data)) {
                warn!("cannot record digest of {}: {e}", path.display());
            }
            return Ok(Integrity::Adopted);
        }
        Err(e) => return Err(e),
    };
    Ok(if record.trim() == digest(&data) {
        Integrity::Matches
    } else {
        Integrity::Mismatch
    })
}

fn discard(path: &Path) {
    for stale in [path.to_path_buf(), sibling(path, RECORD_SUFFIX)] {
        if let Err(e) = fs::remove_file(&stale)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("could not remove {}: {e}", stale.display());
        }
    }
}

/// Write `bytes` to `path` via a `.part` file and record their digest.
fn store(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| StoreError::Io { path, source }
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    let part = sibling(path, PART_SUFFIX);
    fs::write(&part, bytes).map_err(io_error(&part))?;
    fs::rename(&part, path).map_err(io_error(path))?;

    let record = sibling(path, RECORD_SUFFIX);
    fs::write(&record, digest(bytes)).map_err(io_error(&record))?;
    Ok(())
}

// ───────────────────────── Resolver ────────────────────────────────

/// [`ModelSource`] backed by a [`ModelStore`], a [`Fetcher`] and a
/// [`BackendLoader`].
pub struct ModelResolver {
    store: ModelStore,
    fetcher: Box<dyn Fetcher>,
    loader: Box<dyn BackendLoader>,
}

impl ModelResolver {
    /// Resolver over `store` using HTTP and the compiled-in backend.
    #[must_use]
    pub fn new(store: ModelStore) -> Self {
        Self {
            store,
            fetcher: Box::new(HttpFetcher::default()),
            loader: default_loader(),
        }
    }

    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Box<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    #[must_use]
    pub fn with_loader(mut self, loader: Box<dyn BackendLoader>) -> Self {
        self.loader = loader;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &ModelStore {
        &self.store
    }
}

impl std::fmt::Debug for ModelResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelResolver")
            .field("store", &self.store)
            .field("loader", &self.loader.name())
            .finish_non_exhaustive()
    }
}

impl ModelSource for ModelResolver {
    fn load(&self, arch: ModelArch, scale: u32) -> Result<ResolvedModel, ModelUnavailable> {
        // A runtime-less build never touches the network.
        if !self.loader.is_available() {
            return Err(ModelUnavailable::new(
                arch,
                scale,
                format!("no {} inference runtime in this build", self.loader.name()),
            ));
        }

        let format = self.loader.format();
        let path = self
            .store
            .ensure(arch, scale, format, &*self.fetcher)
            .map_err(|e| ModelUnavailable::new(arch, scale, e.to_string()))?;
        let backend = self
            .loader
            .load(&path, arch, scale)
            .map_err(|e| ModelUnavailable::new(arch, scale, e.to_string()))?;
        info!("loaded {arch} x{scale} from {}", path.display());
        Ok(ResolvedModel::new(arch, scale, backend))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Serves fixed bytes and remembers every URL asked for.
    struct FakeFetcher {
        body: Vec<u8>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        fn serving(body: &[u8]) -> Self {
            Self {
                body: body.to_vec(),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn count(&self) -> usize {
            self.requests.borrow().len()
        }
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.requests.borrow_mut().push(url.to_owned());
            Ok(self.body.clone())
        }
    }

    struct Offline;

    impl Fetcher for Offline {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::Request {
                url: url.to_owned(),
                message: "network unreachable".to_owned(),
            })
        }
    }

    #[test]
    fn artifact_names_follow_upstream_casing() {
        assert_eq!(ModelStore::artifact_name(ModelArch::Edsr, 4, "pb"), "EDSR_x4.pb");
        assert_eq!(
            ModelStore::artifact_name(ModelArch::Lapsrn, 8, "onnx"),
            "LapSRN_x8.onnx",
        );
    }

    #[test]
    fn upstream_urls() {
        let store = ModelStore::new("/tmp/unused");
        assert_eq!(
            store.url_for(ModelArch::Fsrcnn, 3, "pb").unwrap(),
            "https://github.com/Saafke/FSRCNN_Tensorflow/raw/master/models/FSRCNN_x3.pb",
        );
        assert_eq!(
            store.url_for(ModelArch::Espcn, 2, "pb").unwrap(),
            "https://github.com/fannymonori/TF-ESPCN/raw/master/export/ESPCN_x2.pb",
        );
        assert!(store.url_for(ModelArch::Edsr, 2, "onnx").is_none());
    }

    #[test]
    fn mirror_serves_any_format() {
        let store = ModelStore::new("/tmp/unused").with_mirror("https://example.org/weights/");
        assert_eq!(
            store.url_for(ModelArch::Edsr, 2, "onnx").unwrap(),
            "https://example.org/weights/EDSR_x2.onnx",
        );
    }

    #[test]
    fn default_cache_dir_ends_in_models() {
        assert!(ModelStore::default_cache_dir().ends_with("models"));
    }

    #[test]
    fn ensure_fetches_once_then_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let fetcher = FakeFetcher::serving(b"weights");

        let first = store.ensure(ModelArch::Edsr, 2, "pb", &fetcher).unwrap();
        let second = store.ensure(ModelArch::Edsr, 2, "pb", &fetcher).unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.count(), 1);
        assert_eq!(fs::read(&first).unwrap(), b"weights");
        let record = fs::read_to_string(dir.path().join("EDSR_x2.pb.blake3")).unwrap();
        assert_eq!(record, digest(b"weights"));
        assert!(!dir.path().join("EDSR_x2.pb.part").exists());
    }

    #[test]
    fn corrupted_entry_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let fetcher = FakeFetcher::serving(b"weights");
        let path = store.ensure(ModelArch::Espcn, 3, "pb", &fetcher).unwrap();

        fs::write(&path, b"truncat").unwrap();
        assert!(store.cached(ModelArch::Espcn, 3, "pb").is_none());
        assert!(!path.exists());

        store.ensure(ModelArch::Espcn, 3, "pb", &fetcher).unwrap();
        assert_eq!(fetcher.count(), 2);
        assert_eq!(fs::read(&path).unwrap(), b"weights");
    }

    #[test]
    fn file_without_record_is_adopted() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let path = dir.path().join("FSRCNN_x2.pb");
        fs::write(&path, b"left over").unwrap();

        assert_eq!(store.cached(ModelArch::Fsrcnn, 2, "pb"), Some(path.clone()));
        assert_eq!(fs::read(&path).unwrap(), b"left over");
        let record = fs::read_to_string(dir.path().join("FSRCNN_x2.pb.blake3")).unwrap();
        assert_eq!(record, digest(b"left over"));

        // Once adopted, later tampering is caught like any other entry.
        fs::write(&path, b"tampered").unwrap();
        assert!(store.cached(ModelArch::Fsrcnn, 2, "pb").is_none());
        assert!(!path.exists());
    }

    #[test]
    fn user_supplied_export_without_source_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let path = dir.path().join("EDSR_x2.onnx");
        fs::write(&path, b"converted export").unwrap();
        let fetcher = FakeFetcher::serving(b"weights");

        let found = store.ensure(ModelArch::Edsr, 2, "onnx", &fetcher).unwrap();
        assert_eq!(found, path);
        assert!(path.is_file());
        assert_eq!(fetcher.count(), 0);
    }

    #[test]
    fn empty_body_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let err = store
            .ensure(ModelArch::Edsr, 3, "pb", &FakeFetcher::serving(b""))
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyDownload { .. }));
        assert!(!store.path_for(ModelArch::Edsr, 3, "pb").exists());
    }

    #[test]
    fn format_without_source_is_rejected_before_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let fetcher = FakeFetcher::serving(b"weights");
        let err = store.ensure(ModelArch::Edsr, 2, "onnx", &fetcher).unwrap_err();
        assert!(matches!(err, StoreError::NoSource { .. }));
        assert_eq!(fetcher.count(), 0);
    }

    #[test]
    fn fetch_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let err = store.ensure(ModelArch::Lapsrn, 8, "pb", &Offline).unwrap_err();
        assert!(err.to_string().contains("network unreachable"));
    }
}
