//! Integration tests for artifact-cache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn artifact_cache() -> Command {
        let mut cmd = cargo_bin_cmd!("artifact-cache");
        cmd.env_remove("ARTIFACT_CACHE_CONFIG")
            .env_remove("ARTIFACT_CACHE_ROOT");
        cmd
    }

    #[test]
    fn help_displays() {
        artifact_cache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("process-safe local cache"));
    }

    #[test]
    fn version_displays() {
        artifact_cache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("artifact-cache"));
    }

    #[test]
    fn path_creates_category_dir() {
        let temp = TempDir::new().unwrap();
        let expected = temp.path().join("artifact-cache").join("image_cache");

        artifact_cache()
            .args(["path", "image", "--cache-root"])
            .arg(temp.path())
            .arg("--config")
            .arg(temp.path().join("config.toml"))
            .assert()
            .success()
            .stdout(predicate::str::contains(expected.to_string_lossy().as_ref()));

        assert!(expected.is_dir());
    }

    #[test]
    fn path_rejects_unsafe_category() {
        let temp = TempDir::new().unwrap();
        artifact_cache()
            .args(["path", "../escape", "--cache-root"])
            .arg(temp.path())
            .arg("--config")
            .arg(temp.path().join("config.toml"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid input"));
    }

    #[test]
    fn fetch_invalid_url_fails() {
        let temp = TempDir::new().unwrap();
        artifact_cache()
            .args(["fetch", "not a url", "--cache-root"])
            .arg(temp.path())
            .arg("--config")
            .arg(temp.path().join("config.toml"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid input"));

        assert!(!temp.path().join("artifact-cache").exists());
    }

    #[test]
    fn list_empty_category() {
        let temp = TempDir::new().unwrap();
        artifact_cache()
            .args(["list", "image", "--cache-root"])
            .arg(temp.path())
            .arg("--config")
            .arg(temp.path().join("config.toml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("No entries cached"));
    }

    #[test]
    fn list_json_shows_entries() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("artifact-cache").join("iso_cache");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("deadbeef"), b"payload").unwrap();
        std::fs::write(dir.join("deadbeef.lock"), b"").unwrap();

        artifact_cache()
            .args(["list", "iso", "--format", "json", "--cache-root"])
            .arg(temp.path())
            .arg("--config")
            .arg(temp.path().join("config.toml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("\"key\": \"deadbeef\""))
            .stdout(predicate::str::contains("deadbeef.lock").not());
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        artifact_cache()
            .args(["config", "path", "--config"])
            .arg(temp.path().join("config.toml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();
        artifact_cache()
            .args(["config", "show", "--config"])
            .arg(temp.path().join("config.toml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("namespace = \"artifact-cache\""));
    }

    #[test]
    fn config_init_then_refuse_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        artifact_cache()
            .args(["config", "init", "--config"])
            .arg(&path)
            .assert()
            .success();
        assert!(path.exists());

        artifact_cache()
            .args(["config", "init", "--config"])
            .arg(&path)
            .assert()
            .success()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    #[serial]
    fn cache_root_from_env() {
        let temp = TempDir::new().unwrap();
        let expected = temp.path().join("artifact-cache").join("generic_cache");

        artifact_cache()
            .env("ARTIFACT_CACHE_ROOT", temp.path())
            .env("ARTIFACT_CACHE_CONFIG", temp.path().join("config.toml"))
            .args(["path", "generic"])
            .assert()
            .success()
            .stdout(predicate::str::contains(expected.to_string_lossy().as_ref()));
    }
}

mod cache_tests {
    use artifact_cache::cache::{cache_key, Download, Transport};
    use artifact_cache::{
        CacheDirResolver, CacheError, CacheResult, DecompressorRegistry, DownloadCache,
    };
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use sha2::{Digest, Sha256};
    use std::fs;
    use std::io::{self, Cursor, Read, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;
    use url::Url;

    /// Serves a fixed body and counts requests and body reads
    struct CountingTransport {
        body: Vec<u8>,
        requests: AtomicUsize,
        streams_read: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl CountingTransport {
        fn new(body: &[u8]) -> Self {
            Self {
                body: body.to_vec(),
                requests: AtomicUsize::new(0),
                streams_read: Arc::new(AtomicUsize::new(0)),
                delay: Duration::ZERO,
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    struct SlowReader {
        inner: Cursor<Vec<u8>>,
        started: bool,
        streams_read: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl Read for SlowReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.started {
                self.started = true;
                self.streams_read.fetch_add(1, Ordering::SeqCst);
            }
            thread::sleep(self.delay);
            let len = buf.len().min(4);
            self.inner.read(&mut buf[..len])
        }
    }

    impl Transport for CountingTransport {
        fn get(&self, _url: &Url) -> CacheResult<Download> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(Download {
                reader: Box::new(SlowReader {
                    inner: Cursor::new(self.body.clone()),
                    started: false,
                    streams_read: Arc::clone(&self.streams_read),
                    delay: self.delay,
                }),
                content_length: Some(self.body.len() as u64),
            })
        }
    }

    fn cache<T: Transport>(temp: &TempDir, transport: T) -> DownloadCache<T> {
        DownloadCache::new(
            CacheDirResolver::with_root(temp.path(), "artifact-cache"),
            Arc::new(DecompressorRegistry::standard()),
            transport,
        )
    }

    fn sha256_hex(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn repeated_fetch_downloads_once() {
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp, CountingTransport::new(b"plain artifact"));
        let url = "https://example.test/artifact.bin";

        let first = cache.fetch(url, "generic").unwrap();
        let second = cache.fetch(url, "generic").unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.transport().requests.load(Ordering::SeqCst), 1);
        assert_eq!(
            first,
            temp.path()
                .join("artifact-cache")
                .join("generic_cache")
                .join(cache_key(url))
        );
        assert_eq!(fs::read(&first).unwrap(), b"plain artifact");
    }

    #[test]
    fn checksum_mismatch_leaves_no_entry() {
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp, CountingTransport::new(b"tampered"));
        let url = format!(
            "https://example.test/a?sha256={}",
            sha256_hex(b"original")
        );

        let err = cache.fetch(&url, "generic").unwrap_err();
        assert!(matches!(err, CacheError::Integrity { .. }));

        let path = cache.entry_path(&url, "generic").unwrap();
        assert!(!path.exists());
        assert!(!path.with_file_name(format!("{}.lock", cache_key(&url))).exists());
    }

    #[test]
    fn gzip_with_checksum_yields_decompressed_entry() {
        let temp = TempDir::new().unwrap();
        let compressed = gzip(b"hello-world");
        let url = format!("https://example.test/a?sha256={}", sha256_hex(&compressed));
        let cache = cache(&temp, CountingTransport::new(&compressed));

        let path = cache.fetch(&url, "image").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello-world");

        let dir = path.parent().unwrap();
        let names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![cache_key(&url)]);
    }

    #[test]
    fn concurrent_fetches_read_one_stream() {
        const THREADS: usize = 8;

        let temp = TempDir::new().unwrap();
        let transport = CountingTransport::new(b"shared artifact body").slow(Duration::from_millis(5));
        let streams_read = Arc::clone(&transport.streams_read);
        let cache = Arc::new(cache(&temp, transport));
        let barrier = Arc::new(Barrier::new(THREADS));
        let url = "https://example.test/shared.bin";

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.fetch(url, "generic").unwrap()
                })
            })
            .collect();

        let paths: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(streams_read.load(Ordering::SeqCst), 1);
        assert!(paths.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(fs::read(&paths[0]).unwrap(), b"shared artifact body");
    }

    #[test]
    fn concurrent_hits_on_compressed_entry_agree() {
        const THREADS: usize = 16;

        let temp = TempDir::new().unwrap();
        let url = "https://example.test/interrupted.img.gz";
        let transport = CountingTransport::new(b"never streamed");
        let streams_read = Arc::clone(&transport.streams_read);
        let cache = Arc::new(cache(&temp, transport));

        // Promoted by an earlier run that stopped before decompressing
        let path = cache.entry_path(url, "image").unwrap();
        fs::write(&path, gzip(&vec![b'x'; 256 * 1024])).unwrap();

        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    thread::sleep(Duration::from_micros(200 * i as u64));
                    cache.fetch(url, "image").unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), path);
        }

        // Callers that raced the rename may issue a request, but the entry
        // lock stops them from ever reading a body.
        assert_eq!(streams_read.load(Ordering::SeqCst), 0);
        assert_eq!(fs::read(&path).unwrap(), vec![b'x'; 256 * 1024]);
    }

    #[test]
    fn stale_temp_file_is_replaced() {
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp, CountingTransport::new(b"fresh"));
        let url = "https://example.test/crashed.bin";

        let path = cache.entry_path(url, "generic").unwrap();
        let stale = path.with_file_name(format!("{}.tmp", cache_key(url)));
        fs::write(&stale, b"left over by a crashed run").unwrap();

        let fetched = cache.fetch(url, "generic").unwrap();
        assert_eq!(fetched, path);
        assert_eq!(fs::read(&path).unwrap(), b"fresh");
        assert!(!stale.exists());
    }

    #[test]
    fn decompression_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let registry = DecompressorRegistry::standard();
        let file = temp.path().join("entry");
        fs::write(&file, gzip(b"hello-world")).unwrap();

        assert!(registry.decompress_in_place(&file).unwrap());
        assert!(!registry.decompress_in_place(&file).unwrap());
        assert_eq!(fs::read(&file).unwrap(), b"hello-world");
    }
}
