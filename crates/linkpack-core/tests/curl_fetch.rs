//! Integration test: curl fetcher against a local HTTP server.

mod common;

use linkpack_core::fetch::{CurlFetcher, FetchError, Fetcher};

#[test]
fn fetch_writes_body_on_success() {
    let body: Vec<u8> = (0u8..100).cycle().take(32 * 1024).collect();
    let server = common::file_server::start(&[("doc.pdf", 200, &body)]);

    let mut sink = Vec::new();
    let n = CurlFetcher::default()
        .fetch(&server.url("doc.pdf"), &mut sink)
        .expect("fetch");
    assert_eq!(n, body.len() as u64);
    assert_eq!(sink, body);
}

#[test]
fn non_success_status_is_an_error() {
    let server = common::file_server::start(&[("broken.pdf", 500, b"oops")]);
    let mut sink = Vec::new();

    let err = CurlFetcher::default()
        .fetch(&server.url("broken.pdf"), &mut sink)
        .unwrap_err();
    assert!(matches!(err, FetchError::Status(500)), "got {err:?}");

    let err = CurlFetcher::default()
        .fetch(&server.url("missing.pdf"), &mut Vec::new())
        .unwrap_err();
    assert!(matches!(err, FetchError::Status(404)), "got {err:?}");
}

#[test]
fn connection_refused_is_transport_error() {
    let err = CurlFetcher::default()
        .fetch(&common::file_server::refused_url("a.pdf"), &mut Vec::new())
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)), "got {err:?}");
}

#[test]
fn sink_failure_is_reported() {
    struct FullDisk;
    impl std::io::Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let server = common::file_server::start(&[("doc.pdf", 200, b"payload")]);
    let err = CurlFetcher::default()
        .fetch(&server.url("doc.pdf"), &mut FullDisk)
        .unwrap_err();
    assert!(matches!(err, FetchError::Sink(_)), "got {err:?}");
}
