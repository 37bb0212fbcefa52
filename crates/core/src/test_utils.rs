//! Shared test fixtures for ensureconda-core unit tests.
//!
//! Provides an in-memory [`HttpFetch`] and builders for the archive formats
//! the installers consume.

use bzip2::write::BzEncoder;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use tar::{Builder, Header};
use zip::write::SimpleFileOptions;

use crate::Result;
use crate::http::{HttpFetch, HttpResponse};

/// Serves canned responses; unknown URLs answer 404.
#[derive(Default)]
pub struct FakeHttp {
    routes: HashMap<String, HttpResponse>,
    requests: RefCell<Vec<String>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with 200 and `body`.
    pub fn ok(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.status(url, 200, body)
    }

    pub fn status(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.routes
            .insert(url.to_string(), HttpResponse::new(status, body));
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl HttpFetch for FakeHttp {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(url.to_string());
        Ok(self
            .routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| HttpResponse::new(404, Vec::new())))
    }
}

/// Plain tarball with mode 0755 entries.
pub fn tarball(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    for (path, content) in files {
        let mut header = Header::new_gnu();
        header.set_path(path).unwrap();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append(&header, &content[..]).unwrap();
    }
    builder.into_inner().unwrap()
}

/// Legacy `.tar.bz2` package.
pub fn tar_bz2(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::fast());
    encoder.write_all(&tarball(files)).unwrap();
    encoder.finish().unwrap()
}

/// `.conda` package with one zstd tarball per named component.
pub fn conda_package(components: &[(&str, &[(&str, &[u8])])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer.start_file("metadata.json", options).unwrap();
    writer
        .write_all(br#"{"conda_pkg_format_version": 2}"#)
        .unwrap();
    for (name, files) in components {
        writer.start_file(*name, options).unwrap();
        let compressed = zstd::encode_all(&tarball(files)[..], 3).unwrap();
        writer.write_all(&compressed).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
