//! HTTP implementations of the release metadata and download services.

mod client;
mod download;
mod retry;
mod service;

pub use client::build_client;
pub use download::HttpDownloader;
pub use service::GoReleaseService;
