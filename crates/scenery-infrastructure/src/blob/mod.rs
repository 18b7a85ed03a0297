//! Blob stores and payload fetching for file-reference scenes.
//!
//! - `memory`: in-process `blob:` URLs, also usable as the fetcher
//! - `file`: payloads written next to the store, addressed by `file://` URLs
//! - `http_fetcher`: fetches `http(s)://` and `file://` URLs

pub mod file;
pub mod http_fetcher;
pub mod memory;

pub use file::FileBlobStore;
pub use http_fetcher::HttpPayloadFetcher;
pub use memory::MemoryBlobStore;
