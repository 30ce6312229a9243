use std::fs::File;
use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::error::CatalogError;

const CATALOG_BASE_URL: &str = "https://ccrgpages.rit.edu/~RITCatalog";

pub fn metadata_url(filename: &str) -> String {
    format!("{CATALOG_BASE_URL}/Metadata/{filename}")
}

pub fn data_url(filename: &str) -> String {
    format!("{CATALOG_BASE_URL}/Data/{filename}")
}

/// Remote side of the catalog: existence probing, metadata text fetch and
/// payload download. The crawler treats any failure of `exists` as
/// absence; retries live below this trait, not above it.
pub trait ArchiveClient: Send + Sync {
    fn exists(&self, url: &str) -> bool;
    fn fetch_text(&self, url: &str) -> Result<String, CatalogError>;
    fn download(&self, url: &str, destination: &Path) -> Result<(), CatalogError>;
}

#[derive(Clone)]
pub struct HttpArchiveClient {
    client: Client,
}

impl HttpArchiveClient {
    pub fn new() -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("nrcat/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| CatalogError::ArchiveHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| CatalogError::ArchiveHttp(err.to_string()))?;
        Ok(Self { client })
    }

    fn send_with_retries<F>(&self, mut make_req: F) -> Result<reqwest::blocking::Response, CatalogError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(CatalogError::ArchiveHttp(err.to_string()));
                }
            }
        }
    }

    fn write_response_to_file(
        &self,
        mut response: reqwest::blocking::Response,
        destination: &Path,
    ) -> Result<(), CatalogError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "archive request failed".to_string());
            return Err(CatalogError::ArchiveStatus { status, message });
        }
        let mut file =
            File::create(destination).map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| CatalogError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

impl ArchiveClient for HttpArchiveClient {
    fn exists(&self, url: &str) -> bool {
        match self.send_with_retries(|| self.client.head(url)) {
            Ok(response) => response.status().is_success(),
            Err(_) => {
                debug!(url, "existence probe failed, treating as absent");
                false
            }
        }
    }

    fn fetch_text(&self, url: &str) -> Result<String, CatalogError> {
        let response = self.send_with_retries(|| self.client.get(url))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "archive request failed".to_string());
            return Err(CatalogError::ArchiveStatus { status, message });
        }
        response
            .text()
            .map_err(|err| CatalogError::ArchiveHttp(err.to_string()))
    }

    fn download(&self, url: &str, destination: &Path) -> Result<(), CatalogError> {
        debug!(url, "downloading");
        let response = self.send_with_retries(|| self.client.get(url))?;
        self.write_response_to_file(response, destination)
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_layout() {
        assert_eq!(
            metadata_url("RIT-BBH-0193-n100-id3_Metadata.txt"),
            "https://ccrgpages.rit.edu/~RITCatalog/Metadata/RIT-BBH-0193-n100-id3_Metadata.txt"
        );
        assert_eq!(
            data_url("ExtrapStrain_RIT-BBH-0193-n100.h5"),
            "https://ccrgpages.rit.edu/~RITCatalog/Data/ExtrapStrain_RIT-BBH-0193-n100.h5"
        );
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(404));
    }
}
