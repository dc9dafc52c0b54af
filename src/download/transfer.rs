//! Single-file transfers: size probe, streamed download, verification.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use indicatif::ProgressBar;
use reqwest::{header, Client, Response};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use crate::config::OptionsConfig;
use crate::error::{Error, Result};
use crate::fs::paths::PARTIAL_SUFFIX;

/// Declared body length of a response, read from the header.
fn declared_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Check that a transfer received exactly the declared number of bytes.
pub fn verify_length(expected: Option<u64>, actual: u64) -> Result<()> {
    match expected {
        Some(expected) if expected != actual => Err(Error::Integrity { expected, actual }),
        _ => Ok(()),
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// HTTP transfers for file servers.
#[derive(Debug, Clone)]
pub struct Transfer {
    client: Client,
    probe_timeout: Duration,
    request_timeout: Duration,
    idle_timeout: Duration,
}

impl Transfer {
    pub fn new(client: Client, options: &OptionsConfig) -> Self {
        Self {
            client,
            probe_timeout: options.probe_timeout(),
            request_timeout: options.request_timeout(),
            idle_timeout: options.idle_timeout(),
        }
    }

    /// Size of the remote file, or `None` when it cannot be determined.
    ///
    /// Never fails: any error just means the caller should download.
    pub async fn probe_size(&self, url: &str) -> Option<u64> {
        let response = match self
            .client
            .head(url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::debug!("Size probe for {} returned {}", url, response.status());
                return None;
            }
            Err(e) => {
                tracing::debug!("Size probe for {} failed: {}", url, e);
                return None;
            }
        };

        declared_length(&response).filter(|len| *len > 0)
    }

    /// Whether `dest` already holds the complete remote file.
    pub async fn is_complete_on_disk(&self, url: &str, dest: &Path) -> bool {
        let Ok(metadata) = tokio::fs::metadata(dest).await else {
            return false;
        };
        match self.probe_size(url).await {
            Some(expected) if expected == metadata.len() => true,
            Some(expected) => {
                tracing::info!(
                    "Re-downloading incomplete {} ({}/{} bytes)",
                    dest.display(),
                    metadata.len(),
                    expected
                );
                false
            }
            None => false,
        }
    }

    /// Stream `url` into `dest`, returning the number of bytes written.
    ///
    /// Data lands in `{dest}.part` and is renamed into place only after the
    /// length check passes.
    pub async fn download(&self, url: &str, dest: &Path, bar: Option<&ProgressBar>) -> Result<u64> {
        let response = timeout(self.request_timeout, self.client.get(url).send())
            .await
            .map_err(|_| {
                Error::Network(format!(
                    "No response from {} within {} seconds",
                    url,
                    self.request_timeout.as_secs()
                ))
            })??;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let expected = declared_length(&response);
        if let Some(bar) = bar {
            bar.set_length(expected.unwrap_or(0));
        }

        let part = partial_path(dest);
        let written = match self.stream_to(response, &part, expected, bar).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(e);
            }
        };

        if let Err(e) = verify_length(expected, written) {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e);
        }

        tokio::fs::rename(&part, dest).await?;
        Ok(written)
    }

    /// Write the body to `path`. A body cut short of `expected` is an
    /// integrity failure rather than a transport error.
    async fn stream_to(
        &self,
        response: Response,
        path: &Path,
        expected: Option<u64>,
        bar: Option<&ProgressBar>,
    ) -> Result<u64> {
        let mut file = File::create(path).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        loop {
            let chunk = match timeout(self.idle_timeout, stream.next()).await {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) => {
                    return match expected {
                        Some(expected) if written < expected => {
                            tracing::debug!("Body of {} ended early: {}", path.display(), e);
                            Err(Error::Integrity {
                                expected,
                                actual: written,
                            })
                        }
                        _ => Err(e.into()),
                    };
                }
                Ok(None) => break,
                Err(_) => {
                    return Err(Error::Network(format!(
                        "No data received for {} seconds",
                        self.idle_timeout.as_secs()
                    )))
                }
            };

            file.write_all(&chunk).await?;
            written += chunk.len() as u64;

            if let Some(bar) = bar {
                bar.set_position(written);
            }
        }

        file.flush().await?;
        Ok(written)
    }
}
