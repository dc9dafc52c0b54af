//! Downloading individual post links, including ledger retries.

use crate::api::{PlatformApi, RetryPolicy, SiteApis};
use crate::collect::normalize_post;
use crate::config::{parse_post_link, PostLink};
use crate::download::orchestrator::Downloader;
use crate::download::state::DownloadResult;
use crate::error::Result;
use crate::fs::paths::{artist_dir, site_dir, POSTS_DIR};
use crate::fs::profiles::{ArtistInfo, ProfileRegistry};
use crate::output::print_post_result;

/// Outcome of one requested link.
#[derive(Debug)]
pub struct LinkReport {
    pub link: String,
    pub outcome: Result<DownloadResult>,
}

impl Downloader<'_> {
    /// Download each post link in turn. A failing link does not stop the
    /// others.
    pub async fn download_links(&self, apis: &SiteApis, links: &[PostLink]) -> Vec<LinkReport> {
        let retry = RetryPolicy::from_options(&self.config.options);
        let mut reports = Vec::with_capacity(links.len());

        for (i, link) in links.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!("Cancelled, {} link(s) not processed", links.len() - i);
                break;
            }
            if i > 0 {
                self.pause_between_posts().await;
            }

            let outcome = match apis.get(link.site) {
                Ok(api) => self.download_post_link(api, link, retry).await,
                Err(e) => Err(e),
            };

            let link_text = apis
                .get(link.site)
                .map(|api| api.post_link(&link.service, &link.user_id, &link.post_id))
                .unwrap_or_else(|_| link.post_id.clone());

            match &outcome {
                Ok(result) => print_post_result(result),
                Err(e) => tracing::error!("Error processing link {}: {}", link_text, e),
            }

            reports.push(LinkReport {
                link: link_text,
                outcome,
            });
        }

        reports
    }

    /// Fetch one post and download it under its creator folder.
    pub async fn download_post_link(
        &self,
        api: &PlatformApi,
        link: &PostLink,
        retry: RetryPolicy,
    ) -> Result<DownloadResult> {
        let artist = self.artist_info(api, link, retry).await?;

        let detail = retry
            .run("post detail", || {
                api.get_post(&link.service, &link.user_id, &link.post_id)
            })
            .await?;
        let record = normalize_post(
            &detail,
            api.post_link(&link.service, &link.user_id, &link.post_id),
            0,
            0,
        );

        let posts_dir = artist_dir(
            self.config,
            link.site,
            &artist.name,
            &link.service,
            &link.user_id,
        )
        .join(POSTS_DIR);

        tracing::info!("Post {} ({}) by {}", record.id, record.title, artist.name);
        Ok(self.download_post(&record, &posts_dir).await)
    }

    /// Creator info from the site registry, fetched and recorded on a miss.
    async fn artist_info(
        &self,
        api: &PlatformApi,
        link: &PostLink,
        retry: RetryPolicy,
    ) -> Result<ArtistInfo> {
        let mut registry = ProfileRegistry::load(&site_dir(self.config, link.site));
        if let Some(info) = registry.get(&link.service, &link.user_id) {
            return Ok(info.clone());
        }

        let profile = retry
            .run("profile", || api.get_profile(&link.service, &link.user_id))
            .await?;
        let info = ArtistInfo::from(&profile);
        if let Err(e) = registry.upsert(info.clone()) {
            tracing::warn!("Could not update profile registry: {}", e);
        }
        Ok(info)
    }

    /// Re-process every link in the failure ledger.
    pub async fn retry_failed(&self, apis: &SiteApis) -> Result<Vec<LinkReport>> {
        let entries = self.ledger().load()?;
        if entries.is_empty() {
            tracing::info!("No failed downloads recorded");
            return Ok(Vec::new());
        }

        let mut links = Vec::new();
        let mut originals = Vec::new();
        for entry in entries {
            match parse_post_link(&self.config.domains, &entry) {
                Ok(link) => {
                    links.push(link);
                    originals.push(entry);
                }
                Err(e) => tracing::warn!("Keeping unparseable ledger entry {}: {}", entry, e),
            }
        }

        tracing::info!("Retrying {} failed link(s)", links.len());
        let reports = self.download_links(apis, &links).await;

        // Entries written by hand may differ from the canonical link; the
        // canonical link takes their place.
        for (report, original) in reports.iter().zip(&originals) {
            if *original == report.link {
                continue;
            }
            let complete = matches!(&report.outcome, Ok(result) if result.is_complete());
            if !complete {
                self.ledger().add(&report.link)?;
            }
            self.ledger().remove(original)?;
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ListingEndpoint, Site};
    use reqwest::Client;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_post(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/v1/patreon/user/42/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "42", "name": "Artist", "service": "patreon", "post_count": 1
            })))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/patreon/user/42/post/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "post": {"id": "7", "user": "42", "service": "patreon", "title": "Hi",
                         "file": {"name": "a.png", "path": "/aa/a.png"}},
                "previews": [{"server": server.uri(), "name": "a.png", "path": "/aa/a.png"}]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/aa/a.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
            .mount(server)
            .await;
    }

    fn setup(server: &MockServer, dir: &std::path::Path) -> (Config, SiteApis) {
        let mut config = Config::default();
        config.domains.kemono = format!("127.0.0.1:{}", server.address().port());
        config.options.download_directory = Some(dir.to_path_buf());
        config.options.ledger_file = dir.join("failed.txt");
        config.options.post_delay_ms = 0;
        config.options.show_progress = false;

        let mut apis = SiteApis::new(&config, Client::new());
        apis.insert(PlatformApi::with_base_url(
            Client::new(),
            Site::Kemono,
            server.uri(),
            ListingEndpoint::Posts,
        ));
        (config, apis)
    }

    fn link() -> PostLink {
        PostLink {
            site: Site::Kemono,
            service: "patreon".into(),
            user_id: "42".into(),
            post_id: "7".into(),
        }
    }

    #[tokio::test]
    async fn test_download_links_uses_registry_layout() {
        let server = MockServer::start().await;
        mock_post(&server).await;
        let dir = tempfile::tempdir().unwrap();
        let (config, apis) = setup(&server, dir.path());
        let downloader = Downloader::new(&config, Client::new(), CancellationToken::new());

        let reports = downloader.download_links(&apis, &[link(), link()]).await;

        assert_eq!(reports.len(), 2);
        let result = reports[0].outcome.as_ref().unwrap();
        assert!(result.is_complete());
        assert_eq!(reports[0].link, format!("{}/patreon/user/42/post/7", server.uri()));

        let file = dir
            .path()
            .join("kemono")
            .join("Artist-patreon-42")
            .join("posts")
            .join("7")
            .join("1-a.png");
        assert_eq!(std::fs::read(file).unwrap(), b"png");
        assert!(ProfileRegistry::load(&dir.path().join("kemono")).get("patreon", "42").is_some());
    }

    #[tokio::test]
    async fn test_retry_failed_clears_entry() {
        let server = MockServer::start().await;
        mock_post(&server).await;
        let dir = tempfile::tempdir().unwrap();
        let (config, apis) = setup(&server, dir.path());
        let downloader = Downloader::new(&config, Client::new(), CancellationToken::new());

        let entry = format!(
            "http://{}/patreon/user/42/post/7/",
            config.domains.kemono
        );
        downloader.ledger().add(&entry).unwrap();
        downloader.ledger().add("not a link").unwrap();

        let reports = downloader.retry_failed(&apis).await.unwrap();

        assert_eq!(reports.len(), 1);
        let remaining = downloader.ledger().load().unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.contains("not a link"));
    }

    #[tokio::test]
    async fn test_retry_failed_replaces_entry_on_partial_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/aa/a.png"))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .mount(&server)
            .await;
        mock_post(&server).await;
        let dir = tempfile::tempdir().unwrap();
        let (config, apis) = setup(&server, dir.path());
        let downloader = Downloader::new(&config, Client::new(), CancellationToken::new());

        let entry = format!("http://{}/patreon/user/42/post/7/", config.domains.kemono);
        downloader.ledger().add(&entry).unwrap();

        let reports = downloader.retry_failed(&apis).await.unwrap();
        assert!(!reports[0].outcome.as_ref().unwrap().is_complete());

        let remaining = downloader.ledger().load().unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.contains(&reports[0].link));
        assert!(!remaining.contains(&entry));
    }
}
