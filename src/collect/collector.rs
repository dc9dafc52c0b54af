//! Page walk that turns a fetch plan into a snapshot of post records.

use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::api::{PostDetail, PostSource, RawPost, RetryPolicy, PAGE_SIZE};
use crate::collect::cache::DetailCache;
use crate::collect::normalize::{normalize_post, PostRecord};
use crate::collect::range::{FetchPlan, IdPredicate};
use crate::collect::snapshot::write_snapshot;
use crate::config::OptionsConfig;
use crate::error::{Error, Result};

/// Settings the collector needs from the configuration.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub get_empty_posts: bool,
    pub detail_delay: Duration,
    pub retry: RetryPolicy,
}

impl CollectOptions {
    pub fn from_options(options: &OptionsConfig) -> Self {
        Self {
            get_empty_posts: options.get_empty_posts,
            detail_delay: Duration::from_millis(options.detail_delay_ms),
            retry: RetryPolicy::from_options(options),
        }
    }
}

/// Boundary ids of an id filter that have shown up in listings.
struct BoundaryTracker<'a> {
    pending: HashSet<&'a str>,
}

impl<'a> BoundaryTracker<'a> {
    fn new(predicate: &'a IdPredicate) -> Self {
        Self {
            pending: predicate.boundaries().into_iter().collect(),
        }
    }

    fn observe(&mut self, id: &str) {
        self.pending.remove(id);
    }

    fn done(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Walks listing pages of one creator and persists what it finds.
pub struct PostCollector<'a, S: PostSource + ?Sized> {
    source: &'a S,
    cache: DetailCache,
    options: CollectOptions,
    cancel: CancellationToken,
}

impl<'a, S: PostSource + ?Sized> PostCollector<'a, S> {
    pub fn new(
        source: &'a S,
        cache: DetailCache,
        options: CollectOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            cache,
            options,
            cancel,
        }
    }

    async fn cancellable<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = fut => result,
        }
    }

    /// Collect every post of the plan, rewriting `snapshot_path` after each
    /// page.
    ///
    /// Posts whose detail could not be fetched are skipped and reported at
    /// the end as [`Error::CollectionIncomplete`]; the snapshot and the detail
    /// cache keep what was gathered so a later run can resume.
    pub async fn collect(
        &self,
        service: &str,
        user_id: &str,
        plan: &FetchPlan,
        snapshot_path: &Path,
    ) -> Result<Vec<PostRecord>> {
        let mut records: Vec<PostRecord> = Vec::new();
        let mut deferred = 0usize;
        let mut boundaries = plan.predicate.as_ref().map(BoundaryTracker::new);

        for &offset in &plan.offsets {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let page = offset / PAGE_SIZE + 1;
            tracing::info!("Fetching page {} (offset {})", page, offset);

            let raw_posts = self
                .cancellable(self.options.retry.run("posts page", || {
                    self.source.fetch_page(service, user_id, offset)
                }))
                .await?;

            for raw in &raw_posts {
                if self.cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                if let Some(tracker) = boundaries.as_mut() {
                    tracker.observe(&raw.id);
                }
                if let Some(predicate) = &plan.predicate {
                    if !predicate.matches(&raw.id) {
                        continue;
                    }
                }

                let detail = match self.detail(raw).await {
                    Ok(detail) => detail,
                    Err(Error::Cancelled) => return Err(Error::Cancelled),
                    Err(e) => {
                        tracing::warn!("Deferring post {} - {}: {}", raw.user, raw.id, e);
                        deferred += 1;
                        continue;
                    }
                };

                let link = self
                    .source
                    .post_link(&detail.post.service, &detail.post.user, &detail.post.id);
                let record = normalize_post(&detail, link, page, offset);

                if let Some(predicate) = &plan.predicate {
                    if !predicate.matches(&record.id) {
                        continue;
                    }
                }
                if !self.options.get_empty_posts && record.files.is_empty() {
                    tracing::debug!("Skipping post {} without files", record.id);
                    continue;
                }

                records.push(record);
            }

            write_snapshot(snapshot_path, &records)?;
            tracing::debug!(
                "Snapshot {} now holds {} posts",
                snapshot_path.display(),
                records.len()
            );

            if boundaries.as_ref().is_some_and(|t| t.done()) {
                tracing::info!("All boundary posts seen, stopping after offset {}", offset);
                break;
            }
        }

        if deferred > 0 {
            return Err(Error::CollectionIncomplete { pending: deferred });
        }

        Ok(records)
    }

    /// Detail of a post, from the cache or the network.
    async fn detail(&self, raw: &RawPost) -> Result<PostDetail> {
        if let Some(detail) = self.cache.get(&raw.user, &raw.id) {
            tracing::debug!("Cache hit for post {}", raw.id);
            return Ok(detail);
        }

        self.pause().await?;

        let detail = self
            .cancellable(self.options.retry.run("post detail", || {
                self.source.fetch_post(&raw.service, &raw.user, &raw.id)
            }))
            .await?;

        if let Err(e) = self.cache.put(&raw.user, &raw.id, &detail) {
            tracing::warn!("Could not cache post {}: {}", raw.id, e);
        }
        Ok(detail)
    }

    /// Jittered pause before a detail request.
    async fn pause(&self) -> Result<()> {
        let base = self.options.detail_delay.as_millis() as u64;
        if base == 0 {
            return Ok(());
        }
        let delay_ms = rand::thread_rng().gen_range(base..=base + base / 2);
        self.cancellable(async {
            sleep(Duration::from_millis(delay_ms)).await;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::range::{resolve, FetchPlan};
    use crate::collect::snapshot::ProfileSnapshot;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted source: pages by offset and a detail per post id.
    #[derive(Default)]
    struct ScriptedSource {
        pages: HashMap<u64, Vec<&'static str>>,
        rate_limited_details: HashSet<&'static str>,
        /// Pages answered with a rate limit this many times before succeeding.
        page_throttles: Mutex<u32>,
        requested_pages: Mutex<Vec<u64>>,
        requested_posts: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn with_pages(pages: Vec<(u64, Vec<&'static str>)>) -> Self {
            Self {
                pages: pages.into_iter().collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl PostSource for ScriptedSource {
        async fn fetch_page(&self, _service: &str, user_id: &str, offset: u64) -> Result<Vec<RawPost>> {
            self.requested_pages.lock().unwrap().push(offset);
            {
                let mut throttles = self.page_throttles.lock().unwrap();
                if *throttles > 0 {
                    *throttles -= 1;
                    return Err(Error::RateLimited(429));
                }
            }
            let ids = self.pages.get(&offset).cloned().unwrap_or_default();
            Ok(ids
                .into_iter()
                .map(|id| RawPost {
                    id: id.to_string(),
                    user: user_id.to_string(),
                    service: "patreon".to_string(),
                    title: None,
                })
                .collect())
        }

        async fn fetch_post(&self, service: &str, user_id: &str, post_id: &str) -> Result<PostDetail> {
            self.requested_posts.lock().unwrap().push(post_id.to_string());
            if self.rate_limited_details.contains(post_id) {
                return Err(Error::RateLimited(429));
            }
            Ok(serde_json::from_value(serde_json::json!({
                "post": {
                    "id": post_id, "user": user_id, "service": service,
                    "title": format!("post {}", post_id),
                    "file": {"name": "a.png", "path": format!("/f/{}.png", post_id)}
                },
                "previews": [{"server": "https://n1.kemono.su", "name": "a.png",
                              "path": format!("/f/{}.png", post_id)}]
            }))
            .unwrap())
        }

        fn post_link(&self, service: &str, user_id: &str, post_id: &str) -> String {
            format!("https://kemono.su/{}/user/{}/post/{}", service, user_id, post_id)
        }
    }

    fn options() -> CollectOptions {
        CollectOptions {
            get_empty_posts: false,
            detail_delay: Duration::ZERO,
            retry: RetryPolicy {
                retries: 3,
                unit: Duration::from_millis(1),
            },
        }
    }

    fn collector<'a>(source: &'a ScriptedSource, cache_dir: &Path) -> PostCollector<'a, ScriptedSource> {
        PostCollector::new(
            source,
            DetailCache::new(cache_dir),
            options(),
            CancellationToken::new(),
        )
    }

    fn ids(records: &[PostRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_collects_all_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::with_pages(vec![(0, vec!["3", "2"]), (50, vec!["1"])]);
        let snapshot = dir.path().join("posts.json");

        let plan = FetchPlan::new(resolve("all", 60).unwrap(), 60);
        let records = collector(&source, &dir.path().join("cache"))
            .collect("patreon", "42", &plan, &snapshot)
            .await
            .unwrap();

        assert_eq!(ids(&records), vec!["3", "2", "1"]);
        assert_eq!(records[2].page, 2);
        assert_eq!(records[2].offset, 50);
        assert_eq!(records[0].link, "https://kemono.su/patreon/user/42/post/3");

        let written = ProfileSnapshot::load(&snapshot).unwrap();
        assert_eq!(written.total_posts, 3);
        assert_eq!(written.posts, records);
    }

    #[tokio::test]
    async fn test_id_range_stops_once_both_ends_seen() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::with_pages(vec![
            (0, vec!["12", "9", "8"]),
            (50, vec!["6", "5", "4"]),
            (100, vec!["3", "2"]),
        ]);
        let snapshot = dir.path().join("posts.json");

        let plan = FetchPlan::new(resolve("id:5-9", 120).unwrap(), 120);
        let records = collector(&source, &dir.path().join("cache"))
            .collect("patreon", "42", &plan, &snapshot)
            .await
            .unwrap();

        assert_eq!(ids(&records), vec!["9", "8", "6", "5"]);
        assert_eq!(*source.requested_pages.lock().unwrap(), vec![0, 50]);
        // Posts outside the range never need a detail request.
        assert!(!source.requested_posts.lock().unwrap().contains(&"12".to_string()));
    }

    #[tokio::test]
    async fn test_rate_limited_page_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::with_pages(vec![(0, vec!["1"])]);
        *source.page_throttles.lock().unwrap() = 2;

        let plan = FetchPlan::new(resolve("0", 10).unwrap(), 10);
        let records = collector(&source, &dir.path().join("cache"))
            .collect("patreon", "42", &plan, &dir.path().join("posts.json"))
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(source.requested_pages.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_page_failure_after_retries_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::with_pages(vec![(0, vec!["1"])]);
        *source.page_throttles.lock().unwrap() = 10;

        let plan = FetchPlan::new(resolve("0", 10).unwrap(), 10);
        let err = collector(&source, &dir.path().join("cache"))
            .collect("patreon", "42", &plan, &dir.path().join("posts.json"))
            .await
            .unwrap_err();

        assert!(err.is_rate_limit());
        assert_eq!(source.requested_pages.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_details_are_deferred() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ScriptedSource::with_pages(vec![(0, vec!["3", "2", "1"])]);
        source.rate_limited_details.insert("2");
        let snapshot = dir.path().join("posts.json");

        let plan = FetchPlan::new(resolve("0", 3).unwrap(), 3);
        let err = collector(&source, &dir.path().join("cache"))
            .collect("patreon", "42", &plan, &snapshot)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CollectionIncomplete { pending: 1 }));
        let written = ProfileSnapshot::load(&snapshot).unwrap();
        assert_eq!(ids(&written.posts), vec!["3", "1"]);
    }

    #[tokio::test]
    async fn test_rerun_uses_cache_and_matches_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache");
        let source = ScriptedSource::with_pages(vec![(0, vec!["2", "1"])]);
        let plan = FetchPlan::new(resolve("all", 2).unwrap(), 2);

        let first = collector(&source, &cache)
            .collect("patreon", "42", &plan, &dir.path().join("a.json"))
            .await
            .unwrap();
        let detail_requests = source.requested_posts.lock().unwrap().len();

        let second = collector(&source, &cache)
            .collect("patreon", "42", &plan, &dir.path().join("b.json"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(source.requested_posts.lock().unwrap().len(), detail_requests);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::with_pages(vec![(0, vec!["1"])]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let plan = FetchPlan::new(resolve("all", 1).unwrap(), 1);
        let result = PostCollector::new(&source, DetailCache::new(dir.path()), options(), cancel)
            .collect("patreon", "42", &plan, &dir.path().join("posts.json"))
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(source.requested_pages.lock().unwrap().is_empty());
    }
}
