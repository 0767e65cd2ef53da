use crate::retry::{BoundedRetry, RetryError};
use async_trait::async_trait;
use linkway_core::{
    Repository, ShortCode, ShortenedLink, Shortener, ShortenerError, StorageError,
};
use linkway_generator::Generator;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;
use url::Url;

/// Settings for [`ShortenerService`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerSettings {
    /// Public base URL short links are built on, e.g. `https://lnk.way`.
    #[builder(setter(into))]
    pub base_url: String,
    /// How many codes to try before giving up with
    /// [`ShortenerError::GenerationExhausted`].
    #[builder(default = 5)]
    pub max_attempts: u32,
}

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `Repository` and a `Generator` to handle:
/// - URL validation
/// - Short code generation, retried on collision up to `max_attempts`
/// - Building the public short URL
#[derive(Debug, Clone)]
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
    base_url: String,
    retry: BoundedRetry,
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    pub fn new(repository: R, generator: G, settings: ShortenerSettings) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            base_url: settings.base_url,
            retry: BoundedRetry::new(settings.max_attempts),
        }
    }

    /// Accepts any absolute URL. No scheme or host allow-list is applied.
    fn validate_url(url: &str) -> Result<(), ShortenerError> {
        if url.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        // The url parser silently strips surrounding and embedded whitespace,
        // but the original is echoed and redirected to verbatim.
        if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must not contain whitespace or control characters: {:?}",
                url
            )));
        }

        Url::parse(url).map_err(|e| {
            ShortenerError::InvalidUrl(format!("not an absolute URL: {}: {}", url, e))
        })?;

        Ok(())
    }
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn shorten(&self, original_url: &str) -> Result<ShortenedLink, ShortenerError> {
        Self::validate_url(original_url)?;

        let repository = &self.repository;
        let generator = &self.generator;

        let link = self
            .retry
            .run(
                |attempt| {
                    let code: ShortCode = generator.generate().into();
                    trace!(attempt, code = %code, "trying short code");
                    async move {
                        // Route names count as taken.
                        if code.is_reserved() {
                            return Err(StorageError::Conflict(code.to_string()));
                        }
                        repository.insert(&code, original_url).await
                    }
                },
                |err| matches!(err, StorageError::Conflict(_)),
            )
            .await
            .map_err(|err| match err {
                RetryError::Exhausted { attempts, last } => {
                    warn!(attempts, last = %last, "short code generation exhausted");
                    ShortenerError::GenerationExhausted { attempts }
                }
                RetryError::Aborted(source) => ShortenerError::Storage(source),
            })?;

        let short = link.code.to_url(&self.base_url);
        debug!(code = %link.code, url = %link.original_url, "link created");

        Ok(ShortenedLink {
            short,
            code: link.code,
            original: link.original_url,
            created_at: link.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use linkway_core::{Link, ReadRepository};
    use linkway_generator::{RandomGenerator, SeqGenerator};
    use linkway_storage::InMemoryRepository;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    const BASE_URL: &str = "http://lnk.test";

    fn settings() -> ShortenerSettings {
        ShortenerSettings::builder().base_url(BASE_URL).build()
    }

    fn test_service() -> (
        Arc<InMemoryRepository>,
        ShortenerService<Arc<InMemoryRepository>, SeqGenerator>,
    ) {
        let repo = Arc::new(InMemoryRepository::new());
        let service = ShortenerService::new(
            Arc::clone(&repo),
            SeqGenerator::with_prefix("lw").unwrap(),
            settings(),
        );
        (repo, service)
    }

    /// Always proposes the same code and counts how often it was asked.
    struct StuckGenerator {
        calls: Arc<AtomicU32>,
    }

    impl Generator for StuckGenerator {
        type Output = ShortCode;

        fn generate(&self) -> ShortCode {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ShortCode::new_unchecked("taken")
        }
    }

    /// A store that is always down.
    struct UnavailableRepository;

    #[async_trait]
    impl ReadRepository for UnavailableRepository {
        async fn get(&self, _code: &ShortCode) -> linkway_core::repository::Result<Option<Link>> {
            Err(StorageError::Unavailable("down".into()))
        }
    }

    #[async_trait]
    impl Repository for UnavailableRepository {
        async fn insert(
            &self,
            _code: &ShortCode,
            _original_url: &str,
        ) -> linkway_core::repository::Result<Link> {
            Err(StorageError::Unavailable("down".into()))
        }
    }

    #[tokio::test]
    async fn shorten_echoes_original_and_builds_short_url() {
        let (_, service) = test_service();

        let link = service
            .shorten("http://example.com/aBcDeFgH")
            .await
            .unwrap();

        assert_eq!(link.original, "http://example.com/aBcDeFgH");
        assert_eq!(link.code.as_str(), "lw000000");
        assert_eq!(link.short, "http://lnk.test/lw000000");
    }

    #[tokio::test]
    async fn original_is_not_normalized() {
        let (repo, service) = test_service();
        let odd = "HTTP://Example.COM:80/a/../b?q=1#Frag";

        let link = service.shorten(odd).await.unwrap();
        assert_eq!(link.original, odd);

        let stored = repo.get(&link.code).await.unwrap().unwrap();
        assert_eq!(stored.original_url, odd);
    }

    #[tokio::test]
    async fn shortened_link_is_stored() {
        let (repo, service) = test_service();

        let link = service.shorten("https://example.com").await.unwrap();

        let stored = repo.get(&link.code).await.unwrap().unwrap();
        assert_eq!(stored.original_url, "https://example.com");
        assert_eq!(stored.created_at, link.created_at);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn invalid_urls_are_rejected_without_storing() {
        let (repo, service) = test_service();

        for input in ["", "not a url", "not-a-valid-url", "/relative/path", " http://example.com"] {
            let err = service.shorten(input).await.unwrap_err();
            assert!(
                matches!(err, ShortenerError::InvalidUrl(_)),
                "{input:?} gave {err:?}"
            );
        }

        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn any_absolute_scheme_is_accepted() {
        let (_, service) = test_service();

        for input in ["ftp://files.example.com/a", "mailto:someone@example.com"] {
            service.shorten(input).await.unwrap();
        }
    }

    #[tokio::test]
    async fn collision_is_retried_with_a_new_code() {
        let (repo, service) = test_service();
        repo.insert(&ShortCode::new_unchecked("lw000000"), "https://first.example")
            .await
            .unwrap();

        let link = service.shorten("https://second.example").await.unwrap();

        assert_eq!(link.code.as_str(), "lw000001");
        let first = repo
            .get(&ShortCode::new_unchecked("lw000000"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.original_url, "https://first.example");
    }

    #[tokio::test]
    async fn generation_exhausted_after_max_attempts() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.insert(&ShortCode::new_unchecked("taken"), "https://first.example")
            .await
            .unwrap();

        let calls = Arc::new(AtomicU32::new(0));
        let service = ShortenerService::new(
            Arc::clone(&repo),
            StuckGenerator {
                calls: Arc::clone(&calls),
            },
            ShortenerSettings::builder()
                .base_url(BASE_URL)
                .max_attempts(5)
                .build(),
        );

        let err = service.shorten("https://second.example").await.unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::GenerationExhausted { attempts: 5 }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(repo.len(), 1);
    }

    /// Hands out the given codes in order.
    struct ScriptedGenerator {
        codes: std::sync::Mutex<std::vec::IntoIter<&'static str>>,
    }

    impl ScriptedGenerator {
        fn new(codes: Vec<&'static str>) -> Self {
            Self {
                codes: std::sync::Mutex::new(codes.into_iter()),
            }
        }
    }

    impl Generator for ScriptedGenerator {
        type Output = ShortCode;

        fn generate(&self) -> ShortCode {
            let next = self.codes.lock().unwrap().next().expect("script exhausted");
            ShortCode::new_unchecked(next)
        }
    }

    #[tokio::test]
    async fn reserved_codes_are_skipped() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = ShortenerService::new(
            Arc::clone(&repo),
            ScriptedGenerator::new(vec!["readyz", "api", "Xk9_a-2"]),
            settings(),
        );

        let link = service.shorten("https://example.com").await.unwrap();

        assert_eq!(link.code.as_str(), "Xk9_a-2");
        assert_eq!(repo.len(), 1);
        assert!(repo
            .get(&ShortCode::new_unchecked("readyz"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn resumed_sequence_skips_codes_from_a_previous_run() {
        let repo = Arc::new(InMemoryRepository::new());
        for n in 0..10 {
            repo.insert(
                &ShortCode::new_unchecked(format!("lw{n:06}")),
                "https://earlier.example",
            )
            .await
            .unwrap();
        }

        let restarted = ShortenerService::new(
            Arc::clone(&repo),
            SeqGenerator::with_prefix("lw").unwrap(),
            settings(),
        );
        let err = restarted.shorten("https://new.example").await.unwrap_err();
        assert!(matches!(err, ShortenerError::GenerationExhausted { .. }));

        let last = ShortCode::new_unchecked("lw000009");
        let resumed = ShortenerService::new(
            Arc::clone(&repo),
            SeqGenerator::resume_after("lw", &last).unwrap(),
            settings(),
        );
        let link = resumed.shorten("https://new.example").await.unwrap();
        assert_eq!(link.code.as_str(), "lw000010");
    }

    #[tokio::test]
    async fn storage_failure_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let service = ShortenerService::new(
            UnavailableRepository,
            StuckGenerator {
                calls: Arc::clone(&calls),
            },
            settings(),
        );

        let err = service.shorten("https://example.com").await.unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::Storage(StorageError::Unavailable(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_shortens_get_distinct_resolvable_codes() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = Arc::new(ShortenerService::new(
            Arc::clone(&repo),
            RandomGenerator::default(),
            settings(),
        ));

        let handles: Vec<_> = (0..300)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    let url = format!("http://example.com/{i:08}");
                    let link = service.shorten(&url).await.unwrap();
                    (url, link)
                })
            })
            .collect();

        let mut codes = HashSet::new();
        for handle in handles {
            let (url, link) = handle.await.unwrap();
            assert_eq!(link.original, url);
            assert!(codes.insert(link.code.clone()), "duplicate {}", link.code);

            let stored = repo.get(&link.code).await.unwrap().unwrap();
            assert_eq!(stored.original_url, url);
        }

        assert_eq!(codes.len(), 300);
        assert_eq!(repo.len(), 300);
    }
}
