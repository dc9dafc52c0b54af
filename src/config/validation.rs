//! Configuration validation and link parsing.

use regex::Regex;
use url::Url;

use crate::config::loader::{url_authority, Config, DomainsConfig, OptionsConfig};
use crate::config::modes::Site;
use crate::error::{Error, Result};

/// Maximum concurrent transfers per post.
const MAX_WORKERS: usize = 16;

/// A creator profile on one of the platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLink {
    pub site: Site,
    pub service: String,
    pub user_id: String,
}

/// A single post on one of the platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostLink {
    pub site: Site,
    pub service: String,
    pub user_id: String,
    pub post_id: String,
}

impl PostLink {
    /// The profile this post belongs to.
    pub fn profile(&self) -> ProfileLink {
        ProfileLink {
            site: self.site,
            service: self.service.clone(),
            user_id: self.user_id.clone(),
        }
    }
}

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_domains(&config.domains)?;
    validate_workers(config.options.workers)?;
    validate_timeouts(&config.options)?;
    Ok(())
}

/// Validate the platform hostnames.
pub fn validate_domains(domains: &DomainsConfig) -> Result<()> {
    let host_pattern = Regex::new(r"^[A-Za-z0-9.-]+(:\d{1,5})?$").unwrap();

    for site in Site::ALL {
        let domain = domains.domain(site);
        let field = format!("domains.{}", site);

        if domain.trim().is_empty() {
            return Err(Error::ConfigValidation {
                field,
                message: "Domain must not be empty".to_string(),
            });
        }

        if !host_pattern.is_match(domain) {
            return Err(Error::ConfigValidation {
                field,
                message: format!(
                    "'{}' is not a bare hostname (drop any scheme or path)",
                    domain
                ),
            });
        }
    }

    if domains.kemono.eq_ignore_ascii_case(&domains.coomer) {
        return Err(Error::ConfigValidation {
            field: "domains".to_string(),
            message: "Both platforms point at the same domain".to_string(),
        });
    }

    Ok(())
}

/// Validate the worker pool size.
pub fn validate_workers(workers: usize) -> Result<()> {
    if workers == 0 || workers > MAX_WORKERS {
        return Err(Error::ConfigValidation {
            field: "workers".to_string(),
            message: format!("Must be between 1 and {} (got {})", MAX_WORKERS, workers),
        });
    }
    Ok(())
}

/// Every network timeout must be at least one second.
pub fn validate_timeouts(options: &OptionsConfig) -> Result<()> {
    let timeouts = [
        ("probe_timeout_secs", options.probe_timeout_secs),
        ("connect_timeout_secs", options.connect_timeout_secs),
        ("request_timeout_secs", options.request_timeout_secs),
        ("idle_timeout_secs", options.idle_timeout_secs),
    ];
    match timeouts.iter().find(|(_, secs)| *secs == 0) {
        Some((field, _)) => Err(Error::ConfigValidation {
            field: field.to_string(),
            message: "Timeout must be at least 1 second".to_string(),
        }),
        None => Ok(()),
    }
}

/// Parse the site and path segments of a platform link.
fn parse_link(domains: &DomainsConfig, link: &str) -> Result<(Site, Vec<String>)> {
    let url = Url::parse(link.trim())?;
    let authority = url_authority(&url).ok_or_else(|| Error::InvalidLink(link.to_string()))?;

    // Links must name the platform itself, not one of its file servers.
    let site = Site::ALL
        .into_iter()
        .find(|site| domains.domain(*site).eq_ignore_ascii_case(&authority))
        .ok_or_else(|| {
            Error::UnsupportedDomain(format!(
                "{} (supported: {})",
                authority,
                domains.all().join(", ")
            ))
        })?;

    let segments = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).map(String::from).collect())
        .unwrap_or_default();

    Ok((site, segments))
}

/// Parse `https://{domain}/{service}/user/{id}`.
pub fn parse_profile_link(domains: &DomainsConfig, link: &str) -> Result<ProfileLink> {
    let (site, segments) = parse_link(domains, link)?;

    match segments.as_slice() {
        [service, user, user_id, ..] if user == "user" => Ok(ProfileLink {
            site,
            service: service.clone(),
            user_id: user_id.clone(),
        }),
        _ => Err(Error::InvalidLink(format!(
            "{} (expected https://domain/service/user/user_id)",
            link
        ))),
    }
}

/// Parse `https://{domain}/{service}/user/{id}/post/{post_id}`.
pub fn parse_post_link(domains: &DomainsConfig, link: &str) -> Result<PostLink> {
    let (site, segments) = parse_link(domains, link)?;

    match segments.as_slice() {
        [service, user, user_id, post, post_id, ..] if user == "user" && post == "post" => {
            Ok(PostLink {
                site,
                service: service.clone(),
                user_id: user_id.clone(),
                post_id: post_id.clone(),
            })
        }
        _ => Err(Error::InvalidLink(format!(
            "{} (expected https://domain/service/user/user_id/post/post_id)",
            link
        ))),
    }
}

/// Split pasted or file-loaded text into links on commas and whitespace.
pub fn split_links(content: &str) -> Vec<String> {
    let separator = Regex::new(r"[,\s]+").unwrap();
    separator
        .split(content)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_link() {
        let domains = DomainsConfig::default();
        let link = parse_profile_link(&domains, "https://kemono.su/patreon/user/12345").unwrap();
        assert_eq!(link.site, Site::Kemono);
        assert_eq!(link.service, "patreon");
        assert_eq!(link.user_id, "12345");
    }

    #[test]
    fn test_parse_post_link() {
        let domains = DomainsConfig::default();
        let link =
            parse_post_link(&domains, "https://coomer.su/onlyfans/user/alice/post/987").unwrap();
        assert_eq!(link.site, Site::Coomer);
        assert_eq!(link.user_id, "alice");
        assert_eq!(link.post_id, "987");
        assert_eq!(link.profile().service, "onlyfans");
    }

    #[test]
    fn test_parse_link_unsupported_domain() {
        let domains = DomainsConfig::default();
        let err = parse_profile_link(&domains, "https://example.com/patreon/user/1").unwrap_err();
        assert!(matches!(err, Error::UnsupportedDomain(_)));
    }

    #[test]
    fn test_parse_link_bad_shape() {
        let domains = DomainsConfig::default();
        assert!(matches!(
            parse_post_link(&domains, "https://kemono.su/patreon/user/1").unwrap_err(),
            Error::InvalidLink(_)
        ));
        assert!(parse_profile_link(&domains, "not a url").is_err());
    }

    #[test]
    fn test_split_links() {
        let links = split_links("https://a/1, https://a/2\nhttps://a/3  ,,");
        assert_eq!(links, vec!["https://a/1", "https://a/2", "https://a/3"]);
    }

    #[test]
    fn test_validate_domains() {
        let mut domains = DomainsConfig::default();
        assert!(validate_domains(&domains).is_ok());
        domains.coomer = "https://coomer.su/".into();
        assert!(validate_domains(&domains).is_err());
        domains.coomer = "KEMONO.su".into();
        assert!(validate_domains(&domains).is_err());
    }

    #[test]
    fn test_validate_workers() {
        assert!(validate_workers(3).is_ok());
        assert!(validate_workers(0).is_err());
        assert!(validate_workers(64).is_err());
    }

    #[test]
    fn test_validate_timeouts() {
        let mut options = OptionsConfig::default();
        assert!(validate_timeouts(&options).is_ok());
        options.request_timeout_secs = 0;
        assert!(matches!(
            validate_timeouts(&options),
            Err(Error::ConfigValidation { field, .. }) if field == "request_timeout_secs"
        ));
    }
}
