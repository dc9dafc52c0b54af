//! Site and option enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two supported content platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Kemono,
    Coomer,
}

impl Site {
    /// All supported sites.
    pub const ALL: [Site; 2] = [Site::Kemono, Site::Coomer];

    /// Name of the top-level download folder for this site.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Site::Kemono => "kemono",
            Site::Coomer => "coomer",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// How post folders are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostFolderName {
    /// `{id}` (default).
    #[default]
    Id,
    /// `{id}_{sanitized title}`.
    Title,
}

impl fmt::Display for PostFolderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostFolderName::Id => write!(f, "id"),
            PostFolderName::Title => write!(f, "title"),
        }
    }
}

impl FromStr for PostFolderName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "id" => Ok(PostFolderName::Id),
            "title" => Ok(PostFolderName::Title),
            _ => Err(format!("Unknown post folder naming: {}", s)),
        }
    }
}

/// Which page-listing endpoint to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingEndpoint {
    /// `/posts?o={offset}`, returns a bare array of posts.
    #[default]
    Posts,
    /// `/posts-legacy?o={offset}`, returns `{ "results": [...] }`.
    Legacy,
}

impl fmt::Display for ListingEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingEndpoint::Posts => write!(f, "posts"),
            ListingEndpoint::Legacy => write!(f, "legacy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_folder_name_parse() {
        assert_eq!("ID".parse::<PostFolderName>().unwrap(), PostFolderName::Id);
        assert_eq!(
            "title".parse::<PostFolderName>().unwrap(),
            PostFolderName::Title
        );
        assert!("name".parse::<PostFolderName>().is_err());
    }
}
