//! Subreddit scrapers.
//!
//! A scraper turns a subreddit name into at most [`SEARCH_PAGE_SIZE`] recent
//! [`Post`]s. Failures are returned, not swallowed: the pipeline decides to
//! treat a failed source as empty.
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | PullPush submission search | [`pullpush`] | JSON search API, last 7 days, sorted by score |

use crate::error::ScrapeError;
use crate::models::Post;
use chrono::{DateTime, Utc};

pub mod pullpush;

/// Subreddits scanned on every run unless the settings file overrides them.
pub const SUBREDDITS: [&str; 19] = [
    "SomebodyMakeThis",
    "AppIdeas",
    "Doesthisexist",
    "lightbulb",
    "INAT",
    "software",
    "SideProject",
    "InternetIsBeautiful",
    "Startup_Ideas",
    "challengeaprogrammer",
    "androidapps",
    "IdeaHunt",
    "startups",
    "Entrepreneur",
    "WebDev",
    "opensource",
    "coding",
    "computerscience",
    "Business_Ideas",
];

/// Maximum number of posts requested (and kept) per subreddit.
pub const SEARCH_PAGE_SIZE: usize = 20;

/// How far back a scrape looks.
pub const SEARCH_WINDOW_DAYS: i64 = 7;

/// Anything that can list recent posts for a subreddit.
pub trait PostSource {
    /// Fetch posts from `subreddit` made within the window ending at `now`.
    async fn fetch_posts(
        &self,
        subreddit: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Post>, ScrapeError>;
}
