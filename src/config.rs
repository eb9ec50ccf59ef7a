use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::sources::reddit::{self, RedditCredentials, RedditOptions};
use crate::sources::twitter::chromium::BrowserOptions;
use crate::sources::twitter::{self, TwitterOptions};

/// Central configuration loaded from environment variables.
///
/// Secrets come from env vars only. A .env file is loaded at startup via
/// dotenvy. Missing credentials aren't an error here — they just disable
/// the source that needs them.
pub struct Config {
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub reddit_user_agent: String,
    pub reddit_api_url: String,
    pub reddit_auth_url: String,
    /// Browser binary for the Twitter scraper (CHROME_PATH). None = auto-detect.
    pub chrome_path: Option<PathBuf>,
    /// Set RUMOUR_HEADLESS=false to watch the browser work
    pub headless: bool,
    pub twitter_base_url: String,
    pub db_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let headless = match env::var("RUMOUR_HEADLESS").as_deref() {
            Ok("false") | Ok("0") | Ok("no") => false,
            // unset or anything else keeps headless on
            _ => true,
        };

        Ok(Self {
            reddit_client_id: env::var("REDDIT_CLIENT_ID").unwrap_or_default(),
            reddit_client_secret: env::var("REDDIT_CLIENT_SECRET").unwrap_or_default(),
            reddit_user_agent: env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| reddit::DEFAULT_USER_AGENT.to_string()),
            reddit_api_url: env::var("REDDIT_API_URL")
                .unwrap_or_else(|_| reddit::DEFAULT_API_URL.to_string()),
            reddit_auth_url: env::var("REDDIT_AUTH_URL")
                .unwrap_or_else(|_| reddit::DEFAULT_AUTH_URL.to_string()),
            chrome_path: env::var("CHROME_PATH")
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            headless,
            twitter_base_url: env::var("TWITTER_BASE_URL")
                .unwrap_or_else(|_| twitter::DEFAULT_BASE_URL.to_string()),
            db_path: env::var("RUMOUR_DB_PATH").unwrap_or_else(|_| "./rumour.db".to_string()),
        })
    }

    /// Reddit credentials, if both id and secret are set.
    pub fn reddit_credentials(&self) -> Option<RedditCredentials> {
        if self.reddit_client_id.is_empty() || self.reddit_client_secret.is_empty() {
            return None;
        }
        Some(RedditCredentials {
            client_id: self.reddit_client_id.clone(),
            client_secret: self.reddit_client_secret.clone(),
            user_agent: self.reddit_user_agent.clone(),
        })
    }

    pub fn reddit_options(&self) -> RedditOptions {
        RedditOptions {
            api_url: self.reddit_api_url.clone(),
            auth_url: self.reddit_auth_url.clone(),
            ..RedditOptions::default()
        }
    }

    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            executable: self.chrome_path.clone(),
            headless: self.headless,
            ..BrowserOptions::default()
        }
    }

    pub fn twitter_options(&self) -> TwitterOptions {
        TwitterOptions {
            base_url: self.twitter_base_url.clone(),
            ..TwitterOptions::default()
        }
    }
}
