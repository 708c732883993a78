//! Google provider

use serde_json::Value;

use super::{map_identity, ProviderFlow};
use crate::error::Result;
use crate::flow::ProviderEndpoints;
use crate::identity::Identity;

/// Scopes requested when none are configured
///
/// More scopes are listed in the Google OAuth 2.0 Playground.
const SCOPES: &[&str] = &[
    // Basic
    "email",
    "profile",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
    // Google+
    "https://www.googleapis.com/auth/plus.me",
    "https://www.googleapis.com/auth/plus.login",
    // Drive
    "https://docs.google.com/feeds/",
    "https://spreadsheets.google.com/feeds/",
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/drive.appdata",
    "https://www.googleapis.com/auth/drive.apps.readonly",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/drive.metadata.readonly",
    "https://www.googleapis.com/auth/drive.readonly",
    "https://www.googleapis.com/auth/drive.scripts",
    // Ads
    "https://www.googleapis.com/auth/adsense",
    "https://adwords.google.com/api/adwords/",
    "https://www.googleapis.com/auth/gan",
    // Analytics
    "https://www.googleapis.com/auth/analytics",
    "https://www.googleapis.com/auth/analytics.edit",
    "https://www.googleapis.com/auth/analytics.manage.users",
    "https://www.googleapis.com/auth/analytics.readonly",
    // Other services
    "https://www.googleapis.com/auth/books",
    "https://www.googleapis.com/auth/blogger",
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/calendar.readonly",
    "https://www.google.com/m8/feeds/",
    "https://www.googleapis.com/auth/chromewebstore.readonly",
    "https://mail.google.com/mail/feed/atom",
    "https://picasaweb.google.com/data/",
    "https://sites.google.com/feeds/",
    "https://www.googleapis.com/auth/urlshortener",
    "https://www.google.com/webmasters/tools/feeds/",
    "https://www.googleapis.com/auth/tasks",
    // Cloud
    "https://www.googleapis.com/auth/devstorage.read_write",
    "https://www.googleapis.com/auth/structuredcontent",
    "https://apps-apis.google.com/a/feeds/user/",
    "https://apps-apis.google.com/a/feeds/groups/",
    "https://apps-apis.google.com/a/feeds/alias/",
    // Legacy
    "https://www.googleapis.com/auth/orkut",
    "https://www.googleapis.com/auth/latitude.all.best",
    "https://www.googleapis.com/auth/latitude.all.city",
    "openid",
    // YouTube
    "https://gdata.youtube.com",
    "https://www.googleapis.com/auth/yt-analytics-monetary.readonly",
    "https://www.googleapis.com/auth/yt-analytics.readonly",
    "https://www.googleapis.com/auth/youtube",
    "https://www.googleapis.com/auth/youtube.readonly",
    "https://www.googleapis.com/auth/youtube.upload",
    "https://www.googleapis.com/auth/youtubepartner",
    "https://www.googleapis.com/auth/youtubepartner-channel-audit",
    // Glass
    "https://www.googleapis.com/auth/glass.timeline",
    "https://www.googleapis.com/auth/glass.location",
    // Android
    "https://www.googleapis.com/auth/androidpublisher",
];

/// Google account login
#[derive(Debug, Clone, Copy, Default)]
pub struct Google;

impl ProviderFlow for Google {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn default_scopes(&self) -> Vec<String> {
        SCOPES.iter().map(|s| s.to_string()).collect()
    }

    fn endpoints(&self) -> ProviderEndpoints {
        ProviderEndpoints::new(
            "https://accounts.google.com/o/oauth2/auth",
            "https://accounts.google.com/o/oauth2/token",
            "https://www.googleapis.com/oauth2/v1/",
        )
    }

    fn profile_path(&self) -> &str {
        "https://www.googleapis.com/oauth2/v1/userinfo"
    }

    fn extract_identity(&self, raw: &Value) -> Result<Identity> {
        map_identity(
            self.provider_name(),
            raw,
            "/email",
            &[
                ("id", "/id"),
                ("firstName", "/given_name"),
                ("lastName", "/family_name"),
                ("picture", "/picture"),
                ("link", "/link"),
            ],
        )
    }
}
