//! Facebook provider

use serde_json::Value;

use super::{map_identity, ProviderFlow};
use crate::error::Result;
use crate::flow::ProviderEndpoints;
use crate::identity::Identity;

const SCOPES: &[&str] = &[
    "email",
    "public_profile",
    "user_about_me",
    "user_birthday",
    "user_friends",
    "user_hometown",
    "user_likes",
    "user_location",
    "user_photos",
    "user_posts",
    "user_videos",
    "user_website",
];

/// Facebook Graph API login
#[derive(Debug, Clone, Copy, Default)]
pub struct Facebook;

impl ProviderFlow for Facebook {
    fn provider_name(&self) -> &str {
        "facebook"
    }

    fn default_scopes(&self) -> Vec<String> {
        SCOPES.iter().map(|s| s.to_string()).collect()
    }

    fn endpoints(&self) -> ProviderEndpoints {
        ProviderEndpoints::new(
            "https://www.facebook.com/dialog/oauth",
            "https://graph.facebook.com/oauth/access_token",
            "https://graph.facebook.com/",
        )
        .with_scope_separator(",")
    }

    fn profile_path(&self) -> &str {
        "/me?fields=id,first_name,last_name,picture,link,email"
    }

    fn extract_identity(&self, raw: &Value) -> Result<Identity> {
        map_identity(
            self.provider_name(),
            raw,
            "/email",
            &[
                ("id", "/id"),
                ("firstName", "/first_name"),
                ("lastName", "/last_name"),
                ("picture", "/picture/data/url"),
                ("link", "/link"),
            ],
        )
    }
}
