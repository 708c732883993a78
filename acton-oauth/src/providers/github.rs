//! GitHub provider

use http::{header, HeaderValue};
use serde_json::Value;

use super::{map_identity, ProviderFlow};
use crate::error::Result;
use crate::flow::{ProviderEndpoints, TokenPlacement};
use crate::identity::Identity;

const SCOPES: &[&str] = &[
    "user",
    "user:email",
    "user:follow",
    "public_repo",
    "repo",
    "repo_deployment",
    "repo:status",
    "delete_repo",
    "notifications",
    "gist",
    "read:repo_hook",
    "write:repo_hook",
    "admin:repo_hook",
    "read:org",
    "write:org",
    "admin:org",
    "read:public_key",
    "write:public_key",
    "admin:public_key",
];

/// GitHub login
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHub;

impl ProviderFlow for GitHub {
    fn provider_name(&self) -> &str {
        "github"
    }

    fn default_scopes(&self) -> Vec<String> {
        SCOPES.iter().map(|s| s.to_string()).collect()
    }

    fn endpoints(&self) -> ProviderEndpoints {
        ProviderEndpoints::new(
            "https://github.com/login/oauth/authorize",
            "https://github.com/login/oauth/access_token",
            "https://api.github.com/",
        )
        .with_scope_separator(",")
        .with_token_placement(TokenPlacement::AuthorizationScheme("token".to_string()))
        .with_header(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        )
        // GitHub rejects API calls without one
        .with_header(header::USER_AGENT, HeaderValue::from_static("acton-oauth"))
    }

    fn profile_path(&self) -> &str {
        "user"
    }

    fn extract_identity(&self, raw: &Value) -> Result<Identity> {
        // GitHub only has a single display name
        map_identity(
            self.provider_name(),
            raw,
            "/email",
            &[
                ("id", "/id"),
                ("firstName", "/name"),
                ("lastName", "/name"),
                ("picture", "/avatar_url"),
                ("link", "/html_url"),
            ],
        )
    }
}
