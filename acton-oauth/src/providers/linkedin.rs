//! LinkedIn provider

use serde_json::Value;

use super::{map_identity, ProviderFlow};
use crate::error::Result;
use crate::flow::{ProviderEndpoints, TokenPlacement};
use crate::identity::Identity;

const SCOPES: &[&str] = &[
    "r_basicprofile",
    "r_fullprofile",
    "r_emailaddress",
    "r_network",
    "r_contactinfo",
    "rw_nus",
    "rw_company_admin",
    "rw_groups",
    "w_messages",
    "w_share",
];

/// LinkedIn login
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedIn;

impl ProviderFlow for LinkedIn {
    fn provider_name(&self) -> &str {
        "linkedin"
    }

    fn default_scopes(&self) -> Vec<String> {
        SCOPES.iter().map(|s| s.to_string()).collect()
    }

    fn endpoints(&self) -> ProviderEndpoints {
        ProviderEndpoints::new(
            "https://www.linkedin.com/uas/oauth2/authorization",
            "https://www.linkedin.com/uas/oauth2/accessToken",
            "https://api.linkedin.com/v1/",
        )
        .with_token_placement(TokenPlacement::QueryParameter(
            "oauth2_access_token".to_string(),
        ))
    }

    fn profile_path(&self) -> &str {
        "/people/~:(id,first-name,last-name,email-address,picture-url,public-profile-url)?format=json"
    }

    fn extract_identity(&self, raw: &Value) -> Result<Identity> {
        map_identity(
            self.provider_name(),
            raw,
            "/emailAddress",
            &[
                ("id", "/id"),
                ("firstName", "/firstName"),
                ("lastName", "/lastName"),
                ("picture", "/pictureUrl"),
                ("link", "/publicProfileUrl"),
            ],
        )
    }
}
