//! Built-in tools selectable through the `TOOLS` setting.
//!
//! These implement the tool contracts only. The wallet tool reports a fixed
//! account, the identity tool reports the local agent, and the email and
//! storefront tools always answer with an authorization-required payload
//! pointing at the consent flow. Real integrations plug in through the same
//! [`Tool`] trait.
//!
//! ```rust
//! use parley::tools::builtin::{toolkit, BuiltinSettings};
//!
//! let kit = toolkit(&BuiltinSettings::default()).unwrap();
//! assert!(kit.contains_key("wallet"));
//! ```

use std::sync::Arc;

use reqwest::Url;

use crate::error::ParleyError;
use crate::tools::catalog::Toolkit;
use crate::tools::tool::{AgentTool, Tool, ToolExecutionContext};
use crate::tools::types::{
    ActionMetadata, AgentToolParameters, AuthorizationRequired, HumanAction, ToolErrorDetail,
};

const WALLET_ACCOUNT_ID: &str = "0x0963A5b35DeCb483173dFaFdeB035510847Cd416";
const WALLET_BALANCE: &str = "10 usdc";
/// Storefront used until stores are looked up per user.
const SHOPIFY_STORE: &str = "tesser-test";
const SHOPIFY_LOGO: &str = "https://cdn.shopify.com/shopifycloud/brochure/assets/brand-assets/shopify-logo-shopping-bag-full-color-66166b2e55d67988b56b4bd28b63c271e2b9713358cb723070a92bde17ad7d63.svg";

/// Settings the built-in tools need to render their payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinSettings {
    /// Base URL of the consent service; the provider name is appended as a path segment.
    pub auth_endpoint: String,
    /// Where the consent service sends the user afterwards.
    pub auth_redirect_url: String,
}

impl Default for BuiltinSettings {
    fn default() -> Self {
        Self {
            auth_endpoint: "http://localhost:3000/".to_string(),
            auth_redirect_url: "http://localhost:3000/".to_string(),
        }
    }
}

/// All built-in tools keyed by their configuration name.
pub fn toolkit(settings: &BuiltinSettings) -> Result<Toolkit, ParleyError> {
    let mut kit = Toolkit::new();
    kit.insert("wallet".to_string(), wallet_tool());
    kit.insert("gmail".to_string(), email_tool(settings)?);
    kit.insert("shopify".to_string(), shopify_tool(settings)?);
    kit.insert("did".to_string(), identity_tool());
    Ok(kit)
}

/// Build the consent URL for `provider`, carrying the requesting agent's did.
pub fn authorization_url(
    settings: &BuiltinSettings,
    provider: &str,
    resource: Option<&str>,
    agent_did: &str,
) -> Result<Url, ParleyError> {
    let base = Url::parse(&settings.auth_endpoint).map_err(|e| {
        ParleyError::Configuration(format!("invalid AUTH_ENDPOINT '{}': {e}", settings.auth_endpoint))
    })?;
    let mut url = base.join(provider).map_err(|e| {
        ParleyError::Configuration(format!("cannot build consent URL for '{provider}': {e}"))
    })?;
    {
        let mut query = url.query_pairs_mut();
        if let Some(resource) = resource {
            query.append_pair("resource", resource);
        }
        query.append_pair("redirectUrl", &settings.auth_redirect_url);
        query.append_pair("udid", agent_did);
    }
    Ok(url)
}

/// Create the `wallet` tool: reports the agent's wallet account and balance.
pub fn wallet_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        "wallet",
        "Interact with the agent's wallet. Use it to query the agent's account balance.",
        AgentToolParameters::empty(),
        |_args, _ctx: ToolExecutionContext| async move {
            Ok(serde_json::json!({
                "wallet_account": {
                    "id": WALLET_ACCOUNT_ID,
                    "balance": WALLET_BALANCE,
                }
            }))
        },
    ))
}

/// Create the `get_email_tool` tool.
///
/// Mail access always needs the user's consent first, so the tool answers
/// with an [`AuthorizationRequired`] payload. The consent base URL is
/// validated here so a bad setting fails at startup.
pub fn email_tool(settings: &BuiltinSettings) -> Result<Arc<dyn Tool>, ParleyError> {
    authorization_url(settings, "google", None, "")?;
    let settings = settings.clone();

    Ok(Arc::new(AgentTool::new(
        "get_email_tool",
        "Fetch the user's email from gmail. If the result has an error field, return the result as it is to the user.",
        AgentToolParameters::object()
            .integer("limit", "Maximum number of emails to fetch", false)
            .build(),
        move |_args, ctx: ToolExecutionContext| {
            let settings = settings.clone();
            async move {
                let did = ctx.agent.did.clone().unwrap_or_default();
                let url = authorization_url(&settings, "google", Some("gmail"), &did)?;
                let payload = AuthorizationRequired {
                    human_action: HumanAction {
                        url: url.to_string(),
                        metadata: ActionMetadata {
                            name: "google".into(),
                            title: "Connect your Gmail account".into(),
                            description: "Allow the agent to read your email".into(),
                            btn_text: Some("Login with Google".into()),
                            logo: None,
                        },
                    },
                    error: ToolErrorDetail {
                        code: 403,
                        message: "User is not authorized to get emails".into(),
                    },
                };
                Ok(serde_json::to_value(payload)?)
            }
        },
    )))
}

/// Create the `get_shopify_products` tool.
///
/// Like the email tool, store access needs consent first, so the answer is
/// always an [`AuthorizationRequired`] payload for the configured store.
pub fn shopify_tool(settings: &BuiltinSettings) -> Result<Arc<dyn Tool>, ParleyError> {
    authorization_url(settings, "shopify", Some(SHOPIFY_STORE), "")?;
    let settings = settings.clone();

    Ok(Arc::new(AgentTool::new(
        "get_shopify_products",
        "This tool is used to fetch the user's products from their Shopify store.",
        AgentToolParameters::object()
            .integer("limit", "Maximum number of products to fetch", false)
            .build(),
        move |_args, ctx: ToolExecutionContext| {
            let settings = settings.clone();
            async move {
                let did = ctx.agent.did.clone().unwrap_or_default();
                let url = authorization_url(&settings, "shopify", Some(SHOPIFY_STORE), &did)?;
                let payload = AuthorizationRequired {
                    human_action: HumanAction {
                        url: url.to_string(),
                        metadata: ActionMetadata {
                            name: "shopify".into(),
                            title: "Login to your Shopify Store".into(),
                            description:
                                "login to your Shopify Store to allow access to your store information"
                                    .into(),
                            btn_text: Some("Login to Shopify".into()),
                            logo: Some(SHOPIFY_LOGO.into()),
                        },
                    },
                    error: ToolErrorDetail {
                        code: 401,
                        message: "User is not authorized to access the store".into(),
                    },
                };
                Ok(serde_json::to_value(payload)?)
            }
        },
    )))
}

/// Create the `authenticate` tool: reports who this agent is.
pub fn identity_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        "authenticate",
        "Verify the identity of the AI assistant agent. Use it when asked who or what the assistant is; it returns the agent's identity information to present to the user.",
        AgentToolParameters::empty(),
        |_args, ctx: ToolExecutionContext| async move {
            Ok(serde_json::json!({
                "did": ctx.agent.did,
                "name": ctx.agent.name,
            }))
        },
    ))
}
