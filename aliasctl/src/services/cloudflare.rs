//! Cloudflare Email Routing gateway
//!
//! Thin reqwest client over the v4 API. Responses are reduced to a value or a
//! [`GatewayFailure`]; nothing past the envelope and the few fields the
//! workflows need is interpreted.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use shared::{GatewayFailure, RuleSummary};

use crate::config::AppConfig;
use crate::error::{AliasctlError, AliasctlResult};
use crate::traits::{RuleGateway, TokenStatus};

const PER_PAGE: u32 = 50;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Standard v4 response wrapper
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    tag: Option<String>,
}

impl IdOnly {
    fn into_id(self) -> Option<String> {
        self.id.or(self.tag).filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct Rule {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    matchers: Vec<Matcher>,
}

#[derive(Debug, Deserialize)]
struct Matcher {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

impl Rule {
    /// Address of a literal `to` matcher, if the rule has one
    fn literal_address(&self) -> Option<&str> {
        self.matchers
            .iter()
            .find(|m| m.kind == "literal" && m.field.as_deref().is_none_or(|f| f == "to"))
            .and_then(|m| m.value.as_deref())
    }
}

/// Production gateway talking to the Cloudflare API
pub struct RealRuleGateway {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl RealRuleGateway {
    /// Client for the configured API base. A missing token is only
    /// reported by the provider once a request is made.
    pub fn new(config: &AppConfig) -> AliasctlResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("aliasctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AliasctlError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            token: config.api_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.api_base, path.trim_start_matches('/'));
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send, classify the status, and unwrap the envelope
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Envelope<T>, GatewayFailure> {
        let response = builder.send().await.map_err(network_failure)?;
        let status = response.status();
        let body = response.text().await.map_err(network_failure)?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("request failed").to_string()
            });
            return Err(GatewayFailure::from_status(status.as_u16(), message));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| GatewayFailure::InvalidResponse(format!("unexpected body: {e}")))?;
        if !envelope.success {
            let message = envelope
                .errors
                .first()
                .map(describe)
                .unwrap_or_else(|| "success=false without errors".to_string());
            return Err(GatewayFailure::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(envelope)
    }
}

fn network_failure(error: reqwest::Error) -> GatewayFailure {
    if error.is_decode() {
        GatewayFailure::InvalidResponse(error.to_string())
    } else {
        GatewayFailure::Network(error.to_string())
    }
}

fn describe(message: &ApiMessage) -> String {
    match message.code {
        Some(code) => format!("{} (code {})", message.message, code),
        None => message.message.clone(),
    }
}

/// First `errors[].message` of an error body, if it has one
fn error_message(body: &str) -> Option<String> {
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(body).ok()?;
    envelope.errors.first().map(describe).filter(|m| !m.is_empty())
}

#[async_trait]
impl RuleGateway for RealRuleGateway {
    async fn verify_token(&self) -> Result<TokenStatus, GatewayFailure> {
        let envelope: Envelope<TokenInfo> = self.send(self.request(Method::GET, "user/tokens/verify")).await?;
        let info = envelope
            .result
            .ok_or_else(|| GatewayFailure::InvalidResponse("token verification returned no result".to_string()))?;
        Ok(TokenStatus {
            id: info.id,
            status: info.status,
        })
    }

    async fn resolve_zone(&self, domain: &str) -> Result<String, GatewayFailure> {
        let builder = self.request(Method::GET, "zones").query(&[("name", domain)]);
        let envelope: Envelope<Vec<Zone>> = self.send(builder).await?;
        envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|zone| zone.id)
            .ok_or_else(|| GatewayFailure::Rejected {
                status: 404,
                message: format!("no zone named {domain} is visible to this token"),
            })
    }

    async fn create_rule(&self, zone_id: &str, address: &str, destination: &str) -> Result<String, GatewayFailure> {
        let body = json!({
            "actions": [{ "type": "forward", "value": [destination] }],
            "matchers": [{ "type": "literal", "field": "to", "value": address }],
            "enabled": true,
            "name": format!("Forward {address}"),
        });
        let builder = self
            .request(Method::POST, &format!("zones/{zone_id}/email/routing/rules"))
            .json(&body);
        let envelope: Envelope<IdOnly> = self.send(builder).await?;
        envelope
            .result
            .and_then(IdOnly::into_id)
            .ok_or_else(|| GatewayFailure::InvalidResponse(format!("no rule id returned for {address}")))
    }

    async fn list_rules(&self, zone_id: &str, domain: &str) -> Result<Vec<RuleSummary>, GatewayFailure> {
        let suffix = format!("@{}", domain.to_lowercase());
        let mut rules = Vec::new();
        let mut page = 1;

        loop {
            let builder = self
                .request(Method::GET, &format!("zones/{zone_id}/email/routing/rules"))
                .query(&[("page", page), ("per_page", PER_PAGE)]);
            let envelope: Envelope<Vec<Rule>> = self.send(builder).await?;
            let total_pages = envelope.result_info.and_then(|info| info.total_pages).unwrap_or(1);
            let batch = envelope.result.unwrap_or_default();
            let fetched = batch.len();

            for rule in batch {
                let Some(address) = rule.literal_address().map(str::to_string) else {
                    continue;
                };
                if !address.to_lowercase().ends_with(&suffix) {
                    continue;
                }
                let Some(rule_id) = rule.id.clone().or_else(|| rule.tag.clone()) else {
                    continue;
                };
                rules.push(RuleSummary {
                    rule_id,
                    address,
                    enabled: rule.enabled,
                });
            }

            if page >= total_pages || fetched == 0 {
                break;
            }
            page += 1;
        }

        tracing::debug!("listed {} rules for {} across {} page(s)", rules.len(), domain, page);
        Ok(rules)
    }

    async fn delete_rule(&self, zone_id: &str, rule_id: &str) -> Result<(), GatewayFailure> {
        let builder = self.request(Method::DELETE, &format!("zones/{zone_id}/email/routing/rules/{rule_id}"));
        let _: Envelope<serde_json::Value> = self.send(builder).await?;
        Ok(())
    }
}
