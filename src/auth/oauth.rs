use oauth2::basic::{BasicErrorResponseType, BasicTokenType};
use oauth2::{
    AuthUrl, Client, ClientId, ClientSecret, EmptyExtraTokenFields, EndpointNotSet, EndpointSet,
    RedirectUrl, RevocationErrorResponseType, StandardErrorResponse, StandardRevocableToken,
    StandardTokenIntrospectionResponse, StandardTokenResponse, TokenUrl,
};
use serde::Deserialize;

use crate::config::Config;

/// Fully configured `OAuth2` client type (auth URI, token URI, and redirect URI all set).
pub type ConfiguredClient = Client<
    StandardErrorResponse<BasicErrorResponseType>,
    StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardTokenIntrospectionResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardRevocableToken,
    StandardErrorResponse<RevocationErrorResponseType>,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Build an `OAuth2` client for Google.
///
/// # Errors
///
/// Returns an error if the OAuth URLs are malformed.
pub fn google_client(config: &Config) -> anyhow::Result<ConfiguredClient> {
    let client = Client::new(ClientId::new(config.google_client_id.clone()))
        .set_client_secret(ClientSecret::new(config.google_client_secret.clone()))
        .set_auth_uri(AuthUrl::new(
            "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
        )?)
        .set_token_uri(TokenUrl::new(
            "https://oauth2.googleapis.com/token".to_string(),
        )?)
        .set_redirect_uri(RedirectUrl::new(config.google_redirect_uri.clone())?);
    Ok(client)
}

/// Google user info returned from the userinfo endpoint.
#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String,
    pub email: String,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Fetch user info from Google's userinfo endpoint.
///
/// # Errors
///
/// Returns an error if the HTTP request fails or the response is malformed.
pub async fn fetch_google_userinfo(access_token: &str) -> anyhow::Result<GoogleUserInfo> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;
    let resp = client
        .get("https://www.googleapis.com/oauth2/v3/userinfo")
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to fetch Google userinfo: {e}"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!(
            "Google userinfo request failed ({status}): {body}"
        ));
    }

    resp.json::<GoogleUserInfo>()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to parse Google userinfo: {e}"))
}
