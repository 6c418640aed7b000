use anyhow::Result;
use log::debug;
use reqwest::{
    Client, Url,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use crate::http::HttpClient;
use crate::runtime::Runtime;

pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

const USER_AGENT: &str = concat!("electron-installer/", env!("ELECTRON_INSTALLER_VERSION"));

/// Host that receives `GITHUB_TOKEN`. Nothing else ever sees it.
const GITHUB_API_HOST: &str = "api.github.com";

/// Plain client for artifact downloads. Never authenticated, since the CDN
/// can point at any mirror.
pub fn http_client() -> Result<HttpClient> {
    build(HeaderMap::new())
}

/// Client for the release listing at `releases_url`.
///
/// `GITHUB_TOKEN`, when set, is sent as a bearer token, but only to the GitHub API.
pub fn release_client<R: Runtime>(runtime: &R, releases_url: &str) -> Result<HttpClient> {
    build(release_headers(runtime, releases_url)?)
}

fn release_headers<R: Runtime>(runtime: &R, releases_url: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let Ok(token) = runtime.env_var(ENV_GITHUB_TOKEN) else {
        return Ok(headers);
    };
    if token.is_empty() {
        return Ok(headers);
    }

    if is_github_api(releases_url) {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        debug!("Using GITHUB_TOKEN for authentication: {}", mask(&token));
    } else {
        debug!("Not sending GITHUB_TOKEN to {}", releases_url);
    }
    Ok(headers)
}

fn build(headers: HeaderMap) -> Result<HttpClient> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()?;

    Ok(HttpClient::new(client))
}

fn is_github_api(url: &str) -> bool {
    Url::parse(url).is_ok_and(|u| u.scheme() == "https" && u.host_str() == Some(GITHUB_API_HOST))
}

fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 12 {
        return "*********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
