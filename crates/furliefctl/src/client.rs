//! HTTP client for the furliefd admin API.

use anyhow::{anyhow, Context, Result};
use furlief_common::dashboard::{DashboardStats, SignupPage};
use reqwest::{Response, StatusCode};

pub struct AdminClient {
    http: reqwest::Client,
    server: String,
    token: Option<String>,
}

impl AdminClient {
    pub fn new(server: &str, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("furliefctl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            server: server.trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let token = self.token.as_deref().ok_or_else(|| {
            anyhow!("No admin token. Pass --token or set FURLIEF_ADMIN_TOKEN.")
        })?;
        let url = format!("{}{}", self.server, path);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Cannot reach furliefd at {}", self.server))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(anyhow!("Admin token rejected by {}", self.server)),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(anyhow!("{} returned {}: {}", path, status, body.trim()))
            }
            _ => Ok(response),
        }
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        Ok(self.get("/api/admin/stats", &[]).await?.json().await?)
    }

    pub async fn signups(
        &self,
        search: Option<&str>,
        status: Option<&str>,
        page: usize,
    ) -> Result<SignupPage> {
        let mut query = vec![("page", page.to_string())];
        if let Some(search) = search {
            query.push(("search", search.to_string()));
        }
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        Ok(self.get("/api/admin/signups", &query).await?.json().await?)
    }

    pub async fn export(&self) -> Result<String> {
        Ok(self.get("/api/admin/export", &[]).await?.text().await?)
    }
}
