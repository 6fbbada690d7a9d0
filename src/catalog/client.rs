use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::ServiceSettings;

use super::model::{Account, Episode, Home, Plan};

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request never produced a usable response.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// Blocking client for the podcast service. Lives on the catalog worker
/// thread; the UI thread never calls it directly.
pub struct CatalogClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_token: String,
    user_id: String,
    home_liked_limit: usize,
    home_mine_limit: usize,
}

impl CatalogClient {
    pub fn new(service: &ServiceSettings) -> Result<Self, CatalogError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(service.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: service.base_url.trim_end_matches('/').to_string(),
            api_token: service.api_token.clone(),
            user_id: service.user_id.clone(),
            home_liked_limit: service.home_liked_limit,
            home_mine_limit: service.home_mine_limit,
        })
    }

    /// The home rails: the top liked episodes plus the user's own.
    pub fn fetch_home(&self) -> Result<Home, CatalogError> {
        let most_liked = self.get(&format!(
            "/podcasts?sort=likes&limit={}",
            self.home_liked_limit
        ))?;
        let mine = self.get(&format!(
            "/podcasts?user_id={}&limit={}",
            self.user_id, self.home_mine_limit
        ))?;
        Ok(Home { most_liked, mine })
    }

    pub fn fetch_episodes(&self) -> Result<Vec<Episode>, CatalogError> {
        self.get("/podcasts")
    }

    pub fn like(&self, episode_id: &str) -> Result<Episode, CatalogError> {
        self.post(
            &format!("/podcasts/{episode_id}/like"),
            &LikeRequest {
                user_id: &self.user_id,
            },
        )
    }

    pub fn unlike(&self, episode_id: &str) -> Result<Episode, CatalogError> {
        self.post(
            &format!("/podcasts/{episode_id}/unlike"),
            &LikeRequest {
                user_id: &self.user_id,
            },
        )
    }

    /// Queue a new generation. The service debits a token and answers with
    /// a placeholder episode in `generating` state; running out of tokens
    /// comes back as an API error.
    pub fn generate(&self, prompt: &str) -> Result<Episode, CatalogError> {
        self.post(
            "/generate-podcast",
            &GenerateRequest {
                user_id: &self.user_id,
                subject: prompt,
                podcast_name: prompt,
            },
        )
    }

    pub fn fetch_account(&self) -> Result<Account, CatalogError> {
        self.get(&format!("/users/{}", self.user_id))
    }

    pub fn fetch_plans(&self) -> Result<Vec<Plan>, CatalogError> {
        let mut plans: Vec<Plan> = self.get("/plans")?;
        plans.sort_by(|a, b| a.price.total_cmp(&b.price));
        Ok(plans)
    }

    pub fn subscribe(&self, plan_id: &str) -> Result<Account, CatalogError> {
        self.post(
            &format!("/users/{}/subscribe", self.user_id),
            &SubscribeRequest { plan_id },
        )
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_token)
            .send()?;
        Self::decode(response)
    }

    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CatalogError> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_token)
            .json(body)
            .send()?;
        Self::decode(response)
    }

    fn decode<T: DeserializeOwned>(
        response: reqwest::blocking::Response,
    ) -> Result<T, CatalogError> {
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }
        Ok(response.json()?)
    }
}

#[derive(Serialize)]
struct LikeRequest<'a> {
    user_id: &'a str,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    user_id: &'a str,
    subject: &'a str,
    podcast_name: &'a str,
}

#[derive(Serialize)]
struct SubscribeRequest<'a> {
    plan_id: &'a str,
}

/// Case-insensitive substring match on episode names.
pub fn filter_episodes(episodes: &[Episode], query: &str) -> Vec<Episode> {
    let needle = query.to_lowercase();
    episodes
        .iter()
        .filter(|e| e.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
