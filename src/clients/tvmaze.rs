use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;

use crate::models::episode::Episode;
use crate::models::show::Show;

const TVMAZE_API: &str = "https://api.tvmaze.com";

#[derive(Debug, Deserialize)]
pub struct TvMazeImage {
    pub medium: Option<String>,
    pub original: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TvMazeShow {
    pub id: i32,
    pub name: String,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub premiered: Option<String>,
    pub ended: Option<String>,
    pub image: Option<TvMazeImage>,
    #[serde(rename = "_embedded")]
    pub embedded: Option<TvMazeEmbedded>,
}

#[derive(Debug, Deserialize)]
pub struct TvMazeEmbedded {
    pub episodes: Option<Vec<TvMazeEpisode>>,
}

#[derive(Debug, Deserialize)]
pub struct TvMazeEpisode {
    pub id: i32,
    pub season: i32,
    pub number: Option<i32>,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub airdate: Option<String>,
    pub airtime: Option<String>,
    pub runtime: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    show: TvMazeShow,
}

impl TvMazeShow {
    /// Flatten into the domain model. TVmaze sends empty strings where it
    /// has no date yet; those normalize to `None`.
    #[must_use]
    pub fn into_show(self) -> Show {
        Show {
            id: self.id,
            name: self.name,
            summary: self.summary,
            status: self.status.unwrap_or_default(),
            premiered: none_if_empty(self.premiered),
            ended: none_if_empty(self.ended),
            image_medium: self.image.as_ref().and_then(|i| i.medium.clone()),
            image_original: self.image.and_then(|i| i.original),
        }
    }
}

impl TvMazeEpisode {
    #[must_use]
    pub fn into_episode(self, show_id: i32) -> Episode {
        Episode {
            id: self.id,
            show_id,
            season: self.season,
            number: self.number.unwrap_or(0),
            name: self.name.unwrap_or_default(),
            summary: self.summary,
            airdate: none_if_empty(self.airdate),
            airtime: none_if_empty(self.airtime),
            runtime: self.runtime,
        }
    }
}

fn none_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[derive(Clone)]
pub struct TvMazeClient {
    client: Client,
    base_url: String,
}

impl Default for TvMazeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TvMazeClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: TVMAZE_API.to_string(),
        }
    }

    #[must_use]
    pub fn with_shared_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a show with its full episode list embedded.
    pub async fn get_show_with_episodes(
        &self,
        id: i32,
    ) -> Result<Option<(Show, Vec<Episode>)>> {
        let url = format!("{}/shows/{}?embed=episodes", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("TVmaze API error: {} - {}", status, body));
        }

        let mut raw: TvMazeShow = response.json().await?;
        let episodes = raw
            .embedded
            .take()
            .and_then(|e| e.episodes)
            .unwrap_or_default();

        let show = raw.into_show();
        let show_id = show.id;
        let episodes = episodes
            .into_iter()
            .map(|e| e.into_episode(show_id))
            .collect();

        Ok(Some((show, episodes)))
    }

    pub async fn search_shows(&self, query: &str) -> Result<Vec<Show>> {
        let url = format!("{}/search/shows", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("TVmaze API error: {} - {}", status, body));
        }

        let hits: Vec<SearchHit> = response.json().await?;
        Ok(hits.into_iter().map(|h| h.show.into_show()).collect())
    }
}
