use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clients::tvmaze::TvMazeClient;
use crate::db::Store;
use crate::services::error::{ServiceError, ServiceResult};

pub const EXPORT_VERSION: u32 = 1;

/// Persisted export/import document. Field names are part of the wire
/// contract and round-trip bit-exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: u32,
    pub exported_at: String,
    pub shows: Vec<ExportShow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportShow {
    pub catalog_show_id: i32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<String>,
    #[serde(default)]
    pub watched_episodes: Vec<ExportMark>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMark {
    pub catalog_episode_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub shows: usize,
    pub watched_episodes: usize,
    pub skipped_shows: usize,
    pub skipped_episodes: usize,
}

/// Accepted import shapes: the full document, a bare array of catalog show
/// ids, or a newline-delimited id list.
#[derive(Debug)]
enum ImportPayload {
    Document(ExportDocument),
    Ids(Vec<i32>),
}

#[derive(Clone)]
pub struct TransferService {
    store: Store,
    tvmaze: Arc<TvMazeClient>,
}

impl TransferService {
    #[must_use]
    pub const fn new(store: Store, tvmaze: Arc<TvMazeClient>) -> Self {
        Self { store, tvmaze }
    }

    /// Snapshot a profile's subscriptions and marks. Ordering is by catalog
    /// id throughout so repeated exports of the same data are identical.
    pub async fn export(&self, profile_id: i32) -> ServiceResult<ExportDocument> {
        let links = self.store.links_for_profile(profile_id).await?;
        let show_ids: Vec<i32> = links.iter().map(|l| l.show_id).collect();
        let shows = self.store.get_shows_by_ids(&show_ids).await?;
        let name_of: std::collections::HashMap<i32, String> =
            shows.into_iter().map(|s| (s.id, s.name)).collect();

        let mut export_shows = Vec::with_capacity(links.len());
        for link in links {
            let episodes = self.store.episodes_for_show(link.show_id).await?;
            let episode_ids: Vec<i32> = episodes.iter().map(|e| e.id).collect();
            let marks = self
                .store
                .watch_marks_for_episodes(profile_id, &episode_ids)
                .await?;

            export_shows.push(ExportShow {
                catalog_show_id: link.show_id,
                name: name_of.get(&link.show_id).cloned().unwrap_or_default(),
                added_at: Some(link.added_at),
                watched_episodes: marks
                    .into_iter()
                    .map(|m| ExportMark {
                        catalog_episode_id: m.episode_id,
                        watched_at: Some(m.watched_at),
                    })
                    .collect(),
            });
        }

        Ok(ExportDocument {
            version: EXPORT_VERSION,
            exported_at: chrono::Utc::now().to_rfc3339(),
            shows: export_shows,
        })
    }

    /// Import into a profile. Unknown shows are fetched from the catalog;
    /// one show's lookup failure skips that show and the import continues.
    pub async fn import(&self, profile_id: i32, input: &str) -> ServiceResult<ImportSummary> {
        let shows = match parse_payload(input)? {
            ImportPayload::Document(doc) => doc.shows,
            ImportPayload::Ids(ids) => ids
                .into_iter()
                .map(|id| ExportShow {
                    catalog_show_id: id,
                    name: String::new(),
                    added_at: None,
                    watched_episodes: Vec::new(),
                })
                .collect(),
        };

        let mut summary = ImportSummary::default();

        for entry in shows {
            let show_id = entry.catalog_show_id;

            if self.store.get_show(show_id).await?.is_none() {
                match self.tvmaze.get_show_with_episodes(show_id).await {
                    Ok(Some((show, episodes))) => {
                        self.store.upsert_show(&show).await?;
                        self.store.upsert_episodes(&episodes).await?;
                    }
                    Ok(None) => {
                        warn!("Import: show {} not found in catalog, skipping", show_id);
                        summary.skipped_shows += 1;
                        continue;
                    }
                    Err(e) => {
                        warn!("Import: catalog lookup failed for {}: {}", show_id, e);
                        summary.skipped_shows += 1;
                        continue;
                    }
                }
            }

            self.store
                .add_link(profile_id, show_id, entry.added_at.clone())
                .await?;
            summary.shows += 1;

            if entry.watched_episodes.is_empty() {
                continue;
            }

            // Marks may reference episodes the catalog no longer lists.
            let known: HashSet<i32> = self
                .store
                .episodes_for_show(show_id)
                .await?
                .into_iter()
                .map(|e| e.id)
                .collect();

            for mark in entry.watched_episodes {
                if !known.contains(&mark.catalog_episode_id) {
                    summary.skipped_episodes += 1;
                    continue;
                }
                let watched_at = mark
                    .watched_at
                    .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
                self.store
                    .upsert_watch_mark(profile_id, mark.catalog_episode_id, &watched_at)
                    .await?;
                summary.watched_episodes += 1;
            }
        }

        Ok(summary)
    }
}

fn parse_payload(input: &str) -> ServiceResult<ImportPayload> {
    if let Ok(doc) = serde_json::from_str::<ExportDocument>(input) {
        if doc.version != EXPORT_VERSION {
            return Err(ServiceError::validation(format!(
                "Unsupported export version {}",
                doc.version
            )));
        }
        return Ok(ImportPayload::Document(doc));
    }

    if let Ok(ids) = serde_json::from_str::<Vec<i32>>(input) {
        return Ok(ImportPayload::Ids(ids));
    }

    let mut ids = Vec::new();
    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let id: i32 = line.parse().map_err(|_| {
            ServiceError::validation(format!("Unrecognized import line: '{line}'"))
        })?;
        ids.push(id);
    }

    if ids.is_empty() {
        return Err(ServiceError::validation(
            "Import payload is empty or unrecognized",
        ));
    }

    Ok(ImportPayload::Ids(ids))
}
