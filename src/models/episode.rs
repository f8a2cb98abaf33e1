use serde::{Deserialize, Serialize};

use crate::entities::episodes;
use crate::watch::EpisodeFacts;

/// Catalog-owned episode record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub id: i32,
    pub show_id: i32,
    pub season: i32,
    pub number: i32,
    pub name: String,
    pub summary: Option<String>,
    pub airdate: Option<String>,
    pub airtime: Option<String>,
    pub runtime: Option<i32>,
}

impl Episode {
    /// Pair the catalog facts with a profile's watched flag for derivation.
    #[must_use]
    pub fn facts(&self, watched: bool) -> EpisodeFacts {
        EpisodeFacts {
            id: self.id,
            season: self.season,
            number: self.number,
            airdate: self.airdate.clone(),
            watched,
        }
    }
}

impl From<episodes::Model> for Episode {
    fn from(model: episodes::Model) -> Self {
        Self {
            id: model.id,
            show_id: model.show_id,
            season: model.season,
            number: model.number,
            name: model.name,
            summary: model.summary,
            airdate: model.airdate,
            airtime: model.airtime,
            runtime: model.runtime,
        }
    }
}
