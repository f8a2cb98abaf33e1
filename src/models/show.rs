use serde::{Deserialize, Serialize};

use crate::entities::shows;

/// Catalog-owned show record as the rest of the system sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    pub id: i32,
    pub name: String,
    pub summary: Option<String>,
    pub status: String,
    pub premiered: Option<String>,
    pub ended: Option<String>,
    pub image_medium: Option<String>,
    pub image_original: Option<String>,
}

impl From<shows::Model> for Show {
    fn from(model: shows::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            summary: model.summary,
            status: model.status,
            premiered: model.premiered,
            ended: model.ended,
            image_medium: model.image_medium,
            image_original: model.image_original,
        }
    }
}
