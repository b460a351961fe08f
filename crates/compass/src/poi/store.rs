use chrono::{DateTime, SecondsFormat, Utc};

use super::{Poi, PoiDraft, seed_pois};
use crate::error::NavError;

/// Ordered, append-only collection of POIs for one session.
#[derive(Debug, Clone, Default)]
pub struct PoiStore {
    pois: Vec<Poi>,
}

impl PoiStore {
    pub fn new(pois: Vec<Poi>) -> Self {
        Self { pois }
    }

    pub fn seeded() -> Self {
        Self::new(seed_pois())
    }

    pub fn all(&self) -> &[Poi] {
        &self.pois
    }

    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn get(&self, id: &str) -> Option<&Poi> {
        self.pois.iter().find(|p| p.id == id)
    }

    /// Look a POI up by id first, then by case-insensitive exact name.
    pub fn find(&self, id_or_name: &str) -> Option<&Poi> {
        self.get(id_or_name).or_else(|| {
            let wanted = id_or_name.trim().to_lowercase();
            self.pois.iter().find(|p| p.name.to_lowercase() == wanted)
        })
    }

    /// Validate a draft and append it as a new POI stamped with the current time.
    pub fn add(&mut self, draft: &PoiDraft) -> Result<&Poi, NavError> {
        self.add_at(draft, Utc::now())
    }

    pub fn add_at(&mut self, draft: &PoiDraft, now: DateTime<Utc>) -> Result<&Poi, NavError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(NavError::MalformedPoiInput("Name is required".to_string()));
        }
        let location = draft.location.ok_or_else(|| {
            NavError::MalformedPoiInput("Pick a location on the map first".to_string())
        })?;

        let id = self.unique_id(now);
        tracing::debug!(%id, name, category = %draft.category, "adding point of interest");
        self.pois.push(Poi {
            id,
            name: name.to_string(),
            category: draft.category,
            coordinates: location,
            description: draft.description.trim().to_string(),
            is_accessible: false,
            is_essential: false,
            hours: None,
            floor: None,
        });
        Ok(&self.pois[self.pois.len() - 1])
    }

    fn unique_id(&self, now: DateTime<Utc>) -> String {
        let base = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        if self.get(&base).is_none() {
            return base;
        }
        (1..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| self.get(candidate).is_none())
            .unwrap_or(base)
    }
}
