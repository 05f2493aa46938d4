//! Person records - the unit of persistence
//!
//! A [`PersonPayload`] is the raw `people/<id>/` resource as served by SWAPI.
//! Relation fields there are URLs. A [`Person`] is the flattened record that
//! gets stored: the same scalars plus every relation resolved to display names.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Related-resource fields carried by a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Single planet URL
    Homeworld,
    Films,
    Species,
    Starships,
    Vehicles,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Homeworld => "homeworld",
            Relation::Films => "films",
            Relation::Species => "species",
            Relation::Starships => "starships",
            Relation::Vehicles => "vehicles",
        }
    }

    pub fn all() -> &'static [Relation] {
        &[
            Relation::Homeworld,
            Relation::Films,
            Relation::Species,
            Relation::Starships,
            Relation::Vehicles,
        ]
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A person resource exactly as the API returns it.
///
/// Unknown fields (`created`, `edited`, ...) are ignored. List relations may be
/// missing or `null`; both read as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonPayload {
    /// Self link, e.g. `https://swapi.dev/api/people/42/`
    pub url: String,
    pub name: String,
    pub birth_year: Option<String>,
    pub eye_color: Option<String>,
    pub gender: Option<String>,
    pub hair_color: Option<String>,
    pub height: Option<String>,
    pub mass: Option<String>,
    pub skin_color: Option<String>,
    pub homeworld: Option<String>,
    pub films: Option<Vec<String>>,
    pub species: Option<Vec<String>>,
    pub starships: Option<Vec<String>>,
    pub vehicles: Option<Vec<String>>,
}

impl PersonPayload {
    /// URLs referenced by a relation, in the order the API lists them.
    ///
    /// An empty homeworld string counts as absent.
    pub fn references(&self, relation: Relation) -> Vec<String> {
        let list = match relation {
            Relation::Homeworld => {
                return self
                    .homeworld
                    .iter()
                    .filter(|url| !url.is_empty())
                    .cloned()
                    .collect();
            }
            Relation::Films => &self.films,
            Relation::Species => &self.species,
            Relation::Starships => &self.starships,
            Relation::Vehicles => &self.vehicles,
        };
        list.clone().unwrap_or_default()
    }
}

/// Relation fields after name resolution. Each is a `", "`-joined list of
/// names, or empty when the person had no reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRelations {
    pub homeworld: String,
    pub films: String,
    pub species: String,
    pub starships: String,
    pub vehicles: String,
}

/// A flattened person, ready for a single insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Trailing path segment of the person's self link
    pub id: u32,
    pub name: String,
    pub birth_year: Option<String>,
    pub eye_color: Option<String>,
    pub gender: Option<String>,
    pub hair_color: Option<String>,
    pub height: Option<String>,
    pub mass: Option<String>,
    pub skin_color: Option<String>,
    pub homeworld: String,
    pub films: String,
    pub species: String,
    pub starships: String,
    pub vehicles: String,
}

impl Person {
    /// Build a record from the raw payload and its resolved relation names.
    ///
    /// The id comes from the payload's own `url`, not from the id that was
    /// requested.
    pub fn from_payload(payload: PersonPayload, relations: ResolvedRelations) -> Result<Self> {
        Ok(Self {
            id: id_from_url(&payload.url)?,
            name: payload.name,
            birth_year: payload.birth_year,
            eye_color: payload.eye_color,
            gender: payload.gender,
            hair_color: payload.hair_color,
            height: payload.height,
            mass: payload.mass,
            skin_color: payload.skin_color,
            homeworld: relations.homeworld,
            films: relations.films,
            species: relations.species,
            starships: relations.starships,
            vehicles: relations.vehicles,
        })
    }

    /// Minimal record with every optional field empty. Mostly for tests and fixtures.
    pub fn named(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            birth_year: None,
            eye_color: None,
            gender: None,
            hair_color: None,
            height: None,
            mass: None,
            skin_color: None,
            homeworld: String::new(),
            films: String::new(),
            species: String::new(),
            starships: String::new(),
            vehicles: String::new(),
        }
    }
}

/// Extract the numeric id from a resource URL such as `.../people/42/`.
pub fn id_from_url(url: &str) -> Result<u32> {
    let segment = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    segment
        .parse()
        .map_err(|_| Error::InvalidUrl(format!("no numeric id at the end of {}", url)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_url() {
        assert_eq!(id_from_url("https://swapi.dev/api/people/42/").unwrap(), 42);
        assert_eq!(id_from_url("https://swapi.dev/api/people/7").unwrap(), 7);
        assert_eq!(id_from_url("people/1//").unwrap(), 1);
    }

    #[test]
    fn test_id_from_invalid_url() {
        assert!(id_from_url("https://swapi.dev/api/people/").is_err());
        assert!(id_from_url("").is_err());
        assert!(id_from_url("https://swapi.dev/api/people/abc/").is_err());
    }

    #[test]
    fn test_payload_tolerates_missing_and_null_relations() {
        let payload: PersonPayload = serde_json::from_value(serde_json::json!({
            "url": "https://swapi.dev/api/people/3/",
            "name": "R2-D2",
            "height": "96",
            "homeworld": null,
            "films": null,
            "created": "2014-12-10T15:11:50.376000Z"
        }))
        .unwrap();

        assert_eq!(payload.height.as_deref(), Some("96"));
        assert!(payload.mass.is_none());
        for relation in Relation::all() {
            assert!(payload.references(*relation).is_empty(), "{} should be empty", relation);
        }
    }

    #[test]
    fn test_payload_requires_name() {
        let parsed = serde_json::from_value::<PersonPayload>(serde_json::json!({
            "url": "https://swapi.dev/api/people/3/"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_references_preserve_order() {
        let payload = PersonPayload {
            url: "https://swapi.dev/api/people/1/".into(),
            name: "Luke Skywalker".into(),
            homeworld: Some("https://swapi.dev/api/planets/1/".into()),
            films: Some(vec![
                "https://swapi.dev/api/films/2/".into(),
                "https://swapi.dev/api/films/1/".into(),
            ]),
            ..Default::default()
        };

        assert_eq!(
            payload.references(Relation::Homeworld),
            vec!["https://swapi.dev/api/planets/1/".to_string()]
        );
        assert_eq!(
            payload.references(Relation::Films),
            vec![
                "https://swapi.dev/api/films/2/".to_string(),
                "https://swapi.dev/api/films/1/".to_string(),
            ]
        );
    }

    #[test]
    fn test_person_takes_id_from_self_link() {
        let payload = PersonPayload {
            url: "https://swapi.dev/api/people/42/".into(),
            name: "Someone".into(),
            eye_color: Some("blue".into()),
            ..Default::default()
        };
        let relations = ResolvedRelations {
            films: "A New Hope, Empire".into(),
            ..Default::default()
        };

        let person = Person::from_payload(payload, relations).unwrap();
        assert_eq!(person.id, 42);
        assert_eq!(person.eye_color.as_deref(), Some("blue"));
        assert_eq!(person.films, "A New Hope, Empire");
        assert_eq!(person.homeworld, "");
    }
}
