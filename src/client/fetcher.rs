//! Person fetching: one primary request, then five concurrent relation lookups.

use super::SwapiClient;
use crate::Result;
use crate::person::{Person, PersonPayload, Relation, ResolvedRelations};

impl SwapiClient {
    /// Fetch `people/<id>/` and resolve all of its relations.
    ///
    /// Returns `Ok(None)` when the API answers with any non-success status;
    /// that id simply does not exist. A failed relation lookup is an error.
    pub async fn fetch_person(&self, id: u32) -> Result<Option<Person>> {
        let url = self.person_url(id);
        let fetched = self.get(&url).await?;

        if !fetched.status.is_success() {
            tracing::debug!("person {} not available ({})", id, fetched.status);
            return Ok(None);
        }

        let payload: PersonPayload = fetched.json()?;
        let relations = self.resolve_relations(&payload).await?;
        let person = Person::from_payload(payload, relations)?;

        tracing::debug!("fetched person {} ({})", person.id, person.name);
        Ok(Some(person))
    }

    /// Resolve the five relation fields of a payload concurrently.
    pub async fn resolve_relations(&self, payload: &PersonPayload) -> Result<ResolvedRelations> {
        let (homeworld, films, species, starships, vehicles) = tokio::try_join!(
            self.resolve_names(payload.references(Relation::Homeworld)),
            self.resolve_names(payload.references(Relation::Films)),
            self.resolve_names(payload.references(Relation::Species)),
            self.resolve_names(payload.references(Relation::Starships)),
            self.resolve_names(payload.references(Relation::Vehicles)),
        )?;

        Ok(ResolvedRelations {
            homeworld,
            films,
            species,
            starships,
            vehicles,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;
    use crate::testing::StubApi;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fetch_person_resolves_relations() {
        let api = StubApi::start().await;
        api.json("planets/1/", json!({"name": "Tatooine"}));
        api.json("films/1/", json!({"title": "A New Hope"}));
        api.json("films/2/", json!({"title": "Empire"}));
        api.json("starships/12/", json!({"name": "X-wing"}));
        api.json("vehicles/14/", json!({"name": "Snowspeeder"}));

        let mut body = api.person(1, "Luke Skywalker");
        body["homeworld"] = json!(api.url("planets/1/"));
        body["films"] = json!([api.url("films/1/"), api.url("films/2/")]);
        body["starships"] = json!([api.url("starships/12/")]);
        body["vehicles"] = json!([api.url("vehicles/14/")]);
        api.json("people/1/", body);

        let person = api.client().fetch_person(1).await.unwrap().unwrap();

        assert_eq!(person.id, 1);
        assert_eq!(person.name, "Luke Skywalker");
        assert_eq!(person.eye_color.as_deref(), Some("blue"));
        assert_eq!(person.homeworld, "Tatooine");
        assert_eq!(person.films, "A New Hope, Empire");
        assert_eq!(person.species, "");
        assert_eq!(person.starships, "X-wing");
        assert_eq!(person.vehicles, "Snowspeeder");
    }

    #[tokio::test]
    async fn test_relations_resolve_concurrently() {
        let api = StubApi::start().await;
        api.json("planets/1/", json!({"name": "Tatooine"}));
        api.json("films/1/", json!({"title": "A New Hope"}));
        api.json("species/1/", json!({"name": "Human"}));
        api.json("starships/12/", json!({"name": "X-wing"}));
        api.json("vehicles/14/", json!({"name": "Snowspeeder"}));

        let mut body = api.person(1, "Luke Skywalker");
        body["homeworld"] = json!(api.url("planets/1/"));
        body["films"] = json!([api.url("films/1/")]);
        body["species"] = json!([api.url("species/1/")]);
        body["starships"] = json!([api.url("starships/12/")]);
        body["vehicles"] = json!([api.url("vehicles/14/")]);
        api.json("people/1/", body);
        api.latency(Duration::from_millis(200));

        let person = api.client().fetch_person(1).await.unwrap().unwrap();

        assert_eq!(person.species, "Human");
        // One request per relation field, all outstanding together.
        assert_eq!(api.peak_in_flight(), 5);
    }

    #[tokio::test]
    async fn test_missing_person_is_none() {
        let api = StubApi::start().await;
        let client = api.client();

        assert!(client.fetch_person(17).await.unwrap().is_none());

        api.status("people/18/", 503);
        assert!(client.fetch_person(18).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_id_comes_from_self_link() {
        let api = StubApi::start().await;
        let mut body = api.person(5, "Leia Organa");
        body["url"] = json!(api.url("people/42/"));
        api.json("people/5/", body);

        let person = api.client().fetch_person(5).await.unwrap().unwrap();
        assert_eq!(person.id, 42);
    }

    #[tokio::test]
    async fn test_scalars_may_be_absent() {
        let api = StubApi::start().await;
        api.json(
            "people/9/",
            json!({"name": "Biggs Darklighter", "url": api.url("people/9/")}),
        );

        let person = api.client().fetch_person(9).await.unwrap().unwrap();
        assert_eq!(person.name, "Biggs Darklighter");
        assert!(person.birth_year.is_none());
        assert!(person.mass.is_none());
        assert_eq!(person.films, "");
    }

    #[tokio::test]
    async fn test_broken_relation_fails_person() {
        let api = StubApi::start().await;
        let mut body = api.person(4, "Darth Vader");
        body["films"] = json!([api.url("films/1/")]);
        api.json("people/4/", body);

        let err = api.client().fetch_person(4).await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 404, .. }));
    }
}
