//! Name resolution for related-resource URLs
//!
//! Planets, films, species, starships and vehicles are referenced by URL. Each
//! detail resource carries a `name`, except films which carry a `title`.

use super::SwapiClient;
use crate::{Error, Result};
use futures::future::try_join_all;
use serde_json::Value;

/// Separator between resolved names in a relation string.
pub const NAME_SEPARATOR: &str = ", ";

/// Display name of a detail resource: `name`, else `title`, else empty.
pub fn display_name(resource: &Value) -> String {
    let field = |key: &str| {
        resource
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    };

    field("name")
        .or_else(|| field("title"))
        .unwrap_or_default()
        .to_string()
}

impl SwapiClient {
    /// Fetch one detail resource and return its display name.
    ///
    /// An empty URL resolves to an empty name without a request. Any non-success
    /// status or undecodable body is an error.
    pub async fn resolve_name(&self, url: &str) -> Result<String> {
        if url.is_empty() {
            return Ok(String::new());
        }

        let fetched = self.get(url).await?;
        if !fetched.status.is_success() {
            return Err(Error::Status {
                url: fetched.url,
                status: fetched.status.as_u16(),
            });
        }

        let resource: Value = fetched.json()?;
        Ok(display_name(&resource))
    }

    /// Resolve every URL concurrently and join the names with `", "`.
    ///
    /// Names come back in input order regardless of which request finishes
    /// first. The first failure fails the whole call. An empty list, or an
    /// absent single URL passed as `None`, gives an empty string.
    pub async fn resolve_names<I>(&self, urls: I) -> Result<String>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let lookups = urls
            .into_iter()
            .map(|url| async move { self.resolve_name(url.as_ref()).await });

        let names = try_join_all(lookups).await?;
        Ok(names.join(NAME_SEPARATOR))
    }
}
