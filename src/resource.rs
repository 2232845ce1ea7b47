//! Collection resource facade
//!
//! Ties a [`CollectionStore`] to the pagination settings of its route and
//! answers the five request shapes the HTTP layer serves. All failures come
//! back as [`ResourceError`], which carries the status to report.

use tracing::debug;

use crate::core::config::{PaginationConfig, ResponseLocation, RouteConfig};
use crate::core::error::{ResourceError, StoreError};
use crate::pagination::{paginate, Page, PageRequest, ParamSource};
use crate::storage::{CollectionStore, FileLocks, Record};

/// Result of listing a collection
#[derive(Debug, Clone, PartialEq)]
pub enum ListOutcome {
    /// File content, unmodified
    Raw(Vec<u8>),
    /// Page object to serialize as the body
    Body(Page<Record>),
    /// Content as the body, metadata as `page-*` headers
    Headers(Page<Record>),
}

/// A collection served under one route
#[derive(Debug, Clone)]
pub struct Resource {
    route: RouteConfig,
    pagination: PaginationConfig,
    store: CollectionStore,
}

impl Resource {
    /// Create the resource for `route`
    pub fn new(route: RouteConfig, pagination: PaginationConfig, locks: &FileLocks) -> Self {
        let store = CollectionStore::new(route.file.clone(), route.id_field.clone(), locks);
        Self {
            route,
            pagination,
            store,
        }
    }

    /// Route configuration
    pub fn route(&self) -> &RouteConfig {
        &self.route
    }

    /// Underlying store
    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    /// Lists bypass decoding and return the file verbatim
    pub fn is_passthrough(&self) -> bool {
        self.route.raw || !self.pagination.enabled
    }

    /// Raw file content
    pub fn raw(&self) -> Result<Vec<u8>, ResourceError> {
        Ok(self.store.read_raw()?)
    }

    /// List the collection, paginated when enabled
    pub fn list(
        &self,
        query: &impl ParamSource,
        headers: &impl ParamSource,
    ) -> Result<ListOutcome, ResourceError> {
        if self.is_passthrough() {
            return self.raw().map(ListOutcome::Raw);
        }

        let request = PageRequest::extract(&self.pagination, query, headers)?;
        let records = self.store.load()?;
        debug!(
            "Paginating {} records of {} with page {} size {}",
            records.len(),
            self.route.path,
            request.page,
            request.size
        );
        let page = paginate(records, &request);

        Ok(match self.pagination.response_location {
            ResponseLocation::Body => ListOutcome::Body(page),
            ResponseLocation::Header => ListOutcome::Headers(page),
        })
    }

    /// Record with identity `id`
    pub fn get(&self, id: &str) -> Result<Record, ResourceError> {
        self.store
            .find_by_id(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()).into())
    }

    /// Insert the record in `body`
    pub fn create(&self, body: &[u8]) -> Result<Record, ResourceError> {
        let item = parse_record(body)?;
        Ok(self.store.insert(item)?)
    }

    /// Replace the stored record with the one in `body`
    pub fn replace(&self, body: &[u8]) -> Result<Record, ResourceError> {
        let item = parse_record(body)?;
        Ok(self.store.replace(item)?)
    }

    /// Merge the keys in `body` into the stored record
    pub fn patch(&self, body: &[u8]) -> Result<Record, ResourceError> {
        let item = parse_record(body)?;
        Ok(self.store.merge(item)?)
    }
}

fn parse_record(body: &[u8]) -> Result<Record, ResourceError> {
    serde_json::from_slice(body).map_err(ResourceError::InvalidBody)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RequestLocation;
    use crate::core::error::PageRequestError;
    use axum::http::HeaderMap;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const USERS: &str = r#"[
  {"id": 1, "name": "ada"},
  {"id": 2, "name": "bob"},
  {"id": 3, "name": "cy"}
]"#;

    fn paginated() -> PaginationConfig {
        PaginationConfig {
            enabled: true,
            default_page_size: 2,
            ..Default::default()
        }
    }

    fn resource(pagination: PaginationConfig, raw: bool) -> (TempDir, Resource) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, USERS).unwrap();
        let route = if raw {
            RouteConfig::raw("/users", path)
        } else {
            RouteConfig::collection("/users", path, "id")
        };
        (dir, Resource::new(route, pagination, &FileLocks::new()))
    }

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_list_passthrough_when_pagination_disabled() {
        let (_dir, resource) = resource(PaginationConfig::default(), false);
        let outcome = resource.list(&query(&[("page", "x")]), &HeaderMap::new()).unwrap();
        assert_eq!(outcome, ListOutcome::Raw(USERS.as_bytes().to_vec()));
    }

    #[test]
    fn test_list_raw_route_ignores_pagination() {
        let (dir, resource) = resource(paginated(), true);
        std::fs::write(dir.path().join("users.json"), "not json at all").unwrap();
        let outcome = resource.list(&query(&[]), &HeaderMap::new()).unwrap();
        assert_eq!(outcome, ListOutcome::Raw(b"not json at all".to_vec()));
    }

    #[test]
    fn test_list_body_page() {
        let (_dir, resource) = resource(paginated(), false);
        match resource.list(&query(&[("page", "1")]), &HeaderMap::new()).unwrap() {
            ListOutcome::Body(page) => {
                assert_eq!(page.total_pages, 2);
                assert_eq!(page.total_elements, 3);
                assert_eq!(page.content.len(), 1);
                assert_eq!(page.content[0]["name"], json!("cy"));
                assert!(page.last);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_list_header_page() {
        let pagination = PaginationConfig {
            response_location: ResponseLocation::Header,
            request_location: RequestLocation::Header,
            ..paginated()
        };
        let (_dir, resource) = resource(pagination, false);
        let outcome = resource.list(&query(&[]), &HeaderMap::new()).unwrap();
        assert!(matches!(outcome, ListOutcome::Headers(ref page) if page.content.len() == 2));
    }

    #[test]
    fn test_list_invalid_page_request() {
        let (_dir, resource) = resource(paginated(), false);
        let err = resource.list(&query(&[("size", "0")]), &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, ResourceError::PageRequest(PageRequestError::InvalidSize(_))));
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_get() {
        let (_dir, resource) = resource(paginated(), false);
        assert_eq!(resource.get("2").unwrap()["name"], json!("bob"));

        let err = resource.get("42").unwrap_err();
        assert!(matches!(err, ResourceError::Store(StoreError::NotFound(_))));
        assert_eq!(err.status(), 404);
        assert_eq!(err.message(), "Object with id 42 not found");
    }

    #[test]
    fn test_create_replace_patch() {
        let (_dir, resource) = resource(paginated(), false);

        let created = resource.create(br#"{"name": "dee"}"#).unwrap();
        assert_eq!(created["id"], json!(4));

        let patched = resource.patch(br#"{"id": 4, "role": "admin"}"#).unwrap();
        assert_eq!(patched, resource.get("4").unwrap());
        assert_eq!(patched["name"], json!("dee"));
        assert_eq!(patched["role"], json!("admin"));

        let replaced = resource.replace(br#"{"id": 4, "name": "eve"}"#).unwrap();
        assert_eq!(json!(replaced), json!({"id": 4, "name": "eve"}));
        assert_eq!(resource.store().load().unwrap().len(), 4);
    }

    #[test]
    fn test_invalid_bodies() {
        let (_dir, resource) = resource(paginated(), false);
        let bodies: [&[u8]; 3] = [b"[1, 2]", b"{", b"\"text\""];
        for body in bodies {
            let err = resource.create(body).unwrap_err();
            assert!(matches!(err, ResourceError::InvalidBody(_)));
            assert_eq!(err.status(), 400);
        }
    }

    #[test]
    fn test_update_errors() {
        let (_dir, resource) = resource(paginated(), false);
        let err = resource.replace(br#"{"name": "x"}"#).unwrap_err();
        assert!(matches!(err, ResourceError::Store(StoreError::MissingIdentity { .. })));

        let err = resource.patch(br#"{"id": 99}"#).unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn test_missing_file_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let route = RouteConfig::collection("/gone", dir.path().join("gone.json"), "id");
        let resource = Resource::new(route, paginated(), &FileLocks::new());
        let err = resource.list(&query(&[]), &HeaderMap::new()).unwrap_err();
        assert_eq!(err.status(), 500);
        assert!(err.message().starts_with("Internal server error"));
    }
}
