//! Page request extraction from query parameters or headers

use std::collections::HashMap;

use axum::http::HeaderMap;

use crate::core::config::{PaginationConfig, RequestLocation};
use crate::core::error::PageRequestError;
use crate::pagination::page::PageRequest;

/// Anything that can look up a raw request parameter by name
pub trait ParamSource {
    /// Raw value of `name`, if present
    fn param(&self, name: &str) -> Option<&str>;
}

impl ParamSource for HashMap<String, String> {
    fn param(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl ParamSource for HeaderMap {
    fn param(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }
}

impl PageRequest {
    /// Build a page request from the location `config` points at.
    ///
    /// Empty values count as absent. Absent `page` resolves to 0 and absent
    /// `size` to the configured default. A resolved page of 0 is rejected in
    /// one-indexed mode, so one-indexed clients must always send `page`.
    pub fn extract(
        config: &PaginationConfig,
        query: &impl ParamSource,
        headers: &impl ParamSource,
    ) -> Result<Self, PageRequestError> {
        let source: &dyn ParamSource = match config.request_location {
            RequestLocation::QueryParam => query,
            RequestLocation::Header => headers,
        };
        let raw_page = source.param("page").filter(|v| !v.is_empty());
        let raw_size = source.param("size").filter(|v| !v.is_empty());

        let page = match raw_page {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| PageRequestError::InvalidPage(raw.to_string()))?,
            None => 0,
        };
        if config.one_indexed && page == 0 {
            return Err(PageRequestError::InvalidPage(raw_page.unwrap_or_default().to_string()));
        }

        let size = match raw_size {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|size| *size > 0)
                .and_then(|size| usize::try_from(size).ok())
                .ok_or_else(|| PageRequestError::InvalidSize(raw.to_string()))?,
            None => config.default_page_size,
        };

        Ok(Self {
            page,
            size,
            one_indexed: config.one_indexed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PaginationConfig;
    use axum::http::HeaderValue;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn extract(config: &PaginationConfig, pairs: &[(&str, &str)]) -> Result<PageRequest, PageRequestError> {
        PageRequest::extract(config, &query(pairs), &HeaderMap::new())
    }

    #[test]
    fn test_defaults_when_absent() {
        let config = PaginationConfig::default();
        let request = extract(&config, &[]).unwrap();
        assert_eq!(request, PageRequest::new(0, 20));
    }

    #[test]
    fn test_reads_query_params() {
        let config = PaginationConfig::default();
        let request = extract(&config, &[("page", "3"), ("size", "7")]).unwrap();
        assert_eq!(request, PageRequest::new(3, 7));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let config = PaginationConfig::default();
        let request = extract(&config, &[("page", ""), ("size", "")]).unwrap();
        assert_eq!(request, PageRequest::new(0, 20));
    }

    #[test]
    fn test_invalid_page() {
        let config = PaginationConfig::default();
        assert_eq!(
            extract(&config, &[("page", "abc")]),
            Err(PageRequestError::InvalidPage("abc".to_string()))
        );
        assert_eq!(
            extract(&config, &[("page", "-1")]),
            Err(PageRequestError::InvalidPage("-1".to_string()))
        );
    }

    #[test]
    fn test_invalid_size() {
        let config = PaginationConfig::default();
        for raw in ["big", "0", "-4", "1.5"] {
            assert_eq!(
                extract(&config, &[("size", raw)]),
                Err(PageRequestError::InvalidSize(raw.to_string()))
            );
        }
    }

    #[test]
    fn test_one_indexed() {
        let config = PaginationConfig {
            one_indexed: true,
            ..Default::default()
        };
        let request = extract(&config, &[("page", "1")]).unwrap();
        assert_eq!(request.page, 1);
        assert!(request.one_indexed);

        assert_eq!(
            extract(&config, &[("page", "0")]),
            Err(PageRequestError::InvalidPage("0".to_string()))
        );
        assert_eq!(extract(&config, &[("page", "4")]).unwrap().page, 4);
    }

    #[test]
    fn test_one_indexed_requires_page() {
        let config = PaginationConfig {
            one_indexed: true,
            ..Default::default()
        };
        assert_eq!(
            extract(&config, &[]),
            Err(PageRequestError::InvalidPage(String::new()))
        );
        assert_eq!(
            extract(&config, &[("page", ""), ("size", "5")]),
            Err(PageRequestError::InvalidPage(String::new()))
        );
    }

    #[test]
    fn test_reads_headers_when_configured() {
        let config = PaginationConfig {
            request_location: RequestLocation::Header,
            ..Default::default()
        };
        let mut headers = HeaderMap::new();
        headers.insert("page", HeaderValue::from_static("2"));
        headers.insert("size", HeaderValue::from_static("5"));

        // query parameters are ignored in header mode
        let ignored = query(&[("page", "9"), ("size", "x")]);
        let request = PageRequest::extract(&config, &ignored, &headers).unwrap();
        assert_eq!(request, PageRequest::new(2, 5));
    }
}
