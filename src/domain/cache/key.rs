//! Response cache key generation

use crate::domain::gateway::GatewayRequest;
use crate::domain::route::HttpMethod;

/// Key of a cached response: `cache:<METHOD>:<path>[:<vary value>...]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub const PREFIX: &'static str = "cache";

    /// Build a key from explicit vary-by values, in header order
    pub fn new<'a>(
        method: HttpMethod,
        path: &str,
        vary_values: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut key = format!("{}:{}:{}", Self::PREFIX, method.as_str(), path);

        for value in vary_values {
            key.push(':');
            key.push_str(value);
        }

        Self(key)
    }

    /// Build a key for a request, reading each vary-by header (missing headers fold in as "")
    pub fn for_request(request: &GatewayRequest, vary_by: &[String]) -> Self {
        let values: Vec<&str> = vary_by
            .iter()
            .map(|header| request.header(header).unwrap_or(""))
            .collect();

        Self::new(request.method, &request.path, values)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_without_vary() {
        let key = CacheKey::new(HttpMethod::Get, "/api/items", []);
        assert_eq!(key.as_str(), "cache:GET:/api/items");
    }

    #[test]
    fn test_key_for_request_folds_vary_headers() {
        let request = GatewayRequest::new(HttpMethod::Get, "/api/items")
            .with_header("Accept-Language", "en");
        let vary = vec!["accept-language".to_string(), "X-Tenant".to_string()];

        let key = CacheKey::for_request(&request, &vary);
        assert_eq!(key.as_str(), "cache:GET:/api/items:en:");
    }

    #[test]
    fn test_distinct_vary_values_give_distinct_keys() {
        let en = GatewayRequest::new(HttpMethod::Get, "/a").with_header("Accept-Language", "en");
        let fr = GatewayRequest::new(HttpMethod::Get, "/a").with_header("Accept-Language", "fr");
        let vary = vec!["Accept-Language".to_string()];

        assert_ne!(
            CacheKey::for_request(&en, &vary),
            CacheKey::for_request(&fr, &vary)
        );
    }
}
