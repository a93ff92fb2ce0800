use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{CacheError, Destination, Request};

/// Current cache generation. Bump to invalidate every client's offline copy.
pub const DEFAULT_GENERATION: &str = "paintedd-v1";

/// Pre-cached page served to navigations with no network and no cached copy
pub const DEFAULT_OFFLINE_PAGE: &str = "/offline.html";

/// Host of the icon font stylesheet and glyphs
pub const FONT_ICON_HOST: &str = "cdnjs.cloudflare.com";

/// How each request class is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Network, cache the result; cached copy only when offline
    NetworkFirst,
    /// Network; cached copy or the offline page when offline
    NetworkFirstWithFallback,
    /// Cached copy now, refresh in the background
    StaleWhileRevalidate,
    /// Cached copy, else network without storing
    CacheFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    DataManifest,
    Navigation,
    Asset,
    Shell,
}

impl RequestClass {
    pub fn strategy(&self) -> Strategy {
        match self {
            RequestClass::DataManifest => Strategy::NetworkFirst,
            RequestClass::Navigation => Strategy::NetworkFirstWithFallback,
            RequestClass::Asset => Strategy::StaleWhileRevalidate,
            RequestClass::Shell => Strategy::CacheFirst,
        }
    }
}

/// Which generation is live, what gets pre-cached and how requests are classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachePolicy {
    pub generation: String,
    /// Site root every relative path is resolved against
    pub origin: String,
    /// Paths fetched and stored at install time
    pub app_shell: Vec<String>,
    pub offline_page: String,
    /// Path suffixes of the catalog data files
    pub data_manifests: Vec<String>,
    /// Third-party hosts whose responses are refreshed in the background
    pub revalidate_hosts: Vec<String>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            generation: DEFAULT_GENERATION.to_string(),
            origin: "https://paintedd.art/".to_string(),
            app_shell: [
                "/",
                "/index.html",
                "/gallery/index.html",
                "/event/index.html",
                "/about/index.html",
                "/pallet/img/logo-circular.png",
                "/manifest.json",
                DEFAULT_OFFLINE_PAGE,
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            offline_page: DEFAULT_OFFLINE_PAGE.to_string(),
            data_manifests: vec!["/pallet/data/art.json".to_string()],
            revalidate_hosts: vec![FONT_ICON_HOST.to_string()],
        }
    }
}

impl CachePolicy {
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Resolve a site path to an absolute URL
    pub fn resolve(&self, path: &str) -> Result<String, CacheError> {
        let invalid = |reason: String| CacheError::InvalidUrl {
            url: path.to_string(),
            reason,
        };
        let base = Url::parse(&self.origin).map_err(|e| invalid(e.to_string()))?;
        base.join(path)
            .map(|u| u.to_string())
            .map_err(|e| invalid(e.to_string()))
    }

    pub fn app_shell_urls(&self) -> Result<Vec<String>, CacheError> {
        self.app_shell.iter().map(|p| self.resolve(p)).collect()
    }

    pub fn offline_url(&self) -> Result<String, CacheError> {
        self.resolve(&self.offline_page)
    }

    pub fn classify(&self, request: &Request) -> RequestClass {
        let parsed = Url::parse(&request.url).ok();
        let path = parsed.as_ref().map(|u| u.path()).unwrap_or(request.url.as_str());
        let host = parsed.as_ref().and_then(|u| u.host_str()).unwrap_or_default();

        if self.data_manifests.iter().any(|m| path.ends_with(m.as_str())) {
            RequestClass::DataManifest
        } else if request.is_navigation() {
            RequestClass::Navigation
        } else if matches!(request.destination, Destination::Image | Destination::Script)
            || self.revalidate_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
        {
            RequestClass::Asset
        } else {
            RequestClass::Shell
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_request_kinds() {
        let policy = CachePolicy::default();

        let data = Request::fetch("https://paintedd.art/pallet/data/art.json", Destination::Data);
        assert_eq!(policy.classify(&data), RequestClass::DataManifest);
        assert_eq!(policy.classify(&data).strategy(), Strategy::NetworkFirst);

        let page = Request::navigate("https://paintedd.art/gallery/");
        assert_eq!(policy.classify(&page).strategy(), Strategy::NetworkFirstWithFallback);

        let img = Request::fetch("https://paintedd.art/pallet/img/a.webp", Destination::Image);
        assert_eq!(policy.classify(&img).strategy(), Strategy::StaleWhileRevalidate);

        let font = Request::fetch(
            "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0/css/all.min.css",
            Destination::Style,
        );
        assert_eq!(policy.classify(&font), RequestClass::Asset);

        let css = Request::fetch("https://paintedd.art/pallet/style/main.css", Destination::Style);
        assert_eq!(policy.classify(&css).strategy(), Strategy::CacheFirst);

        // Other data files are plain shell requests
        let global = Request::fetch("https://paintedd.art/pallet/data/global.json", Destination::Data);
        assert_eq!(policy.classify(&global), RequestClass::Shell);
    }

    #[test]
    fn test_resolve_app_shell_against_origin() {
        let policy = CachePolicy::with_origin("http://127.0.0.1:8080/site/");
        let urls = policy.app_shell_urls().unwrap();
        assert_eq!(urls[0], "http://127.0.0.1:8080/");
        assert_eq!(policy.resolve("gallery/").unwrap(), "http://127.0.0.1:8080/site/gallery/");
        assert_eq!(policy.offline_url().unwrap(), "http://127.0.0.1:8080/offline.html");

        let broken = CachePolicy::with_origin("not a url");
        assert!(matches!(broken.offline_url(), Err(CacheError::InvalidUrl { .. })));
    }
}
