use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    Navigate,
    Fetch,
}

/// What the page intends to do with the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Image,
    Script,
    Style,
    Font,
    Manifest,
    Data,
    Other,
}

impl Destination {
    /// Guess the destination from a URL path's extension.
    pub fn from_path(path: &str) -> Self {
        let ext = path
            .rsplit('/')
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match ext.as_deref() {
            None | Some("html") | Some("htm") => Destination::Document,
            Some("png" | "jpg" | "jpeg" | "webp" | "gif" | "svg" | "avif" | "ico") => Destination::Image,
            Some("js" | "mjs") => Destination::Script,
            Some("css") => Destination::Style,
            Some("woff" | "woff2" | "ttf" | "otf" | "eot") => Destination::Font,
            Some("webmanifest") => Destination::Manifest,
            Some("json") => Destination::Data,
            Some(_) => Destination::Other,
        }
    }
}

/// An intercepted GET request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub url: String,
    pub mode: RequestMode,
    pub destination: Destination,
}

impl Request {
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mode: RequestMode::Navigate,
            destination: Destination::Document,
        }
    }

    pub fn fetch(url: impl Into<String>, destination: Destination) -> Self {
        Self {
            url: url.into(),
            mode: RequestMode::Fetch,
            destination,
        }
    }

    /// Build a request the way a browser would for a typed-in URL:
    /// documents navigate, everything else is a subresource fetch.
    pub fn infer(url: impl Into<String>) -> Self {
        let url = url.into();
        let path = reqwest::Url::parse(&url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.clone());
        match Destination::from_path(&path) {
            Destination::Document => Self::navigate(url),
            destination => Self::fetch(url, destination),
        }
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// A response as stored in and served from the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub url: String,
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(with = "body_base64")]
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

mod body_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_from_path() {
        assert_eq!(Destination::from_path("/"), Destination::Document);
        assert_eq!(Destination::from_path("/gallery/index.html"), Destination::Document);
        assert_eq!(Destination::from_path("/pallet/img/logo.PNG"), Destination::Image);
        assert_eq!(Destination::from_path("/pallet/script/event.js"), Destination::Script);
        assert_eq!(Destination::from_path("/pallet/data/art.json"), Destination::Data);
        assert_eq!(Destination::from_path("/fonts/fa-solid.woff2"), Destination::Font);
    }

    #[test]
    fn test_infer_navigation_for_documents() {
        assert!(Request::infer("https://paintedd.art/gallery/").is_navigation());
        let img = Request::infer("https://paintedd.art/pallet/img/a.webp?v=2");
        assert!(!img.is_navigation());
        assert_eq!(img.destination, Destination::Image);
    }

    #[test]
    fn test_binary_body_survives_storage_encoding() {
        let response = Response::new("https://paintedd.art/a.png", 200, vec![0u8, 159, 146, 150])
            .with_header("Content-Type", "image/png");
        let json = serde_json::to_string(&response).unwrap();
        let back: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
        assert_eq!(back.header("content-type"), Some("image/png"));
    }
}
