use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::lenient::skip_malformed;

/// Placeholder image used when an artwork carries no image set at all
pub const FALLBACK_IMAGE: &str = "pallet/img/logo-circular.png";

/// Display status marking sensitive content
const SENSITIVE_STATUS: &str = "NSFW";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Thumbnail,
    Medium,
    Original,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct ImageSet {
    pub thumbnail: Option<String>,
    pub medium: Option<String>,
    pub original: Option<String>,
}

impl ImageSet {
    fn get(&self, size: ImageSize) -> Option<&str> {
        match size {
            ImageSize::Thumbnail => self.thumbnail.as_deref(),
            ImageSize::Medium => self.medium.as_deref(),
            ImageSize::Original => self.original.as_deref(),
        }
    }

    /// Requested size first, then medium, original and thumbnail.
    pub fn resolve(&self, size: ImageSize) -> Option<&str> {
        self.get(size)
            .or(self.medium.as_deref())
            .or(self.original.as_deref())
            .or(self.thumbnail.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
    #[serde(other)]
    Square,
}

impl Orientation {
    /// Width/height ratio used for gallery tiles
    pub fn aspect_ratio(&self) -> (u32, u32) {
        match self {
            Orientation::Portrait => (3, 4),
            Orientation::Landscape => (4, 3),
            Orientation::Square => (1, 1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Artwork {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub images: Option<ImageSet>,
    pub status: Option<String>,
    pub orientation: Option<Orientation>,
}

impl Artwork {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(&self.id)
    }

    pub fn is_sensitive(&self) -> bool {
        self.status.as_deref() == Some(SENSITIVE_STATUS)
    }

    pub fn image_url(&self, size: ImageSize) -> &str {
        self.images
            .as_ref()
            .and_then(|images| images.resolve(size))
            .unwrap_or(FALLBACK_IMAGE)
    }

    pub fn tag_line(&self) -> String {
        self.tags.join(" // ")
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation.unwrap_or(Orientation::Square)
    }
}

/// The master artwork catalog.
/// Deployed files wrap the list as `{"artworks": [...]}`; older ones are a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Bare(#[serde(deserialize_with = "skip_malformed")] Vec<Artwork>),
    Wrapped {
        #[serde(default, deserialize_with = "skip_malformed")]
        artworks: Vec<Artwork>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "CatalogFile")]
pub struct ArtCatalog {
    pub artworks: Vec<Artwork>,
}

impl From<CatalogFile> for ArtCatalog {
    fn from(file: CatalogFile) -> Self {
        match file {
            CatalogFile::Bare(artworks) | CatalogFile::Wrapped { artworks } => Self { artworks },
        }
    }
}

impl ArtCatalog {
    pub fn len(&self) -> usize {
        self.artworks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artworks.is_empty()
    }

    /// Index artworks by id. Later duplicates replace earlier ones.
    pub fn index(&self) -> HashMap<&str, &Artwork> {
        self.artworks.iter().map(|a| (a.id.as_str(), a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artwork(images: Option<ImageSet>) -> Artwork {
        Artwork {
            id: "PDD-001".to_string(),
            title: None,
            description: None,
            tags: vec![],
            images,
            status: None,
            orientation: None,
        }
    }

    #[test]
    fn test_image_url_falls_back_through_sizes() {
        let art = artwork(Some(ImageSet {
            thumbnail: Some("t.webp".to_string()),
            medium: None,
            original: Some("o.webp".to_string()),
        }));
        assert_eq!(art.image_url(ImageSize::Thumbnail), "t.webp");
        assert_eq!(art.image_url(ImageSize::Medium), "o.webp");

        let bare = artwork(None);
        assert_eq!(bare.image_url(ImageSize::Medium), FALLBACK_IMAGE);
    }

    #[test]
    fn test_display_title_uses_id_when_untitled() {
        let mut art = artwork(None);
        assert_eq!(art.display_title(), "PDD-001");
        art.title = Some("Red Balloon".to_string());
        assert_eq!(art.display_title(), "Red Balloon");
    }

    #[test]
    fn test_catalog_accepts_wrapped_and_bare_arrays() {
        let wrapped: ArtCatalog =
            serde_json::from_str(r#"{"artworks":[{"id":"a"},{"id":"b","status":"NSFW"}]}"#).unwrap();
        assert_eq!(wrapped.len(), 2);
        assert!(wrapped.artworks[1].is_sensitive());

        let bare: ArtCatalog = serde_json::from_str(r#"[{"id":"a","orientation":"portrait"}]"#).unwrap();
        assert_eq!(bare.artworks[0].orientation().aspect_ratio(), (3, 4));
        assert!(bare.index().contains_key("a"));
    }

    #[test]
    fn test_catalog_skips_malformed_artworks() {
        let wrapped: ArtCatalog = serde_json::from_value(serde_json::json!({
            "artworks": [{"id": "PDD-001"}, {"title": "No id"}, {"id": "PDD-003", "tags": "oops"}]
        }))
        .unwrap();
        assert_eq!(wrapped.len(), 1);

        let bare: ArtCatalog =
            serde_json::from_value(serde_json::json!([{"id": "PDD-001"}, 42, {"id": "PDD-002"}])).unwrap();
        assert_eq!(bare.len(), 2);
    }
}
