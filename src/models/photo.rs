//! Photo records served to the gallery widget

use serde::Serialize;

use super::DriveItem;

/// A photo as consumed by the gallery front end.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub src: String,
    pub thumbnail: String,
    pub download_url: String,
    pub mime_type: String,
    pub web_url: String,
}

/// Body of `/photos`.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoListing {
    pub trip: String,
    pub total: usize,
    pub photos: Vec<Photo>,
}

impl PhotoListing {
    pub fn new(trip: String, photos: Vec<Photo>) -> Self {
        Self {
            trip,
            total: photos.len(),
            photos,
        }
    }
}

/// Where the proxy's own `/thumb` and `/content` endpoints live, as seen by
/// the client.
#[derive(Debug, Clone)]
pub struct PhotoLinks {
    /// Scheme and authority, without trailing slash.
    pub origin: String,
    pub thumb_path: String,
    pub content_path: String,
}

impl PhotoLinks {
    /// Links for a listing served at `photos_path`; the sibling endpoints
    /// share its prefix.
    pub fn new(origin: &str, photos_path: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            thumb_path: swap_path_leaf(photos_path, "thumb"),
            content_path: swap_path_leaf(photos_path, "content"),
        }
    }

    fn link(&self, path: &str, share_id: &str, item_id: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("sid", share_id)
            .append_pair("id", item_id)
            .finish();
        format!("{}{}?{}", self.origin, path, query)
    }

    pub fn thumb(&self, share_id: &str, item_id: &str) -> String {
        self.link(&self.thumb_path, share_id, item_id)
    }

    pub fn content(&self, share_id: &str, item_id: &str) -> String {
        self.link(&self.content_path, share_id, item_id)
    }
}

/// Replace the last segment of `path` with `leaf`.
pub fn swap_path_leaf(path: &str, leaf: &str) -> String {
    let mut parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    match parts.last_mut() {
        Some(last) => *last = leaf,
        None => return format!("/{}", leaf),
    }
    format!("/{}", parts.join("/"))
}

/// Human title from a file name: extension dropped, `-`/`_` runs and
/// whitespace runs become single spaces. Blank names get `Photo {index}`.
pub fn derive_photo_title(file_name: &str, index: usize) -> String {
    let raw = file_name.trim();
    if raw.is_empty() {
        return format!("Photo {}", index);
    }

    let stem = match raw.rfind('.') {
        Some(dot) if dot + 1 < raw.len() && !raw[dot + 1..].contains('/') => &raw[..dot],
        _ => raw,
    };

    stem.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// HEIC/HEIF usually cannot be rendered by browsers, so those are displayed
/// through the thumbnail endpoint.
fn needs_thumbnail_src(mime_type: &str) -> bool {
    let mime = mime_type.to_lowercase();
    mime.contains("heic") || mime.contains("heif")
}

impl Photo {
    /// Build the photo for `item`, the `index`-th (1-based) in the listing.
    pub fn from_item(item: &DriveItem, index: usize, share_id: &str, links: &PhotoLinks) -> Self {
        let id = item.id();
        let name = item.name();
        let mime_type = item.mime_type();

        let thumbnail = links.thumb(share_id, &id);
        let download_url = links.content(share_id, &id);
        let src = if needs_thumbnail_src(&mime_type) {
            thumbnail.clone()
        } else {
            download_url.clone()
        };

        Self {
            title: derive_photo_title(&name, index),
            description: String::new(),
            src,
            thumbnail,
            download_url,
            web_url: item.web_url(),
            id,
            name,
            mime_type,
        }
    }
}

/// Keep image items, at most `limit` of them, and map them to photos.
pub fn build_photos(
    items: &[DriveItem],
    limit: usize,
    share_id: &str,
    links: &PhotoLinks,
) -> Vec<Photo> {
    items
        .iter()
        .filter(|item| item.is_image())
        .take(limit)
        .enumerate()
        .map(|(i, item)| Photo::from_item(item, i + 1, share_id, links))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> PhotoLinks {
        PhotoLinks::new("https://photos.example.com", "/api/photos")
    }

    fn item(json: serde_json::Value) -> DriveItem {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_derive_title() {
        assert_eq!(derive_photo_title("Sunset-Beach_02.JPG", 3), "Sunset Beach 02");
        assert_eq!(derive_photo_title("", 3), "Photo 3");
        assert_eq!(derive_photo_title("   ", 7), "Photo 7");
    }

    #[test]
    fn test_derive_title_separators_and_whitespace() {
        assert_eq!(derive_photo_title("a--b__c  d.png", 1), "a b c d");
        assert_eq!(derive_photo_title("_leading-and-trailing_.jpg", 1), "leading and trailing");
        assert_eq!(derive_photo_title("IMG_0001.tar.gz", 1), "IMG 0001.tar");
    }

    #[test]
    fn test_derive_title_without_extension() {
        assert_eq!(derive_photo_title("Harbour Bridge", 1), "Harbour Bridge");
        // A trailing dot is not an extension.
        assert_eq!(derive_photo_title("odd.", 1), "odd.");
    }

    #[test]
    fn test_swap_path_leaf() {
        assert_eq!(swap_path_leaf("/photos", "thumb"), "/thumb");
        assert_eq!(swap_path_leaf("/api/photos", "content"), "/api/content");
        assert_eq!(swap_path_leaf("/api//photos/", "thumb"), "/api/thumb");
        assert_eq!(swap_path_leaf("/", "thumb"), "/thumb");
        assert_eq!(swap_path_leaf("", "content"), "/content");
    }

    #[test]
    fn test_links_are_absolute_and_encoded() {
        let l = links();
        assert_eq!(
            l.thumb("u!abc", "97C5!123"),
            "https://photos.example.com/api/thumb?sid=u%21abc&id=97C5%21123"
        );
        assert_eq!(
            l.content("u!abc", "x y"),
            "https://photos.example.com/api/content?sid=u%21abc&id=x+y"
        );
    }

    #[test]
    fn test_heic_uses_thumbnail_as_src() {
        let it = item(serde_json::json!({
            "id": "h1",
            "name": "IMG_1234.HEIC",
            "file": { "mimeType": "image/heic" }
        }));
        let photo = Photo::from_item(&it, 1, "u!abc", &links());

        assert_eq!(photo.src, photo.thumbnail);
        assert_ne!(photo.src, photo.download_url);
        assert_eq!(photo.title, "IMG 1234");
        assert_eq!(photo.mime_type, "image/heic");
    }

    #[test]
    fn test_jpeg_uses_content_as_src() {
        let it = item(serde_json::json!({
            "id": "j1",
            "name": "beach.jpg",
            "file": { "mimeType": "image/jpeg" },
            "webUrl": "https://onedrive.live.com/j1"
        }));
        let photo = Photo::from_item(&it, 1, "u!abc", &links());

        assert_eq!(photo.src, photo.download_url);
        assert_eq!(photo.description, "");
        assert_eq!(photo.web_url, "https://onedrive.live.com/j1");
    }

    #[test]
    fn test_build_photos_filters_and_limits() {
        let items: Vec<DriveItem> = vec![
            item(serde_json::json!({ "id": "1", "name": "a.jpg", "file": { "mimeType": "image/jpeg" } })),
            item(serde_json::json!({ "id": "2", "name": "notes.txt", "file": { "mimeType": "text/plain" } })),
            item(serde_json::json!({ "id": "3", "name": "", "image": {} })),
            item(serde_json::json!({ "id": "4", "name": "c.png", "file": { "mimeType": "image/png" } })),
        ];

        let photos = build_photos(&items, 2, "u!abc", &links());
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].id, "1");
        assert_eq!(photos[1].id, "3");
        // Index counts photos, not raw items.
        assert_eq!(photos[1].title, "Photo 2");
    }

    #[test]
    fn test_photo_serializes_camel_case() {
        let it = item(serde_json::json!({ "id": "1", "name": "a.jpg", "file": { "mimeType": "image/jpeg" } }));
        let listing = PhotoListing::new(
            "australia".to_string(),
            vec![Photo::from_item(&it, 1, "u!abc", &links())],
        );
        let json = serde_json::to_value(&listing).unwrap();

        assert_eq!(json["trip"], "australia");
        assert_eq!(json["total"], 1);
        let photo = &json["photos"][0];
        for key in [
            "id",
            "name",
            "title",
            "description",
            "src",
            "thumbnail",
            "downloadUrl",
            "mimeType",
            "webUrl",
        ] {
            assert!(photo.get(key).is_some(), "missing {}", key);
        }
    }
}
