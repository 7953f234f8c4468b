//! Drive item models (Graph `driveItem` resource, trimmed to what we select)

use serde::Deserialize;

use super::text_or;

/// A page of `/driveItem/children`.
#[derive(Debug, Deserialize)]
pub struct DriveItemPage {
    #[serde(default)]
    pub value: Vec<DriveItem>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// File facet; present on files, absent on folders.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacet {
    pub mime_type: Option<String>,
}

/// Drive item as returned with `$select=id,name,file,image,webUrl`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    pub id: Option<String>,
    pub name: Option<String>,
    pub file: Option<FileFacet>,
    /// Image facet. Only its presence matters.
    pub image: Option<serde_json::Value>,
    pub web_url: Option<String>,
}

impl DriveItem {
    pub fn id(&self) -> String {
        text_or(self.id.as_deref(), "")
    }

    pub fn name(&self) -> String {
        text_or(self.name.as_deref(), "")
    }

    pub fn web_url(&self) -> String {
        text_or(self.web_url.as_deref(), "")
    }

    /// MIME type from the file facet, `""` when unknown.
    pub fn mime_type(&self) -> String {
        text_or(
            self.file.as_ref().and_then(|f| f.mime_type.as_deref()),
            "",
        )
    }

    /// Whether the item is a photo: it has an image facet, or its MIME type
    /// is `image/*`.
    pub fn is_image(&self) -> bool {
        if self.image.is_some() {
            return true;
        }
        self.mime_type().to_lowercase().starts_with("image/")
    }
}
