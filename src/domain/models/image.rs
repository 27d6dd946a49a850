#[cfg(test)]
#[path = "image_test.rs"]
mod tests;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;

use super::ValidationError;

pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

const IMAGE_TYPES: [(&str, &str); 6] = [
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
];

/// An image picked for upload, held in memory until it is sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime: String,
    pub bytes: Arc<Vec<u8>>,
}

impl ImageFile {
    pub fn new(name: &str, mime: &str, bytes: Vec<u8>) -> ImageFile {
        return ImageFile {
            name: name.to_string(),
            mime: mime.to_string(),
            bytes: Arc::new(bytes),
        };
    }

    pub fn mime_for(path: &Path) -> &'static str {
        let ext = path
            .extension()
            .map(|e| return e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        return IMAGE_TYPES
            .iter()
            .find(|(e, _)| return *e == ext)
            .map(|(_, mime)| return *mime)
            .unwrap_or("application/octet-stream");
    }

    pub async fn from_path(path: &Path) -> Result<ImageFile> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|e| return e.to_string_lossy().to_string())
            .unwrap_or_else(|| return path.to_string_lossy().to_string());

        return Ok(ImageFile::new(&name, ImageFile::mime_for(path), bytes));
    }

    pub fn size(&self) -> usize {
        return self.bytes.len();
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.size() > MAX_IMAGE_SIZE {
            return Err(ValidationError::ImageTooLarge {
                name: self.name.to_string(),
                size: self.size(),
            });
        }

        if !IMAGE_TYPES.iter().any(|(_, mime)| return *mime == self.mime) {
            return Err(ValidationError::ImageRejected {
                name: self.name.to_string(),
                reason: format!("{} is not an accepted image type", self.mime),
            });
        }

        if self.bytes.is_empty() {
            return Err(ValidationError::ImageRejected {
                name: self.name.to_string(),
                reason: "file is empty".to_string(),
            });
        }

        return Ok(());
    }
}

/// Registry of live preview URLs. A URL stays registered until every
/// `PreviewUrl` handle pointing at it has been dropped.
#[derive(Clone, Debug, Default)]
pub struct ObjectUrls {
    urls: Arc<DashMap<String, String>>,
}

impl ObjectUrls {
    pub fn create(&self, file: &ImageFile) -> PreviewUrl {
        let url = format!("blob:codequest/{}", uuid::Uuid::new_v4());
        self.urls.insert(url.to_string(), file.name.to_string());
        tracing::debug!(url = %url, name = %file.name, "created preview url");

        return PreviewUrl {
            inner: Arc::new(PreviewInner {
                url,
                registry: self.urls.clone(),
            }),
        };
    }

    pub fn is_live(&self, url: &str) -> bool {
        return self.urls.contains_key(url);
    }

    pub fn len(&self) -> usize {
        return self.urls.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.urls.is_empty();
    }
}

#[derive(Debug)]
struct PreviewInner {
    url: String,
    registry: Arc<DashMap<String, String>>,
}

impl Drop for PreviewInner {
    fn drop(&mut self) {
        self.registry.remove(&self.url);
        tracing::debug!(url = %self.url, "revoked preview url");
    }
}

#[derive(Clone, Debug)]
pub struct PreviewUrl {
    inner: Arc<PreviewInner>,
}

impl PreviewUrl {
    pub fn as_str(&self) -> &str {
        return &self.inner.url;
    }
}

impl PartialEq for PreviewUrl {
    fn eq(&self, other: &PreviewUrl) -> bool {
        return self.inner.url == other.inner.url;
    }
}

impl Eq for PreviewUrl {}

impl fmt::Display for PreviewUrl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        return write!(f, "{}", self.inner.url);
    }
}

#[derive(Clone, Debug)]
pub struct PendingImage {
    pub file: ImageFile,
    pub preview: PreviewUrl,
}

/// Images attached to the next search or follow-up.
#[derive(Debug, Default)]
pub struct ImageSet {
    urls: ObjectUrls,
    pending: Vec<PendingImage>,
}

impl ImageSet {
    pub fn new(urls: ObjectUrls) -> ImageSet {
        return ImageSet {
            urls,
            pending: vec![],
        };
    }

    /// Accepts every valid file and returns one error per rejected file.
    pub fn add_files(&mut self, files: Vec<ImageFile>) -> Vec<ValidationError> {
        let mut errors = vec![];
        for file in files {
            if let Err(err) = file.validate() {
                tracing::warn!(name = %file.name, size = file.size(), error = %err, "image rejected");
                errors.push(err);
                continue;
            }

            let preview = self.urls.create(&file);
            self.pending.push(PendingImage { file, preview });
        }

        return errors;
    }

    pub fn remove(&mut self, index: usize) -> Result<PendingImage, ValidationError> {
        if index >= self.pending.len() {
            return Err(ValidationError::OutOfBounds(index + 1));
        }

        return Ok(self.pending.remove(index));
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn files(&self) -> Vec<ImageFile> {
        return self
            .pending
            .iter()
            .map(|e| return e.file.clone())
            .collect();
    }

    pub fn previews(&self) -> Vec<PreviewUrl> {
        return self
            .pending
            .iter()
            .map(|e| return e.preview.clone())
            .collect();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingImage> {
        return self.pending.iter();
    }

    pub fn len(&self) -> usize {
        return self.pending.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.pending.is_empty();
    }
}
