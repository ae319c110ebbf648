//! Filesystem storage for post images.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use imagesize::{ImageSize, ImageType};
use sha2::{Digest, Sha256};
use slug::slugify;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;

const POST_IMAGE_DIR: &str = "posts";
const CHECKSUM_PREFIX_LEN: usize = 16;
const FILE_STEM_MAX_CHARS: usize = 64;

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("uploaded file is not a supported image")]
    UnsupportedImage,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Path relative to the storage root, e.g. `posts/3f2a...-cat.gif`.
    pub stored_path: String,
    pub checksum: String,
    pub width: usize,
    pub height: usize,
}

#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Check that `data` is a web image and return its dimensions and the
    /// file extension matching its format.
    pub fn inspect_image(data: &[u8]) -> Result<(ImageSize, &'static str), UploadStorageError> {
        if data.is_empty() {
            return Err(UploadStorageError::EmptyPayload);
        }
        let extension = imagesize::image_type(data)
            .ok()
            .and_then(image_extension)
            .ok_or(UploadStorageError::UnsupportedImage)?;
        let size = imagesize::blob_size(data).map_err(|_| UploadStorageError::UnsupportedImage)?;
        Ok((size, extension))
    }

    /// Store an image under `posts/`, named by content hash and original file
    /// stem. The extension always follows the detected format.
    pub async fn store_image(
        &self,
        original_name: &str,
        data: Bytes,
    ) -> Result<StoredUpload, UploadStorageError> {
        let (size, extension) = Self::inspect_image(&data)?;

        let checksum = hex::encode(Sha256::digest(&data));
        let stored_path = format!(
            "{POST_IMAGE_DIR}/{}-{}.{extension}",
            &checksum[..CHECKSUM_PREFIX_LEN],
            file_stem(original_name)
        );
        let absolute = self.resolve(&stored_path)?;

        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        debug!(
            target = "murmur::uploads",
            path = %stored_path,
            bytes = data.len(),
            width = size.width,
            height = size.height,
            "stored post image"
        );

        Ok(StoredUpload {
            stored_path,
            checksum,
            width: size.width,
            height: size.height,
        })
    }

    pub async fn read(&self, stored_path: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

fn image_extension(format: ImageType) -> Option<&'static str> {
    match format {
        ImageType::Gif => Some("gif"),
        ImageType::Jpeg => Some("jpg"),
        ImageType::Png => Some("png"),
        ImageType::Webp => Some("webp"),
        ImageType::Bmp => Some("bmp"),
        ImageType::Ico => Some("ico"),
        _ => None,
    }
}

/// Slugified stem of the client's file name, capped so stored names stay
/// well inside filesystem limits.
fn file_stem(original: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or_default();
    let slug = slugify(stem);
    let capped: String = slug.chars().take(FILE_STEM_MAX_CHARS).collect();
    let capped = capped.trim_end_matches('-');
    if capped.is_empty() {
        "image".to_string()
    } else {
        capped.to_string()
    }
}
