use crate::{config::MediaConfig, report::UploadedImage};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::{Builder, NamedTempFile};
use thiserror::Error;

pub const IMAGE_UPLOAD_DIR: &str = "plant_images";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to prepare media directory {path:?}: {source}")]
    Setup { path: PathBuf, source: io::Error },
    #[error("Failed to write file: {0}")]
    Write(#[from] io::Error),
    #[error("Failed to persist file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// An image the persistence side owns.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub path: PathBuf,
    pub url: String,
}

/// Owns the media root and the scratch directory used while classifying uploads.
///
/// Staged uploads are [`NamedTempFile`] guards: dropping one removes the file, so
/// the scratch directory is emptied on every request outcome. Persisted images are
/// written separately under `plant_images/` and are never touched by the guard.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    base_url: String,
    upload_dir: PathBuf,
}

impl MediaStorage {
    pub fn new(config: &MediaConfig) -> Result<Self, StorageError> {
        let storage = Self {
            root: config.root.clone(),
            base_url: normalize_base_url(&config.base_url),
            upload_dir: config.upload_dir.clone(),
        };

        for dir in [storage.images_dir(), storage.upload_dir.clone()] {
            fs::create_dir_all(&dir).map_err(|source| StorageError::Setup {
                path: dir.clone(),
                source,
            })?;
        }

        Ok(storage)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[cfg(test)]
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGE_UPLOAD_DIR)
    }

    /// Writes the upload to a scratch file that lives as long as the returned guard.
    pub fn stage_upload(&self, upload: &UploadedImage) -> Result<NamedTempFile, StorageError> {
        let file_name = sanitize_file_name(&upload.file_name);
        let suffix = extension_suffix(&file_name);

        let mut staged = Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(&self.upload_dir)?;
        staged.write_all(&upload.content)?;
        staged.flush()?;

        tracing::debug!("Staged upload {:?} at {:?}", upload.file_name, staged.path());
        Ok(staged)
    }

    /// Persists the upload under `plant_images/`, keeping its name when free.
    pub fn save_image(&self, upload: &UploadedImage) -> Result<StoredImage, StorageError> {
        let file_name = sanitize_file_name(&upload.file_name);
        let (stem, suffix) = split_file_name(&file_name);
        let images_dir = self.images_dir();

        let mut pending = Builder::new()
            .prefix(".pending-")
            .suffix(&suffix)
            .tempfile_in(&images_dir)?;
        pending.write_all(&upload.content)?;
        pending.flush()?;

        let path = match pending.persist_noclobber(images_dir.join(&file_name)) {
            Ok(_) => images_dir.join(&file_name),
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                // Name taken: keep the bytes under a unique name instead.
                let unique = Builder::new()
                    .prefix(&format!("{}_", stem))
                    .suffix(&suffix)
                    .rand_bytes(7)
                    .tempfile_in(&images_dir)?;
                let (_, unique_path) = unique.keep()?;
                err.file.persist(&unique_path)?;
                unique_path
            }
            Err(err) => return Err(err.into()),
        };

        let stored_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or(file_name);
        let url = format!("{}{}/{}", self.base_url, IMAGE_UPLOAD_DIR, stored_name);

        tracing::info!("Saved image to {:?}", path);
        Ok(StoredImage { path, url })
    }

    /// Best-effort removal of a persisted image whose report was never stored.
    pub fn discard(&self, image: &StoredImage) {
        if let Err(e) = fs::remove_file(&image.path) {
            tracing::warn!("Failed to remove orphaned image {:?}: {}", image.path, e);
        }
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    format!("{}/", trimmed)
}

fn sanitize_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

fn split_file_name(file_name: &str) -> (String, String) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{}", ext)),
        _ => (file_name.to_string(), String::new()),
    }
}

fn extension_suffix(file_name: &str) -> String {
    split_file_name(file_name).1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &Path) -> MediaStorage {
        MediaStorage::new(&MediaConfig {
            root: dir.join("media"),
            base_url: "/media".to_string(),
            upload_dir: dir.join("uploads"),
        })
        .unwrap()
    }

    fn upload(name: &str) -> UploadedImage {
        UploadedImage {
            file_name: name.to_string(),
            content: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_staged_upload_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());

        let staged = storage.stage_upload(&upload("leaf.jpg")).unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "jpg");
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);

        drop(staged);
        assert!(!path.exists());
        assert_eq!(fs::read_dir(storage.upload_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_save_image_keeps_name_then_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());

        let first = storage.save_image(&upload("leaf.png")).unwrap();
        assert_eq!(first.url, "/media/plant_images/leaf.png");
        assert!(first.path.exists());

        let second = storage.save_image(&upload("leaf.png")).unwrap();
        assert_ne!(first.path, second.path);
        assert!(second.url.starts_with("/media/plant_images/leaf_"));
        assert!(second.url.ends_with(".png"));
        assert_eq!(fs::read(&second.path).unwrap(), vec![1, 2, 3]);

        let images: Vec<_> = fs::read_dir(dir.path().join("media").join(IMAGE_UPLOAD_DIR))
            .unwrap()
            .collect();
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn test_discard_removes_persisted_image() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());

        let stored = storage.save_image(&upload("leaf.png")).unwrap();
        storage.discard(&stored);
        assert!(!stored.path.exists());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("my leaf (1).JPG"), "my_leaf__1_.JPG");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(split_file_name("archive"), ("archive".to_string(), String::new()));
    }
}
