//! # lc-storage-local
//! limbcare/crates/lc-plugins/lc-storage-local/src/lib.rs
//! Local filesystem implementation of `MediaStore`.
//! Features: Content-addressable storage, directory sharding, and thumbnailing
//! of uploaded images. Documents (resumes, PDF reports) are stored as-is.

use async_trait::async_trait;
use image::ImageReader;
use lc_core::traits::MediaStore;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const THUMBNAIL_EDGE: u32 = 250;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/static/uploads")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: String) -> Self {
        let url_prefix = url_prefix.trim_end_matches('/').to_string();
        Self { root_path: root, url_prefix }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Generates a sharded path: "ab/cd/abcdef...hash.ext"
    fn get_sharded_path(&self, media_id: &str) -> anyhow::Result<PathBuf> {
        let (first, second) = shards(media_id)?;
        let mut path = self.root_path.clone();
        path.push(first);
        path.push(second);
        path.push(media_id);
        Ok(path)
    }

    /// URL of the 250px WebP thumbnail. Only image uploads have one.
    pub fn get_thumbnail_url(&self, media_id: &str) -> Option<String> {
        let (first, second) = shards(media_id).ok()?;
        let stem = media_id.split('.').next().unwrap_or(media_id);
        Some(format!("{}/{first}/{second}/thumb_{stem}.webp", self.url_prefix))
    }
}

fn shards(media_id: &str) -> anyhow::Result<(&str, &str)> {
    match (media_id.get(0..2), media_id.get(2..4)) {
        (Some(first), Some(second)) if media_id.is_char_boundary(4) => Ok((first, second)),
        _ => Err(anyhow::anyhow!("malformed media id '{media_id}'")),
    }
}

/// File extension for a stored upload.
fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "application/pdf" => "pdf",
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.first().copied())
            .unwrap_or("bin"),
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload using its SHA-256 hash as the filename.
    /// This automatically deduplicates files.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> anyhow::Result<String> {
        // 1. Calculate Hash
        let mut hasher = Sha256::new();
        hasher.update(&data);
        let hash = format!("{:x}", hasher.finalize());
        let media_id = format!("{hash}.{}", extension_for(content_type));

        let target_path = self.get_sharded_path(&media_id)?;
        let parent = target_path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("upload path has no parent"))?
            .to_path_buf();

        // 2. Ensure directory exists
        fs::create_dir_all(&parent).await?;

        // 3. Save Original (if not exists)
        if fs::try_exists(&target_path).await? {
            log::debug!("media {media_id} already stored");
            return Ok(media_id);
        }
        fs::write(&target_path, &data).await?;
        log::info!("stored media {media_id} ({} bytes)", data.len());

        // 4. Thumbnail images; a file that will not decode is still kept
        if content_type.starts_with("image/") {
            let thumb_path = parent.join(format!("thumb_{hash}.webp"));
            let outcome = tokio::task::spawn_blocking(move || write_thumbnail(data, &thumb_path)).await?;
            if let Err(err) = outcome {
                log::warn!("no thumbnail for {media_id}: {err:#}");
            }
        }

        Ok(media_id)
    }

    async fn get_url(&self, media_id: &str) -> String {
        match shards(media_id) {
            Ok((first, second)) => format!("{}/{first}/{second}/{media_id}", self.url_prefix),
            Err(_) => format!("{}/{media_id}", self.url_prefix),
        }
    }
}

/// Internal helper to generate a 250px WebP thumbnail.
fn write_thumbnail(data: Vec<u8>, thumb_path: &Path) -> anyhow::Result<()> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()?;

    let thumb = img.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE);
    thumb.save_with_format(thumb_path, image::ImageFormat::WebP)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_store() -> LocalMediaStore {
        let root = std::env::temp_dir().join(format!("lc-storage-{}", uuid::Uuid::now_v7()));
        LocalMediaStore::new(root, "/static/uploads/".into())
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(400, 300, image::Rgb([200, 40, 40]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_image_upload_is_sharded_and_thumbnailed() {
        let store = scratch_store();
        let media_id = store.save_upload(png_bytes(), "image/png").await.unwrap();
        assert!(media_id.ends_with(".png"));

        let path = store.get_sharded_path(&media_id).unwrap();
        assert!(path.exists());
        let stem = media_id.trim_end_matches(".png");
        assert!(path.with_file_name(format!("thumb_{stem}.webp")).exists());

        let url = store.get_url(&media_id).await;
        assert_eq!(url, format!("/static/uploads/{}/{}/{media_id}", &media_id[0..2], &media_id[2..4]));
        assert!(store.get_thumbnail_url(&media_id).unwrap().ends_with(".webp"));

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_same_bytes_are_deduplicated() {
        let store = scratch_store();
        let a = store.save_upload(b"%PDF-1.4 resume".to_vec(), "application/pdf").await.unwrap();
        let b = store.save_upload(b"%PDF-1.4 resume".to_vec(), "application/pdf").await.unwrap();
        assert_eq!(a, b);
        assert!(a.ends_with(".pdf"));
        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_undecodable_image_is_still_stored() {
        let store = scratch_store();
        let media_id = store.save_upload(vec![1, 2, 3, 4], "image/jpeg").await.unwrap();
        assert!(store.get_sharded_path(&media_id).unwrap().exists());
        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_short_media_id_does_not_panic() {
        let store = scratch_store();
        assert_eq!(store.get_url("ab").await, "/static/uploads/ab");
        assert!(store.get_thumbnail_url("ab").is_none());
    }
}
