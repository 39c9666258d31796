// src/services/upload_service.rs
use crate::{
    config::Config,
    error::{AppError, AppResult},
};
use chrono::Utc;
use tokio::fs;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub stored_name: String,
    pub url: String,
}

/// Keeps only the last path segment and replaces anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(|c| c == '/' || c == '\\')
        .next()
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
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Writes the bytes under `UPLOAD_DIR/<unix_ms>_<name>` and returns the public URL.
pub async fn save_evidence_file(
    config: &Config,
    original_name: &str,
    bytes: &[u8],
) -> AppResult<StoredFile> {
    if bytes.len() > config.max_upload_bytes {
        return Err(AppError::BadRequest(format!(
            "File exceeds the {} byte upload limit",
            config.max_upload_bytes
        )));
    }

    let stored_name = format!(
        "{}_{}",
        Utc::now().timestamp_millis(),
        sanitize_file_name(original_name)
    );
    let path = config.upload_dir.join(&stored_name);

    fs::create_dir_all(&config.upload_dir).await.map_err(|e| {
        tracing::error!("Cannot create upload dir {}: {}", config.upload_dir.display(), e);
        AppError::InternalServerError
    })?;
    fs::write(&path, bytes).await.map_err(|e| {
        tracing::error!("Cannot write upload {}: {}", path.display(), e);
        AppError::InternalServerError
    })?;

    tracing::info!("📂 Stored upload {} ({} bytes)", stored_name, bytes.len());
    Ok(StoredFile {
        url: format!("{}/uploads/{}", config.public_base_url, stored_name),
        stored_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_paths_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\sertifikat lomba.pdf"), "sertifikat_lomba.pdf");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[tokio::test]
    async fn saves_under_upload_dir_and_builds_public_url() {
        let dir = std::env::temp_dir().join(format!("uploads-{}", uuid::Uuid::new_v4()));
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.upload_dir = dir.clone();
        config.public_base_url = "http://files.test".to_string();

        let stored = save_evidence_file(&config, "bukti.pdf", b"%PDF-1.4").await.unwrap();
        assert!(stored.stored_name.ends_with("_bukti.pdf"));
        assert_eq!(stored.url, format!("http://files.test/uploads/{}", stored.stored_name));
        let written = std::fs::read(dir.join(&stored.stored_name)).unwrap();
        assert_eq!(written, b"%PDF-1.4");

        config.max_upload_bytes = 2;
        let err = save_evidence_file(&config, "big.pdf", b"abc").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        std::fs::remove_dir_all(dir).ok();
    }
}
