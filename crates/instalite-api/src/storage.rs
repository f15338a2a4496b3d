use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads/";

/// Manages uploaded images on local disk.
///
/// Every file lives flat in `dir` and is addressed publicly as
/// `/uploads/{file_name}`.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Write `bytes` under a generated name and return its public URL.
    pub async fn save(
        &self,
        prefix: &str,
        original_name: Option<&str>,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let name = stored_name(prefix, original_name, content_type);
        fs::write(self.dir.join(&name), bytes).await?;
        Ok(format!("{PUBLIC_PREFIX}{name}"))
    }

    /// Delete the file behind a public URL. URLs that do not point into
    /// this store are ignored.
    pub async fn delete_by_url(&self, url: &str) -> Result<()> {
        let Some(name) = url.strip_prefix(PUBLIC_PREFIX) else {
            return Ok(());
        };
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            warn!("Refusing to delete suspicious upload path {}", url);
            return Ok(());
        }

        match fs::remove_file(self.dir.join(name)).await {
            Ok(()) => {
                info!("Deleted upload {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Upload {} already gone", name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// `{prefix}{millis}-{uuid}.{ext}`. The client's extension is kept only when
/// it is short and alphanumeric; otherwise it comes from the content type.
fn stored_name(prefix: &str, original_name: Option<&str>, content_type: &str) -> String {
    let ext = original_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
        .or_else(|| extension_for(content_type).map(str::to_string))
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    format!(
        "{}{}-{}{}",
        prefix,
        chrono::Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        ext
    )
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}
