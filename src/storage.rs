//! Object storage for team emblems and player images.
//!
//! Objects live under `{team_id}/emblem/` and `{team_id}/players/`. The
//! server only talks to [`ObjectStore`]; [`LocalStore`] keeps the bytes on
//! disk and serves them back through `GET /files/{path}`.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use url::Url;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid object path: {0}")]
    InvalidPath(String),

    #[error("invalid public url: {0}")]
    Url(#[from] url::ParseError),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` at `path`, replacing any previous object, and returns its public URL.
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, StorageError>;

    /// `None` when nothing is stored at `path`.
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Missing objects are ignored.
    async fn remove(&self, paths: &[String]) -> Result<(), StorageError>;

    /// Removes every object under `prefix`.
    async fn remove_prefix(&self, prefix: &str) -> Result<(), StorageError>;

    /// Object paths directly under `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Filesystem-backed store rooted at `STORAGE_DIR/TEAMS_BUCKET`.
pub struct LocalStore {
    root: PathBuf,
    public_base: Url,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Result<Self, StorageError> {
        let mut base = public_base.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(LocalStore {
            root: root.into(),
            public_base: Url::parse(&base)?,
        })
    }

    pub fn public_url(&self, path: &str) -> Result<String, StorageError> {
        Ok(self.public_base.join(path)?.to_string())
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn ignore_missing(result: std::io::Result<()>) -> std::io::Result<()> {
    match result {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        log::info!("stored object {path}");
        self.public_url(path)
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StorageError> {
        for path in paths {
            let target = self.resolve(path)?;
            ignore_missing(tokio::fs::remove_file(&target).await)?;
        }
        Ok(())
    }

    async fn remove_prefix(&self, prefix: &str) -> Result<(), StorageError> {
        let target = self.resolve(prefix.trim_end_matches('/'))?;
        ignore_missing(tokio::fs::remove_dir_all(&target).await)?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let prefix = prefix.trim_end_matches('/');
        let dir = self.resolve(prefix)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(format!("{prefix}/{}", entry.file_name().to_string_lossy()));
            }
        }
        names.sort();
        Ok(names)
    }
}

//////////////////////////////////////////////////
// Paths
//////////////////////////////////////////////////

/// Extension taken from the uploaded filename, else from its content type.
pub fn file_extension(filename: Option<&str>, content_type: Option<&str>) -> String {
    if let Some(ext) = filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.trim().to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    {
        return ext;
    }
    match content_type.unwrap_or_default() {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        _ => "png",
    }
    .to_string()
}

pub fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext.to_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

pub fn emblem_dir(team_id: Uuid) -> String {
    format!("{team_id}/emblem")
}

pub fn emblem_path(team_id: Uuid, extension: &str) -> String {
    format!("{}/emblem.{extension}", emblem_dir(team_id))
}

pub fn players_dir(team_id: Uuid) -> String {
    format!("{team_id}/players")
}

pub fn player_image_path(team_id: Uuid, player_id: Uuid, extension: &str) -> String {
    format!("{}/{player_id}.{extension}", players_dir(team_id))
}

//////////////////////////////////////////////////
// Team objects
//////////////////////////////////////////////////

/// Replaces the team emblem, whatever its previous extension.
pub async fn upload_team_emblem(
    store: &dyn ObjectStore,
    team_id: Uuid,
    extension: &str,
    bytes: Vec<u8>,
) -> Result<String, StorageError> {
    store.remove_prefix(&emblem_dir(team_id)).await?;
    store.upload(&emblem_path(team_id, extension), bytes).await
}

pub async fn upload_player_image(
    store: &dyn ObjectStore,
    team_id: Uuid,
    player_id: Uuid,
    extension: &str,
    bytes: Vec<u8>,
) -> Result<String, StorageError> {
    remove_player_image(store, team_id, player_id).await?;
    store
        .upload(&player_image_path(team_id, player_id, extension), bytes)
        .await
}

pub async fn remove_player_image(
    store: &dyn ObjectStore,
    team_id: Uuid,
    player_id: Uuid,
) -> Result<(), StorageError> {
    let stem = format!("{}/{player_id}.", players_dir(team_id));
    let matching: Vec<String> = store
        .list(&players_dir(team_id))
        .await?
        .into_iter()
        .filter(|path| path.starts_with(&stem))
        .collect();
    store.remove(&matching).await
}

pub async fn remove_team_player_images(
    store: &dyn ObjectStore,
    team_id: Uuid,
) -> Result<(), StorageError> {
    store.remove_prefix(&players_dir(team_id)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> LocalStore {
        LocalStore::new(dir.path(), "http://localhost:8080/files").unwrap()
    }

    #[test]
    fn extension_prefers_filename() {
        assert_eq!(file_extension(Some("Escudo.PNG"), Some("image/jpeg")), "png");
        assert_eq!(file_extension(Some("escudo"), Some("image/jpeg")), "jpg");
        assert_eq!(file_extension(None, None), "png");
    }

    #[test]
    fn paths_follow_team_layout() {
        let team = Uuid::nil();
        assert_eq!(
            emblem_path(team, "png"),
            "00000000-0000-0000-0000-000000000000/emblem/emblem.png"
        );
        assert_eq!(content_type_for("a/b/emblem.jpeg"), "image/jpeg");
    }

    #[tokio::test]
    async fn upload_returns_public_url_and_bytes_are_readable() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let team = Uuid::new_v4();

        let url = upload_team_emblem(&store, team, "png", b"first".to_vec())
            .await
            .unwrap();
        assert_eq!(url, format!("http://localhost:8080/files/{team}/emblem/emblem.png"));

        // A new extension replaces the old emblem instead of sitting next to it.
        upload_team_emblem(&store, team, "jpg", b"second".to_vec())
            .await
            .unwrap();
        let listed = store.list(&emblem_dir(team)).await.unwrap();
        assert_eq!(listed, vec![emblem_path(team, "jpg")]);
        assert_eq!(
            store.read(&emblem_path(team, "jpg")).await.unwrap().as_deref(),
            Some(&b"second"[..])
        );
    }

    #[tokio::test]
    async fn player_images_are_removed_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let team = Uuid::new_v4();
        let (kept, removed) = (Uuid::new_v4(), Uuid::new_v4());

        upload_player_image(&store, team, kept, "png", vec![1]).await.unwrap();
        upload_player_image(&store, team, removed, "webp", vec![2]).await.unwrap();
        remove_player_image(&store, team, removed).await.unwrap();

        let listed = store.list(&players_dir(team)).await.unwrap();
        assert_eq!(listed, vec![player_image_path(team, kept, "png")]);

        remove_team_player_images(&store, team).await.unwrap();
        assert!(store.list(&players_dir(team)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn escaping_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        assert!(matches!(
            store.read("../etc/passwd").await,
            Err(StorageError::InvalidPath(_))
        ));
        assert!(store.read("missing/file.png").await.unwrap().is_none());
    }
}
