//! Filesystem artifact store confined to one directory with `cap-std`.

use crate::task::{
    domain::{ArtifactKey, ArtifactRef},
    ports::{ArtifactStorage, ArtifactStorageError},
};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::sync::Arc;

/// Artifact store writing objects beneath a root directory.
///
/// References are `{base_url}/{key}`; only references under `base_url` can
/// be deleted.
#[derive(Debug, Clone)]
pub struct CapStdArtifactStorage {
    root: Arc<Dir>,
    base_url: String,
}

impl CapStdArtifactStorage {
    /// Opens `root` and serves references under `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStorageError::Backend`] when the directory cannot be
    /// opened.
    pub fn open(root: &Utf8Path, base_url: impl Into<String>) -> Result<Self, ArtifactStorageError> {
        let dir = Dir::open_ambient_dir(root, ambient_authority())
            .map_err(ArtifactStorageError::backend)?;
        Ok(Self {
            root: Arc::new(dir),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    fn key_of<'a>(&self, artifact: &'a ArtifactRef) -> Option<&'a str> {
        artifact
            .as_str()
            .strip_prefix(self.base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }
}

fn relative_path(key: &str) -> Result<Utf8PathBuf, ArtifactStorageError> {
    let path = Utf8PathBuf::from(key);
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|component| !matches!(component, camino::Utf8Component::Normal(_)));
    if key.is_empty() || escapes {
        return Err(ArtifactStorageError::InvalidKey(key.to_owned()));
    }
    Ok(path)
}

async fn run_blocking<F, T>(f: F) -> Result<T, ArtifactStorageError>
where
    F: FnOnce() -> Result<T, ArtifactStorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(ArtifactStorageError::backend)?
}

#[async_trait]
impl ArtifactStorage for CapStdArtifactStorage {
    async fn put(
        &self,
        key: &ArtifactKey,
        bytes: &[u8],
        _content_type: Option<&str>,
    ) -> Result<ArtifactRef, ArtifactStorageError> {
        let path = relative_path(key.as_str())?;
        let root = Arc::clone(&self.root);
        let contents = bytes.to_vec();
        run_blocking(move || {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
                root.create_dir_all(parent)
                    .map_err(ArtifactStorageError::backend)?;
            }
            root.write(&path, contents)
                .map_err(ArtifactStorageError::backend)
        })
        .await?;
        Ok(ArtifactRef::new(format!("{}/{key}", self.base_url)))
    }

    async fn delete(&self, artifact: &ArtifactRef) -> Result<(), ArtifactStorageError> {
        let key = self
            .key_of(artifact)
            .ok_or_else(|| ArtifactStorageError::UnknownReference(artifact.clone()))?;
        let path = relative_path(key)?;
        let root = Arc::clone(&self.root);
        run_blocking(move || match root.remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ArtifactStorageError::backend(err)),
        })
        .await
    }
}
