// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::services::session_store::{SessionBlob, SessionError, SessionStore};

/// 基于文件的会话存储
///
/// 每个账号一个 JSON 文件：`{cookie_dir}/{account_id}.json`
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, account_id: &str) -> Result<PathBuf, SessionError> {
        let valid = !account_id.is_empty()
            && account_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@'))
            && !account_id.starts_with('.');
        if !valid {
            return Err(SessionError::InvalidAccount(account_id.to_string()));
        }
        Ok(self.dir.join(format!("{account_id}.json")))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, account_id: &str) -> Result<Option<SessionBlob>, SessionError> {
        let path = self.path_for(account_id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let blob = serde_json::from_slice(&bytes)?;
                debug!(account_id, path = %path.display(), "Loaded session");
                Ok(Some(blob))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, account_id: &str, blob: &SessionBlob) -> Result<(), SessionError> {
        let path = self.path_for(account_id)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // 先写临时文件再重命名，避免进程中断留下半个文件
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(blob)?).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(account_id, path = %path.display(), "Saved session");
        Ok(())
    }
}
