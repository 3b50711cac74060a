use std::path::{Path, PathBuf};

use futures_lite::AsyncWriteExt;
use tracing::debug;

use crate::{
    error::{GatewayError, Result},
    types::Tokens,
};

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Flat file holding one environment's token pair.
///
/// The file has two `key:value` lines and is readable by its owner only.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub async fn read(&self) -> Result<Tokens> {
        debug!("Reading tokens from {}", self.path.display());
        let content = async_fs::read_to_string(&self.path).await?;
        let tokens = parse_tokens(&content);

        if tokens.refresh_token.is_empty() {
            return Err(GatewayError::auth(format!(
                "no refresh token in {}",
                self.path.display()
            )));
        }

        Ok(tokens)
    }

    pub async fn write(&self, tokens: &Tokens) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                async_fs::create_dir_all(parent).await?;
            }
        }

        debug!("Writing tokens to {}", self.path.display());
        let content = format!(
            "{ACCESS_TOKEN_KEY}:{}\n{REFRESH_TOKEN_KEY}:{}\n",
            tokens.access_token, tokens.refresh_token
        );
        let mut options = async_fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        async_fs::unix::OpenOptionsExt::mode(&mut options, 0o600);

        let mut file = options.open(&self.path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        // mode only applies to new files
        restrict_permissions(&self.path).await
    }
}

fn parse_tokens(content: &str) -> Tokens {
    let mut tokens = Tokens::default();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            ACCESS_TOKEN_KEY => tokens.access_token = value.trim().to_string(),
            REFRESH_TOKEN_KEY => tokens.refresh_token = value.trim().to_string(),
            _ => {}
        }
    }

    tokens
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    async_fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
