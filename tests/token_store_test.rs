use homelink::{error::GatewayError, management::TokenStore, types::Tokens};
use tempfile::tempdir;

fn tokens() -> Tokens {
    Tokens {
        access_token: "access-1".to_string(),
        refresh_token: "refresh-1".to_string(),
    }
}

#[tokio::test]
async fn test_write_then_read() {
    let dir = tempdir().unwrap();
    let store = TokenStore::new(dir.path().join(".tokens-home.txt"));

    assert!(!store.exists());
    store.write(&tokens()).await.unwrap();
    assert!(store.exists());
    assert_eq!(store.read().await.unwrap(), tokens());
}

#[tokio::test]
async fn test_file_format() {
    let dir = tempdir().unwrap();
    let store = TokenStore::new(dir.path().join("tokens.txt"));
    store.write(&tokens()).await.unwrap();

    let content = std::fs::read_to_string(store.path()).unwrap();
    assert_eq!(content, "access_token:access-1\nrefresh_token:refresh-1\n");
}

#[tokio::test]
async fn test_creates_missing_directories() {
    let dir = tempdir().unwrap();
    let store = TokenStore::new(dir.path().join("nested/deeper/tokens.txt"));

    store.write(&tokens()).await.unwrap();
    assert!(store.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_owner_only_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let store = TokenStore::new(dir.path().join("tokens.txt"));
    store.write(&tokens()).await.unwrap();

    let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[cfg(unix)]
#[tokio::test]
async fn test_rewrite_tightens_existing_file() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = dir.path().join("tokens.txt");
    std::fs::write(&path, "access_token:old\nrefresh_token:old-refresh-token-longer\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    let store = TokenStore::new(&path);
    store.write(&tokens()).await.unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "access_token:access-1\nrefresh_token:refresh-1\n"
    );
}

#[tokio::test]
async fn test_reads_loosely_formatted_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tokens.txt");
    std::fs::write(&path, "refresh_token: r-2 \n\naccess_token:a-2\nnoise\n").unwrap();

    let read = TokenStore::new(&path).read().await.unwrap();
    assert_eq!(read.access_token, "a-2");
    assert_eq!(read.refresh_token, "r-2");
}

#[tokio::test]
async fn test_missing_refresh_token_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tokens.txt");
    std::fs::write(&path, "access_token:a-2\n").unwrap();

    let result = TokenStore::new(&path).read().await;
    assert!(matches!(result, Err(GatewayError::Auth { .. })));
}

#[tokio::test]
async fn test_missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let result = TokenStore::new(dir.path().join("absent.txt")).read().await;
    assert!(matches!(result, Err(GatewayError::Io(_))));
}
