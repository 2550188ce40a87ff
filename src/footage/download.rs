use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Sibling path a transfer is written to before it is moved into place.
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

async fn fetch_into(client: &Client, url: &str, partial: &Path) -> anyhow::Result<u64> {
    let mut response = client
        .get(url)
        .timeout(Duration::from_secs(180))
        .send()
        .await?
        .error_for_status()?;

    let mut file = File::create(partial)
        .await
        .with_context(|| format!("creating {}", partial.display()))?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if written == 0 {
        anyhow::bail!("empty response body from {}", url);
    }
    Ok(written)
}

/// Download `url` to `dest`. `dest` either appears complete or not at all.
pub async fn download_atomic(client: &Client, url: &str, dest: &Path) -> anyhow::Result<u64> {
    let partial = partial_path(dest);
    match fetch_into(client, url, &partial).await {
        Ok(bytes) => {
            fs::rename(&partial, dest).await?;
            debug!("Downloaded {} bytes to {}", bytes, dest.display());
            Ok(bytes)
        }
        Err(e) => {
            let _ = fs::remove_file(&partial).await;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response per connection.
    async fn serve(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/clip.mp4", addr)
    }

    #[test]
    fn partial_path_is_a_sibling() {
        assert_eq!(
            partial_path(Path::new("/runs/a/footage/ocean_1.mp4")),
            PathBuf::from("/runs/a/footage/ocean_1.mp4.part")
        );
    }

    #[tokio::test]
    async fn completed_transfer_lands_at_destination() {
        let url = serve(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nvideo").await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mp4");

        let bytes = download_atomic(&Client::new(), &url, &dest).await.unwrap();

        assert_eq!(bytes, 5);
        assert_eq!(std::fs::read(&dest).unwrap(), b"video");
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn truncated_transfer_leaves_nothing_behind() {
        let url = serve(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\nConnection: close\r\n\r\nshort").await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mp4");

        assert!(download_atomic(&Client::new(), &url, &dest).await.is_err());
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn http_error_leaves_nothing_behind() {
        let url = serve(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mp4");

        assert!(download_atomic(&Client::new(), &url, &dest).await.is_err());
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
