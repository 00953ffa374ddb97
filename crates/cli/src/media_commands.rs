use std::{path::Path, sync::Arc};

use {
    anyhow::Result,
    tokio::io::AsyncWriteExt,
    wxmedia_config::WxMediaConfig,
    wxmedia_media::{MediaClient, MediaType, http_client},
    wxmedia_token::{ClientCredentialTokenProvider, StaticTokenProvider, TokenProvider},
};

/// Wire the token provider and media client from config.
///
/// An explicit token wins over the configured app credentials. The token
/// provider and the media client share one HTTP client.
pub fn build_client(config: &WxMediaConfig, token: Option<String>) -> Result<MediaClient> {
    let http = http_client(&config.http)?;
    let tokens: Arc<dyn TokenProvider> = match token {
        Some(token) => Arc::new(StaticTokenProvider::new(token)),
        None => Arc::new(ClientCredentialTokenProvider::from_config(
            http.clone(),
            config,
        )?),
    };
    Ok(MediaClient::from_config(http, config, tokens)?)
}

pub async fn upload(client: &MediaClient, file: &Path, media_type: MediaType) -> Result<()> {
    let media_id = client.upload_file(file, media_type).await?;
    println!("{media_id}");
    Ok(())
}

pub async fn download(client: &MediaClient, media_id: &str, media_type: MediaType) -> Result<()> {
    let media = client.download(media_id, media_type).await?;
    let note = if media.is_cached() {
        "cached"
    } else {
        "downloaded"
    };
    println!("{} ({note})", media.path.display());
    Ok(())
}

pub async fn fetch(
    client: &MediaClient,
    media_id: &str,
    media_type: MediaType,
    output: Option<&Path>,
) -> Result<()> {
    let data = client.download_data(media_id, media_type).await?;
    match output {
        Some(path) => {
            tokio::fs::write(path, &data)
                .await
                .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
            eprintln!("wrote {} bytes to {}", data.len(), path.display());
        },
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        },
    }
    Ok(())
}
