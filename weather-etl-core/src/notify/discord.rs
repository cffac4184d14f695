use std::path::Path;

use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::AUTHORIZATION,
    multipart::{Form, Part},
};
use tracing::{error, info, warn};

use crate::{PipelineError, error::truncate_body};

use super::Notifier;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Posts files to a Discord channel as a bot.
#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    api_base: String,
    bot_token: String,
    channel_id: String,
    http: Client,
}

impl DiscordNotifier {
    pub fn new(api_base: impl Into<String>, bot_token: String, channel_id: String) -> Self {
        Self {
            api_base: api_base.into(),
            bot_token,
            channel_id,
            http: Client::new(),
        }
    }

    pub fn messages_url(&self) -> String {
        format!(
            "{}/channels/{}/messages",
            self.api_base.trim_end_matches('/'),
            self.channel_id
        )
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send_file(&self, path: &Path, caption: &str) -> Result<(), PipelineError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::filesystem(path, e))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "weather.csv".to_string());

        let url = self.messages_url();
        let file_part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/csv")
            .map_err(|source| PipelineError::Http { endpoint: url.clone(), source })?;

        let form = Form::new()
            .text("content", caption.to_string())
            .part("file", file_part);

        let res = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bot {}", self.bot_token))
            .multipart(form)
            .send()
            .await
            .map_err(|source| PipelineError::Http { endpoint: url.clone(), source })?;

        let status = res.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            info!(path = %path.display(), "CSV file sent to Discord");
            return Ok(());
        }

        let body = match res.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(status = status.as_u16(), error = %e, "Failed to read Discord response body");
                format!("<failed to read response body: {e}>")
            }
        };
        error!(status = status.as_u16(), body = %body, "Failed to send CSV to Discord");

        Err(PipelineError::UploadRejected {
            status: status.as_u16(),
            body: truncate_body(&body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_url_embeds_channel() {
        let n = DiscordNotifier::new(DEFAULT_API_BASE, "tok".into(), "42".into());
        assert_eq!(n.messages_url(), "https://discord.com/api/v10/channels/42/messages");
    }

    #[tokio::test]
    async fn missing_file_is_a_filesystem_error() {
        let n = DiscordNotifier::new("http://127.0.0.1:9", "tok".into(), "42".into());
        let err = n
            .send_file(Path::new("/definitely/not/here.csv"), "caption")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Filesystem { .. }));
    }

    #[tokio::test]
    async fn truncated_rejection_body_is_reported() {
        use tokio::{
            io::{AsyncReadExt, AsyncWriteExt},
            net::TcpListener,
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Answer 403 but hang up long before the announced body length.
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.ends_with(b"--\r\n") {
                    break;
                }
            }
            socket
                .write_all(b"HTTP/1.1 403 Forbidden\r\nContent-Length: 100\r\n\r\nshort")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("weather.csv");
        std::fs::write(&path, "city\nPortland\n").unwrap();

        let n = DiscordNotifier::new(format!("http://{addr}"), "tok".into(), "42".into());
        let err = n.send_file(&path, "caption").await.unwrap_err();
        server.await.unwrap();

        match err {
            PipelineError::UploadRejected { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("failed to read response body"), "body: {body}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
