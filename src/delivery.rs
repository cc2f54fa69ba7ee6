use anyhow::Result;
use reqwest::blocking::Client;
use serde_json::json;
use tracing::{error, info};

use crate::config::TelegramConfig;
use crate::http_client::http_client;

/// Stays under Telegram's hard 4096 limit.
pub const MAX_MESSAGE_CHARS: usize = 4000;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Splits `text` into chunks of at most `max_chars` characters, cutting at the
/// last newline before the limit when there is one.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.chars().count() <= max_chars {
            chunks.push(remaining.to_string());
            break;
        }

        let limit = remaining
            .char_indices()
            .nth(max_chars)
            .map(|(idx, _)| idx)
            .unwrap_or(remaining.len());
        let cut = match remaining[..limit].rfind('\n') {
            Some(idx) if idx > 0 => idx,
            _ => limit,
        };

        let chunk = remaining[..cut].trim_matches('\n');
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        remaining = remaining[cut..].trim_start_matches('\n');
    }

    chunks
}

pub struct TelegramClient {
    http: &'static Client,
    base_url: String,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout_secs)?,
            base_url: TELEGRAM_API.to_string(),
            config,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Sends `text` as HTML, chunk by chunk. A failed chunk, rejected or
    /// unreachable, is logged and skipped. Returns how many chunks were accepted.
    pub fn send(&self, text: &str) -> Result<usize> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.config.bot_token);
        let chunks = split_message(text, MAX_MESSAGE_CHARS);
        let total = chunks.len();
        let mut delivered = 0usize;

        for (idx, chunk) in chunks.iter().enumerate() {
            let body = json!({
                "chat_id": self.config.chat_id,
                "text": chunk,
                "parse_mode": "HTML",
            });
            let resp = match self.http.post(&url).json(&body).send() {
                Ok(resp) => resp,
                Err(err) => {
                    error!(chunk = idx + 1, total, error = %err, "telegram request failed");
                    continue;
                }
            };
            let status = resp.status();
            if status.is_success() {
                delivered += 1;
            } else {
                let detail = resp.text().unwrap_or_default();
                error!(chunk = idx + 1, total, %status, detail, "telegram rejected chunk");
            }
        }

        info!(delivered, total, "telegram delivery finished");
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_message("hola", 10), vec!["hola".to_string()]);
        assert!(split_message("", 10).is_empty());
    }

    #[test]
    fn cuts_on_last_newline_before_limit() {
        let chunks = split_message("aaaa\nbbbb\ncccc", 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn hard_cut_without_newline() {
        let chunks = split_message("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "ñññññ\n⭐⭐⭐⭐⭐";
        let chunks = split_message(text, 6);
        assert_eq!(chunks, vec!["ñññññ", "⭐⭐⭐⭐⭐"]);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 6);
        }
    }

    #[test]
    fn no_content_is_lost() {
        let text = (0..300)
            .map(|i| format!("línea {i} con algo de texto"))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = split_message(&text, 120);
        assert!(chunks.iter().all(|c| c.chars().count() <= 120));
        let strip = |s: &str| s.replace('\n', "");
        assert_eq!(strip(&chunks.concat()), strip(&text));
    }

    #[test]
    fn unreachable_api_skips_every_chunk_without_failing() {
        let config = TelegramConfig {
            bot_token: "token".to_string(),
            chat_id: "-100".to_string(),
        };
        let client = TelegramClient::new(config, 2)
            .unwrap()
            .with_base_url("http://127.0.0.1:9/");
        assert_eq!(client.base_url, "http://127.0.0.1:9");

        let text = (0..400)
            .map(|i| format!("línea {i} del resumen"))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(split_message(&text, MAX_MESSAGE_CHARS).len() >= 2);
        assert_eq!(client.send(&text).unwrap(), 0);
    }
}
