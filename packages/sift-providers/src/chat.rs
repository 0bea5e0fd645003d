use std::time::Duration;

use color_eyre::{Result, eyre};
use futures::StreamExt;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::mpsc;

use sift_domain::message::ChatMessage;

/// One blocking chat completion. The response's first choice content is
/// returned as an assistant message.
pub async fn generate(
	cfg: &sift_config::LlmProviderConfig,
	messages: &[ChatMessage],
) -> Result<ChatMessage> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion(json)
}

/// Incremental chat completion. Content deltas are forwarded over the
/// returned channel; the channel closes when the upstream stream ends or
/// the receiver is dropped.
pub async fn stream(
	cfg: &sift_config::LlmProviderConfig,
	messages: &[ChatMessage],
) -> Result<mpsc::Receiver<String>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
		"stream": true,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?
		.error_for_status()?;
	let (tx, rx) = mpsc::channel(32);

	tokio::spawn(async move {
		let mut bytes = res.bytes_stream();
		let mut buffer = String::new();

		while let Some(chunk) = bytes.next().await {
			let Ok(chunk) = chunk else { break };

			buffer.push_str(&String::from_utf8_lossy(&chunk));

			while let Some(newline) = buffer.find('\n') {
				let line = buffer[..newline].trim().to_string();

				buffer.drain(..=newline);

				let Some(data) = line.strip_prefix("data:") else { continue };
				let data = data.trim();

				if data == "[DONE]" {
					return;
				}
				if let Some(delta) = parse_stream_delta(data)
					&& tx.send(delta).await.is_err()
				{
					return;
				}
			}
		}
	});

	Ok(rx)
}

fn parse_completion(json: Value) -> Result<ChatMessage> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| eyre::eyre!("Chat response is missing message content."))?;

	Ok(ChatMessage::assistant(content))
}

fn parse_stream_delta(data: &str) -> Option<String> {
	let json: Value = serde_json::from_str(data).ok()?;
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("delta"))
		.and_then(|delta| delta.get("content"))
		.and_then(|c| c.as_str())?;

	if content.is_empty() { None } else { Some(content.to_string()) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "an answer" } }
			]
		});
		let message = parse_completion(json).expect("parse failed");
		assert_eq!(message.content, "an answer");
	}

	#[test]
	fn missing_content_is_an_error() {
		let json = serde_json::json!({ "choices": [] });
		assert!(parse_completion(json).is_err());
	}

	#[test]
	fn parses_stream_delta_content() {
		let data = r#"{"choices":[{"delta":{"content":"chunk"}}]}"#;
		assert_eq!(parse_stream_delta(data).as_deref(), Some("chunk"));
		assert_eq!(parse_stream_delta(r#"{"choices":[{"delta":{}}]}"#), None);
	}
}
