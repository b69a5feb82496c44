//! Wire types for the messages endpoint: the outgoing request body and the
//! streamed events that come back.

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Request body for a single-turn streaming message call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub stream: bool,
    /// The endpoint accepts this block as present-and-enabled or not at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<Thinking>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Thinking {
    #[serde(rename = "type")]
    pub thinking_type: &'static str,
    pub budget_tokens: u32,
}

impl Thinking {
    pub fn enabled(budget_tokens: u32) -> Self {
        Self {
            thinking_type: "enabled",
            budget_tokens,
        }
    }
}

/// Build the request body for `message`; no system prompt is ever attached.
pub fn build_body(message: &str, config: &Config, with_thinking: bool) -> ChatRequest {
    ChatRequest {
        model: config.model.clone(),
        messages: vec![ChatMessage {
            role: "user",
            content: message.to_owned(),
        }],
        max_tokens: config.max_tokens(),
        stream: true,
        thinking: with_thinking.then(|| Thinking::enabled(config.thinking_budget())),
    }
}

/// Server-sent events the consumer reacts to. Anything else maps to `Other`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageStart {
        #[serde(default)]
        message: MessageStart,
    },
    ContentBlockStart {
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        delta: ContentDelta,
    },
    MessageDelta {
        #[serde(default)]
        usage: Option<Usage>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageStart {
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Thinking,
    Text,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    TextDelta {
        #[serde(default)]
        text: String,
    },
    ThinkingDelta {
        #[serde(default)]
        thinking: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: Option<u64>,
    #[serde(default)]
    pub output_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::Value;

    fn config(raw: &str) -> Config {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn body_without_thinking_omits_key() {
        let config = config(r#"{"apis": {}, "thinking_budget": 4096}"#);
        let body = serde_json::to_value(build_body("hi", &config, false)).unwrap();
        let object = body.as_object().unwrap();
        assert!(!object.contains_key("thinking"));
        assert_eq!(body["stream"], Value::Bool(true));
        assert_eq!(body["max_tokens"], 16_000);
    }

    #[test]
    fn body_with_thinking_uses_budget() {
        let config = config(r#"{"apis": {}, "model": "m-1", "thinking_budget": 4096}"#);
        let body = serde_json::to_value(build_body("hi", &config, true)).unwrap();
        assert_eq!(body["model"], "m-1");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["thinking"]["type"], "enabled");
        assert_eq!(body["thinking"]["budget_tokens"], 4096);
        assert!(body.get("system").is_none());
    }

    #[test]
    fn decodes_known_events() {
        let start: StreamEvent = serde_json::from_str(
            r#"{"type":"content_block_start","index":0,"content_block":{"type":"thinking","thinking":""}}"#,
        )
        .unwrap();
        assert_matches!(
            start,
            StreamEvent::ContentBlockStart {
                content_block: ContentBlock::Thinking
            }
        );

        let delta: StreamEvent = serde_json::from_str(
            r#"{"type":"content_block_delta","index":1,"delta":{"type":"text_delta","text":"Hi"}}"#,
        )
        .unwrap();
        assert_matches!(
            delta,
            StreamEvent::ContentBlockDelta {
                delta: ContentDelta::TextDelta { text }
            } if text == "Hi"
        );

        let usage: StreamEvent = serde_json::from_str(
            r#"{"type":"message_start","message":{"id":"msg_1","usage":{"input_tokens":12}}}"#,
        )
        .unwrap();
        assert_matches!(
            usage,
            StreamEvent::MessageStart {
                message: MessageStart {
                    usage: Some(Usage {
                        input_tokens: Some(12),
                        ..
                    })
                }
            }
        );
    }

    #[test]
    fn unknown_event_types_are_other() {
        let ping: StreamEvent = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_matches!(ping, StreamEvent::Other);

        let signature: StreamEvent = serde_json::from_str(
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"signature_delta","signature":"x"}}"#,
        )
        .unwrap();
        assert_matches!(
            signature,
            StreamEvent::ContentBlockDelta {
                delta: ContentDelta::Other
            }
        );
    }
}
