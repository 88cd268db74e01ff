use {onebridge_channels::ParseOutcome, serde::Deserialize, tracing::debug};

/// The only `post_type` routed further; everything else is dropped.
const POST_TYPE_MESSAGE: &str = "message";

/// Lenient wire shape of an inbound OneBot event. Unknown fields are
/// ignored; recognized fields are all optional so that a malformed peer
/// cannot make deserialization fail past the JSON layer.
#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    post_type: Option<String>,
    #[serde(default)]
    message_type: Option<String>,
    #[serde(default)]
    user_id: Option<i64>,
    #[serde(default)]
    group_id: Option<i64>,
    #[serde(default)]
    raw_message: Option<String>,
    #[serde(default)]
    sender: RawSender,
}

#[derive(Debug, Default, Deserialize)]
struct RawSender {
    #[serde(default)]
    nickname: Option<String>,
}

/// A chat message event decoded from a raw peer payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub message_type: Option<String>,
    pub user_id: String,
    /// Group the message was posted in; `"0"` for private messages.
    pub group_id: String,
    pub username: Option<String>,
    pub text: String,
}

/// Decode a raw payload into a message event.
///
/// Peer input is untrusted: every failure is a [`ParseOutcome`] the caller
/// matches on, never a panic or an error that reaches the read loop.
pub fn decode(raw: &str) -> Result<MessageEvent, ParseOutcome> {
    let event: RawEvent = serde_json::from_str(raw).map_err(|error| {
        debug!(error = %error, "onebot: unparsable event payload");
        ParseOutcome::Malformed
    })?;

    if event.post_type.as_deref() != Some(POST_TYPE_MESSAGE) {
        return Err(ParseOutcome::NotAMessage);
    }

    let text = event.raw_message.unwrap_or_default();
    if text.is_empty() {
        return Err(ParseOutcome::Empty);
    }

    // A message without a sender is semantically incomplete.
    let Some(user_id) = event.user_id else {
        return Err(ParseOutcome::Malformed);
    };

    Ok(MessageEvent {
        message_type: event.message_type,
        user_id: user_id.to_string(),
        group_id: event.group_id.unwrap_or(0).to_string(),
        username: event.sender.nickname,
        text,
    })
}
