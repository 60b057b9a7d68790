//! Raw message classification.

use super::{Event, EventKind, TurnOrigin, TurnUpdate};
use crate::proto::extension_message::Payload;
use crate::proto::{ExtensionMessage, ExtensionMessageType};

/// Map one raw streamed message to an [`Event`].
///
/// Rules apply in priority order and the first match wins. Never fails:
/// anything that matches no rule becomes [`EventKind::Unrecognized`].
pub fn classify(raw: &ExtensionMessage) -> Event {
    let raw_text = if raw.error_message.is_empty() {
        raw.generic_text.clone()
    } else {
        raw.error_message.clone()
    };

    if let Some(started) = raw.task_started.as_ref().filter(|s| !s.task_id.is_empty()) {
        return Event {
            seq: 0,
            kind: EventKind::TurnStarted {
                task_id: started.task_id.clone(),
                version: started.version.clone(),
            },
            is_final: true,
            timestamp_ms: 0,
            raw_text,
        };
    }

    if let Some(message) = &raw.new_chat_message {
        return Event {
            seq: 0,
            timestamp_ms: message.ts,
            raw_text: message.text.clone(),
            kind: EventKind::TurnUpdate(TurnUpdate {
                origin: TurnOrigin::Committed,
                message: message.clone(),
            }),
            is_final: true,
        };
    }

    if let Some(message) = &raw.partial_message {
        return Event {
            seq: 0,
            timestamp_ms: message.ts,
            raw_text: message.text.clone(),
            is_final: !message.partial,
            kind: EventKind::TurnUpdate(TurnUpdate {
                origin: TurnOrigin::Partial,
                message: message.clone(),
            }),
        };
    }

    let payload_kind = match &raw.payload {
        Some(Payload::ToolUse(tool)) => Some(EventKind::ToolInvocation(tool.clone())),
        Some(Payload::ToolResult(result)) => Some(EventKind::ToolResult(result.clone())),
        _ => None,
    };
    if let Some(kind) = payload_kind {
        return Event {
            seq: 0,
            kind,
            is_final: true,
            timestamp_ms: 0,
            raw_text,
        };
    }

    let kind = match ExtensionMessageType::try_from(raw.kind) {
        Ok(ExtensionMessageType::State) => EventKind::StatusSnapshot(match &raw.payload {
            Some(Payload::State(state)) => Some(Box::new(state.clone())),
            _ => None,
        }),
        Ok(ExtensionMessageType::DidUpdateSettings) => EventKind::SettingsAck,
        Ok(ExtensionMessageType::Error) => EventKind::ErrorSignal {
            message: raw.error_message.clone(),
        },
        Ok(ExtensionMessageType::McpServers) => EventKind::ServerRoster(match &raw.payload {
            Some(Payload::McpServers(roster)) => roster.servers.clone(),
            _ => Vec::new(),
        }),
        _ => EventKind::Unrecognized { type_tag: raw.kind },
    };

    Event {
        seq: 0,
        kind,
        is_final: true,
        timestamp_ms: 0,
        raw_text,
    }
}
