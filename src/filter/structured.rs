use serde_json::Value;
use tracing::debug;

pub const PARSE_ERROR: &str = "Error parsing JSON";
pub const NO_MATCH: &str = "No matching data found";
pub const MISSING_CHUNK: &str = "Missing or invalid 'chunk' field";
pub const NO_BODY: &str = "[no body]";

const CHAT_CONTENT_POINTER: &str = "/choices/0/message/content";

fn parse(raw: &[u8]) -> Option<Value> {
    match serde_json::from_slice(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Captured response is not valid JSON: {e}");
            None
        }
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[must_use]
pub fn extract_chat_content(raw: &[u8]) -> String {
    let Some(document) = parse(raw) else {
        return PARSE_ERROR.to_string();
    };
    present(document.pointer(CHAT_CONTENT_POINTER)).map_or_else(|| NO_MATCH.to_string(), text_of)
}

#[must_use]
pub fn extract_chunk_lines(raw: &[u8]) -> Vec<String> {
    let Some(document) = parse(raw) else {
        return vec![PARSE_ERROR.to_string()];
    };
    let mut lines = Vec::new();

    if let Some(end) = present(document.get("end")) {
        lines.push(text_of(end));
    }

    match document.get("chunk").and_then(Value::as_array) {
        Some(chunks) => lines.extend(chunks.iter().map(chunk_line)),
        None => lines.push(MISSING_CHUNK.to_string()),
    }
    lines
}

fn chunk_line(chunk: &Value) -> String {
    let sender = present(chunk.get("sender")).map(text_of).map(|sender| {
        match sender.split_once(':') {
            Some((name, _)) => name.to_string(),
            None => sender,
        }
    });
    let body = present(chunk.get("content").and_then(|content| content.get("body")))
        .map_or_else(|| NO_BODY.to_string(), text_of);
    format!("{}: {body}", sender.unwrap_or_default())
}
