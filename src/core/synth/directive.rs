//! Streaming directive handed to the real-time playback engine.
//!
//! Wire form: `say:{k1=v1,k2=v2}text`. Parameters keep insertion order.
//! Backslash, comma, equals sign and braces inside keys or values are escaped
//! with a backslash. Line breaks in the text become spaces.

use crate::errors::{SynthError, SynthResult};

const PREFIX: &str = "say:";
const SPECIAL: [char; 5] = ['\\', ',', '=', '{', '}'];

/// Parameter asking the engine to cache the audio it produces.
pub const WRITE_CACHE_FILE: &str = "write_cache_file";
/// Parameter carrying the fingerprint the engine should cache under.
pub const CACHE_KEY: &str = "cache_key";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamingDirective {
    params: Vec<(String, String)>,
    text: String,
}

impl StreamingDirective {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            params: Vec::new(),
            text: text.into(),
        }
    }

    /// Appends a parameter, replacing the value of an existing key in place.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    /// Appends a parameter only when a value is present and non-empty.
    pub fn push_opt(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.push(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the engine is asked to cache the audio it produces.
    pub fn writes_cache_file(&self) -> bool {
        self.get(WRITE_CACHE_FILE) == Some("1")
    }

    pub fn encode(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", escape(k), escape(v)))
            .collect::<Vec<_>>()
            .join(",");
        let text = self.text.replace(['\r', '\n'], " ");
        format!("{PREFIX}{{{params}}}{text}")
    }

    pub fn parse(encoded: &str) -> SynthResult<Self> {
        let body = encoded
            .strip_prefix(PREFIX)
            .and_then(|rest| rest.strip_prefix('{'))
            .ok_or_else(|| invalid("missing 'say:{' prefix"))?;

        let mut params = Vec::new();
        let mut key = String::new();
        let mut value = String::new();
        let mut in_value = false;
        let mut chars = body.char_indices();

        let text_start = loop {
            let Some((idx, c)) = chars.next() else {
                return Err(invalid("unterminated parameter block"));
            };
            match c {
                '\\' => {
                    let (_, escaped) = chars
                        .next()
                        .ok_or_else(|| invalid("dangling escape character"))?;
                    if in_value {
                        value.push(escaped)
                    } else {
                        key.push(escaped)
                    }
                }
                '=' if !in_value => in_value = true,
                ',' | '}' => {
                    if in_value {
                        params.push((std::mem::take(&mut key), std::mem::take(&mut value)));
                        in_value = false;
                    } else if !key.is_empty() {
                        return Err(invalid("parameter without a value"));
                    }
                    if c == '}' {
                        break idx + 1;
                    }
                }
                '=' | '{' => return Err(invalid("unescaped delimiter")),
                other => {
                    if in_value {
                        value.push(other)
                    } else {
                        key.push(other)
                    }
                }
            }
        };

        Ok(Self {
            params,
            text: body[text_start..].to_string(),
        })
    }
}

impl std::fmt::Display for StreamingDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn invalid(reason: &str) -> SynthError {
    SynthError::Validation(format!("Malformed streaming directive: {reason}"))
}
