//! Incremental decoder for `text/event-stream` bodies.
//!
//! Chunks arrive at arbitrary byte boundaries; the decoder buffers partial
//! lines and yields complete events as soon as their terminating blank line
//! has been seen.

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name, `message` unless the server set one.
    pub event: String,
    /// `data:` lines joined with `\n`.
    pub data: String,
    /// Last event id seen on the stream.
    pub id: Option<String>,
}

/// Longest line the decoder buffers before giving up on the stream.
pub const MAX_LINE_BYTES: usize = 1 << 20;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SseError {
    #[error("event stream line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to contain no newline.
    scanned: usize,
    max_line: usize,
    event: Option<String>,
    data: Vec<String>,
    last_id: Option<String>,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            max_line,
            event: None,
            data: Vec::new(),
            last_id: None,
        }
    }

    /// Feed the next body chunk, returning every event it completed.
    ///
    /// Fails once a single line grows past the configured limit; the
    /// decoder is reset and the stream should be abandoned.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, SseError> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        let mut line_start = 0;
        let mut cursor = self.scanned;
        while let Some(pos) = self.buffer[cursor..].iter().position(|&b| b == b'\n') {
            let end = cursor + pos;
            let mut raw = &self.buffer[line_start..end];
            if raw.last() == Some(&b'\r') {
                raw = &raw[..raw.len() - 1];
            }
            let line = String::from_utf8_lossy(raw).into_owned();
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
            line_start = end + 1;
            cursor = line_start;
        }
        self.buffer.drain(..line_start);
        self.scanned = self.buffer.len();

        if self.buffer.len() > self.max_line {
            self.buffer.clear();
            self.scanned = 0;
            return Err(SseError::LineTooLong {
                limit: self.max_line,
            });
        }
        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.last_id = Some(value.to_string()),
            // `retry` only matters for reconnecting clients; we never reconnect.
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "message".to_string()),
            data,
            id: self.last_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    impl SseDecoder {
        fn feed_ok(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
            self.feed(chunk).unwrap()
        }
    }

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed_ok(b"data: {\"id\":\"a\"}\n\n");
        assert_eq!(
            events,
            vec![SseEvent {
                event: "message".into(),
                data: "{\"id\":\"a\"}".into(),
                id: None,
            }]
        );
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed_ok(b"da").is_empty());
        assert!(decoder.feed_ok(b"ta: hel").is_empty());
        assert!(decoder.feed_ok(b"lo\n").is_empty());
        let events = decoder.feed_ok(b"\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "hello");
    }

    #[test]
    fn test_multiline_data_and_crlf() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed_ok(b"data: one\r\ndata: two\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "one\ntwo");
    }

    #[test]
    fn test_named_events_comments_and_ids() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed_ok(b": keep-alive\n\nevent: status\nid: 7\nretry: 1000\ndata: x\n\ndata: y\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "status");
        assert_eq!(events[0].id.as_deref(), Some("7"));
        assert_eq!(events[1].event, "message");
        assert_eq!(events[1].id.as_deref(), Some("7"));
        assert_eq!(events[1].data, "y");
    }

    #[test]
    fn test_value_without_space_and_bare_field() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed_ok(b"data:tight\ndata\n\n");
        assert_eq!(events[0].data, "tight\n");
    }

    #[test]
    fn test_incomplete_event_is_held_back() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed_ok(b"data: pending\n").is_empty());
    }

    #[test]
    fn test_multibyte_characters_across_chunks() {
        let mut decoder = SseDecoder::new();
        let text = "data: Größe\n\n".as_bytes();
        let (head, tail) = text.split_at(9);
        assert!(decoder.feed_ok(head).is_empty());
        let events = decoder.feed_ok(tail);
        assert_eq!(events[0].data, "Größe");
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut decoder = SseDecoder::new();
        let body = b"event: status\r\ndata: {\"id\":\"a\"}\r\n\r\ndata: b\n\n";
        let events: Vec<SseEvent> = body
            .iter()
            .flat_map(|b| decoder.feed_ok(std::slice::from_ref(b)))
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "status");
        assert_eq!(events[0].data, "{\"id\":\"a\"}");
        assert_eq!(events[1].data, "b");
    }

    #[test]
    fn test_overlong_line_is_rejected() {
        let mut decoder = SseDecoder::with_max_line(16);
        assert!(decoder.feed_ok(b"data: short\n").is_empty());
        assert!(decoder.feed_ok(b"data: 0123456").is_empty());
        assert_eq!(
            decoder.feed(b"789abcdef"),
            Err(SseError::LineTooLong { limit: 16 })
        );
    }

    #[test]
    fn test_long_line_within_limit_split_many_ways() {
        let mut decoder = SseDecoder::new();
        let payload = "x".repeat(10_000);
        let body = format!("data: {payload}\n\n");
        let mut events = Vec::new();
        for chunk in body.as_bytes().chunks(7) {
            events.extend(decoder.feed_ok(chunk));
        }
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data.len(), 10_000);
    }
}
