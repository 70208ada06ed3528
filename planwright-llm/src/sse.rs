//! Server-sent event decoding for streamed responses

/// Splits a byte stream into `data:` payloads
///
/// Bytes are buffered until a full line arrives, so events may be split at
/// any byte boundary.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning the payloads of every completed `data:` line
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            if let Some(data) = data_payload(&String::from_utf8_lossy(&line)) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a final line that arrived without a newline
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(&String::from_utf8_lossy(&line))
    }
}

fn data_payload(line: &str) -> Option<String> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    Some(data.to_string())
}
