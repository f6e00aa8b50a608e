use bytes::BytesMut;

const DATA_FIELD: &str = "data:";

/// Incremental `text/event-stream` line decoder.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere; complete lines are
/// decoded only once their terminator arrives. Each `data:` line is yielded
/// verbatim, marker included, as one frame. Comments, `event:`, `id:`,
/// `retry:` and blank separator lines carry no payload and are skipped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: BytesMut,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(end) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line = self.buffer.split_to(end + 1);
            frames.extend(decode_line(&line));
        }
        frames
    }

    /// Flushes an unterminated trailing line once the stream has ended.
    pub fn finish(&mut self) -> Vec<String> {
        let rest = self.buffer.split();
        decode_line(&rest).into_iter().collect()
    }
}

fn decode_line(line: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim_end_matches(['\r', '\n']);
    text.starts_with(DATA_FIELD).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_data_lines_in_order() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(
            b"data: {\"progress\": 1}\n\ndata: {\"progress\": 2, \"status\": \"x\"}\n\n",
        );
        assert_eq!(
            frames,
            vec![
                "data: {\"progress\": 1}".to_string(),
                "data: {\"progress\": 2, \"status\": \"x\"}".to_string(),
            ]
        );
    }

    #[test]
    fn reassembles_lines_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"prog").is_empty());
        assert!(decoder.feed(b"ress\": 7").is_empty());
        assert_eq!(decoder.feed(b"}\r\n\r\n"), vec!["data: {\"progress\": 7}".to_string()]);
    }

    #[test]
    fn keeps_multibyte_text_split_mid_character() {
        let payload = "data: {\"status\":\"벡터 구축\"}\n".as_bytes();
        let (head, tail) = payload.split_at(19);
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(head).is_empty());
        assert_eq!(
            decoder.feed(tail),
            vec!["data: {\"status\":\"벡터 구축\"}".to_string()]
        );
    }

    #[test]
    fn skips_comments_and_other_fields() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b": keep-alive\nevent: progress\nid: 4\nretry: 1000\n\ndata: {}\n\n");
        assert_eq!(frames, vec!["data: {}".to_string()]);
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"progress\":100}").is_empty());
        assert_eq!(decoder.finish(), vec!["data: {\"progress\":100}".to_string()]);
        assert!(decoder.finish().is_empty());
    }
}
