//! PEM envelope construction for Postal's webhook public key.
//!
//! Postal publishes its signing key as bare base64 (the DER-encoded
//! SubjectPublicKeyInfo, no headers). The key is rebuilt into a
//! `PUBLIC KEY` PEM block before it is handed to the RSA decoder.

/// Width of each base64 line in the PEM body.
pub const PEM_LINE_WIDTH: usize = 64;

/// Line terminator used inside the PEM envelope.
pub const PEM_LINE_ENDING: &str = "\r\n";

const PEM_HEADER: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_FOOTER: &str = "-----END PUBLIC KEY-----";

/// Why a string could not be chunked into lines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkSplitError {
    #[error("input is empty")]
    EmptyInput,

    #[error("chunk width must be at least 1, got {0}")]
    InvalidWidth(usize),
}

/// Split `input` into `width`-character chunks joined by `line_ending`.
///
/// The last chunk may be shorter than `width`. No terminator is appended
/// after the last chunk.
pub fn chunk_split(input: &str, width: usize, line_ending: &str) -> Result<String, ChunkSplitError> {
    if input.is_empty() {
        return Err(ChunkSplitError::EmptyInput);
    }
    if width < 1 {
        return Err(ChunkSplitError::InvalidWidth(width));
    }

    let chars: Vec<char> = input.chars().collect();
    let chunks: Vec<String> = chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect();

    Ok(chunks.join(line_ending))
}

/// Wrap a raw base64 public key in a `PUBLIC KEY` PEM envelope.
///
/// ASCII whitespace in `raw` is ignored, so keys copied with line breaks or a
/// trailing newline format the same as the single-line form.
pub fn format_public_key(raw: &str) -> Result<String, ChunkSplitError> {
    let body: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let chunked = chunk_split(&body, PEM_LINE_WIDTH, PEM_LINE_ENDING)?;

    Ok(format!(
        "{PEM_HEADER}{PEM_LINE_ENDING}{chunked}{PEM_LINE_ENDING}{PEM_FOOTER}{PEM_LINE_ENDING}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_split_empty_input() {
        assert_eq!(chunk_split("", 64, "\r\n"), Err(ChunkSplitError::EmptyInput));
    }

    #[test]
    fn test_chunk_split_zero_width() {
        assert_eq!(
            chunk_split("abc", 0, "\r\n"),
            Err(ChunkSplitError::InvalidWidth(0))
        );
    }

    #[test]
    fn test_chunk_split_two_full_lines() {
        let key = "A".repeat(64) + &"B".repeat(64);
        let chunked = chunk_split(&key, 64, "\r\n").unwrap();

        assert_eq!(chunked, format!("{}\r\n{}", "A".repeat(64), "B".repeat(64)));

        let lines: Vec<&str> = chunked.split("\r\n").collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.len() == 64));
    }

    #[test]
    fn test_chunk_split_short_tail() {
        assert_eq!(chunk_split("Hello world!", 10, "*").unwrap(), "Hello worl*d!");
        assert_eq!(chunk_split("abc", 64, "\r\n").unwrap(), "abc");
    }

    #[test]
    fn test_format_public_key_envelope() {
        let key = "x".repeat(100);
        let pem = format_public_key(&key).unwrap();

        assert_eq!(
            pem,
            format!(
                "-----BEGIN PUBLIC KEY-----\r\n{}\r\n{}\r\n-----END PUBLIC KEY-----\r\n",
                "x".repeat(64),
                "x".repeat(36)
            )
        );
    }

    #[test]
    fn test_format_public_key_ignores_whitespace() {
        let wrapped = format!("{}\n{}\n", "y".repeat(40), "y".repeat(40));
        let single = "y".repeat(80);

        assert_eq!(
            format_public_key(&wrapped).unwrap(),
            format_public_key(&single).unwrap()
        );
    }

    #[test]
    fn test_format_public_key_empty() {
        assert_eq!(format_public_key(""), Err(ChunkSplitError::EmptyInput));
        assert_eq!(format_public_key("  \n "), Err(ChunkSplitError::EmptyInput));
    }
}
