//! Outbound framing: a big-endian `u32` payload length followed by the
//! zlib-compressed payload.

use std::io::{self, Write};

use flate2::Compression;
use flate2::write::ZlibEncoder;

const HEADER: usize = 4;

/// Compress `payload` and prefix it with its compressed length.
pub fn encode(payload: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(payload)?;
    let compressed = encoder.finish()?;
    let len = u32::try_from(compressed.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame too large"))?;
    let mut frame = Vec::with_capacity(HEADER + compressed.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&compressed);
    Ok(frame)
}

/// The client side of the framing, for tests.
#[cfg(test)]
pub(crate) mod client {
    use std::io::{self, Read};

    use flate2::read::ZlibDecoder;

    use super::HEADER;

    /// Largest compressed payload accepted by [`decode`].
    pub const MAX_FRAME: usize = 16 * 1024 * 1024;

    #[derive(Debug, thiserror::Error)]
    pub enum CodecError {
        #[error("frame is incomplete")]
        Incomplete,

        #[error("frame of {0} bytes exceeds the limit")]
        TooLarge(usize),

        #[error("bad frame payload: {0}")]
        Io(#[from] io::Error),
    }

    /// Decode the first frame in `buf`. Returns the payload and the number
    /// of bytes consumed.
    pub fn decode(buf: &[u8]) -> Result<(Vec<u8>, usize), CodecError> {
        let Some(header) = buf.get(..HEADER) else {
            return Err(CodecError::Incomplete);
        };
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        if len > MAX_FRAME {
            return Err(CodecError::TooLarge(len));
        }
        let body = buf
            .get(HEADER..HEADER + len)
            .ok_or(CodecError::Incomplete)?;
        let mut payload = Vec::new();
        ZlibDecoder::new(body).read_to_end(&mut payload)?;
        Ok((payload, HEADER + len))
    }
}

#[cfg(test)]
mod tests {
    use super::client::{CodecError, decode};
    use super::*;

    #[test]
    fn frames_carry_their_length() {
        let json = br#"{"players":[{"entityID":"x","worldX":3}]}"#;
        let frame = encode(json).unwrap();
        let len = u32::from_be_bytes(frame[..4].try_into().unwrap()) as usize;
        assert_eq!(len, frame.len() - 4);

        let mut stream = frame.clone();
        stream.extend_from_slice(&encode(b"pong").unwrap());
        let (first, used) = decode(&stream).unwrap();
        assert_eq!(first, json);
        let (second, _) = decode(&stream[used..]).unwrap();
        assert_eq!(second, b"pong");
    }

    #[test]
    fn repetitive_payloads_shrink() {
        let payload = "{\"worldX\":1}".repeat(200);
        assert!(encode(payload.as_bytes()).unwrap().len() < payload.len() / 4);
    }

    #[test]
    fn partial_frames_are_incomplete() {
        let frame = encode(b"hello").unwrap();
        assert!(matches!(decode(&frame[..2]), Err(CodecError::Incomplete)));
        assert!(matches!(decode(&frame[..frame.len() - 1]), Err(CodecError::Incomplete)));
    }

    #[test]
    fn oversized_header_is_rejected() {
        let frame = u32::MAX.to_be_bytes();
        assert!(matches!(decode(&frame), Err(CodecError::TooLarge(_))));
    }
}
