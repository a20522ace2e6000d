use std::io::{Read, Write};
use std::string::FromUtf8Error;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use thiserror::Error;

const FRAME_VERSION: u8 = 1;
/// Largest frame either side accepts: the version byte, three length
/// prefixes and the field bytes together.
pub const MAX_FRAME_LEN: usize = 8 * 1024 * 1024;
const FRAME_OVERHEAD: usize = 1 + 3 * 4;

/// The three editor buffers, in pane order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceBundle {
    pub markup: String,
    pub style: String,
    pub script: String,
}

impl SourceBundle {
    const FIELD_NAMES: [&'static str; 3] = ["markup", "style", "script"];

    pub fn new(
        markup: impl Into<String>,
        style: impl Into<String>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            markup: markup.into(),
            style: style.into(),
            script: script.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.markup.is_empty() && self.style.is_empty() && self.script.is_empty()
    }

    fn fields(&self) -> [&str; 3] {
        [&self.markup, &self.style, &self.script]
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("token is not valid url-safe base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("token payload failed to inflate: {0}")]
    Inflate(#[from] std::io::Error),

    #[error("token payload exceeds the 8 MiB limit")]
    TooLarge,

    #[error("unsupported frame version {0}")]
    UnsupportedVersion(u8),

    #[error("frame truncated while reading {0}")]
    Truncated(&'static str),

    #[error("field is not valid utf-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("{0} unexpected bytes after the last field")]
    TrailingBytes(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{0} field does not fit a 32-bit length prefix")]
    FieldTooLong(&'static str),

    #[error("bundle needs a {0} byte frame, over the 8 MiB limit")]
    TooLarge(usize),
}

/// Packs a bundle into a token safe to use as a single URL path segment.
///
/// Bundles whose frame would exceed [`MAX_FRAME_LEN`] are refused, so every
/// token produced here is accepted by [`decode`].
pub fn encode(bundle: &SourceBundle) -> Result<String, EncodeError> {
    let mut frame_len = FRAME_OVERHEAD;
    let mut prefixes = [0u32; 3];
    for ((name, field), prefix) in SourceBundle::FIELD_NAMES
        .into_iter()
        .zip(bundle.fields())
        .zip(&mut prefixes)
    {
        *prefix = u32::try_from(field.len()).map_err(|_| EncodeError::FieldTooLong(name))?;
        frame_len = frame_len.saturating_add(field.len());
    }
    if frame_len > MAX_FRAME_LEN {
        return Err(EncodeError::TooLarge(frame_len));
    }

    let mut frame = Vec::with_capacity(frame_len);
    frame.push(FRAME_VERSION);
    for (field, prefix) in bundle.fields().into_iter().zip(prefixes) {
        frame.extend_from_slice(&prefix.to_le_bytes());
        frame.extend_from_slice(field.as_bytes());
    }

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    let compressed = encoder
        .write_all(&frame)
        .and_then(|()| encoder.finish())
        .unwrap_or_else(|err| {
            // Only reachable if the in-memory sink refuses a write.
            tracing::error!("deflate into memory failed: {err}");
            Vec::new()
        });
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

pub fn decode(token: &str) -> Result<SourceBundle, DecodeError> {
    let compressed = URL_SAFE_NO_PAD.decode(token.trim())?;

    let mut frame = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .take(MAX_FRAME_LEN as u64 + 1)
        .read_to_end(&mut frame)?;
    if frame.len() > MAX_FRAME_LEN {
        return Err(DecodeError::TooLarge);
    }

    let mut reader = FrameReader { rest: &frame };
    let version = reader.take(1, "version")?[0];
    if version != FRAME_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }
    let markup = reader.field("markup")?;
    let style = reader.field("style")?;
    let script = reader.field("script")?;
    if !reader.rest.is_empty() {
        return Err(DecodeError::TrailingBytes(reader.rest.len()));
    }

    Ok(SourceBundle {
        markup,
        style,
        script,
    })
}

/// Decodes `token`, falling back to the empty bundle on any failure.
pub fn decode_or_empty(token: &str) -> SourceBundle {
    match decode(token) {
        Ok(bundle) => bundle,
        Err(err) => {
            tracing::warn!("discarding unreadable url token: {err}");
            SourceBundle::default()
        }
    }
}

struct FrameReader<'a> {
    rest: &'a [u8],
}

impl<'a> FrameReader<'a> {
    fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.rest.len() < len {
            return Err(DecodeError::Truncated(what));
        }
        let (head, tail) = self.rest.split_at(len);
        self.rest = tail;
        Ok(head)
    }

    fn field(&mut self, what: &'static str) -> Result<String, DecodeError> {
        let mut len = [0u8; 4];
        len.copy_from_slice(self.take(4, what)?);
        let bytes = self.take(u32::from_le_bytes(len) as usize, what)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}
