//! Minimal PNG chunk container.
//!
//! Only the chunk structure is interpreted: the 8-byte signature followed by
//! `length | type | data | crc` records. Pixel data is never decoded, so any
//! well-formed PNG round trips byte for byte apart from the chunks we edit.
//!
//! The side channel only needs "bytes with keyed text chunks", captured by
//! [`TextChunks`]; other container formats with equivalent chunk support can
//! implement it too.

use crate::error::RpngError;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::{Compression, Crc};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

pub const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const IEND: [u8; 4] = *b"IEND";

/// Which text chunk type carries a payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// `tEXt`: uncompressed Latin-1 text
    #[default]
    Text,
    /// `zTXt`: zlib-compressed Latin-1 text
    Compressed,
}

impl ChunkKind {
    pub fn tag(self) -> [u8; 4] {
        match self {
            ChunkKind::Text => *b"tEXt",
            ChunkKind::Compressed => *b"zTXt",
        }
    }

    pub fn from_tag(tag: &[u8; 4]) -> Option<Self> {
        match tag {
            b"tEXt" => Some(ChunkKind::Text),
            b"zTXt" => Some(ChunkKind::Compressed),
            _ => None,
        }
    }
}

/// Keyed text chunks inside a binary container.
pub trait TextChunks {
    /// The text stored under `keyword`, if any, with the chunk kind it came from.
    fn text(&self, keyword: &str) -> Option<Result<(ChunkKind, String), RpngError>>;

    /// Removes every text chunk stored under `keyword`.
    fn remove_text(&mut self, keyword: &str);

    /// Adds a text chunk immediately before the container's terminal chunk.
    fn push_text(&mut self, keyword: &str, text: &str, kind: ChunkKind)
        -> Result<(), RpngError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub tag: [u8; 4],
    pub data: Vec<u8>,
}

impl Chunk {
    fn keyword(&self) -> Option<&[u8]> {
        ChunkKind::from_tag(&self.tag)?;
        let end = self.data.iter().position(|&b| b == 0)?;
        Some(&self.data[..end])
    }
}

/// A PNG image as an ordered list of chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Png {
    chunks: Vec<Chunk>,
}

impl Png {
    pub fn parse(bytes: &[u8]) -> Result<Self, RpngError> {
        if bytes.len() < SIGNATURE.len() || bytes[..SIGNATURE.len()] != SIGNATURE {
            return Err(RpngError::NotPng);
        }

        let mut chunks = Vec::new();
        let mut offset = SIGNATURE.len();
        while offset < bytes.len() {
            let header = bytes
                .get(offset..offset + 8)
                .ok_or(RpngError::Truncated(offset))?;
            let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
            let tag = [header[4], header[5], header[6], header[7]];
            let data_start = offset + 8;
            let data = bytes
                .get(data_start..data_start + length)
                .ok_or(RpngError::Truncated(offset))?;
            if bytes.len() < data_start + length + 4 {
                return Err(RpngError::Truncated(offset));
            }
            chunks.push(Chunk {
                tag,
                data: data.to_vec(),
            });
            offset = data_start + length + 4;
            if tag == IEND {
                break;
            }
        }

        Ok(Png { chunks })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let size: usize = self.chunks.iter().map(|c| c.data.len() + 12).sum();
        let mut out = Vec::with_capacity(SIGNATURE.len() + size);
        out.extend_from_slice(&SIGNATURE);
        for chunk in &self.chunks {
            out.extend_from_slice(&(chunk.data.len() as u32).to_be_bytes());
            out.extend_from_slice(&chunk.tag);
            out.extend_from_slice(&chunk.data);
            let mut crc = Crc::new();
            crc.update(&chunk.tag);
            crc.update(&chunk.data);
            out.extend_from_slice(&crc.sum().to_be_bytes());
        }
        out
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// A white grayscale image of the given size.
    pub fn blank(width: u32, height: u32) -> Result<Self, RpngError> {
        let mut header = Vec::with_capacity(13);
        header.extend_from_slice(&width.to_be_bytes());
        header.extend_from_slice(&height.to_be_bytes());
        // bit depth 8, grayscale, deflate, adaptive filtering, no interlace
        header.extend_from_slice(&[8, 0, 0, 0, 0]);

        let mut scanlines = Vec::with_capacity((width as usize + 1) * height as usize);
        for _ in 0..height {
            scanlines.push(0);
            scanlines.extend(std::iter::repeat(255u8).take(width as usize));
        }
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&scanlines)?;
        let pixels = encoder.finish()?;

        Ok(Png {
            chunks: vec![
                Chunk {
                    tag: *b"IHDR",
                    data: header,
                },
                Chunk {
                    tag: *b"IDAT",
                    data: pixels,
                },
                Chunk {
                    tag: IEND,
                    data: Vec::new(),
                },
            ],
        })
    }
}

impl TextChunks for Png {
    fn text(&self, keyword: &str) -> Option<Result<(ChunkKind, String), RpngError>> {
        let chunk = self
            .chunks
            .iter()
            .find(|chunk| chunk.keyword() == Some(keyword.as_bytes()))?;
        let kind = ChunkKind::from_tag(&chunk.tag)?;
        let body = &chunk.data[keyword.len() + 1..];
        Some(read_text(kind, body).map(|text| (kind, text)))
    }

    fn remove_text(&mut self, keyword: &str) {
        self.chunks
            .retain(|chunk| chunk.keyword() != Some(keyword.as_bytes()));
    }

    fn push_text(
        &mut self,
        keyword: &str,
        text: &str,
        kind: ChunkKind,
    ) -> Result<(), RpngError> {
        let end = self
            .chunks
            .iter()
            .position(|chunk| chunk.tag == IEND)
            .ok_or(RpngError::MissingEnd)?;

        let mut data = Vec::with_capacity(keyword.len() + text.len() + 2);
        data.extend_from_slice(keyword.as_bytes());
        data.push(0);
        match kind {
            ChunkKind::Text => data.extend_from_slice(text.as_bytes()),
            ChunkKind::Compressed => {
                // compression method 0: zlib
                data.push(0);
                let mut encoder = ZlibEncoder::new(data, Compression::default());
                encoder.write_all(text.as_bytes())?;
                data = encoder.finish()?;
            }
        }

        self.chunks.insert(
            end,
            Chunk {
                tag: kind.tag(),
                data,
            },
        );
        Ok(())
    }
}

fn read_text(kind: ChunkKind, body: &[u8]) -> Result<String, RpngError> {
    let bytes = match kind {
        ChunkKind::Text => body.to_vec(),
        ChunkKind::Compressed => {
            let compressed = body.get(1..).unwrap_or_default();
            let mut inflated = Vec::new();
            ZlibDecoder::new(compressed).read_to_end(&mut inflated)?;
            inflated
        }
    };
    // Latin-1 maps byte-for-byte onto the first 256 code points
    Ok(bytes.into_iter().map(char::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_image_round_trips() {
        let png = Png::blank(4, 3).unwrap();
        let bytes = png.to_bytes();
        assert!(bytes.starts_with(&SIGNATURE));
        assert_eq!(Png::parse(&bytes).unwrap(), png);
    }

    #[test]
    fn rejects_non_png_bytes() {
        assert!(matches!(Png::parse(b"GIF89a"), Err(RpngError::NotPng)));
    }

    #[test]
    fn reports_truncation() {
        let bytes = Png::blank(1, 1).unwrap().to_bytes();
        let cut = &bytes[..bytes.len() - 6];
        assert!(matches!(Png::parse(cut), Err(RpngError::Truncated(_))));
    }

    #[test]
    fn text_chunks_go_before_iend() {
        let mut png = Png::blank(1, 1).unwrap();
        png.push_text("key", "value", ChunkKind::Text).unwrap();
        let tags: Vec<_> = png.chunks().iter().map(|c| c.tag).collect();
        assert_eq!(tags, vec![*b"IHDR", *b"IDAT", *b"tEXt", *b"IEND"]);
    }

    #[test]
    fn compressed_text_is_inflated_on_read() {
        let mut png = Png::blank(1, 1).unwrap();
        png.push_text("key", "a long value", ChunkKind::Compressed)
            .unwrap();
        let png = Png::parse(&png.to_bytes()).unwrap();
        let (kind, text) = png.text("key").unwrap().unwrap();
        assert_eq!(kind, ChunkKind::Compressed);
        assert_eq!(text, "a long value");
    }

    #[test]
    fn crc_matches_reference_value() {
        // every PNG ends with the same IEND CRC
        let bytes = Png::blank(1, 1).unwrap().to_bytes();
        assert_eq!(&bytes[bytes.len() - 4..], &[0xAE, 0x42, 0x60, 0x82]);
    }
}
