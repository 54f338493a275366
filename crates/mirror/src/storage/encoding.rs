//! On-disk encodings for stored messages

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// How a stored message is written to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Raw message bytes, no suffix
    Plain,
    /// gzip, `.gz` suffix
    #[default]
    Gzip,
    /// zstd, `.zst` suffix
    Zstd,
}

impl Encoding {
    /// Every encoding, compressed ones first
    pub const ALL: [Encoding; 3] = [Encoding::Gzip, Encoding::Zstd, Encoding::Plain];

    /// zstd level: good balance of speed vs compression
    const ZSTD_LEVEL: i32 = 3;

    /// Compression marker appended to the file name
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Encoding::Plain => None,
            Encoding::Gzip => Some("gz"),
            Encoding::Zstd => Some("zst"),
        }
    }

    /// File name for an entry stored under this encoding
    pub fn file_name(&self, stem: &str) -> String {
        match self.extension() {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem.to_string(),
        }
    }

    /// Forms to probe when looking up an entry: compressed forms first
    /// (`self` leading among them), plain last
    pub fn probe_order(&self) -> Vec<Encoding> {
        let mut order = Self::ALL.to_vec();
        order.sort_by_key(|e| (*e == Encoding::Plain, e != self));
        order
    }

    pub fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        match self {
            Encoding::Plain => Ok(raw.to_vec()),
            Encoding::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(raw).context("Failed to gzip message")?;
                encoder.finish().context("Failed to gzip message")
            }
            Encoding::Zstd => {
                zstd::encode_all(raw, Self::ZSTD_LEVEL).context("Failed to compress message")
            }
        }
    }

    pub fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut decoded = Vec::new();
        match self {
            Encoding::Plain => decoded.extend_from_slice(data),
            Encoding::Gzip => {
                GzDecoder::new(data)
                    .read_to_end(&mut decoded)
                    .context("Failed to gunzip message")?;
            }
            Encoding::Zstd => {
                zstd::Decoder::new(data)?
                    .read_to_end(&mut decoded)
                    .context("Failed to decompress message")?;
            }
        }
        Ok(decoded)
    }
}
