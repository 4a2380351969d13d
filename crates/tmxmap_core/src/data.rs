//! Layer payload decoding.
//!
//! Tile layers store their GIDs either as CSV text or as a base64 stream of
//! little-endian `u32`s, optionally compressed with gzip or zlib.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::read::{GzDecoder, ZlibDecoder};

use crate::error::{TmxError, TmxResult};
use crate::gid::Gid;

/// Text encoding of a `<data>` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Csv,
    Base64,
}

impl FromStr for Encoding {
    type Err = TmxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Encoding::Csv),
            "base64" => Ok(Encoding::Base64),
            other => Err(TmxError::UnsupportedFeature(format!("data encoding '{other}'"))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Csv => "csv",
            Encoding::Base64 => "base64",
        })
    }
}

/// Compression applied to a base64 payload before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Zlib,
}

impl FromStr for Compression {
    type Err = TmxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gzip" => Ok(Compression::Gzip),
            "zlib" => Ok(Compression::Zlib),
            other => Err(TmxError::UnsupportedFeature(format!("data compression '{other}'"))),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Compression::Gzip => "gzip",
            Compression::Zlib => "zlib",
        })
    }
}

/// Decode a payload given the raw `encoding` / `compression` attribute values.
///
/// # Errors
///
/// `UnsupportedFeature` for unknown encodings or compressions, `MalformedPayload`
/// when the payload itself cannot be decoded.
pub fn unpack(text: &str, encoding: &str, compression: Option<&str>) -> TmxResult<Vec<u32>> {
    let encoding = encoding.parse()?;
    let compression = compression.map(str::parse).transpose()?;
    unpack_with(text, encoding, compression)
}

/// Typed variant of [`unpack`].
pub fn unpack_with(
    text: &str,
    encoding: Encoding,
    compression: Option<Compression>,
) -> TmxResult<Vec<u32>> {
    match (encoding, compression) {
        (Encoding::Csv, None) => decode_csv(text),
        (Encoding::Csv, Some(compression)) => Err(TmxError::UnsupportedFeature(format!(
            "{compression} compression of csv data"
        ))),
        (Encoding::Base64, compression) => {
            let bytes = decode_base64(text)?;
            let bytes = match compression {
                None => bytes,
                Some(compression) => decompress(&bytes, compression)?,
            };
            bytes_to_gids(&bytes)
        }
    }
}

fn decode_csv(text: &str) -> TmxResult<Vec<u32>> {
    text.split(',')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(|cell| {
            cell.parse::<u32>()
                .map_err(|err| TmxError::MalformedPayload(format!("csv cell '{cell}': {err}")))
        })
        .collect()
}

fn decode_base64(text: &str) -> TmxResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|err| TmxError::MalformedPayload(format!("base64: {err}")))
}

fn decompress(bytes: &[u8], compression: Compression) -> TmxResult<Vec<u8>> {
    let mut out = Vec::new();
    let result = match compression {
        Compression::Gzip => GzDecoder::new(bytes).read_to_end(&mut out),
        Compression::Zlib => ZlibDecoder::new(bytes).read_to_end(&mut out),
    };
    result.map_err(|err| TmxError::MalformedPayload(format!("{compression} stream: {err}")))?;
    Ok(out)
}

fn bytes_to_gids(bytes: &[u8]) -> TmxResult<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(TmxError::MalformedPayload(format!(
            "{} bytes is not a whole number of 32-bit gids",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Split a flat gid sequence into `height` rows of `width` gids.
///
/// # Errors
///
/// `MalformedLayer` when the sequence length is not exactly `width * height`.
pub fn reshape(layer: &str, gids: Vec<u32>, width: u32, height: u32) -> TmxResult<Vec<Vec<Gid>>> {
    let expected = width as usize * height as usize;
    if gids.len() != expected {
        return Err(TmxError::MalformedLayer {
            layer: layer.to_string(),
            expected,
            actual: gids.len(),
        });
    }
    if width == 0 {
        return Ok(vec![Vec::new(); height as usize]);
    }
    Ok(gids
        .chunks_exact(width as usize)
        .map(|row| row.iter().copied().map(Gid).collect())
        .collect())
}
