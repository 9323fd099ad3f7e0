use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use flate2::read::{DeflateDecoder, MultiGzDecoder};

const MAX_LAYERS: usize = 10;

/// Compression layer recognised from leading magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// gzip, including BGZF and concatenated members.
    Gzip,
    /// ZIP archive; only the first entry is read.
    Zip,
}

impl Layer {
    pub fn detect(buf: &[u8]) -> Option<Self> {
        match buf {
            [0x1f, 0x8b, ..] => Some(Self::Gzip),
            [b'P', b'K', 0x03, 0x04, ..] => Some(Self::Zip),
            _ => None,
        }
    }
}

/// Opens a VCF, peeling off gzip/BGZF/ZIP layers regardless of extension.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file =
        File::open(path).with_context(|| format!("failed to open input {}", path.display()))?;
    unwrap_layers(Box::new(BufReader::new(file)))
        .with_context(|| format!("failed to decode input {}", path.display()))
}

/// Peels nested compression off an already open stream.
pub fn unwrap_layers(mut reader: Box<dyn BufRead + Send>) -> Result<Box<dyn BufRead + Send>> {
    for _ in 0..MAX_LAYERS {
        let layer = Layer::detect(reader.fill_buf()?);
        reader = match layer {
            Some(Layer::Gzip) => {
                tracing::debug!("input has a gzip/BGZF layer");
                Box::new(BufReader::new(MultiGzDecoder::new(reader)))
            }
            Some(Layer::Zip) => {
                tracing::debug!("input has a ZIP layer");
                Box::new(BufReader::new(first_zip_entry(reader)?))
            }
            None => return Ok(reader),
        };
    }
    bail!("more than {MAX_LAYERS} nested compression layers");
}

/// Streams the first entry of a ZIP archive from its local file header.
fn first_zip_entry(mut reader: Box<dyn BufRead + Send>) -> Result<Box<dyn Read + Send>> {
    let mut header = [0u8; 30];
    reader
        .read_exact(&mut header)
        .context("truncated ZIP local file header")?;

    let le16 = |at: usize| u16::from_le_bytes([header[at], header[at + 1]]);
    let flags = le16(6);
    let method = le16(8);
    let compressed_size = u32::from_le_bytes([header[18], header[19], header[20], header[21]]);
    let skip = u64::from(le16(26)) + u64::from(le16(28));

    // File name and extra field; the stream is not seekable.
    io::copy(&mut reader.by_ref().take(skip), &mut io::sink())?;

    let has_data_descriptor = flags & 0x0008 != 0;
    match method {
        8 => Ok(Box::new(DeflateDecoder::new(reader))),
        0 if has_data_descriptor => {
            tracing::warn!("stored ZIP entry without size; reading to end of stream");
            Ok(Box::new(reader))
        }
        0 => Ok(Box::new(reader.take(u64::from(compressed_size)))),
        other => bail!("unsupported ZIP compression method {other}"),
    }
}
