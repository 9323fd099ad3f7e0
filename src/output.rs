use std::{
    ffi::OsString,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use noodles::bgzf;

/// Output compression, chosen from the output path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCompression {
    Plain,
    Bgzf,
}

impl OutputCompression {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz") => {
                Self::Bgzf
            }
            _ => Self::Plain,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Plain => "vcf",
            Self::Bgzf => "vcf.gz",
        }
    }
}

enum Inner {
    Plain(BufWriter<File>),
    Bgzf(BufWriter<bgzf::Writer<File>>),
}

/// Writable VCF destination that only appears at its final path once
/// [`VcfSink::commit`] succeeds.
///
/// Data is written to `<path>.partial`; a failed or abandoned run leaves that
/// file behind and never creates `<path>` itself.
pub struct VcfSink {
    inner: Inner,
    compression: OutputCompression,
    partial: PathBuf,
    target: PathBuf,
}

impl VcfSink {
    pub fn create(path: &Path) -> Result<Self> {
        let compression = OutputCompression::from_path(path);
        let partial = partial_path(path);
        let file = File::create(&partial)
            .with_context(|| format!("failed to create output {}", partial.display()))?;

        let inner = match compression {
            OutputCompression::Plain => Inner::Plain(BufWriter::new(file)),
            OutputCompression::Bgzf => Inner::Bgzf(BufWriter::new(bgzf::Writer::new(file))),
        };

        Ok(Self {
            inner,
            compression,
            partial,
            target: path.to_path_buf(),
        })
    }

    pub fn compression(&self) -> OutputCompression {
        self.compression
    }

    /// Flushes every layer and moves the finished file into place.
    pub fn commit(self) -> Result<PathBuf> {
        let file = match self.inner {
            Inner::Plain(writer) => writer.into_inner().map_err(|e| e.into_error())?,
            Inner::Bgzf(writer) => writer
                .into_inner()
                .map_err(|e| e.into_error())?
                .finish()
                .context("failed to finish BGZF stream")?,
        };
        file.sync_all()?;
        drop(file);

        fs::rename(&self.partial, &self.target).with_context(|| {
            format!(
                "failed to move {} to {}",
                self.partial.display(),
                self.target.display()
            )
        })?;
        Ok(self.target)
    }
}

impl Write for VcfSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Plain(writer) => writer.write(buf),
            Inner::Bgzf(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            Inner::Plain(writer) => writer.flush(),
            Inner::Bgzf(writer) => writer.flush(),
        }
    }
}

pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}
