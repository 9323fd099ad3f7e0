use std::io::{self, BufRead, Write};

use crate::error::{InjectionError, MissingHeaderKind};

/// Number of fixed descriptive columns before the first sample column.
pub const FIXED_COLUMNS: usize = 9;

const COLUMN_LINE_PREFIX: &str = "#CHROM";

/// Metadata lines and the sample-declaration row of a VCF, kept verbatim.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
    lines: Vec<String>,
    sample_names: Vec<String>,
}

impl Header {
    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    pub fn num_samples(&self) -> usize {
        self.sample_names.len()
    }

    /// Number of input lines the header occupies.
    pub fn line_count(&self) -> u64 {
        self.lines.len() as u64
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for line in &self.lines {
            writer.write_all(line.as_bytes())?;
        }
        Ok(())
    }
}

/// Reads header lines up to and including the `#CHROM` row.
///
/// The reader is left positioned at the first data line.
pub fn read_header<R: BufRead>(reader: &mut R) -> Result<Header, InjectionError> {
    let mut lines = Vec::new();
    let mut buf = String::new();

    loop {
        buf.clear();
        let line_number = lines.len() as u64 + 1;
        if reader.read_line(&mut buf)? == 0 {
            return Err(MissingHeaderKind::NoColumnLine { line: line_number }.into());
        }

        if buf.starts_with(COLUMN_LINE_PREFIX) {
            let sample_names = parse_sample_names(&buf);
            if sample_names.is_empty() {
                return Err(MissingHeaderKind::NoSamples { line: line_number }.into());
            }
            lines.push(std::mem::take(&mut buf));
            return Ok(Header {
                lines,
                sample_names,
            });
        } else if buf.starts_with("##") {
            lines.push(buf.clone());
        } else {
            return Err(MissingHeaderKind::NoColumnLine { line: line_number }.into());
        }
    }
}

fn parse_sample_names(line: &str) -> Vec<String> {
    line.trim_end_matches(&['\n', '\r'][..])
        .split('\t')
        .skip(FIXED_COLUMNS)
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "##fileformat=VCFv4.2\n##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tA\tB\tC\n";

    #[test]
    fn reads_samples_in_order() {
        let data = format!("{HEADER}1\t10\t.\tA\tC\t.\t.\t.\tGT\t0/1\t0/0\t1/1\n");
        let mut reader = data.as_bytes();
        let header = read_header(&mut reader).unwrap();
        assert_eq!(header.sample_names(), ["A", "B", "C"]);
        assert_eq!(header.line_count(), 3);

        let mut rest = String::new();
        reader.read_line(&mut rest).unwrap();
        assert!(rest.starts_with("1\t10\t"));
    }

    #[test]
    fn round_trips_verbatim() {
        let mut reader = HEADER.as_bytes();
        let header = read_header(&mut reader).unwrap();
        let mut out = Vec::new();
        header.write_to(&mut out).unwrap();
        assert_eq!(out, HEADER.as_bytes());
    }

    #[test]
    fn handles_crlf_column_line() {
        let data = "##fileformat=VCFv4.2\r\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2\r\n";
        let header = read_header(&mut data.as_bytes()).unwrap();
        assert_eq!(header.sample_names(), ["S1", "S2"]);
    }

    #[test]
    fn rejects_data_before_column_line() {
        let data = "##fileformat=VCFv4.2\n1\t10\t.\tA\tC\t.\t.\t.\tGT\t0/1\n";
        let err = read_header(&mut data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            InjectionError::MissingHeader(MissingHeaderKind::NoColumnLine { line: 2 })
        ));
    }

    #[test]
    fn rejects_empty_input() {
        let err = read_header(&mut &b""[..]).unwrap_err();
        assert!(matches!(
            err,
            InjectionError::MissingHeader(MissingHeaderKind::NoColumnLine { line: 1 })
        ));
    }

    #[test]
    fn rejects_sites_only_header() {
        let data = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        let err = read_header(&mut data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            InjectionError::MissingHeader(MissingHeaderKind::NoSamples { line: 2 })
        ));
    }
}
