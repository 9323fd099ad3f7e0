use std::{
    fmt,
    io::{self, BufRead, Write},
    ops::Range,
};

use crate::error::InjectionError;
use crate::header::FIXED_COLUMNS;

/// Genotype token written in place of a blanked call.
pub const MISSING_GENOTYPE: &str = "./.";

const FORMAT_COLUMN: usize = FIXED_COLUMNS - 1;
const GENOTYPE_KEY: &str = "GT";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum LineEnding {
    Lf,
    CrLf,
    None,
}

impl LineEnding {
    fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::None => "",
        }
    }
}

/// A single VCF data line viewed as tab-separated columns.
///
/// Blanking a genotype only marks the sample; the rewritten GT subfield is
/// produced when the record is written, so every other byte of the line is
/// emitted exactly as it was read.
#[derive(Clone, Debug)]
pub struct Record {
    text: String,
    ending: LineEnding,
    columns: Vec<Range<usize>>,
    gt_position: Option<usize>,
    blanked: Vec<bool>,
    line: u64,
}

impl Record {
    /// Parses one data line, including its terminator if present.
    pub fn parse(mut text: String, line: u64, num_samples: usize) -> Result<Self, InjectionError> {
        let ending = if text.ends_with("\r\n") {
            text.truncate(text.len() - 2);
            LineEnding::CrLf
        } else if text.ends_with('\n') {
            text.truncate(text.len() - 1);
            LineEnding::Lf
        } else {
            LineEnding::None
        };

        let expected = FIXED_COLUMNS + num_samples;
        let mut columns = Vec::with_capacity(expected);
        let mut start = 0;
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\t' {
                columns.push(start..i);
                start = i + 1;
            }
        }
        columns.push(start..text.len());

        if columns.len() != expected {
            return Err(InjectionError::MalformedRecord {
                line,
                expected,
                found: columns.len(),
            });
        }

        let gt_position = text[columns[FORMAT_COLUMN].clone()]
            .split(':')
            .position(|key| key == GENOTYPE_KEY);

        Ok(Self {
            text,
            ending,
            columns,
            gt_position,
            blanked: vec![false; num_samples],
            line,
        })
    }

    /// 1-based line number in the input stream.
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn num_samples(&self) -> usize {
        self.blanked.len()
    }

    pub fn column(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|range| &self.text[range.clone()])
    }

    /// The genotype token of a sample as it will be written.
    pub fn genotype(&self, sample: usize) -> Option<&str> {
        if *self.blanked.get(sample)? {
            return Some(MISSING_GENOTYPE);
        }
        self.original_genotype(sample)
    }

    fn original_genotype(&self, sample: usize) -> Option<&str> {
        let position = self.gt_position?;
        self.column(FIXED_COLUMNS + sample)?.split(':').nth(position)
    }

    /// Replaces the sample's GT with the missing call.
    ///
    /// Returns `false` when nothing changed: the sample has no GT subfield, or
    /// its call is already missing.
    pub fn blank_genotype(&mut self, sample: usize) -> bool {
        match self.genotype(sample) {
            Some(gt) if gt != MISSING_GENOTYPE => {
                self.blanked[sample] = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.blanked.iter().any(|&b| b)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write!(writer, "{self}{}", self.ending.as_str())
    }

    fn fmt_blanked_sample(&self, f: &mut fmt::Formatter<'_>, column: &str) -> fmt::Result {
        for (i, field) in column.split(':').enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            if Some(i) == self.gt_position {
                f.write_str(MISSING_GENOTYPE)?;
            } else {
                f.write_str(field)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str("\t")?;
            }
            let column = &self.text[range.clone()];
            match i.checked_sub(FIXED_COLUMNS) {
                Some(sample) if self.blanked[sample] => self.fmt_blanked_sample(f, column)?,
                _ => f.write_str(column)?,
            }
        }
        Ok(())
    }
}

/// Iterator over the data lines following a VCF header.
pub struct Reader<R> {
    inner: R,
    line: u64,
    num_samples: usize,
}

impl<R> Reader<R>
where
    R: BufRead,
{
    /// `lines_consumed` is the number of lines already read (the header), so
    /// errors report positions in the original input.
    pub fn new(inner: R, num_samples: usize, lines_consumed: u64) -> Self {
        Self {
            inner,
            line: lines_consumed,
            num_samples,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> Iterator for Reader<R>
where
    R: BufRead,
{
    type Item = Result<Record, InjectionError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = String::new();
        match self.inner.read_line(&mut buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line += 1;
                Some(Record::parse(buf, self.line, self.num_samples))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "chr1\t100\trs1\tA\tG\t50\tPASS\tDP=10\tGT:DP\t0/1:7\t1|1:3\t./.:0\n";

    #[test]
    fn parses_columns_and_genotypes() {
        let record = Record::parse(LINE.to_string(), 5, 3).unwrap();
        assert_eq!(record.line(), 5);
        assert_eq!(record.column(0), Some("chr1"));
        assert_eq!(record.column(8), Some("GT:DP"));
        assert_eq!(record.genotype(0), Some("0/1"));
        assert_eq!(record.genotype(1), Some("1|1"));
        assert_eq!(record.genotype(2), Some("./."));
        assert_eq!(record.genotype(3), None);
    }

    #[test]
    fn unmodified_record_writes_verbatim() {
        let record = Record::parse(LINE.to_string(), 1, 3).unwrap();
        let mut out = Vec::new();
        record.write_to(&mut out).unwrap();
        assert_eq!(out, LINE.as_bytes());
        assert!(!record.is_modified());
    }

    #[test]
    fn blanking_rewrites_only_gt_subfield() {
        let mut record = Record::parse(LINE.to_string(), 1, 3).unwrap();
        assert!(record.blank_genotype(1));
        assert!(record.is_modified());
        assert_eq!(
            record.to_string(),
            "chr1\t100\trs1\tA\tG\t50\tPASS\tDP=10\tGT:DP\t0/1:7\t./.:3\t./.:0"
        );
    }

    #[test]
    fn already_missing_call_is_not_counted() {
        let mut record = Record::parse(LINE.to_string(), 1, 3).unwrap();
        assert!(!record.blank_genotype(2));
        assert!(record.blank_genotype(0));
        assert!(!record.blank_genotype(0));
    }

    #[test]
    fn gt_not_first_in_format() {
        let line = "1\t5\t.\tC\tT\t.\t.\t.\tDP:GT\t12:0/0\t4\n";
        let mut record = Record::parse(line.to_string(), 1, 2).unwrap();
        assert!(record.blank_genotype(0));
        // Truncated sample column has no GT subfield to blank.
        assert!(!record.blank_genotype(1));
        assert_eq!(record.to_string(), "1\t5\t.\tC\tT\t.\t.\t.\tDP:GT\t12:./.\t4");
    }

    #[test]
    fn format_without_gt_is_left_alone() {
        let line = "1\t5\t.\tC\tT\t.\t.\t.\tDP\t12\t4";
        let mut record = Record::parse(line.to_string(), 1, 2).unwrap();
        assert!(!record.blank_genotype(0));
        assert_eq!(record.to_string(), line);
    }

    #[test]
    fn preserves_crlf_and_missing_terminator() {
        let crlf = "1\t5\t.\tC\tT\t.\t.\t.\tGT\t0/1\r\n";
        let mut record = Record::parse(crlf.to_string(), 1, 1).unwrap();
        record.blank_genotype(0);
        let mut out = Vec::new();
        record.write_to(&mut out).unwrap();
        assert_eq!(out, b"1\t5\t.\tC\tT\t.\t.\t.\tGT\t./.\r\n");

        let bare = "1\t5\t.\tC\tT\t.\t.\t.\tGT\t0/1";
        let record = Record::parse(bare.to_string(), 1, 1).unwrap();
        let mut out = Vec::new();
        record.write_to(&mut out).unwrap();
        assert_eq!(out, bare.as_bytes());
    }

    #[test]
    fn wrong_column_count_is_malformed() {
        let err = Record::parse(LINE.to_string(), 12, 5).unwrap_err();
        assert!(matches!(
            err,
            InjectionError::MalformedRecord {
                line: 12,
                expected: 14,
                found: 12
            }
        ));

        let err = Record::parse(LINE.to_string(), 3, 2).unwrap_err();
        assert!(matches!(err, InjectionError::MalformedRecord { found: 12, .. }));
    }

    #[test]
    fn reader_numbers_lines_after_header() {
        let data = "1\t1\t.\tA\tC\t.\t.\t.\tGT\t0/1\n1\t2\t.\tA\tC\t.\t.\t.\tGT\n";
        let mut reader = Reader::new(data.as_bytes(), 1, 4);
        let first = reader.next().unwrap().unwrap();
        assert_eq!(first.line(), 5);
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(err, InjectionError::MalformedRecord { line: 6, .. }));
        assert!(reader.next().is_none());
    }
}
