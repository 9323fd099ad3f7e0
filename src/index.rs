use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use noodles::{
    csi::{self, BinningIndex, binning_index::ReferenceSequence as _},
    tabix, vcf,
};

/// Builds a tabix index for a finished, coordinate-sorted BGZF VCF.
pub fn write_tabix_index(path: &Path) -> Result<PathBuf> {
    let index = vcf::fs::index(path)
        .with_context(|| format!("failed to index {}", path.display()))?;
    let index_path = tabix_path(path);
    tabix::fs::write(&index_path, &index)
        .with_context(|| format!("failed to write index {}", index_path.display()))?;
    Ok(index_path)
}

/// Record count taken from a `.tbi` or `.csi` index next to `path`.
///
/// Returns `None` when no index exists or it carries no record metadata.
pub fn indexed_record_count(path: &Path) -> Option<u64> {
    let tbi = tabix_path(path);
    if tbi.exists() {
        let index = tabix::fs::read(&tbi).ok()?;
        return sum_counts(
            index
                .reference_sequences()
                .iter()
                .filter_map(|reference_sequence| reference_sequence.metadata())
                .map(|m| m.mapped_record_count() + m.unmapped_record_count()),
            index.unplaced_unmapped_record_count(),
        );
    }

    let csi_path = with_suffix(path, "csi");
    if csi_path.exists() {
        let index = csi::fs::read(&csi_path).ok()?;
        return sum_counts(
            index
                .reference_sequences()
                .iter()
                .filter_map(|reference_sequence| reference_sequence.metadata())
                .map(|m| m.mapped_record_count() + m.unmapped_record_count()),
            index.unplaced_unmapped_record_count(),
        );
    }

    None
}

fn sum_counts<I>(per_reference: I, unplaced: Option<u64>) -> Option<u64>
where
    I: Iterator<Item = u64>,
{
    let mut total = unplaced.unwrap_or(0);
    let mut seen = false;
    for count in per_reference {
        total += count;
        seen = true;
    }
    seen.then_some(total)
}

/// Where the tabix index for `path` lives.
pub fn tabix_path(path: &Path) -> PathBuf {
    with_suffix(path, "tbi")
}

/// Deletes a tabix index left next to `path` by an earlier run.
pub fn remove_stale_index(path: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(tabix_path(path)) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_appended() {
        assert_eq!(
            with_suffix(Path::new("/tmp/out.vcf.gz"), "tbi"),
            PathBuf::from("/tmp/out.vcf.gz.tbi")
        );
    }

    #[test]
    fn counts_need_reference_metadata() {
        assert_eq!(sum_counts(std::iter::empty(), Some(3)), None);
        assert_eq!(sum_counts([4, 5].into_iter(), Some(1)), Some(10));
        assert_eq!(sum_counts([4].into_iter(), None), Some(4));
    }

    #[test]
    fn stale_index_is_removed_once() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.vcf.gz");
        std::fs::write(tabix_path(&output), b"stale").unwrap();

        assert!(remove_stale_index(&output).unwrap());
        assert!(!tabix_path(&output).exists());
        assert!(!remove_stale_index(&output).unwrap());
    }

    #[test]
    fn written_index_reports_record_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.vcf.gz");
        let mut text = String::from(
            "##fileformat=VCFv4.2\n##contig=<ID=1,length=1000>\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tA\n",
        );
        for pos in 1..=7 {
            text.push_str(&format!("1\t{pos}\t.\tA\tG\t.\tPASS\t.\tGT\t0/1\n"));
        }
        let mut writer = noodles::bgzf::Writer::new(std::fs::File::create(&path).unwrap());
        std::io::Write::write_all(&mut writer, text.as_bytes()).unwrap();
        writer.finish().unwrap();

        assert_eq!(write_tabix_index(&path).unwrap(), tabix_path(&path));
        assert_eq!(indexed_record_count(&path), Some(7));
    }

    #[test]
    fn missing_index_has_no_count() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(indexed_record_count(&dir.path().join("in.vcf.gz")), None);
    }
}
