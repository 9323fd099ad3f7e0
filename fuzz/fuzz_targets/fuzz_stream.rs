#![no_main]

use libfuzzer_sys::fuzz_target;
use vcf_missing::{MissingnessModel, inject_missing};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes give an error or a line-aligned copy, never a panic.
    let mut out = Vec::new();
    if let Ok(summary) = inject_missing(data, &mut out, 42, MissingnessModel::default()) {
        assert!(summary.blanked_genotypes <= summary.evaluated_genotypes);
        assert_eq!(
            out.iter().filter(|&&b| b == b'\n').count(),
            data.iter().filter(|&&b| b == b'\n').count()
        );
    }
});
