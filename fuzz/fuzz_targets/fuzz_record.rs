#![no_main]

use libfuzzer_sys::fuzz_target;
use vcf_missing::{Injector, MissingnessModel, record::Record};

fuzz_target!(|data: &[u8]| {
    let Some((&samples, rest)) = data.split_first() else {
        return;
    };
    let num_samples = usize::from(samples % 16);
    let line = String::from_utf8_lossy(rest).into_owned();

    let Ok(mut record) = Record::parse(line, 1, num_samples) else {
        return;
    };

    let model = MissingnessModel {
        record_probability: 1.0,
        sample_fraction: 1.0,
        ..Default::default()
    };
    let mut injector = Injector::new(model, num_samples, 0).unwrap();
    injector.process(&mut record);

    // Blanking never changes the column count.
    let mut out = Vec::new();
    record.write_to(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let columns = text.trim_end_matches(&['\n', '\r'][..]).split('\t').count();
    assert_eq!(columns, 9 + num_samples);
});
