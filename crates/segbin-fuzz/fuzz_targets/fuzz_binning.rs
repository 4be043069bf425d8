#![no_main]
use libfuzzer_sys::fuzz_target;

use segbin_core::{BucketConfig, BucketScheme, SizeError};

fuzz_target!(|data: &[u8]| {
    // 2 config bytes, then 8-byte little-endian sizes.
    if data.len() < 10 {
        return;
    }

    let word_size_bits: u32 = [16, 32, 64][usize::from(data[0] % 3)];
    let word = u64::from(word_size_bits / 8);
    let double_exp = 4 + u32::from(data[1] >> 4);
    let config = BucketConfig {
        word_size_bits,
        word_bucket_limit: word * u64::from(data[1] % 16 + 1) * 4,
        double_bucket_limit: 1u64 << double_exp,
        log_subdivisions: 1u64 << ((data[0] >> 2) % 6),
    };

    // Most byte combinations are rejected; that path must not panic either.
    let Ok(scheme) = BucketScheme::new(config) else {
        return;
    };

    let min = scheme.min_chunk_size();
    let max = scheme.max_size();
    for chunk in data[2..].chunks_exact(8) {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(chunk);
        let size = u64::from_le_bytes(raw);

        match scheme.index_of(size) {
            Ok(index) => {
                let low = scheme.size_of(index).expect("index_of yields a valid index");
                assert!(low <= size);
                if let Ok(next) = scheme.size_of(index + 1) {
                    assert!(size < next);
                }
            }
            Err(SizeError::TooSmall { .. }) => assert!(size < min),
            Err(SizeError::TooLarge { .. }) => assert!(size > max),
        }

        if let Ok(index) = scheme.index_for_request(size) {
            let served = scheme.size_of(index).expect("valid index");
            assert!(served >= size);
            if index > 0 {
                assert!(scheme.size_of(index - 1).expect("valid index") < size);
            }
        }

        let saturated = scheme.index_of_saturating(size);
        assert_eq!(saturated.is_err(), size < min);
    }
});
