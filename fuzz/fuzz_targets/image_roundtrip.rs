//! Any buffer the decoder accepts re-encodes to a buffer that decodes to the
//! same values.

#![no_main]

use imagebytes_proto::{Encoder, decode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(array) = decode(data) else {
        return;
    };
    let Ok(bytes) = Encoder::new(&array).encode_auto() else {
        panic!("decoded array failed to re-encode");
    };
    let Ok(again) = decode(&bytes) else {
        panic!("re-encoded buffer rejected");
    };

    assert_eq!(again.kind(), array.kind());
    assert_eq!(again.shape(), array.shape());
    assert!(again.numbers().zip(array.numbers()).all(|(a, b)| match (a, b) {
        (imagebytes_proto::Number::Float(x), imagebytes_proto::Number::Float(y)) => {
            x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan())
        },
        (a, b) => a == b,
    }));
});
