//! Full decoding of arbitrary bytes returns `Ok` or `Err`, never panics.

#![no_main]

use imagebytes_proto::{CodecConfig, Decoder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let decoder = Decoder::new(CodecConfig { max_payload_len: 1 << 20, ..CodecConfig::default() });
    if let Ok(frame) = decoder.decode_image(data) {
        assert_eq!(frame.array.shape(), frame.metadata.shape().as_slice());
    }
});
