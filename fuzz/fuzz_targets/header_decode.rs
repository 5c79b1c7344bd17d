//! Header decoding never panics, and accepted headers re-encode to the same
//! defining fields.

#![no_main]

use imagebytes_proto::{ImageHeader, decode_header, encode_header};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(meta) = decode_header(data) else {
        return;
    };

    let bytes = encode_header(&meta);
    let Ok(again) = decode_header(&bytes) else {
        panic!("re-encoded header rejected: {meta:?}");
    };

    assert_eq!(again.error_number, meta.error_number);
    assert_eq!(again.logical_kind, meta.logical_kind);
    assert_eq!(again.wire_kind, meta.wire_kind);
    assert_eq!(again.shape(), meta.shape());
    assert_eq!(again.data_start as usize, ImageHeader::SIZE);
});
