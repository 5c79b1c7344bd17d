//! Byte-exact wire format checks.

use hex_literal::hex;
use imagebytes_proto::{
    ArrayMetadata, CodecError, ElementKind, Encoder, ImageArray, ImageHeader, Rank, decode,
    encode_as, encode_auto, encode_error, encode_header, read_header, read_payload,
};
use insta::assert_snapshot;
use ndarray::{Array2, Array3};

fn offset_ramp(offset: i32) -> ImageArray {
    ImageArray::from(Array2::from_shape_fn((4, 3), |(i, j)| offset + i as i32 + 10 * j as i32))
}

#[test]
fn header_is_bit_exact() {
    let meta = ArrayMetadata {
        client_transaction_id: 128,
        server_transaction_id: 255,
        ..ArrayMetadata::new(ElementKind::Int32, ElementKind::UInt16, Rank::Three, (4, 3, 3))
    };
    let bytes = encode_header(&meta);

    assert_eq!(bytes.len(), ImageHeader::SIZE);
    assert_snapshot!(
        hex::encode(bytes),
        @"010000000000000080000000ff0000002c000000020000000800000003000000040000000300000003000000"
    );
}

#[test]
fn small_int32_values_pack_as_bytes() {
    let bytes = encode_auto(&offset_ramp(0), 0, 0, 0, "");
    let bytes = bytes.unwrap_or_default();

    assert_eq!(read_payload(&bytes), Ok(&[0, 10, 20, 1, 11, 21, 2, 12, 22, 3, 13, 23][..]));
    assert_snapshot!(
        hex::encode(&bytes),
        @"010000000000000000000000000000002c000000020000000600000002000000040000000300000000000000000a14010b15020c16030d17"
    );
}

#[test]
fn negative_values_pack_as_int16() {
    let bytes = encode_auto(&offset_ramp(-2), 0, 0, 0, "").unwrap_or_default();

    let meta = read_header(&bytes);
    assert_eq!(meta.map(|m| (m.logical_kind, m.wire_kind)), Ok((ElementKind::Int32, ElementKind::Int16)));
    assert_eq!(read_payload(&bytes).map(|p| p.get(..2)), Ok(Some(&[254, 255][..])));
    assert_snapshot!(
        hex::encode(&bytes),
        @"010000000000000000000000000000002c000000020000000100000002000000040000000300000000000000feff08001200ffff0900130000000a00140001000b001500"
    );
}

#[test]
fn decoded_arrays_keep_logical_kind() {
    for offset in [0, -2, 40_000, -40_000] {
        let image = offset_ramp(offset);
        let bytes = encode_auto(&image, 0, 0, 0, "").unwrap_or_default();
        assert_eq!(decode(&bytes), Ok(image));
    }
}

#[test]
fn rank_three_last_axis_fastest() {
    let image = ImageArray::from(Array3::from_shape_fn((3, 4, 3), |(i, j, k)| {
        (k + 10 * j + 100 * i) as u16
    }));
    let bytes = Encoder::new(&image).encode_as(ElementKind::UInt16).unwrap_or_default();
    let payload = read_payload(&bytes).unwrap_or_default();

    let values: Vec<u16> =
        payload.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect();
    let expected: Vec<u16> = (0..3)
        .flat_map(|i| (0..4).flat_map(move |j| (0..3).map(move |k| k + 10 * j + 100 * i)))
        .collect();
    assert_eq!(values, expected);

    let meta = read_header(&bytes);
    assert_eq!(meta.map(|m| (m.rank, m.shape())), Ok((Rank::Three, vec![3, 4, 3])));
}

#[test]
fn explicit_target_ignores_values() {
    let image = offset_ramp(0);
    assert_eq!(
        encode_as(&image, ElementKind::Int16, 0, 0, 0, ""),
        Err(CodecError::InvalidKind { from: ElementKind::Int32, to: ElementKind::Int16 })
    );

    let bytes = encode_as(&image, ElementKind::Double, 1, 2, 0, "").unwrap_or_default();
    assert_eq!(bytes.len(), ImageHeader::SIZE + 12 * 8);
    let decoded = decode(&bytes).ok().and_then(ImageArray::into_typed::<f64>);
    assert_eq!(decoded.and_then(|a| a.iter().last().copied()), Some(23.0));
}

#[test]
fn error_response_is_bit_exact() {
    let bytes = encode_error(7, 8, 1035, "camera busy");
    assert_eq!(
        &bytes[..],
        hex!(
            "01000000 0b040000 07000000 08000000 2c000000 00000000"
            "00000000 02000000 00000000 00000000 00000000"
            "63616d6572612062757379"
        )
    );
}

#[test]
fn longer_data_start_is_honoured() {
    let mut bytes = hex!(
        "02000000 00000000 00000000 00000000 30000000 06000000"
        "06000000 02000000 02000000 01000000 00000000"
        "deadbeef 0102"
    )
    .to_vec();
    assert_eq!(read_payload(&bytes), Ok(&[1, 2][..]));
    assert_eq!(decode(&bytes), Ok(ImageArray::from(Array2::from_shape_vec((2, 1), vec![1u8, 2]).unwrap_or_default())));

    bytes.truncate(ImageHeader::SIZE + 2);
    assert!(matches!(decode(&bytes), Err(CodecError::BufferTooShort { needed: 48, actual: 46 })));
}
