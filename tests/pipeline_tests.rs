use bmp_stego::carrier::{carrier_capacity, check_capacity, required_bits};
use bmp_stego::codec::{decode_field, decode_size, encode_field, output_path};
use bmp_stego::constants::{BMP_HEADER_SIZE, MAGIC_STRING};
use bmp_stego::steganography::{pack_byte, pack_u32, unpack_byte, unpack_u32};
use bmp_stego::{DecodeReport, Decoder, EncodeReport, Encoder, FormatError, SizeField, StegoError};
use rand::RngCore;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// 在内存中构造一个 24 位 BMP：54 字节头部加随机像素数据
fn bmp_carrier(width: u32, height: u32) -> Vec<u8> {
    let pixel_len = (width * height * 3) as usize;
    let mut bytes = vec![0u8; BMP_HEADER_SIZE];
    bytes[0..2].copy_from_slice(b"BM");
    bytes[2..6].copy_from_slice(&((BMP_HEADER_SIZE + pixel_len) as u32).to_le_bytes());
    bytes[10..14].copy_from_slice(&(BMP_HEADER_SIZE as u32).to_le_bytes());
    bytes[14..18].copy_from_slice(&40u32.to_le_bytes());
    bytes[18..22].copy_from_slice(&width.to_le_bytes());
    bytes[22..26].copy_from_slice(&height.to_le_bytes());
    bytes[26..28].copy_from_slice(&1u16.to_le_bytes());
    bytes[28..30].copy_from_slice(&24u16.to_le_bytes());

    let mut pixels = vec![0u8; pixel_len];
    rand::rng().fill_bytes(&mut pixels);
    bytes.extend_from_slice(&pixels);
    bytes
}

fn encode_bytes(
    carrier: &[u8],
    secret: &[u8],
    extension: &str,
) -> bmp_stego::Result<(Vec<u8>, EncodeReport)> {
    let mut out = Cursor::new(Vec::new());
    let dest = &mut out;
    let report = Encoder::new(Cursor::new(carrier), Cursor::new(secret), extension)?
        .encode(move || Ok(dest))?;
    Ok((out.into_inner(), report))
}

fn decode_bytes(stego: &[u8], base: &str) -> bmp_stego::Result<(Vec<u8>, DecodeReport)> {
    let mut out = Vec::new();
    let sink = &mut out;
    let report = Decoder::new(Cursor::new(stego), base).decode(move |_| Ok(sink))?;
    Ok((out, report))
}

/// 把长度字段直接写进已编码图像的指定位置
fn overwrite_size(stego: &mut [u8], offset: usize, value: u32) {
    let window: &mut [u8; 32] = (&mut stego[offset..offset + 32]).try_into().unwrap();
    pack_u32(value, window);
}

/// 扩展名长度字段的偏移量
fn extension_size_offset() -> usize {
    BMP_HEADER_SIZE + MAGIC_STRING.len() * 8
}

/// 载荷长度字段的偏移量
fn payload_size_offset(extension_len: usize) -> usize {
    extension_size_offset() + 32 + extension_len * 8
}

#[test]
fn test_pack_byte_touches_only_lsb() {
    let mut rng = rand::rng();
    for value in 0..=255u8 {
        let mut window = [0u8; 8];
        rng.fill_bytes(&mut window);
        let original = window;
        pack_byte(value, &mut window);
        for (before, after) in original.iter().zip(window.iter()) {
            assert_eq!(before & 0xFE, after & 0xFE, "bits 1-7 must be preserved");
        }
    }
}

#[test]
fn test_pack_byte_is_msb_first() {
    let mut window = [0u8; 8];
    pack_byte(0x80, &mut window);
    assert_eq!(window, [1, 0, 0, 0, 0, 0, 0, 0]);

    let mut window = [0xFFu8; 8];
    pack_byte(0x01, &mut window);
    assert_eq!(window, [0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0xFE, 0xFF]);
}

#[test]
fn test_unpack_inverts_pack_for_every_byte() {
    let mut rng = rand::rng();
    for value in 0..=255u8 {
        for seed in [[0x00u8; 8], [0xFFu8; 8]] {
            let mut window = seed;
            pack_byte(value, &mut window);
            assert_eq!(unpack_byte(&window), value);
        }

        let mut window = [0u8; 8];
        rng.fill_bytes(&mut window);
        pack_byte(value, &mut window);
        assert_eq!(unpack_byte(&window), value);
    }
}

#[test]
fn test_pack_u32_round_trip() {
    let mut rng = rand::rng();
    for value in [0u32, 1, 5, 255, 256, 30_000, 0x0012_3456, i32::MAX as u32] {
        let mut window = [0u8; 32];
        rng.fill_bytes(&mut window);
        pack_u32(value, &mut window);
        assert_eq!(unpack_u32(&window), value);
    }

    let mut window = [0u8; 32];
    pack_u32(1, &mut window);
    assert_eq!(window[31], 1, "least significant bit goes into the last carrier byte");
    assert!(window[..31].iter().all(|&b| b == 0));
}

#[test]
fn test_field_codec_streams_forward() {
    let mut carrier = vec![0u8; 64];
    rand::rng().fill_bytes(&mut carrier);
    let mut carrier_in = Cursor::new(carrier.clone());
    let mut carrier_out = Vec::new();

    encode_field(b"#*.txt", &mut carrier_in, &mut carrier_out).unwrap();
    assert_eq!(carrier_in.position(), 48);
    assert_eq!(carrier_out.len(), 48);

    let decoded = decode_field(6, &mut Cursor::new(&carrier_out)).unwrap();
    assert_eq!(decoded, b"#*.txt");
}

#[test]
fn test_decode_size_rejects_negative_values() {
    let mut window = [0u8; 32];
    pack_u32(0x8000_0000, &mut window);
    let err = decode_size(SizeField::Payload, &mut Cursor::new(&window[..])).unwrap_err();
    assert!(matches!(
        err,
        StegoError::Format(FormatError::NegativeLength {
            field: SizeField::Payload,
            value: i32::MIN,
        })
    ));

    pack_u32(i32::MAX as u32, &mut window);
    let len = decode_size(SizeField::Payload, &mut Cursor::new(&window[..])).unwrap();
    assert_eq!(len, i32::MAX as u32);
}

#[test]
fn test_output_path_appends_extension_once() {
    assert_eq!(output_path(Path::new("out.txt"), ".txt"), PathBuf::from("out.txt"));
    assert_eq!(output_path(Path::new("out"), ".txt"), PathBuf::from("out.txt"));
    assert_eq!(output_path(Path::new("out.pdf"), ".txt"), PathBuf::from("out.pdf.txt"));
    assert_eq!(output_path(Path::new("decoded"), ""), PathBuf::from("decoded"));
}

#[test]
fn test_capacity_arithmetic() {
    assert_eq!(carrier_capacity(100, 100), 30_000);
    assert_eq!(required_bits(2, 4, 5), 152);
    assert!(check_capacity(153, 152).is_ok());
    assert!(matches!(
        check_capacity(152, 152),
        Err(StegoError::Capacity {
            required: 152,
            available: 152
        })
    ));
    // 大尺寸不应溢出
    assert_eq!(carrier_capacity(u32::MAX, 2), u64::from(u32::MAX) * 6);
}

#[test]
fn test_round_trip_in_memory() {
    let carrier = bmp_carrier(100, 100);
    let secret = b"hello";

    let (stego, report) = encode_bytes(&carrier, secret, ".txt").unwrap();
    assert_eq!(report.required_bits, 152);
    assert_eq!(report.capacity_bits, 30_000);
    assert_eq!(stego.len(), carrier.len());

    let (recovered, decoded) = decode_bytes(&stego, "decoded").unwrap();
    assert_eq!(recovered, secret);
    assert_eq!(decoded.extension, ".txt");
    assert_eq!(decoded.output, PathBuf::from("decoded.txt"));
    assert_eq!(decoded.payload_len, 5);
}

#[test]
fn test_header_and_trailing_bytes_are_untouched() {
    let carrier = bmp_carrier(20, 20);
    let mut secret = vec![0u8; 100];
    rand::rng().fill_bytes(&mut secret);

    let (stego, report) = encode_bytes(&carrier, &secret, ".bin").unwrap();
    assert_eq!(&stego[..BMP_HEADER_SIZE], &carrier[..BMP_HEADER_SIZE]);

    let record_end = BMP_HEADER_SIZE + report.required_bits as usize;
    assert_eq!(&stego[record_end..], &carrier[record_end..]);

    for (before, after) in carrier[BMP_HEADER_SIZE..record_end]
        .iter()
        .zip(&stego[BMP_HEADER_SIZE..record_end])
    {
        assert_eq!(before & 0xFE, after & 0xFE);
    }
}

#[test]
fn test_large_payload_spans_several_chunks() {
    let carrier = bmp_carrier(200, 200);
    let mut secret = vec![0u8; 10_000];
    rand::rng().fill_bytes(&mut secret);

    let (stego, _) = encode_bytes(&carrier, &secret, ".dat").unwrap();
    let (recovered, report) = decode_bytes(&stego, "out").unwrap();
    assert_eq!(recovered, secret);
    assert_eq!(report.output, PathBuf::from("out.dat"));
}

#[test]
fn test_empty_payload_round_trip() {
    let carrier = bmp_carrier(10, 10);
    let (stego, report) = encode_bytes(&carrier, b"", ".txt").unwrap();
    assert_eq!(report.payload_len, 0);

    let (recovered, _) = decode_bytes(&stego, "empty").unwrap();
    assert!(recovered.is_empty());
}

#[test]
fn test_capacity_one_bit_short_is_rejected() {
    // 3 字节载荷 + ".txt" 需要 136 bit，45x1 的图像只有 135 bit
    let carrier = bmp_carrier(45, 1);
    let mut opened = false;
    let result = Encoder::new(Cursor::new(&carrier), Cursor::new(b"abc"), ".txt")
        .unwrap()
        .encode(|| {
            opened = true;
            Ok(Cursor::new(Vec::new()))
        });

    assert!(matches!(
        result,
        Err(StegoError::Capacity {
            required: 136,
            available: 135
        })
    ));
    assert!(!opened, "destination must not be opened when capacity is insufficient");
}

#[test]
fn test_exact_fit_is_rejected() {
    // 1 字节载荷 + ".txt" 需要 120 bit，40x1 的图像恰好 120 bit
    let exact = bmp_carrier(40, 1);
    let result = encode_bytes(&exact, b"x", ".txt");
    assert!(matches!(result, Err(StegoError::Capacity { .. })));

    let roomy = bmp_carrier(41, 1);
    let (stego, _) = encode_bytes(&roomy, b"x", ".txt").unwrap();
    let (recovered, _) = decode_bytes(&stego, "x").unwrap();
    assert_eq!(recovered, b"x");
}

#[test]
fn test_capacity_limited_by_actual_carrier_bytes() {
    // 头部声称 100x100，但像素数据只有 50 字节
    let mut carrier = bmp_carrier(100, 100);
    carrier.truncate(BMP_HEADER_SIZE + 50);
    let result = encode_bytes(&carrier, b"hello", ".txt");
    assert!(matches!(
        result,
        Err(StegoError::Capacity {
            available: 50,
            ..
        })
    ));
}

#[test]
fn test_invalid_extension_is_an_argument_error() {
    let carrier = bmp_carrier(10, 10);
    let long = format!(".{}", "x".repeat(40));
    for extension in [long.as_str(), "../etc", ".tx t"] {
        let result = Encoder::new(Cursor::new(&carrier), Cursor::new(b"abc"), extension);
        assert!(matches!(result, Err(StegoError::Argument(_))));
    }
}

#[test]
fn test_magic_mismatch_opens_no_output() {
    let mut carrier = bmp_carrier(10, 10);
    carrier[BMP_HEADER_SIZE..].fill(0);

    let mut opened = false;
    let result = Decoder::new(Cursor::new(&carrier), "decoded").decode(|_| {
        opened = true;
        Ok(Vec::new())
    });

    match result {
        Err(StegoError::Format(FormatError::MagicMismatch { expected, actual })) => {
            assert_eq!(expected, MAGIC_STRING);
            assert_eq!(actual, vec![0, 0]);
        }
        other => panic!("expected magic mismatch, got {other:?}"),
    }
    assert!(!opened, "output must not be opened when the magic string is wrong");
}

#[test]
fn test_truncated_header_is_a_format_error() {
    let carrier = vec![0u8; 20];
    let result = encode_bytes(&carrier, b"abc", ".txt");
    assert!(matches!(
        result,
        Err(StegoError::Format(FormatError::TruncatedHeader { len: 20, .. }))
    ));

    let result = decode_bytes(&carrier, "decoded");
    assert!(matches!(
        result,
        Err(StegoError::Format(FormatError::TruncatedHeader { .. }))
    ));
}

#[test]
fn test_carrier_ending_inside_record_is_a_format_error() {
    let carrier = bmp_carrier(10, 10);
    let (stego, _) = encode_bytes(&carrier, b"abc", ".txt").unwrap();
    // 保留魔数，截断在扩展名长度字段中间
    let cut = extension_size_offset() + 10;
    let result = decode_bytes(&stego[..cut], "decoded");
    assert!(matches!(
        result,
        Err(StegoError::Format(FormatError::TruncatedRecord { remaining: 10 }))
    ));
}

#[test]
fn test_negative_payload_length_is_rejected() {
    let carrier = bmp_carrier(20, 20);
    let (mut stego, _) = encode_bytes(&carrier, b"hello", ".txt").unwrap();
    overwrite_size(&mut stego, payload_size_offset(4), 0x8000_0000);

    let result = decode_bytes(&stego, "decoded");
    assert!(matches!(
        result,
        Err(StegoError::Format(FormatError::NegativeLength {
            field: SizeField::Payload,
            ..
        }))
    ));
}

#[test]
fn test_oversized_extension_length_is_rejected() {
    let carrier = bmp_carrier(20, 20);
    let (mut stego, _) = encode_bytes(&carrier, b"hello", ".txt").unwrap();
    overwrite_size(&mut stego, extension_size_offset(), 33);

    let mut opened = false;
    let result = Decoder::new(Cursor::new(&stego), "decoded").decode(|_| {
        opened = true;
        Ok(Vec::new())
    });
    assert!(matches!(
        result,
        Err(StegoError::Format(FormatError::ExtensionTooLong { len: 33, max: 32 }))
    ));
    assert!(!opened);
}

#[test]
fn test_payload_length_beyond_carrier_is_rejected() {
    let carrier = bmp_carrier(20, 20);
    let (mut stego, _) = encode_bytes(&carrier, b"hello", ".txt").unwrap();
    overwrite_size(&mut stego, payload_size_offset(4), 1_000_000);

    let result = decode_bytes(&stego, "decoded");
    assert!(matches!(
        result,
        Err(StegoError::Format(FormatError::LengthExceedsCarrier {
            field: SizeField::Payload,
            required: 8_000_000,
            ..
        }))
    ));
}

#[test]
fn test_negative_extension_length_is_rejected() {
    let carrier = bmp_carrier(20, 20);
    let (mut stego, _) = encode_bytes(&carrier, b"hello", ".txt").unwrap();
    overwrite_size(&mut stego, extension_size_offset(), 0x8000_0000);

    let mut opened = false;
    let result = Decoder::new(Cursor::new(&stego), "decoded").decode(|_| {
        opened = true;
        Ok(Vec::new())
    });
    assert!(matches!(
        result,
        Err(StegoError::Format(FormatError::NegativeLength {
            field: SizeField::Extension,
            value: i32::MIN,
        }))
    ));
    assert!(!opened);
}

#[test]
fn test_extension_length_beyond_carrier_is_rejected() {
    let carrier = bmp_carrier(20, 20);
    let (mut stego, _) = encode_bytes(&carrier, b"hello", ".txt").unwrap();
    overwrite_size(&mut stego, extension_size_offset(), 32);
    // 扩展名字段之后只剩 100 字节，不够容纳 32 字节扩展名所需的 256 字节
    stego.truncate(extension_size_offset() + 32 + 100);

    let result = decode_bytes(&stego, "decoded");
    assert!(matches!(
        result,
        Err(StegoError::Format(FormatError::LengthExceedsCarrier {
            field: SizeField::Extension,
            required: 256,
            remaining: 100,
        }))
    ));
}
