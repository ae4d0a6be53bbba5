#![no_main]

use libfuzzer_sys::fuzz_target;

use cborgen::{CborEncoder, EncoderFeatures, WriteLimits};

// Drive the token API from raw bytes: the first byte selects features, the
// rest becomes a stream of operations. Errors are expected; panics and
// buffer-accounting slips are the bugs being hunted.
fuzz_target!(|data: &[u8]| {
    let Some((&sel, mut ops)) = data.split_first() else {
        return;
    };
    let features = EncoderFeatures::from_bits_truncate(u32::from(sel));
    let limits = WriteLimits::with_max_depth(64);
    let Ok(mut enc) = CborEncoder::with_options(
        Vec::new(),
        features,
        limits,
        cborgen::DEFAULT_BUFFER_LENGTH,
    ) else {
        return;
    };

    while let Some((&op, rest)) = ops.split_first() {
        ops = rest;
        let res = match op % 20 {
            0 => enc.write_null(),
            1 => enc.write_bool(op & 0x20 != 0),
            2 => enc.write_i32(i32::from_le_bytes(take4(&mut ops))),
            3 => enc.write_i64(i64::from(i32::from_le_bytes(take4(&mut ops))) << 20),
            4 => enc.write_f64(f64::from(i32::from_le_bytes(take4(&mut ops)))),
            5 => enc.write_start_array(),
            6 => enc.write_start_array_sized(u64::from(op >> 5)),
            7 => enc.write_start_object(),
            8 => enc.write_start_object_sized(u64::from(op >> 5)),
            9 => enc.write_end_array(),
            10 => enc.write_end_object(),
            11 => {
                let n = take_run(&mut ops);
                enc.write_field_name(&String::from_utf8_lossy(&n))
            }
            12 => {
                let n = take_run(&mut ops);
                enc.write_text(&String::from_utf8_lossy(&n))
            }
            13 => {
                let n = take_run(&mut ops);
                let units: Vec<u16> = n.chunks(2).map(unit_of).collect();
                enc.write_text_utf16(&units)
            }
            14 => {
                let n = take_run(&mut ops);
                enc.write_bytes(&n)
            }
            15 => enc.write_tag(u64::from(op)),
            16 => enc.write_bignum(op & 0x20 != 0, &take_run(&mut ops)),
            17 => enc.write_decimal(i128::from(i32::from_le_bytes(take4(&mut ops))), i32::from(op)),
            18 => enc.write_raw_byte(op),
            _ => enc.flush(),
        };
        if res.is_err() {
            break;
        }
    }
    let _ = enc.close();
});

fn take4(ops: &mut &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    let n = ops.len().min(4);
    out[..n].copy_from_slice(&ops[..n]);
    *ops = &ops[n..];
    out
}

fn take_run(ops: &mut &[u8]) -> Vec<u8> {
    let Some((&len, rest)) = ops.split_first() else {
        return Vec::new();
    };
    let want = usize::from(len) * 37;
    let n = rest.len().min(want);
    let out = rest[..n].to_vec();
    *ops = &rest[n..];
    out
}

fn unit_of(pair: &[u8]) -> u16 {
    match pair {
        [a, b] => u16::from_le_bytes([*a, *b]),
        [a] => u16::from(*a),
        _ => 0,
    }
}
