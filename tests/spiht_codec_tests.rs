use spiht_codec::codec::CodecError;
use spiht_codec::container::{decode_stream, encode_to_stream, EncodedStream};
use spiht_codec::{decode, encode, CoeffArray, UNLIMITED_BITS};
use std::io::Cursor;

/// Deterministic pseudo-random coefficient array (LCG, no external deps).
fn random_array(channels: usize, height: usize, width: usize, seed: u64) -> CoeffArray {
    let mut state = seed;
    let mut next = || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) as i32 % 2000) - 1000
    };
    let data: Vec<i32> = (0..channels * height * width).map(|_| next()).collect();
    CoeffArray::from_vec(data, channels, height, width).unwrap()
}

fn sum_abs_diff(a: &CoeffArray, b: &CoeffArray) -> u64 {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(&x, &y)| (x as i64 - y as i64).unsigned_abs())
        .sum()
}

/// Test exact reconstruction under an unlimited bit budget
#[test]
fn test_round_trip_unlimited_budget() {
    let arr = random_array(3, 16, 16, 0xDEADBEEF);

    let (bytes, max_n) = encode(&arr, 2, 2, UNLIMITED_BITS).expect("encode failed");
    assert!(!bytes.is_empty(), "encoded stream is empty");

    let rec = decode(&bytes, max_n, 3, 16, 16, 2, 2).expect("decode failed");
    assert_eq!(rec, arr, "reconstruction differs from input");
}

/// Test that reconstruction error never grows as the budget grows
#[test]
fn test_monotonic_improvement_with_budget() {
    let arr = random_array(3, 16, 16, 42);

    // Byte-aligned budgets so encoder and decoder agree on the exact cut
    let budgets = [64u64, 256, 1024, 4096, 16384, UNLIMITED_BITS];
    let mut prev_err = u64::MAX;

    for &budget in &budgets {
        let (bytes, max_n) = encode(&arr, 2, 2, budget).expect("encode failed");
        let rec = decode(&bytes, max_n, 3, 16, 16, 2, 2).expect("decode failed");
        let err = sum_abs_diff(&arr, &rec);
        println!("budget={:>8} bytes={:>6} err={}", budget, bytes.len(), err);
        assert!(
            err <= prev_err,
            "error increased from {} to {} at budget {}",
            prev_err,
            err,
            budget
        );
        prev_err = err;
    }
    assert_eq!(prev_err, 0, "unlimited budget must reconstruct exactly");
}

/// Test byte-identical encoding and identical decoding across repeat calls
#[test]
fn test_determinism() {
    let arr = random_array(3, 8, 8, 7);

    let (bytes_a, n_a) = encode(&arr, 2, 2, UNLIMITED_BITS).unwrap();
    let (bytes_b, n_b) = encode(&arr, 2, 2, UNLIMITED_BITS).unwrap();
    assert_eq!(n_a, n_b);
    assert_eq!(bytes_a, bytes_b, "encoding is not deterministic");

    let rec_a = decode(&bytes_a, n_a, 3, 8, 8, 2, 2).unwrap();
    let rec_b = decode(&bytes_a, n_a, 3, 8, 8, 2, 2).unwrap();
    assert_eq!(rec_a, rec_b, "decoding is not deterministic");
}

/// Test the all-zero array for several budgets
#[test]
fn test_all_zero_array() {
    let arr = CoeffArray::zeroed(3, 8, 8);

    for budget in [0, 8, 64, UNLIMITED_BITS] {
        let (bytes, max_n) = encode(&arr, 2, 2, budget).expect("encode failed");
        assert_eq!(max_n, 0, "all-zero array must report max_n = 0");

        let rec = decode(&bytes, max_n, 3, 8, 8, 2, 2).expect("decode failed");
        assert!(
            rec.as_slice().iter().all(|&v| v == 0),
            "all-zero array did not decode to zeros at budget {}",
            budget
        );
    }
}

/// Boundary scenario: (1, 8, 8), ll = 2x2, single root coefficient of 5
#[test]
fn test_single_root_coefficient() {
    let mut arr = CoeffArray::zeroed(1, 8, 8);
    arr.set(0, 0, 0, 5);

    let (bytes, max_n) = encode(&arr, 2, 2, UNLIMITED_BITS).expect("encode failed");
    assert_eq!(max_n, 2, "2^2 <= 5 < 2^3 so max_n must be 2");

    let rec = decode(&bytes, max_n, 1, 8, 8, 2, 2).expect("decode failed");
    assert_eq!(rec.get(0, 0, 0), 5, "root coefficient not reproduced");
    assert_eq!(rec, arr, "positions outside the root must stay zero");
}

/// Truncation scenario: max_bits = 1 must not crash and must stay bounded
#[test]
fn test_one_bit_budget() {
    let mut arr = CoeffArray::zeroed(1, 8, 8);
    arr.set(0, 0, 0, 5);

    let (bytes, max_n) = encode(&arr, 2, 2, 1).expect("encode failed");
    assert_eq!(bytes.len(), 1, "one bit pads to one byte");

    let rec = decode(&bytes, max_n, 1, 8, 8, 2, 2).expect("decode failed");
    for ch in 0..1 {
        for row in 0..8 {
            for col in 0..8 {
                let v = rec.get(ch, row, col);
                if (ch, row, col) == (0, 0, 0) {
                    assert!(
                        v.unsigned_abs() <= 1 << max_n,
                        "magnitude {} exceeds 2^max_n",
                        v
                    );
                } else {
                    assert_eq!(v, 0, "unvisited position ({},{},{}) nonzero", ch, row, col);
                }
            }
        }
    }
}

/// Geometry mismatch on decode must fail loudly, not misalign silently
#[test]
fn test_decode_geometry_mismatch() {
    let arr = random_array(1, 8, 8, 3);
    let (bytes, max_n) = encode(&arr, 2, 2, UNLIMITED_BITS).unwrap();

    let res = decode(&bytes, max_n, 1, 8, 12, 2, 2);
    assert!(
        matches!(res, Err(CodecError::InvalidGeometry(_))),
        "inconsistent (h, w) must raise InvalidGeometry"
    );

    let res = decode(&bytes, max_n, 1, 8, 8, 3, 3);
    assert!(
        matches!(res, Err(CodecError::InvalidGeometry(_))),
        "inconsistent LL subband must raise InvalidGeometry"
    );
}

/// Negative coefficients keep their sign through a round trip
#[test]
fn test_negative_coefficients() {
    let mut arr = CoeffArray::zeroed(1, 8, 8);
    arr.set(0, 0, 1, -37);
    arr.set(0, 5, 5, -2);
    arr.set(0, 1, 0, 12);

    let (bytes, max_n) = encode(&arr, 2, 2, UNLIMITED_BITS).unwrap();
    let rec = decode(&bytes, max_n, 1, 8, 8, 2, 2).unwrap();
    assert_eq!(rec, arr);
}

/// Channels interleave into one stream and stay in lock-step
#[test]
fn test_multi_channel_lock_step() {
    let mut arr = CoeffArray::zeroed(3, 8, 8);
    arr.set(0, 0, 0, 100);
    arr.set(1, 3, 3, -50);
    arr.set(2, 7, 7, 25);

    let (bytes, max_n) = encode(&arr, 2, 2, UNLIMITED_BITS).unwrap();
    let rec = decode(&bytes, max_n, 3, 8, 8, 2, 2).unwrap();
    assert_eq!(rec, arr);
}

/// Container round trip through an in-memory buffer and a real file
#[test]
fn test_container_stream_round_trip() {
    let arr = random_array(3, 16, 16, 99);
    let stream = encode_to_stream(&arr, 2, 2, UNLIMITED_BITS).expect("encode failed");

    // In-memory
    let mut buf = Vec::new();
    stream.write_to(&mut buf).expect("write failed");
    let parsed = EncodedStream::read_from(&mut Cursor::new(&buf)).expect("read failed");
    assert_eq!(parsed, stream);
    assert_eq!(decode_stream(&parsed).unwrap(), arr);

    // On disk
    let mut file = tempfile::tempfile().expect("tempfile failed");
    stream.write_to(&mut file).expect("file write failed");
    use std::io::{Seek, SeekFrom};
    file.seek(SeekFrom::Start(0)).unwrap();
    let parsed = EncodedStream::read_from(&mut file).expect("file read failed");
    assert_eq!(decode_stream(&parsed).unwrap(), arr);
}

/// A truncated container stream still decodes to a bounded partial array
#[test]
fn test_container_with_truncated_budget() {
    let arr = random_array(1, 16, 16, 5);
    let stream = encode_to_stream(&arr, 2, 2, 100).expect("encode failed");
    assert_eq!(stream.bit_len, 100);
    assert_eq!(stream.data.len(), 13, "100 bits pad to 13 bytes");

    let rec = decode_stream(&stream).expect("decode failed");
    // Partial reconstruction: never worse than decoding nothing at all
    assert!(sum_abs_diff(&arr, &rec) <= sum_abs_diff(&arr, &CoeffArray::zeroed(1, 16, 16)));
}
