//! LDPC and HDPC precode generation.
//!
//! The precode appends L + H check packets to the K source packets before
//! any batch is drawn. Both encoder and decoder regenerate the same sparse
//! LDPC graph and the same HDPC coefficient pattern from fixed PRNG keys.
//!
//! # LDPC
//!
//! Each source packet joins `min(ldpcVarDegree, L)` distinct LDPC checks.
//! Neighbours are drawn by partial Fisher-Yates over one permutation of the
//! L check ids that persists across source packets. Check packets are plain
//! XOR sums of their neighbours.
//!
//! # HDPC
//!
//! HDPC checks are dense over the first K + L packets. Instead of
//! materializing the H x (K+L) matrix, [`generate_hdpc`] keeps a running sum
//!
//! ```text
//! acc_k = alpha * acc_{k-1} + input[k]
//! ```
//!
//! and at every step k >= 1 adds `acc_{k-1}` into two distinct rows picked
//! from a shuffled row permutation. Row r finally receives
//! `alpha^r * acc_{K+L-1}`. This costs two slice additions per input packet
//! regardless of H. [`hdpc_matrix`] renders the same coefficients densely
//! for verification.

use crate::field::Field;
use crate::tracing_compat::{debug, debug_span, trace};
use crate::util::DetRng;

/// Rows touched by each running-sum step.
const HDPC_ROWS_PER_STEP: usize = 2;

/// Generates the HDPC check packets.
///
/// `input` holds the K source packets followed by the L LDPC checks; `None`
/// entries contribute zero. Every `output` row is overwritten.
///
/// # Panics
///
/// Panics if `output` has exactly one row, or if any present input or any
/// output row differs in length from the first output row.
pub fn generate_hdpc(
    field: &Field,
    rng: &mut DetRng,
    hdpc_key: u64,
    output: &mut [Vec<u8>],
    input: &[Option<&[u8]>],
) {
    let h = output.len();
    if h == 0 {
        return;
    }
    assert!(
        h >= HDPC_ROWS_PER_STEP,
        "HDPC needs at least {HDPC_ROWS_PER_STEP} rows, got {h}"
    );
    let packet_size = output[0].len();
    for row in output.iter_mut() {
        assert_eq!(row.len(), packet_size, "HDPC row length mismatch");
        row.fill(0);
    }

    let _span = debug_span!("generate_hdpc", rows = h, inputs = input.len()).entered();

    rng.seed(hdpc_key);
    let alpha = field.alpha();
    let mut ids: Vec<usize> = (0..h).collect();
    let mut acc = match input.first() {
        Some(Some(packet)) => packet.to_vec(),
        _ => vec![0u8; packet_size],
    };
    assert_eq!(acc.len(), packet_size, "HDPC input length mismatch");

    for packet in input.iter().skip(1) {
        for i in 0..HDPC_ROWS_PER_STEP {
            let row = rng.pick_into(&mut ids, i);
            field.add_slice(&mut output[row], &acc);
        }
        field.mul_slice(&mut acc, alpha);
        if let Some(packet) = packet {
            field.add_slice(&mut acc, packet);
        }
    }

    let mut scale = 1u8;
    for row in output.iter_mut() {
        field.addmul_slice(row, &acc, scale);
        scale = field.mul(scale, alpha);
    }
    debug!(rows = h, inputs = input.len(), "HDPC checks generated");
}

/// Dense H x `n` coefficient matrix of the HDPC precode over `n` inputs.
///
/// `matrix[r][j]` is the coefficient of input `j` in check `r`, i.e. the
/// value [`generate_hdpc`] effectively multiplies input `j` by. Rows are
/// computed independently by a Horner recurrence over the same PRNG picks.
///
/// # Panics
///
/// Panics if `h == 1`.
#[must_use]
pub fn hdpc_matrix(
    field: &Field,
    rng: &mut DetRng,
    hdpc_key: u64,
    h: usize,
    n: usize,
) -> Vec<Vec<u8>> {
    if h == 0 {
        return Vec::new();
    }
    assert!(
        h >= HDPC_ROWS_PER_STEP,
        "HDPC needs at least {HDPC_ROWS_PER_STEP} rows, got {h}"
    );

    // touched[k] = rows that received the accumulator at step k
    rng.seed(hdpc_key);
    let mut ids: Vec<usize> = (0..h).collect();
    let mut touched = vec![[usize::MAX; HDPC_ROWS_PER_STEP]; n];
    for step in touched.iter_mut().skip(1) {
        for (i, slot) in step.iter_mut().enumerate() {
            *slot = rng.pick_into(&mut ids, i);
        }
    }

    let alpha = field.alpha();
    let mut matrix = vec![vec![0u8; n]; h];
    let mut alpha_r = 1u8;
    for (r, row) in matrix.iter_mut().enumerate() {
        // acc: sum of alpha^(k-1-j) over steps k > j that touched r
        // fin: alpha^(n-1-j), the weight of input j in the final sum
        let mut acc = 0u8;
        let mut fin = 1u8;
        for j in (0..n).rev() {
            row[j] = field.add(acc, field.mul(alpha_r, fin));
            acc = field.mul(acc, alpha);
            if touched[j].contains(&r) {
                acc = field.add(acc, 1);
            }
            fin = field.mul(fin, alpha);
        }
        alpha_r = field.mul(alpha_r, alpha);
    }
    matrix
}

/// LDPC checks joined by each source packet.
///
/// Returns `packet_num` lists, each holding `min(var_degree, ldpc_num)`
/// distinct check ids in `0..ldpc_num`.
#[must_use]
pub fn ldpc_neighbors(
    rng: &mut DetRng,
    ldpc_key: u64,
    packet_num: usize,
    ldpc_num: usize,
    var_degree: usize,
) -> Vec<Vec<usize>> {
    let degree = var_degree.min(ldpc_num);
    rng.seed(ldpc_key);
    let mut checks: Vec<usize> = (0..ldpc_num).collect();
    (0..packet_num)
        .map(|_| (0..degree).map(|i| rng.pick_into(&mut checks, i)).collect())
        .collect()
}

/// Generates the LDPC check packets from the source packets.
///
/// `neighbors` comes from [`ldpc_neighbors`]; missing sources contribute
/// zero. Every `output` row is overwritten.
///
/// # Panics
///
/// Panics if `neighbors` and `sources` differ in length, or if packet
/// lengths disagree.
pub fn generate_ldpc(
    field: &Field,
    neighbors: &[Vec<usize>],
    sources: &[Option<&[u8]>],
    output: &mut [Vec<u8>],
) {
    assert_eq!(neighbors.len(), sources.len(), "one neighbour list per source packet");
    for row in output.iter_mut() {
        row.fill(0);
    }
    for (checks, source) in neighbors.iter().zip(sources) {
        let Some(source) = source else {
            continue;
        };
        for &c in checks {
            field.add_slice(&mut output[c], source);
        }
    }
    trace!(checks = output.len(), sources = sources.len(), "LDPC checks generated");
}

/// Dense L x K binary matrix of the LDPC precode.
#[must_use]
pub fn ldpc_matrix(neighbors: &[Vec<usize>], ldpc_num: usize) -> Vec<Vec<u8>> {
    let mut matrix = vec![vec![0u8; neighbors.len()]; ldpc_num];
    for (source, checks) in neighbors.iter().enumerate() {
        for &c in checks {
            matrix[c][source] = 1;
        }
    }
    matrix
}
