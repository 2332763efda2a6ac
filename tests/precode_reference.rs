//! Precode generation checked against dense matrix references.

mod common;

use batscode::config::{DEFAULT_HDPC_KEY, DEFAULT_LDPC_KEY};
use batscode::precode::{generate_hdpc, generate_ldpc, hdpc_matrix, ldpc_matrix, ldpc_neighbors};
use batscode::{BatsConfig, BatsSession, DetRng, Field, FieldKernel};
use common::{init_test_logging, make_source_packets, test_proptest_config};
use proptest::prelude::*;

fn apply(field: &Field, matrix: &[Vec<u8>], input: &[Vec<u8>], len: usize) -> Vec<Vec<u8>> {
    matrix
        .iter()
        .map(|row| {
            let mut out = vec![0u8; len];
            for (&c, packet) in row.iter().zip(input) {
                field.addmul_slice(&mut out, packet, c);
            }
            out
        })
        .collect()
}

fn as_refs(packets: &[Vec<u8>]) -> Vec<Option<&[u8]>> {
    packets.iter().map(|p| Some(p.as_slice())).collect()
}

#[test]
fn small_block_k10_l2_h5() {
    init_test_logging();
    test_phase!("small_block_k10_l2_h5");
    let (k, l, h, t) = (10, 2, 5, 24);
    for kernel in [FieldKernel::Table, FieldKernel::Bitwise] {
        for order in [1u8, 2, 4, 8] {
            let field = Field::new(order, kernel).unwrap();
            let mut rng = DetRng::new(0);
            let sources = make_source_packets(k, t);

            let neighbors = ldpc_neighbors(&mut rng, DEFAULT_LDPC_KEY, k, l, 3);
            let mut ldpc = vec![vec![0u8; t]; l];
            generate_ldpc(&field, &neighbors, &as_refs(&sources), &mut ldpc);
            assert_eq!(ldpc, apply(&field, &ldpc_matrix(&neighbors, l), &sources, t));

            let mut input = sources.clone();
            input.extend(ldpc.iter().cloned());
            let mut hdpc = vec![vec![0u8; t]; h];
            generate_hdpc(&field, &mut rng, DEFAULT_HDPC_KEY, &mut hdpc, &as_refs(&input));
            let matrix = hdpc_matrix(&field, &mut rng, DEFAULT_HDPC_KEY, h, k + l);
            assert_eq!(hdpc, apply(&field, &matrix, &input, t), "GF(2^{order}) {kernel:?}");
        }
    }
    test_complete!("small_block_k10_l2_h5");
}

#[test]
fn session_check_packets_match_reference() {
    init_test_logging();
    let config = BatsConfig::new(4, 100, 16).with_field(4, FieldKernel::Table);
    let mut session = BatsSession::new(&config).unwrap();
    let sources = make_source_packets(100, 16);
    session.load_packets(&sources).unwrap();
    session.generate_precode();

    let p = *session.params();
    let field = session.field().clone();
    let mut rng = DetRng::new(0);
    let neighbors = ldpc_neighbors(&mut rng, config.ldpc_key, p.packet_num, p.ldpc_num, 3);
    let ldpc = apply(&field, &ldpc_matrix(&neighbors, p.ldpc_num), &sources, 16);
    let mut input = sources;
    input.extend(ldpc.iter().cloned());
    let hdpc_coeffs =
        hdpc_matrix(&field, &mut rng, config.hdpc_key, p.hdpc_num, p.packet_and_ld_num);
    let hdpc = apply(&field, &hdpc_coeffs, &input, 16);

    for (i, want) in ldpc.iter().chain(&hdpc).enumerate() {
        assert_eq!(session.packet(p.packet_num + i), Some(want.as_slice()), "check {i}");
    }
}

#[test]
fn gf2_hdpc_rows_share_final_sum() {
    init_test_logging();
    // alpha = 1 in GF(2): every row gets the same XOR of all inputs
    let field = Field::new(1, FieldKernel::Bitwise).unwrap();
    let matrix = hdpc_matrix(&field, &mut DetRng::new(0), DEFAULT_HDPC_KEY, 5, 12);
    assert!(matrix.iter().all(|row| row[11] == 1));
    assert!(matrix.iter().flatten().all(|&c| c <= 1));
}

proptest! {
    #![proptest_config(test_proptest_config(64))]

    #[test]
    fn hdpc_matches_reference_for_any_key(
        key in any::<u64>(),
        n in 1usize..40,
        h in 2usize..9,
        order in prop_oneof![Just(1u8), Just(2), Just(4), Just(8)],
    ) {
        init_test_logging();
        let field = Field::new(order, FieldKernel::Table).unwrap();
        let input = make_source_packets(n, 9);
        let mut rng = DetRng::new(key);
        let mut out = vec![vec![0u8; 9]; h];
        generate_hdpc(&field, &mut rng, key, &mut out, &as_refs(&input));
        let matrix = hdpc_matrix(&field, &mut rng, key, h, n);
        prop_assert_eq!(out, apply(&field, &matrix, &input, 9));
    }
}
