//! End-to-end session scenarios: configure, load, precode, encode.

mod common;

use batscode::{BatsConfig, BatsSession, DegreeDistribution, ErrorKind, FieldKernel};
use common::{init_test_logging, make_source_packets, session_with_soliton, uniform_degrees};

#[test]
fn documented_scenario_m4_k100_t16() {
    init_test_logging();
    test_phase!("documented_scenario_m4_k100_t16");
    let config = BatsConfig::new(4, 100, 16);
    let mut session = session_with_soliton(&config);
    let p = *session.params();
    assert_eq!((p.ldpc_num, p.hdpc_num, p.pi_num, p.sm_num), (18, 5, 15, 108));
    assert_eq!(session.domains().smallest_bid(), 18);

    session.load_packets(&make_source_packets(100, 16)).unwrap();
    session.generate_precode();
    for key in 0..32 {
        let encoded = session.encode_batch(key).unwrap();
        assert_eq!(encoded.symbols.len(), 4);
        assert!(encoded.symbols.iter().all(|s| s.len() == 16));
        assert_eq!(encoded.vector.pi_indices.len(), 4);
    }
    tracing::info!(stats = %session.stats(), "scenario complete");
    test_complete!("documented_scenario_m4_k100_t16");
}

#[test]
fn encoder_and_decoder_sessions_agree() {
    init_test_logging();
    let config = BatsConfig::new(16, 500, 64).with_field(8, FieldKernel::Table);
    let mut encoder = session_with_soliton(&config);
    let mut decoder = session_with_soliton(&config);
    encoder.load_packets(&make_source_packets(500, 64)).unwrap();
    encoder.generate_precode();

    for key in [0u64, 1, 2, 1000, u64::MAX] {
        let encoded = encoder.encode_batch(key).unwrap();
        // decoder has no packets but regenerates the same vector
        assert_eq!(decoder.batch(key).unwrap(), encoded.vector);
    }
}

#[test]
fn kernels_produce_identical_symbols() {
    init_test_logging();
    let data = make_source_packets(200, 40);
    let run = |kernel: FieldKernel| {
        let config = BatsConfig::new(8, 200, 40).with_field(4, kernel);
        let mut session = session_with_soliton(&config);
        session.load_packets(&data).unwrap();
        session.generate_precode();
        (0..10)
            .map(|key| session.encode_batch(key).unwrap().symbols)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(FieldKernel::Table), run(FieldKernel::Bitwise));
}

#[test]
fn zero_precoding_mode() {
    init_test_logging();
    let config = BatsConfig::new(4, 100, 16).without_precoding();
    let mut session = session_with_soliton(&config);
    let p = *session.params();
    assert_eq!((p.hdpc_num, p.check_num, p.total_num), (0, 0, 100));

    session.load_packets(&make_source_packets(100, 16)).unwrap();
    session.generate_precode();
    assert_eq!(session.stats().precode_runs, 0);
    let encoded = session.encode_batch(3).unwrap();
    assert!(encoded.vector.participants().all(|(id, _)| id < 100));
    assert_eq!(session.packet(100), None);
}

#[test]
fn tiny_block_with_empty_sm_domain() {
    init_test_logging();
    // K=1 without precoding: P = 1, S = 0, every batch is PI-only
    let config = BatsConfig::new(64, 1, 8).without_precoding();
    let mut session = BatsSession::new(&config).unwrap();
    session.set_degree_distribution(uniform_degrees(3));
    assert_eq!(session.params().sm_num, 0);
    session.load_packets(&make_source_packets(1, 8)).unwrap();

    let encoded = session.encode_batch(9).unwrap();
    assert_eq!(encoded.vector.degree, 0);
    assert_eq!(encoded.vector.pi_indices, vec![0]);
    assert_eq!(encoded.symbols.len(), 64);
}

#[test]
fn missing_source_reports_packet() {
    init_test_logging();
    let config = BatsConfig::new(4, 50, 8).without_precoding();
    let mut session = session_with_soliton(&config);
    let mut data = make_source_packets(50, 8);
    data.truncate(49);
    session.load_packets(&data).unwrap();

    let failures = (0..200)
        .filter_map(|key| session.encode_batch(key).err())
        .collect::<Vec<_>>();
    assert!(!failures.is_empty(), "packet 49 should be drawn eventually");
    assert!(failures.iter().all(|e| e.kind() == ErrorKind::MissingPacket));
    assert!(failures[0].to_string().contains("packet 49"));
}

#[test]
fn replacing_distribution_changes_degrees() {
    init_test_logging();
    let config = BatsConfig::new(4, 1000, 8);
    let mut session = BatsSession::new(&config).unwrap();
    session.set_degree_distribution(DegreeDistribution::new(&[0.0, 1.0], 1).unwrap());
    assert_eq!(session.batch(5).unwrap().degree, 1);
    let previous = session.set_degree_distribution(
        DegreeDistribution::new(&[0.0, 0.0, 0.0, 0.0, 1.0], 4).unwrap(),
    );
    assert_eq!(previous.map(|d| d.max_degree()), Some(1));
    assert_eq!(session.batch(5).unwrap().degree, 4);
}

#[test]
fn config_from_json_drives_session() {
    init_test_logging();
    let json = r#"{"batch_size": 8, "packet_num": 300, "packet_size": 32,
                   "field_order": 2, "field_kernel": "bitwise", "hdpc_key": 7}"#;
    let config: BatsConfig = serde_json::from_str(json).unwrap();
    let session = BatsSession::new(&config).unwrap();
    assert_eq!(session.field().order(), 2);
    assert_eq!(session.field().kernel(), FieldKernel::Bitwise);
    assert_eq!(session.params().packet_num, 300);
}
