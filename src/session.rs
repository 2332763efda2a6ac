//! BATS encoding session.
//!
//! [`BatsSession`] owns everything one side of a BATS transfer needs: the
//! derived parameters, the field context, the PRNG, the degree distribution
//! and the packet store. Encoders load source packets, generate the precode
//! and then encode batches by key; decoders use the same session to replay
//! `batch(key)` and recover the encoding vectors.
//!
//! # Example
//!
//! ```
//! use batscode::{BatsConfig, BatsSession, DegreeDistribution};
//!
//! let config = BatsConfig::new(4, 100, 16);
//! let mut session = BatsSession::new(&config)?;
//! session.set_degree_distribution(DegreeDistribution::robust_soliton(20, 0.2, 0.05)?);
//!
//! let packets: Vec<Vec<u8>> = (0..100u8).map(|i| vec![i; 16]).collect();
//! session.load_packets(&packets)?;
//! session.generate_precode();
//!
//! let encoded = session.encode_batch(7)?;
//! assert_eq!(encoded.symbols.len(), 4);
//! # Ok::<(), batscode::Error>(())
//! ```

use crate::batch::{self, BatchVector};
use crate::config::{BatsConfig, DEFAULT_HDPC_KEY, DEFAULT_LDPC_KEY};
use crate::distribution::DegreeDistribution;
use crate::domain::DomainMap;
use crate::error::{Error, ErrorKind, Result};
use crate::field::Field;
use crate::params::BatsParams;
use crate::symbols::SymbolStore;
use crate::tracing_compat::{debug, info, trace};
use crate::util::DetRng;

/// Output of [`BatsSession::encode_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBatch {
    /// Encoding vector the symbols were mixed with.
    pub vector: BatchVector,
    /// M coded symbols of T bytes each.
    pub symbols: Vec<Vec<u8>>,
}

/// Degree drawn by [`BatsSession::sample_degree`].
///
/// Consumed by [`BatsSession::generate_batch`], which only accepts it while
/// the session PRNG still sits right after this draw.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "pass the sample to `generate_batch`"]
pub struct SampledDegree {
    key: u64,
    degree: usize,
}

impl SampledDegree {
    /// Batch key the degree was drawn for.
    #[must_use]
    pub const fn key(&self) -> u64 {
        self.key
    }

    /// The sampled SM degree.
    #[must_use]
    pub const fn degree(&self) -> usize {
        self.degree
    }
}

/// Running counters for a session.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Batches whose encoding vectors were generated.
    pub batches_generated: usize,
    /// Batches whose symbols were mixed.
    pub batches_encoded: usize,
    /// Smallest SM degree generated.
    pub degree_min: usize,
    /// Largest SM degree generated.
    pub degree_max: usize,
    /// Sum of SM degrees generated.
    pub degree_sum: usize,
    /// Times the precode was generated.
    pub precode_runs: usize,
    /// Payload bytes of coded symbols produced.
    pub bytes_encoded: usize,
}

impl SessionStats {
    /// Average SM degree, or 0.0 if no batch was generated.
    #[must_use]
    pub fn average_degree(&self) -> f64 {
        if self.batches_generated == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let sum = self.degree_sum as f64;
            #[allow(clippy::cast_precision_loss)]
            let count = self.batches_generated as f64;
            sum / count
        }
    }

    fn record_batch(&mut self, degree: usize) {
        if self.batches_generated == 0 {
            self.degree_min = degree;
            self.degree_max = degree;
        } else {
            self.degree_min = self.degree_min.min(degree);
            self.degree_max = self.degree_max.max(degree);
        }
        self.batches_generated += 1;
        self.degree_sum += degree;
    }
}

impl std::fmt::Display for SessionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SessionStats(batches={}, encoded={}, deg={}..{}, avg_deg={:.1}, \
             precode_runs={}, bytes={})",
            self.batches_generated,
            self.batches_encoded,
            self.degree_min,
            self.degree_max,
            self.average_degree(),
            self.precode_runs,
            self.bytes_encoded,
        )
    }
}

/// One side of a BATS transfer.
#[derive(Debug)]
pub struct BatsSession {
    params: BatsParams,
    field: Field,
    rng: DetRng,
    distribution: Option<DegreeDistribution>,
    store: SymbolStore,
    hdpc_key: u64,
    ldpc_key: u64,
    /// Key whose degree was just drawn; cleared by any other PRNG use.
    pending_key: Option<u64>,
    stats: SessionStats,
}

impl BatsSession {
    /// Validates `config` and builds a session with an empty packet store.
    pub fn new(config: &BatsConfig) -> Result<Self> {
        let params = BatsParams::from_config(config)?;
        let field = Field::new(config.field_order, config.field_kernel)?;
        let mut session = Self::from_params(params, field)?;
        session.hdpc_key = config.hdpc_key;
        session.ldpc_key = config.ldpc_key;
        Ok(session)
    }

    /// Builds a session from already derived parameters, with the default
    /// precode keys.
    ///
    /// Rejects parameters whose counts disagree (see [`BatsParams::check`]).
    pub fn from_params(params: BatsParams, field: Field) -> Result<Self> {
        params.check()?;
        info!(
            params = %params,
            field = ?field,
            "BATS session created"
        );
        Ok(Self {
            store: SymbolStore::new(&params),
            params,
            field,
            rng: DetRng::new(0),
            distribution: None,
            hdpc_key: DEFAULT_HDPC_KEY,
            ldpc_key: DEFAULT_LDPC_KEY,
            pending_key: None,
            stats: SessionStats::default(),
        })
    }

    /// Derived parameters.
    #[must_use]
    pub const fn params(&self) -> &BatsParams {
        &self.params
    }

    /// Coordinate mapping for this session.
    #[must_use]
    pub const fn domains(&self) -> DomainMap {
        self.params.domains()
    }

    /// Field context.
    #[must_use]
    pub const fn field(&self) -> &Field {
        &self.field
    }

    /// Running counters.
    #[must_use]
    pub const fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Installs the degree distribution, returning the previous one.
    pub fn set_degree_distribution(
        &mut self,
        dist: DegreeDistribution,
    ) -> Option<DegreeDistribution> {
        debug!(max_degree = dist.max_degree(), "degree distribution set");
        self.distribution.replace(dist)
    }

    /// The installed degree distribution, if any.
    #[must_use]
    pub const fn degree_distribution(&self) -> Option<&DegreeDistribution> {
        self.distribution.as_ref()
    }

    /// Stores source packet `index` (T bytes).
    ///
    /// Drops generated check packets; call [`Self::generate_precode`] again
    /// before encoding.
    pub fn set_packet(&mut self, index: usize, packet: &[u8]) -> Result<()> {
        self.store.set_source(index, packet)
    }

    /// Stores source packets `0..packets.len()`.
    pub fn load_packets<P: AsRef<[u8]>>(&mut self, packets: &[P]) -> Result<()> {
        self.store.load_sources(packets)?;
        debug!(loaded = packets.len(), "source packets loaded");
        Ok(())
    }

    /// Packet at external id `ext`: a source packet for `ext < K`, a check
    /// packet otherwise.
    #[must_use]
    pub fn packet(&self, ext: usize) -> Option<&[u8]> {
        self.store.get(ext)
    }

    /// Generates the LDPC and HDPC check packets from the loaded sources.
    pub fn generate_precode(&mut self) {
        if self.params.check_num == 0 {
            return;
        }
        self.pending_key = None;
        self.store.generate_precode(
            &self.params,
            &self.field,
            &mut self.rng,
            self.ldpc_key,
            self.hdpc_key,
        );
        self.stats.precode_runs += 1;
        debug!(
            ldpc = self.params.ldpc_num,
            hdpc = self.params.hdpc_num,
            "precode generated"
        );
    }

    /// Samples the degree of batch `key`, reseeding the PRNG.
    pub fn sample_degree(&mut self, key: u64) -> Result<SampledDegree> {
        let dist = self
            .distribution
            .as_ref()
            .ok_or_else(|| Error::new(ErrorKind::MissingDistribution))?;
        let degree = batch::sample_degree(&mut self.rng, dist, &self.params, key);
        self.pending_key = Some(key);
        Ok(SampledDegree { key, degree })
    }

    /// Draws the encoding vector of `sampled`, continuing its PRNG stream.
    ///
    /// Fails with [`ErrorKind::StaleDegreeSample`] unless `sampled` comes
    /// from the most recent PRNG use of this session, so every returned
    /// vector equals `batch(sampled.key())`.
    pub fn generate_batch(&mut self, sampled: SampledDegree) -> Result<BatchVector> {
        let SampledDegree { key, degree } = sampled;
        if self.pending_key.take() != Some(key) {
            return Err(Error::new(ErrorKind::StaleDegreeSample)
                .with_message(format!("batch {key} was not the last degree sampled")));
        }
        let vector = batch::generate_batch(&mut self.rng, &self.params, &self.field, key, degree);
        self.stats.record_batch(degree);
        trace!(
            key = vector.key,
            degree,
            participants = vector.participant_count(),
            "batch generated"
        );
        Ok(vector)
    }

    /// Encoding vector of batch `key`: degree sampling and generation in one
    /// step.
    pub fn batch(&mut self, key: u64) -> Result<BatchVector> {
        let sampled = self.sample_degree(key)?;
        self.generate_batch(sampled)
    }

    /// Generates batch `key` and mixes its M coded symbols.
    ///
    /// Every participant must be present, and the precode must have been
    /// generated when the session has check packets.
    pub fn encode_batch(&mut self, key: u64) -> Result<EncodedBatch> {
        if !self.store.has_precode() {
            return Err(Error::new(ErrorKind::PrecodeMissing)
                .with_message(format!("{} check packets required", self.params.check_num)));
        }
        let vector = self.batch(key)?;

        let mut symbols = vec![vec![0u8; self.params.packet_size]; self.params.batch_size];
        for (id, coeffs) in vector.participants() {
            let packet = self.store.get(id).ok_or_else(|| {
                Error::new(ErrorKind::MissingPacket)
                    .with_message(format!("packet {id} of batch {key}"))
            })?;
            for (symbol, &c) in symbols.iter_mut().zip(coeffs) {
                self.field.addmul_slice(symbol, packet, c);
            }
        }

        self.stats.batches_encoded += 1;
        self.stats.bytes_encoded += self.params.batch_size * self.params.packet_size;
        Ok(EncodedBatch { vector, symbols })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKernel;

    fn session(config: &BatsConfig) -> BatsSession {
        let mut s = BatsSession::new(config).unwrap();
        s.set_degree_distribution(DegreeDistribution::from_masses(&[1.0; 12]).unwrap());
        s
    }

    fn packets(k: usize, t: usize) -> Vec<Vec<u8>> {
        (0..k)
            .map(|i| (0..t).map(|b| (i * 7 + b * 3) as u8).collect())
            .collect()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let err = BatsSession::new(&BatsConfig::new(0, 10, 10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
        let err = BatsSession::new(&BatsConfig::new(4, 10, 10).with_field(5, FieldKernel::Table))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
    }

    #[test]
    fn from_params_rejects_inconsistent_counts() {
        let mut params = BatsParams::new(4, 100, 16);
        params.pi_num -= 1;
        let err = BatsSession::from_params(params, Field::gf256()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
        assert!(err.to_string().contains("S + P != total_num"));

        let s = BatsSession::from_params(BatsParams::new(4, 100, 16), Field::gf256()).unwrap();
        assert_eq!(s.params().total_num, 123);
    }

    #[test]
    fn sample_without_distribution_fails() {
        let mut s = BatsSession::new(&BatsConfig::new(4, 100, 16)).unwrap();
        let err = s.sample_degree(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingDistribution);
        assert!(s.batch(1).is_err());
    }

    #[test]
    fn set_distribution_returns_previous() {
        let mut s = session(&BatsConfig::new(4, 100, 16));
        let old = s.set_degree_distribution(DegreeDistribution::from_masses(&[1.0]).unwrap());
        assert_eq!(old.map(|d| d.max_degree()), Some(12));
        assert_eq!(s.degree_distribution().map(DegreeDistribution::max_degree), Some(1));
    }

    #[test]
    fn batch_equals_sample_then_generate() {
        let config = BatsConfig::new(4, 100, 16);
        let mut a = session(&config);
        let mut b = session(&config);
        let combined = a.batch(31).unwrap();
        let sampled = b.sample_degree(31).unwrap();
        assert_eq!(sampled.key(), 31);
        assert_eq!(sampled.degree(), combined.degree);
        assert_eq!(b.generate_batch(sampled).unwrap(), combined);
    }

    #[test]
    fn second_generate_for_one_sample_is_rejected() {
        let mut s = session(&BatsConfig::new(4, 100, 16));
        let first = s.sample_degree(31).unwrap();
        let again = s.sample_degree(31).unwrap();
        assert_eq!(first, again);

        let vector = s.generate_batch(again).unwrap();
        let err = s.generate_batch(first).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StaleDegreeSample);
        assert_eq!(s.batch(31).unwrap(), vector);
        assert_eq!(s.stats().batches_generated, 2);
    }

    #[test]
    fn generate_after_other_sample_is_rejected() {
        let mut s = session(&BatsConfig::new(4, 100, 16));
        let stale = s.sample_degree(31).unwrap();
        let _ = s.sample_degree(40).unwrap();
        let err = s.generate_batch(stale).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StaleDegreeSample);
    }

    #[test]
    fn precode_between_sample_and_generate_is_rejected() {
        let mut s = session(&BatsConfig::new(4, 100, 16));
        s.load_packets(&packets(100, 16)).unwrap();
        let sampled = s.sample_degree(7).unwrap();
        s.generate_precode();
        let err = s.generate_batch(sampled).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StaleDegreeSample);
        assert!(s.batch(7).is_ok());
    }

    #[test]
    fn set_packet_requires_new_precode() {
        let config = BatsConfig::new(4, 100, 16);
        let mut s = session(&config);
        let mut data = packets(100, 16);
        s.load_packets(&data).unwrap();
        s.generate_precode();
        let before = s.encode_batch(3).unwrap();

        data[0] = vec![0xA5; 16];
        s.set_packet(0, &data[0]).unwrap();
        assert_eq!(s.packet(0), Some(data[0].as_slice()));
        assert_eq!(s.packet(100), None);
        let err = s.encode_batch(3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PrecodeMissing);

        s.generate_precode();
        let after = s.encode_batch(3).unwrap();
        assert_eq!(after.vector, before.vector);

        let mut fresh = session(&config);
        fresh.load_packets(&data).unwrap();
        fresh.generate_precode();
        assert_eq!(fresh.encode_batch(3).unwrap(), after);
        assert_eq!(s.stats().precode_runs, 2);
    }

    #[test]
    fn set_packet_rejects_bad_input() {
        let mut s = session(&BatsConfig::new(4, 100, 16));
        assert_eq!(
            s.set_packet(100, &[0u8; 16]).unwrap_err().kind(),
            ErrorKind::InvalidPacketIndex
        );
        assert_eq!(
            s.set_packet(0, &[0u8; 15]).unwrap_err().kind(),
            ErrorKind::SymbolSizeMismatch
        );
    }

    #[test]
    fn encode_requires_precode() {
        let config = BatsConfig::new(4, 100, 16);
        let mut s = session(&config);
        s.load_packets(&packets(100, 16)).unwrap();
        let err = s.encode_batch(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PrecodeMissing);
        s.generate_precode();
        assert!(s.encode_batch(0).is_ok());
    }

    #[test]
    fn encode_requires_participants() {
        let config = BatsConfig::new(4, 100, 16).without_precoding();
        let mut s = session(&config);
        let err = s.encode_batch(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingPacket);
    }

    #[test]
    fn encoded_symbols_are_linear_combinations() {
        let config = BatsConfig::new(4, 100, 16).with_field(4, FieldKernel::Bitwise);
        let mut s = session(&config);
        let data = packets(100, 16);
        s.load_packets(&data).unwrap();
        s.generate_precode();
        let encoded = s.encode_batch(5).unwrap();
        assert_eq!(encoded.symbols.len(), 4);

        let field = s.field().clone();
        let mut expected = vec![vec![0u8; 16]; 4];
        for (id, coeffs) in encoded.vector.participants() {
            let packet = s.packet(id).unwrap();
            for (m, sym) in expected.iter_mut().enumerate() {
                for (d, &p) in sym.iter_mut().zip(packet) {
                    *d ^= mul_lanes(&field, p, coeffs[m]);
                }
            }
        }
        assert_eq!(encoded.symbols, expected);
    }

    fn mul_lanes(field: &Field, byte: u8, c: u8) -> u8 {
        let mut buf = [byte];
        field.mul_slice(&mut buf, c);
        buf[0]
    }

    #[test]
    fn stats_track_batches() {
        let config = BatsConfig::new(4, 100, 16).without_precoding();
        let mut s = session(&config);
        s.load_packets(&packets(100, 16)).unwrap();
        for key in 0..10 {
            s.encode_batch(key).unwrap();
        }
        let stats = s.stats();
        assert_eq!(stats.batches_generated, 10);
        assert_eq!(stats.batches_encoded, 10);
        assert_eq!(stats.bytes_encoded, 10 * 4 * 16);
        assert_eq!(stats.precode_runs, 0);
        assert!(stats.degree_min >= 1 && stats.degree_max <= 12);
        assert!(stats.to_string().starts_with("SessionStats(batches=10, encoded=10,"));
    }

    #[test]
    fn hdpc_key_from_config_is_used() {
        let data = packets(100, 16);
        let run = |config: &BatsConfig| {
            let mut s = session(config);
            s.load_packets(&data).unwrap();
            s.generate_precode();
            let last = s.params().total_num - 1;
            s.packet(last).unwrap().to_vec()
        };
        let base = BatsConfig::new(4, 100, 16);
        assert_ne!(run(&base), run(&base.clone().with_hdpc_key(1)));
        assert_eq!(run(&base), run(&base));
    }
}
