//! Packet storage addressed by external id.
//!
//! Source packets are loaded one by one (or all at once) and may be absent;
//! check packets exist only after the precode has been generated. Every
//! packet is exactly T bytes.

use crate::error::{Error, ErrorKind, Result};
use crate::field::Field;
use crate::params::BatsParams;
use crate::precode;
use crate::util::DetRng;

/// Source and check packets of one session.
#[derive(Debug, Clone)]
pub struct SymbolStore {
    packet_size: usize,
    sources: Vec<Option<Vec<u8>>>,
    /// LDPC checks followed by HDPC checks; empty until generated.
    checks: Vec<Vec<u8>>,
    check_num: usize,
}

impl SymbolStore {
    /// Creates an empty store sized for `params`.
    #[must_use]
    pub fn new(params: &BatsParams) -> Self {
        Self {
            packet_size: params.packet_size,
            sources: vec![None; params.packet_num],
            checks: Vec::new(),
            check_num: params.check_num,
        }
    }

    /// Stores source packet `index`, replacing any previous content.
    ///
    /// Invalidates previously generated check packets.
    pub fn set_source(&mut self, index: usize, packet: &[u8]) -> Result<()> {
        if index >= self.sources.len() {
            return Err(Error::new(ErrorKind::InvalidPacketIndex).with_message(format!(
                "source index {index} out of range 0..{}",
                self.sources.len()
            )));
        }
        self.check_len(packet)?;
        self.sources[index] = Some(packet.to_vec());
        self.checks.clear();
        Ok(())
    }

    /// Loads source packets `0..packets.len()`.
    pub fn load_sources<P: AsRef<[u8]>>(&mut self, packets: &[P]) -> Result<()> {
        if packets.len() > self.sources.len() {
            return Err(Error::new(ErrorKind::InvalidPacketIndex).with_message(format!(
                "{} packets given, session holds {}",
                packets.len(),
                self.sources.len()
            )));
        }
        for packet in packets {
            self.check_len(packet.as_ref())?;
        }
        for (slot, packet) in self.sources.iter_mut().zip(packets) {
            *slot = Some(packet.as_ref().to_vec());
        }
        self.checks.clear();
        Ok(())
    }

    /// Number of source packets currently loaded.
    #[must_use]
    pub fn loaded_sources(&self) -> usize {
        self.sources.iter().filter(|p| p.is_some()).count()
    }

    /// Returns true when check packets are available, or none are needed.
    #[must_use]
    pub fn has_precode(&self) -> bool {
        self.check_num == 0 || !self.checks.is_empty()
    }

    /// Packet at external id `ext`, or `None` if absent or out of range.
    #[must_use]
    pub fn get(&self, ext: usize) -> Option<&[u8]> {
        let k = self.sources.len();
        if ext < k {
            self.sources[ext].as_deref()
        } else {
            self.checks.get(ext - k).map(Vec::as_slice)
        }
    }

    /// Generates the LDPC then HDPC check packets from the loaded sources.
    ///
    /// Missing sources count as zero packets.
    pub fn generate_precode(
        &mut self,
        params: &BatsParams,
        field: &Field,
        rng: &mut DetRng,
        ldpc_key: u64,
        hdpc_key: u64,
    ) {
        let mut checks = vec![vec![0u8; self.packet_size]; params.check_num];
        let (ldpc, hdpc) = checks.split_at_mut(params.ldpc_num);
        let sources: Vec<Option<&[u8]>> = self.sources.iter().map(Option::as_deref).collect();

        let neighbors = precode::ldpc_neighbors(
            rng,
            ldpc_key,
            params.packet_num,
            params.ldpc_num,
            params.ldpc_var_degree,
        );
        precode::generate_ldpc(field, &neighbors, &sources, ldpc);

        let input: Vec<Option<&[u8]>> = sources
            .iter()
            .copied()
            .chain(ldpc.iter().map(|p| Some(p.as_slice())))
            .collect();
        precode::generate_hdpc(field, rng, hdpc_key, hdpc, &input);

        self.checks = checks;
    }

    fn check_len(&self, packet: &[u8]) -> Result<()> {
        if packet.len() == self.packet_size {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::SymbolSizeMismatch).with_message(format!(
                "expected {} bytes, got {}",
                self.packet_size,
                packet.len()
            )))
        }
    }
}
