//! BATS session parameters.
//!
//! Every structural count of a BATS code follows from three inputs: batch
//! size M, packet count K and packet size T. Encoder and decoder derive them
//! independently, so the formulas here are part of the wire contract.
//!
//! ```text
//! external ids:  [0 ........ K) [K ..... K+L) [K+L .... K+L+H)
//!                 source          LDPC checks   HDPC checks
//!
//! SM domain (S): [0, smMinLd) ∪ LDPC checks
//! PI domain (P): [smMinLd, K) ∪ HDPC checks
//! ```
//!
//! - L = floor(r*K + sqrt(c*K)), c = 3 for K < 20000 else 4
//! - H = max(5, floor(ln K)) when L > 0, else 0
//! - P = H + floor(sqrt(K)), S = K + L + H - P
//! - piDegree = min(floor(sqrt(M) + 2), P)

#![allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]

use serde::Serialize;

use crate::config::{BatsConfig, ConfigError, DEFAULT_LDPC_VAR_DEGREE, DEFAULT_PRECODE_RATE};
use crate::domain::DomainMap;

/// K at and above which the LDPC variance term uses `sqrt(4K)`.
const LARGE_BLOCK_THRESHOLD: usize = 20_000;

/// Smallest HDPC count once precoding is on.
const MIN_HDPC_NUM: usize = 5;

/// Derived parameters of a BATS session.
/// Serializable for logs and reports only; rebuild from a [`BatsConfig`]
/// rather than reading counts back in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatsParams {
    /// M: symbols per batch.
    pub batch_size: usize,
    /// K: source packets.
    pub packet_num: usize,
    /// T: bytes per packet.
    pub packet_size: usize,
    /// r: LDPC redundancy rate.
    pub precode_rate: f64,
    /// L: LDPC check packets.
    pub ldpc_num: usize,
    /// H: HDPC check packets.
    pub hdpc_num: usize,
    /// L + H.
    pub check_num: usize,
    /// K + L + H.
    pub total_num: usize,
    /// K + L.
    pub packet_and_ld_num: usize,
    /// P: packets in the pre-inactivation domain.
    pub pi_num: usize,
    /// S: packets in the sparse-matrix domain.
    pub sm_num: usize,
    /// S - L: SM-domain packets that are source packets.
    pub sm_min_ld: usize,
    /// P - H: PI-domain packets that are source packets.
    pub pi_min_hd: usize,
    /// PI participants per batch.
    pub pi_degree: usize,
    /// LDPC checks each source packet joins.
    pub ldpc_var_degree: usize,
}

impl BatsParams {
    /// Derives parameters with the default precode rate and precoding on.
    ///
    /// # Panics
    ///
    /// Panics if any input is zero.
    #[must_use]
    pub fn new(batch_size: usize, packet_num: usize, packet_size: usize) -> Self {
        Self::derive(
            batch_size,
            packet_num,
            packet_size,
            DEFAULT_PRECODE_RATE,
            true,
            DEFAULT_LDPC_VAR_DEGREE,
        )
    }

    /// Validates `config` and derives its parameters.
    pub fn from_config(config: &BatsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::derive(
            config.batch_size,
            config.packet_num,
            config.packet_size,
            config.precode_rate,
            config.precoding,
            config.ldpc_var_degree,
        ))
    }

    /// Derives every count from the encoding inputs.
    ///
    /// # Panics
    ///
    /// Panics if `batch_size`, `packet_num` or `packet_size` is zero, or if
    /// `precode_rate` is negative or not finite.
    #[must_use]
    pub fn derive(
        batch_size: usize,
        packet_num: usize,
        packet_size: usize,
        precode_rate: f64,
        precoding: bool,
        ldpc_var_degree: usize,
    ) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        assert!(packet_num > 0, "packet count must be positive");
        assert!(packet_size > 0, "packet size must be positive");
        assert!(
            precode_rate.is_finite() && precode_rate >= 0.0,
            "precode rate must be finite and non-negative"
        );

        let k = packet_num as f64;
        let ldpc_num = if precoding {
            let c = if packet_num < LARGE_BLOCK_THRESHOLD { 3.0 } else { 4.0 };
            (precode_rate * k + (c * k).sqrt()) as usize
        } else {
            0
        };
        let hdpc_num = if ldpc_num > 0 {
            (k.ln() as usize).max(MIN_HDPC_NUM)
        } else {
            0
        };

        let check_num = ldpc_num + hdpc_num;
        let total_num = packet_num + check_num;
        let pi_num = hdpc_num + k.sqrt() as usize;
        let pi_degree = (((batch_size as f64).sqrt() + 2.0) as usize).min(pi_num);
        let sm_num = total_num - pi_num;

        let params = Self {
            batch_size,
            packet_num,
            packet_size,
            precode_rate,
            ldpc_num,
            hdpc_num,
            check_num,
            total_num,
            packet_and_ld_num: packet_num + ldpc_num,
            pi_num,
            sm_num,
            sm_min_ld: sm_num - ldpc_num,
            pi_min_hd: pi_num - hdpc_num,
            pi_degree,
            ldpc_var_degree: if precoding { ldpc_var_degree } else { 0 },
        };
        debug_assert_eq!(params.sm_num + params.pi_num, params.total_num);
        params
    }

    /// Coordinate mapping between the external, SM and PI index spaces.
    #[must_use]
    pub const fn domains(&self) -> DomainMap {
        DomainMap::new(self)
    }

    /// Checks that the counts agree with each other.
    ///
    /// Always holds for derived parameters; guards values assembled or
    /// edited by hand.
    pub fn check(&self) -> Result<(), ConfigError> {
        let inconsistent = |reason: &'static str| -> Result<(), ConfigError> {
            Err(ConfigError::InconsistentParams { reason })
        };
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.packet_num == 0 {
            return Err(ConfigError::ZeroPacketNum);
        }
        if self.packet_size == 0 {
            return Err(ConfigError::ZeroPacketSize);
        }
        if self.check_num != self.ldpc_num + self.hdpc_num {
            return inconsistent("check_num != L + H");
        }
        if self.packet_and_ld_num != self.packet_num + self.ldpc_num {
            return inconsistent("packet_and_ld_num != K + L");
        }
        if self.total_num != self.packet_num + self.check_num {
            return inconsistent("total_num != K + L + H");
        }
        if self.sm_num + self.pi_num != self.total_num {
            return inconsistent("S + P != total_num");
        }
        if self.sm_min_ld + self.ldpc_num != self.sm_num {
            return inconsistent("smMinLd + L != S");
        }
        if self.pi_min_hd + self.hdpc_num != self.pi_num {
            return inconsistent("piMinHd + H != P");
        }
        if self.pi_degree > self.pi_num {
            return inconsistent("piDegree > P");
        }
        if self.hdpc_num == 1 {
            return inconsistent("H == 1");
        }
        Ok(())
    }

    /// Returns true when no check packets exist.
    #[must_use]
    pub const fn is_zero_precoding(&self) -> bool {
        self.check_num == 0
    }
}

impl std::fmt::Display for BatsParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BatsParams(M={}, K={}, T={}B, L={}, H={}, S={}, P={}, piDegree={})",
            self.batch_size,
            self.packet_num,
            self.packet_size,
            self.ldpc_num,
            self.hdpc_num,
            self.sm_num,
            self.pi_num,
            self.pi_degree,
        )
    }
}
