//! Session configuration.
//!
//! [`BatsConfig`] carries the three encoding inputs (batch size, packet
//! count, packet size) plus the tunables that both encoder and decoder must
//! agree on: precode rate, field, and the fixed PRNG keys of the precode.

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};
use crate::field::FieldKernel;

/// Default LDPC redundancy rate `r` in `L = r*K + sqrt(c*K)`.
pub const DEFAULT_PRECODE_RATE: f64 = 0.0101;

/// Default HDPC generation key.
///
/// Tuned empirically: good for GF(16) and GF(256), poor for GF(4).
pub const DEFAULT_HDPC_KEY: u64 = 54_896;

/// Default LDPC neighbour-selection key.
pub const DEFAULT_LDPC_KEY: u64 = 29_917;

/// Default number of LDPC checks each source packet joins.
pub const DEFAULT_LDPC_VAR_DEGREE: usize = 3;

/// Errors produced while validating a [`BatsConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Batch size must be positive.
    #[error("batch size must be positive")]
    ZeroBatchSize,
    /// Packet count must be positive.
    #[error("packet count must be positive")]
    ZeroPacketNum,
    /// Packet size must be positive.
    #[error("packet size must be positive")]
    ZeroPacketSize,
    /// Precode rate is negative or not finite.
    #[error("precode rate must be a finite non-negative number, got {rate}")]
    InvalidPrecodeRate {
        /// The rejected rate.
        rate: f64,
    },
    /// LDPC variable degree is zero while precoding is enabled.
    #[error("ldpc variable degree must be positive when precoding is enabled")]
    ZeroLdpcVarDegree,
    /// Field order is not one of 1, 2, 4, 8.
    #[error("unsupported field order {order}, expected 1, 2, 4 or 8")]
    UnsupportedFieldOrder {
        /// The rejected order.
        order: u8,
    },
    /// Hand-assembled parameters whose counts disagree.
    #[error("inconsistent parameters: {reason}")]
    InconsistentParams {
        /// The violated relation.
        reason: &'static str,
    },
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::InvalidParams).with_message(err.to_string())
    }
}

/// Configuration for a BATS encoding or decoding session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatsConfig {
    /// Batch size M: symbols per batch.
    ///
    /// Default: 16
    pub batch_size: usize,

    /// Packet count K: source packets, excluding check packets.
    ///
    /// Default: 1600
    pub packet_num: usize,

    /// Packet size T in bytes.
    ///
    /// Default: 1024
    pub packet_size: usize,

    /// LDPC redundancy rate.
    ///
    /// Default: 0.0101
    pub precode_rate: f64,

    /// Whether LDPC/HDPC check packets are generated at all.
    ///
    /// `false` forces L = H = 0.
    ///
    /// Default: true
    pub precoding: bool,

    /// Number of LDPC checks each source packet joins.
    ///
    /// Default: 3
    pub ldpc_var_degree: usize,

    /// Bits per field element.
    ///
    /// Default: 8
    pub field_order: u8,

    /// Field primitive implementation.
    ///
    /// Default: table
    pub field_kernel: FieldKernel,

    /// PRNG key for HDPC generation.
    ///
    /// Default: 54896
    pub hdpc_key: u64,

    /// PRNG key for LDPC neighbour selection.
    ///
    /// Default: 29917
    pub ldpc_key: u64,
}

impl Default for BatsConfig {
    fn default() -> Self {
        Self {
            batch_size: 16,
            packet_num: 1600,
            packet_size: 1024,
            precode_rate: DEFAULT_PRECODE_RATE,
            precoding: true,
            ldpc_var_degree: DEFAULT_LDPC_VAR_DEGREE,
            field_order: 8,
            field_kernel: FieldKernel::Table,
            hdpc_key: DEFAULT_HDPC_KEY,
            ldpc_key: DEFAULT_LDPC_KEY,
        }
    }
}

impl BatsConfig {
    /// Configuration for the given encoding inputs with all tunables at
    /// their defaults.
    #[must_use]
    pub fn new(batch_size: usize, packet_num: usize, packet_size: usize) -> Self {
        Self {
            batch_size,
            packet_num,
            packet_size,
            ..Self::default()
        }
    }

    /// Disables precoding (L = H = 0).
    #[must_use]
    pub fn without_precoding(mut self) -> Self {
        self.precoding = false;
        self
    }

    /// Selects the field order and kernel.
    #[must_use]
    pub fn with_field(mut self, order: u8, kernel: FieldKernel) -> Self {
        self.field_order = order;
        self.field_kernel = kernel;
        self
    }

    /// Overrides the HDPC generation key.
    #[must_use]
    pub fn with_hdpc_key(mut self, key: u64) -> Self {
        self.hdpc_key = key;
        self
    }

    /// Checks every field for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.packet_num == 0 {
            return Err(ConfigError::ZeroPacketNum);
        }
        if self.packet_size == 0 {
            return Err(ConfigError::ZeroPacketSize);
        }
        if !self.precode_rate.is_finite() || self.precode_rate < 0.0 {
            return Err(ConfigError::InvalidPrecodeRate {
                rate: self.precode_rate,
            });
        }
        if self.precoding && self.ldpc_var_degree == 0 {
            return Err(ConfigError::ZeroLdpcVarDegree);
        }
        if !matches!(self.field_order, 1 | 2 | 4 | 8) {
            return Err(ConfigError::UnsupportedFieldOrder {
                order: self.field_order,
            });
        }
        Ok(())
    }
}
