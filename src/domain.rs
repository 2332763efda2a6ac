//! Coordinate mapping between the three index spaces of a BATS code.
//!
//! Batches pick participants in domain-local coordinates (SM ids `0..S`, PI
//! ids `0..P`) and the payload store is addressed by external ids
//! `0..K+L+H`. The two domains partition the external space exactly.

use crate::params::BatsParams;

/// Which decoding domain an external id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Sparse-matrix domain, decoded by belief propagation.
    Sm,
    /// Pre-inactivation domain, decoded by inactivation.
    Pi,
}

/// Index-space conversions derived from the session sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainMap {
    packet_num: usize,
    ldpc_num: usize,
    total_num: usize,
    sm_num: usize,
    pi_num: usize,
    sm_min_ld: usize,
    pi_min_hd: usize,
}

impl DomainMap {
    /// Builds the mapping for `params`.
    #[must_use]
    pub const fn new(params: &BatsParams) -> Self {
        Self {
            packet_num: params.packet_num,
            ldpc_num: params.ldpc_num,
            total_num: params.total_num,
            sm_num: params.sm_num,
            pi_num: params.pi_num,
            sm_min_ld: params.sm_min_ld,
            pi_min_hd: params.pi_min_hd,
        }
    }

    /// SM-domain id to external id.
    ///
    /// The first `smMinLd` SM ids are source packets; the rest are the LDPC
    /// checks, which sit past the PI-domain source segment.
    #[inline]
    #[must_use]
    pub const fn sm_to_ext(&self, sm_id: usize) -> usize {
        debug_assert!(sm_id < self.sm_num);
        if sm_id < self.sm_min_ld {
            sm_id
        } else {
            sm_id + self.pi_min_hd
        }
    }

    /// PI-domain id to external id.
    ///
    /// The first `piMinHd` PI ids are the trailing source packets; the rest
    /// are the HDPC checks.
    #[inline]
    #[must_use]
    pub const fn pi_to_ext(&self, pi_id: usize) -> usize {
        debug_assert!(pi_id < self.pi_num);
        if pi_id < self.pi_min_hd {
            pi_id + self.sm_min_ld
        } else {
            pi_id + self.sm_num
        }
    }

    /// External id to SM-domain id.
    ///
    /// Only meaningful for ids in the SM domain; check [`is_pre_inact`]
    /// first. A PI-domain source id yields `L + id`, which is not an SM id.
    ///
    /// [`is_pre_inact`]: Self::is_pre_inact
    #[inline]
    #[must_use]
    pub const fn ext_to_sm(&self, ext_id: usize) -> usize {
        debug_assert!(!self.is_pre_inact(ext_id), "external id is in the PI domain");
        if ext_id < self.sm_min_ld {
            ext_id
        } else if ext_id < self.packet_num {
            self.ldpc_num + ext_id
        } else {
            ext_id - self.pi_min_hd
        }
    }

    /// External id to PI-domain id; `None` for SM-domain ids.
    #[inline]
    #[must_use]
    pub const fn ext_to_pi(&self, ext_id: usize) -> Option<usize> {
        if !self.is_pre_inact(ext_id) {
            return None;
        }
        if ext_id < self.packet_num {
            Some(ext_id - self.sm_min_ld)
        } else {
            Some(ext_id - self.sm_num)
        }
    }

    /// Returns true if `ext_id` lies in the pre-inactivation domain.
    #[inline]
    #[must_use]
    pub const fn is_pre_inact(&self, ext_id: usize) -> bool {
        debug_assert!(ext_id < self.total_num, "external id out of range");
        (ext_id >= self.sm_min_ld && ext_id < self.packet_num)
            || ext_id >= self.packet_num + self.ldpc_num
    }

    /// The domain `ext_id` belongs to.
    #[inline]
    #[must_use]
    pub const fn domain_of(&self, ext_id: usize) -> Domain {
        if self.is_pre_inact(ext_id) {
            Domain::Pi
        } else {
            Domain::Sm
        }
    }

    /// Smallest batch id callers may search from: L.
    #[must_use]
    pub const fn smallest_bid(&self) -> usize {
        self.ldpc_num
    }

    /// Size of the external index space.
    #[must_use]
    pub const fn total_num(&self) -> usize {
        self.total_num
    }
}
