//! Batch degree sampling and encoding-vector generation.
//!
//! A batch is identified by a 64-bit key. Encoder and decoder reseed the
//! PRNG with that key, draw the degree, then keep drawing from the same
//! stream to pick participants and their coefficients. The two steps must
//! run back to back on one generator; [`crate::BatsSession::batch`] does
//! exactly that.

use serde::{Deserialize, Serialize};

use crate::distribution::DegreeDistribution;
use crate::field::Field;
use crate::params::BatsParams;
use crate::util::DetRng;

/// Participants and coefficients of one batch.
///
/// `sm_coeffs[i][m]` is the coefficient of packet `sm_indices[i]` in output
/// symbol `m`; likewise for the PI side. Indices are external ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchVector {
    /// Batch key the vector was generated from.
    pub key: u64,
    /// Number of SM-domain participants.
    pub degree: usize,
    /// External ids of the SM-domain participants, in draw order.
    pub sm_indices: Vec<usize>,
    /// M coefficients per SM participant; zero is allowed.
    pub sm_coeffs: Vec<Vec<u8>>,
    /// External ids of the PI-domain participants, in draw order.
    pub pi_indices: Vec<usize>,
    /// M coefficients per PI participant; never zero.
    pub pi_coeffs: Vec<Vec<u8>>,
}

impl BatchVector {
    /// Total number of participating packets.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.sm_indices.len() + self.pi_indices.len()
    }

    /// Iterates `(external id, coefficients)` over SM then PI participants.
    pub fn participants(&self) -> impl Iterator<Item = (usize, &[u8])> + '_ {
        self.sm_indices
            .iter()
            .zip(&self.sm_coeffs)
            .chain(self.pi_indices.iter().zip(&self.pi_coeffs))
            .map(|(&id, coeffs)| (id, coeffs.as_slice()))
    }
}

/// Samples the degree of batch `key`.
///
/// Reseeds `rng` with `key`, so the result depends only on the key, the
/// distribution and the parameters. The degree is clamped to S.
pub fn sample_degree(
    rng: &mut DetRng,
    dist: &DegreeDistribution,
    params: &BatsParams,
    key: u64,
) -> usize {
    rng.seed(key);
    dist.sample(rng.rand()).min(params.sm_num)
}

/// Draws the participants and coefficients of a batch of `degree`.
///
/// Continues the stream left by [`sample_degree`]; it does not reseed. For
/// each SM participant the index draw is followed by its M coefficient
/// draws, then the PI participants follow in the same pattern.
///
/// # Panics
///
/// Panics if `degree > S` or `piDegree > P`.
#[must_use]
pub fn generate_batch(
    rng: &mut DetRng,
    params: &BatsParams,
    field: &Field,
    key: u64,
    degree: usize,
) -> BatchVector {
    assert!(
        degree <= params.sm_num,
        "degree {degree} exceeds SM domain size {}",
        params.sm_num
    );
    assert!(
        params.pi_degree <= params.pi_num,
        "pi degree {} exceeds PI domain size {}",
        params.pi_degree,
        params.pi_num
    );

    let m = params.batch_size;
    let max_coeff = field.size() - 1;
    let domains = params.domains();

    let mut sm_ids: Vec<usize> = (0..params.sm_num).collect();
    let mut sm_indices = Vec::with_capacity(degree);
    let mut sm_coeffs = Vec::with_capacity(degree);
    for i in 0..degree {
        let sm = rng.pick_into(&mut sm_ids, i);
        sm_indices.push(domains.sm_to_ext(sm));
        sm_coeffs.push(draw_coeffs(rng, m, |rng| rng.rand_int(max_coeff)));
    }

    let mut pi_indices = Vec::with_capacity(params.pi_degree);
    let mut pi_coeffs = Vec::with_capacity(params.pi_degree);
    if params.pi_num > 0 {
        let mut pi_ids: Vec<usize> = (0..params.pi_num).collect();
        for i in 0..params.pi_degree {
            let pi = rng.pick_into(&mut pi_ids, i);
            pi_indices.push(domains.pi_to_ext(pi));
            pi_coeffs.push(draw_coeffs(rng, m, |rng| rng.rand_int(max_coeff - 1) + 1));
        }
    }

    BatchVector {
        key,
        degree,
        sm_indices,
        sm_coeffs,
        pi_indices,
        pi_coeffs,
    }
}

fn draw_coeffs(rng: &mut DetRng, m: usize, draw: impl Fn(&mut DetRng) -> usize) -> Vec<u8> {
    (0..m).map(|_| draw(rng) as u8).collect()
}
