//! Internal utilities.
//!
//! Only the keyed PRNG lives here; it is shared by the precode and batch
//! generators and must stay bit-for-bit stable across releases.

pub mod det_rng;

pub use det_rng::DetRng;
