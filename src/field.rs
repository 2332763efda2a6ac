//! GF(2^m) finite-field arithmetic for BATS symbols.
//!
//! Implements the binary extension fields GF(2), GF(4), GF(16) and GF(256)
//! used for batch coefficients and symbol mixing.
//!
//! # Representation
//!
//! Coefficients are single field elements stored in a `u8`. Symbol payloads
//! are raw bytes holding `8 / m` packed elements each; slice operations act
//! lane-wise, so a byte of GF(16) data is two independent elements.
//!
//! # Kernels
//!
//! Two interchangeable implementations of the primitives exist, selected by
//! [`FieldKernel`]: log/exp table lookups, and plain shift-and-reduce
//! multiplication. They produce bit-identical results and are used to
//! cross-check each other.

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};

/// Slices at least this long build a 256-entry byte multiplication table
/// before the main loop.
const MUL_TABLE_THRESHOLD: usize = 64;

/// Primitive polynomial (with the x^m term) for each supported field order.
const fn primitive_poly(order: u8) -> Option<u16> {
    match order {
        1 => Some(0b11),
        2 => Some(0b111),
        4 => Some(0b1_0011),
        8 => Some(0x11D),
        _ => None,
    }
}

/// Which implementation of the field primitives performs the arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKernel {
    /// Log/exp tables, with per-scalar byte tables for long slices.
    #[default]
    Table,
    /// Carry-less shift-and-reduce multiplication, no tables.
    Bitwise,
}

/// A GF(2^m) arithmetic context.
///
/// Passed explicitly to every component that mixes symbols; there is no
/// global field instance.
#[derive(Clone)]
pub struct Field {
    order: u8,
    poly: u16,
    kernel: FieldKernel,
    lanes: u8,
    lane_mask: u8,
    /// `log[a]` = discrete log of `a` base alpha. `log[0]` is unused.
    log: Vec<u8>,
    /// `exp[i]` = alpha^i, mirrored so `exp[log a + log b]` needs no reduction.
    exp: Vec<u8>,
}

impl Field {
    /// Creates a field context for GF(2^`order`).
    ///
    /// Supported orders are 1, 2, 4 and 8.
    pub fn new(order: u8, kernel: FieldKernel) -> Result<Self, Error> {
        let poly = primitive_poly(order).ok_or_else(|| {
            Error::new(ErrorKind::InvalidParams)
                .with_message(format!("unsupported field order {order}, expected 1, 2, 4 or 8"))
        })?;
        let (log, exp) = build_tables(order, poly);
        Ok(Self {
            order,
            poly,
            kernel,
            lanes: 8 / order,
            lane_mask: ((1u16 << order) - 1) as u8,
            log,
            exp,
        })
    }

    /// GF(256) with the table kernel.
    #[must_use]
    pub fn gf256() -> Self {
        let (log, exp) = build_tables(8, 0x11D);
        Self {
            order: 8,
            poly: 0x11D,
            kernel: FieldKernel::Table,
            lanes: 1,
            lane_mask: 0xFF,
            log,
            exp,
        }
    }

    /// Returns the same field driven by a different kernel.
    #[must_use]
    pub fn with_kernel(mut self, kernel: FieldKernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Bits per element (m).
    #[must_use]
    pub const fn order(&self) -> u8 {
        self.order
    }

    /// Number of elements (2^m).
    #[must_use]
    pub const fn size(&self) -> usize {
        1 << self.order
    }

    /// The kernel in use.
    #[must_use]
    pub const fn kernel(&self) -> FieldKernel {
        self.kernel
    }

    /// Elements packed into one payload byte.
    #[must_use]
    pub const fn lanes_per_byte(&self) -> usize {
        self.lanes as usize
    }

    /// The element `x` (the integer 2) reduced into the field.
    ///
    /// Generator of the multiplicative group; in GF(2) this is 1.
    #[must_use]
    pub fn alpha(&self) -> u8 {
        xtime(1, self.order, self.poly) as u8
    }

    /// Returns true if `a` is a valid element of this field.
    #[must_use]
    pub const fn contains(&self, a: u8) -> bool {
        (a as usize) < self.size()
    }

    /// Field addition (XOR).
    #[inline]
    #[must_use]
    pub const fn add(&self, a: u8, b: u8) -> u8 {
        a ^ b
    }

    /// Field multiplication.
    #[inline]
    #[must_use]
    pub fn mul(&self, a: u8, b: u8) -> u8 {
        debug_assert!(self.contains(a) && self.contains(b), "operand outside GF(2^{})", self.order);
        match self.kernel {
            FieldKernel::Table => self.mul_table(a, b),
            FieldKernel::Bitwise => self.mul_bitwise(a, b),
        }
    }

    /// Exponentiation in the log domain.
    #[must_use]
    pub fn pow(&self, a: u8, exp: usize) -> u8 {
        if exp == 0 {
            return 1;
        }
        if a == 0 {
            return 0;
        }
        let group = self.size() - 1;
        let log_a = usize::from(self.log[a as usize]);
        self.exp[(log_a * (exp % group)) % group]
    }

    fn mul_table(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[usize::from(self.log[a as usize]) + usize::from(self.log[b as usize])]
    }

    fn mul_bitwise(&self, a: u8, b: u8) -> u8 {
        let mut a = u16::from(a);
        let mut b = b;
        let mut acc = 0u16;
        while b != 0 {
            if b & 1 != 0 {
                acc ^= a;
            }
            a = xtime(a, self.order, self.poly);
            b >>= 1;
        }
        acc as u8
    }

    /// Multiplies every packed element of `byte` by `c`.
    #[inline]
    fn mul_byte(&self, byte: u8, c: u8) -> u8 {
        if self.lanes == 1 {
            return self.mul(byte, c);
        }
        let mut out = 0u8;
        for lane in 0..self.lanes {
            let shift = lane * self.order;
            let x = (byte >> shift) & self.lane_mask;
            out |= self.mul(x, c) << shift;
        }
        out
    }

    /// `table[b]` = byte `b` with every lane multiplied by `c`.
    fn byte_table(&self, c: u8) -> [u8; 256] {
        let mut table = [0u8; 256];
        for (b, slot) in table.iter_mut().enumerate() {
            *slot = self.mul_byte(b as u8, c);
        }
        table
    }

    /// Vector addition: `dst[i] += src[i]`.
    ///
    /// # Panics
    ///
    /// Panics if `src.len() != dst.len()`.
    pub fn add_slice(&self, dst: &mut [u8], src: &[u8]) {
        assert_eq!(dst.len(), src.len(), "slice length mismatch");
        match self.kernel {
            FieldKernel::Table => xor_wide(dst, src),
            FieldKernel::Bitwise => {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d ^= s;
                }
            }
        }
    }

    /// Scalar-vector multiply: `dst[i] *= c`.
    ///
    /// Zero clears the slice; one is a no-op.
    pub fn mul_slice(&self, dst: &mut [u8], c: u8) {
        assert!(self.contains(c), "scalar {c} outside GF(2^{})", self.order);
        if c == 0 {
            dst.fill(0);
            return;
        }
        if c == 1 {
            return;
        }
        if self.kernel == FieldKernel::Table && dst.len() >= MUL_TABLE_THRESHOLD {
            let table = self.byte_table(c);
            mul_with_table_wide(dst, &table);
            return;
        }
        for d in dst.iter_mut() {
            *d = self.mul_byte(*d, c);
        }
    }

    /// Scaled vector addition: `dst[i] += c * src[i]`.
    ///
    /// # Panics
    ///
    /// Panics if `src.len() != dst.len()` or `c` is not a field element.
    pub fn addmul_slice(&self, dst: &mut [u8], src: &[u8], c: u8) {
        assert_eq!(dst.len(), src.len(), "slice length mismatch");
        assert!(self.contains(c), "scalar {c} outside GF(2^{})", self.order);
        if c == 0 {
            return;
        }
        if c == 1 {
            self.add_slice(dst, src);
            return;
        }
        if self.kernel == FieldKernel::Table && src.len() >= MUL_TABLE_THRESHOLD {
            let table = self.byte_table(c);
            addmul_with_table_wide(dst, src, &table);
            return;
        }
        for (d, s) in dst.iter_mut().zip(src) {
            *d ^= self.mul_byte(*s, c);
        }
    }
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Field(GF(2^{}), {:?})", self.order, self.kernel)
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.kernel == other.kernel
    }
}

impl Eq for Field {}

/// Multiply by x and reduce.
const fn xtime(v: u16, order: u8, poly: u16) -> u16 {
    let v = v << 1;
    if v & (1 << order) != 0 {
        v ^ poly
    } else {
        v
    }
}

fn build_tables(order: u8, poly: u16) -> (Vec<u8>, Vec<u8>) {
    let size = 1usize << order;
    let group = size - 1;
    let mut log = vec![0u8; size];
    let mut exp = vec![0u8; 2 * group];
    let mut val: u16 = 1;
    for i in 0..group {
        exp[i] = val as u8;
        exp[i + group] = val as u8;
        log[val as usize] = i as u8;
        val = xtime(val, order, poly);
    }
    (log, exp)
}

/// XOR `src` into `dst` eight bytes at a time.
fn xor_wide(dst: &mut [u8], src: &[u8]) {
    let mut d_chunks = dst.chunks_exact_mut(8);
    let mut s_chunks = src.chunks_exact(8);
    for (d_chunk, s_chunk) in d_chunks.by_ref().zip(s_chunks.by_ref()) {
        let mut d_arr = [0u8; 8];
        let mut s_arr = [0u8; 8];
        d_arr.copy_from_slice(d_chunk);
        s_arr.copy_from_slice(s_chunk);
        let result = u64::from_ne_bytes(d_arr) ^ u64::from_ne_bytes(s_arr);
        d_chunk.copy_from_slice(&result.to_ne_bytes());
    }
    for (d, s) in d_chunks
        .into_remainder()
        .iter_mut()
        .zip(s_chunks.remainder())
    {
        *d ^= s;
    }
}

fn mul_with_table_wide(dst: &mut [u8], table: &[u8; 256]) {
    let mut chunks = dst.chunks_exact_mut(8);
    for chunk in chunks.by_ref() {
        let t = [
            table[chunk[0] as usize],
            table[chunk[1] as usize],
            table[chunk[2] as usize],
            table[chunk[3] as usize],
            table[chunk[4] as usize],
            table[chunk[5] as usize],
            table[chunk[6] as usize],
            table[chunk[7] as usize],
        ];
        chunk.copy_from_slice(&t);
    }
    for d in chunks.into_remainder() {
        *d = table[*d as usize];
    }
}

fn addmul_with_table_wide(dst: &mut [u8], src: &[u8], table: &[u8; 256]) {
    let mut d_chunks = dst.chunks_exact_mut(8);
    let mut s_chunks = src.chunks_exact(8);
    for (d_chunk, s_chunk) in d_chunks.by_ref().zip(s_chunks.by_ref()) {
        let t = [
            table[s_chunk[0] as usize],
            table[s_chunk[1] as usize],
            table[s_chunk[2] as usize],
            table[s_chunk[3] as usize],
            table[s_chunk[4] as usize],
            table[s_chunk[5] as usize],
            table[s_chunk[6] as usize],
            table[s_chunk[7] as usize],
        ];
        let mut d_arr = [0u8; 8];
        d_arr.copy_from_slice(d_chunk);
        let result = u64::from_ne_bytes(d_arr) ^ u64::from_ne_bytes(t);
        d_chunk.copy_from_slice(&result.to_ne_bytes());
    }
    for (d, s) in d_chunks
        .into_remainder()
        .iter_mut()
        .zip(s_chunks.remainder())
    {
        *d ^= table[*s as usize];
    }
}
