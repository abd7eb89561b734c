use std::num::NonZeroU64;

/// Weyl increment of splitmix64; also separates the streams of one seed.
const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
const XORSHIFT_STAR: u64 = 0x2545_F491_4F6C_DD1D;

/// Stream ids, so the spawner and the synthetic hand never share a sequence for one seed.
pub const SPAWN_STREAM: u64 = 0;
pub const HAND_STREAM: u64 = 1;

/// Small deterministic generator (xorshift64*) for spawn placement and test input.
///
/// A run is reproduced exactly by its `(seed, stream)` pair on every platform. Not for
/// anything that needs unpredictability.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleRng {
    state: NonZeroU64,
}

/// splitmix64 finalizer: spreads a low-entropy seed (0, 1, 2, ...) over all 64 bits.
fn scramble(seed: u64) -> u64 {
    let z = [(30, 0xBF58_476D_1CE4_E5B9), (27, 0x94D0_49BB_1331_11EB)]
        .iter()
        .fold(seed, |z, &(shift, mul): &(u32, u64)| {
            (z ^ (z >> shift)).wrapping_mul(mul)
        });
    z ^ (z >> 31)
}

impl SimpleRng {
    /// The spawn stream of `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self::from_stream(seed, SPAWN_STREAM)
    }

    pub fn from_stream(seed: u64, stream: u64) -> Self {
        let offset = stream.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA);
        let mixed = scramble(seed.wrapping_add(offset));
        // xorshift is stuck at zero, the one state it must never start from.
        Self {
            state: NonZeroU64::new(mixed).unwrap_or(NonZeroU64::MIN),
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state.get();
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        // A non-zero state never shifts to zero.
        self.state = NonZeroU64::new(x).unwrap_or(NonZeroU64::MIN);
        x.wrapping_mul(XORSHIFT_STAR)
    }

    /// Uniform in `[0, 1)`: the top 23 bits become the mantissa of a float in `[1, 2)`.
    pub fn next_f32_01(&mut self) -> f32 {
        let mantissa = (self.next_u64() >> 41) as u32;
        f32::from_bits(0x3F80_0000 | mantissa) - 1.0
    }

    /// Uniform in `[min, max)`. An empty, inverted or non-finite range returns `min`.
    pub fn gen_range_f32(&mut self, min: f32, max: f32) -> f32 {
        if !(min.is_finite() && max.is_finite() && max > min) {
            return min;
        }
        let v = min + (max - min) * self.next_f32_01();
        // Rounding can land on `max` for wide ranges.
        if v < max { v } else { min }
    }
}
