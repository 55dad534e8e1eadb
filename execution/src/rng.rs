//! Deterministic randomness for game sessions.

use commonware_cryptography::{sha256::Sha256, Hasher};

/// Server seed every session's randomness is derived from.
pub type Seed = [u8; 32];

/// Deterministic random number generator.
///
/// Uses SHA256 hash chains seeded from the server seed, the session id and a
/// per-session stream number, so a session replays identically from its seed.
#[derive(Clone)]
pub struct GameRng {
    state: [u8; 32],
    index: usize,
}

impl GameRng {
    /// Create a new RNG from a seed, session ID, and stream number.
    pub fn new(seed: &Seed, session_id: u64, stream: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        hasher.update(&session_id.to_be_bytes());
        hasher.update(&stream.to_be_bytes());
        Self {
            state: hasher.finalize().0,
            index: 0,
        }
    }

    fn next_byte(&mut self) -> u8 {
        if self.index >= 32 {
            let mut hasher = Sha256::new();
            hasher.update(&self.state);
            self.state = hasher.finalize().0;
            self.index = 0;
        }
        let result = self.state[self.index];
        self.index += 1;
        result
    }

    pub fn next_u8(&mut self) -> u8 {
        self.next_byte()
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        for byte in bytes.iter_mut() {
            *byte = self.next_byte();
        }
        u64::from_be_bytes(bytes)
    }

    /// Get a random value in range [0, max).
    pub fn next_bounded(&mut self, max: u8) -> u8 {
        if max == 0 {
            return 0;
        }
        // Rejection sampling keeps the distribution unbiased.
        let limit = u8::MAX - (u8::MAX % max);
        loop {
            let value = self.next_u8();
            if value < limit {
                return value % max;
            }
        }
    }

    /// Get a random value in the inclusive range [lo, hi].
    pub fn range_inclusive(&mut self, lo: u64, hi: u64) -> u64 {
        if hi <= lo {
            return lo;
        }
        let span = hi - lo;
        if span == u64::MAX {
            return self.next_u64();
        }
        let span = span + 1;
        let limit = u64::MAX - (u64::MAX % span);
        loop {
            let value = self.next_u64();
            if value < limit {
                return lo + value % span;
            }
        }
    }

    /// Pick an index into a collection of `len` elements.
    pub fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.range_inclusive(0, len as u64 - 1) as usize
    }

    /// Shuffle a slice in place using Fisher-Yates.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.pick(i + 1);
            slice.swap(i, j);
        }
    }

    /// Roll a single die (1-6).
    pub fn roll_die(&mut self) -> u8 {
        self.next_bounded(6) + 1
    }

    pub fn coin(&mut self) -> bool {
        self.next_u8() & 1 == 1
    }
}
