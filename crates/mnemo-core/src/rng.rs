// Copyright 2026 The Mnemo Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// A minimal, zero-dependency, completely insecure PRNG used to fuzz
/// review intervals. Seeded explicitly, so scheduling stays deterministic
/// given the same inputs.
pub struct TinyRng {
    state: u64,
}

const A: u64 = 6364136223846793005;
const C: u64 = 1442695040888963407;

impl TinyRng {
    /// Initialize the RNG from a seed.
    pub fn from_seed(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        let new = self.state.wrapping_mul(A).wrapping_add(C);
        self.state = new;
        (new >> 32) as u32
    }

    // Generate random number in range [0, max).
    pub fn generate(&mut self, max: u32) -> u32 {
        self.next_u32() % max
    }

    /// Generate a number in the inclusive range [-magnitude, magnitude].
    pub fn generate_offset(&mut self, magnitude: u32) -> i64 {
        if magnitude == 0 {
            return 0;
        }
        self.generate(2 * magnitude + 1) as i64 - magnitude as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_for_seed() {
        let mut a = TinyRng::from_seed(7);
        let mut b = TinyRng::from_seed(7);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_offset_within_bounds() {
        let mut rng = TinyRng::from_seed(1);
        for _ in 0..1000 {
            let offset = rng.generate_offset(3);
            assert!((-3..=3).contains(&offset));
        }
        assert_eq!(rng.generate_offset(0), 0);
    }
}
