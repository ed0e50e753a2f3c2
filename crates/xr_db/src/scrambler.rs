//! Keyed byte substitution transform applied to packed header payloads.
//!
//! 2947-era archives obscure the directory index with a reversible, non-cryptographic
//! transform: every byte is XOR-ed with a linear-congruential key stream and pushed through a
//! 256 byte substitution box derived from a second seeded shuffle. The RU and worldwide
//! releases use different seeds and shuffle lengths, so the two directions are separate keyed
//! transforms rather than a single involution.

const SEED_MULT: u32 = 0x808_8405;
const SBOX_SIZE: usize = 256;

const SEED_RU: u32 = 0x131_a9d3;
const SBOX_SEED_RU: u32 = 0x132_9436;
const ROUNDS_MULT_RU: usize = 8;

const SEED_WW: u32 = 0x16e_b2eb;
const SBOX_SEED_WW: u32 = 0x5b_bc4b;
const ROUNDS_MULT_WW: usize = 4;

/// Key schedule selector for the two scrambled releases
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ScramblerKey {
    /// 2947 RU release
    Ru,
    /// 2947 worldwide release
    Ww,
}

/// Precomputed substitution boxes and stream seed for one key schedule
pub struct Scrambler {
    seed: u32,
    enc_sbox: [u8; SBOX_SIZE],
    dec_sbox: [u8; SBOX_SIZE],
}

fn next_seed(seed: u32) -> u32 {
    seed.wrapping_mul(SEED_MULT).wrapping_add(1)
}

fn key_byte(seed: u32) -> u8 {
    (seed >> 24) as u8
}

impl Scrambler {
    /// Build the substitution boxes for the given key schedule.
    pub fn new(key: ScramblerKey) -> Self {
        let (seed, sbox_seed, rounds_mult) = match key {
            ScramblerKey::Ru => (SEED_RU, SBOX_SEED_RU, ROUNDS_MULT_RU),
            ScramblerKey::Ww => (SEED_WW, SBOX_SEED_WW, ROUNDS_MULT_WW),
        };

        let mut enc_sbox = [0u8; SBOX_SIZE];
        for (i, slot) in enc_sbox.iter_mut().enumerate() {
            *slot = i as u8;
        }

        // Shuffle by repeated swaps of two distinct stream-chosen positions.
        let mut shuffle_seed = sbox_seed;
        for _ in 0..rounds_mult * SBOX_SIZE {
            shuffle_seed = next_seed(shuffle_seed);
            let a = key_byte(shuffle_seed) as usize;
            let b = loop {
                shuffle_seed = next_seed(shuffle_seed);
                let b = key_byte(shuffle_seed) as usize;
                if a != b {
                    break b;
                }
            };
            enc_sbox.swap(a, b);
        }

        let mut dec_sbox = [0u8; SBOX_SIZE];
        for (i, &mapped) in enc_sbox.iter().enumerate() {
            dec_sbox[mapped as usize] = i as u8;
        }

        Scrambler { seed, enc_sbox, dec_sbox }
    }

    /// Reverse the on-disk transform. Any byte sequence maps to another of equal length.
    pub fn descramble(&self, src: &[u8]) -> Vec<u8> {
        let mut seed = self.seed;
        src.iter()
            .map(|&b| {
                seed = next_seed(seed);
                self.dec_sbox[(b ^ key_byte(seed)) as usize]
            })
            .collect()
    }

    /// Apply the on-disk transform, the inverse of [`Scrambler::descramble`].
    pub fn scramble(&self, src: &[u8]) -> Vec<u8> {
        let mut seed = self.seed;
        src.iter()
            .map(|&b| {
                seed = next_seed(seed);
                self.enc_sbox[b as usize] ^ key_byte(seed)
            })
            .collect()
    }
}
