//! Token colors

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A colored game piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    Blue,
    Green,
    Orange,
    Purple,
    Red,
    Yellow,
    Black,
}

impl Token {
    /// Every variant, in value order
    pub const ALL: [Token; 7] = [
        Token::Blue,
        Token::Green,
        Token::Orange,
        Token::Purple,
        Token::Red,
        Token::Yellow,
        Token::Black,
    ];

    /// Pick a token uniformly at random
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn value(&self) -> u8 {
        *self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Token::Blue => "blue",
            Token::Green => "green",
            Token::Orange => "orange",
            Token::Purple => "purple",
            Token::Red => "red",
            Token::Yellow => "yellow",
            Token::Black => "black",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_value_roundtrip() {
        for token in Token::ALL {
            assert_eq!(Token::from_value(token.value()), Some(token));
        }
        assert_eq!(Token::from_value(7), None);
    }

    #[test]
    fn test_random_covers_all_colors() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut seen = [0u32; 7];
        for _ in 0..7_000 {
            seen[Token::random(&mut rng).value() as usize] += 1;
        }
        // Roughly uniform: every color well represented
        assert!(seen.iter().all(|&n| n > 700), "counts: {:?}", seen);
    }
}
