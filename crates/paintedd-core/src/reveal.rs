//! Progressive gallery reveal.
//!
//! The deck is shuffled once. The first chunk is shown for free; every roll
//! draws a rarity tier and reveals that many more artworks.

use std::ops::Range;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

pub const INITIAL_CHUNK: usize = 15;
pub const POINTS_PER_REVEAL: u64 = 10;
pub const POINTS_PER_ROLL: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tier {
    pub id: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub count: usize,
    /// Chance out of 100
    pub weight: u32,
}

pub const TIERS: [Tier; 4] = [
    Tier { id: "green", label: "8 ARTWORKS DETECTED", color: "#00ff9d", count: 8, weight: 50 },
    Tier { id: "blue", label: "16 ARTWORKS DETECTED", color: "#00a8ff", count: 16, weight: 30 },
    Tier { id: "purple", label: "24 ARTWORKS DETECTED", color: "#bd00ff", count: 24, weight: 15 },
    Tier { id: "gold", label: "40 ARTWORKS DETECTED", color: "#ffd700", count: 40, weight: 5 },
];

/// Draw a tier by weight.
pub fn roll_tier<R: Rng + ?Sized>(rng: &mut R) -> &'static Tier {
    let total: u32 = TIERS.iter().map(|t| t.weight).sum();
    let mut roll = rng.gen_range(0..total);
    for tier in &TIERS {
        if roll < tier.weight {
            return tier;
        }
        roll -= tier.weight;
    }
    &TIERS[0]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roll {
    pub tier: Tier,
    /// Indices into the deck revealed by this roll
    pub revealed: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct RevealDeck<T> {
    items: Vec<T>,
    revealed: usize,
    score: u64,
}

impl<T> RevealDeck<T> {
    pub fn new<R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Self {
        items.shuffle(rng);
        Self {
            items,
            revealed: 0,
            score: 0,
        }
    }

    /// Reveal the free first chunk. Only the first call reveals anything.
    pub fn start(&mut self) -> &[T] {
        if self.revealed > 0 {
            return &[];
        }
        let range = self.reveal(INITIAL_CHUNK);
        &self.items[range]
    }

    pub fn roll<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Roll> {
        if self.is_complete() {
            return None;
        }
        let tier = *roll_tier(rng);
        self.score += POINTS_PER_ROLL;
        let revealed = self.reveal(tier.count);
        debug!(tier = tier.id, revealed = revealed.len(), "Rolled");
        Some(Roll { tier, revealed })
    }

    fn reveal(&mut self, count: usize) -> Range<usize> {
        let start = self.revealed;
        let end = (start + count).min(self.items.len());
        self.revealed = end;
        self.score += (end - start) as u64 * POINTS_PER_REVEAL;
        start..end
    }

    pub fn revealed(&self) -> &[T] {
        &self.items[..self.revealed]
    }

    pub fn remaining(&self) -> usize {
        self.items.len() - self.revealed
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn is_complete(&self) -> bool {
        self.revealed >= self.items.len()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}
