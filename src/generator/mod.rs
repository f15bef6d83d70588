pub mod corridor;
pub mod crossing;
pub mod flexibility;
pub mod sequence;

use crate::level::{GameKind, LevelSelector};
use crate::round::RoundSpec;
use flexibility::{Playfield, Rule};

/// Everything a generator needs to know about the round it is building.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoundContext {
    pub level: LevelSelector,
    /// 1-based round number within the level.
    pub number: usize,
    /// Active mapping rule (flexibility only).
    pub rule: Rule,
    pub playfield: Playfield,
}

/// Trait for the per-game stimulus generators
pub trait RoundGenerator {
    /// Build one round. All randomness comes from `rng` so a seeded session
    /// is reproducible.
    fn generate(&self, ctx: &RoundContext, rng: &mut dyn rand::RngCore) -> RoundSpec;
}

pub fn generator_for(game: GameKind) -> Box<dyn RoundGenerator> {
    match game {
        GameKind::VerbalMemory => Box::new(sequence::SequenceGenerator),
        GameKind::SustainedAttention => Box::new(crossing::CrossingGenerator),
        GameKind::CognitionFlexibility => Box::new(flexibility::FlexibilityGenerator),
        GameKind::CorridorMemory => Box::new(corridor::CorridorGenerator),
    }
}
