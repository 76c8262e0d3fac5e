//! Production points source.

use rand::Rng;
use tally_types::{Points, PointsSource};

/// Draws claim points uniformly at random from [1, 10] inclusive.
///
/// A gamified reward, not a security-sensitive value: the thread-local RNG
/// is sufficient as long as the ten outcomes stay uniform and draws stay
/// independent.
pub struct UniformPoints;

impl PointsSource for UniformPoints {
    fn draw(&self) -> Points {
        let value = rand::rng().random_range(Points::MIN..=Points::MAX);
        Points::new(value).expect("drawn within the claimable range")
    }
}
