//! Nullable points source — scripted claim draws.

use std::sync::Mutex;

use tally_types::{Points, PointsSource};

/// A deterministic points source for testing.
///
/// Returns pre-configured draws in order, cycling when the script runs out.
pub struct NullPoints {
    draws: Vec<Points>,
    index: Mutex<usize>,
}

impl NullPoints {
    /// Create with a sequence of deterministic draws.
    ///
    /// # Panics
    /// Panics if the script is empty or contains a value outside [1, 10].
    pub fn new(values: Vec<u8>) -> Self {
        assert!(!values.is_empty(), "draw script must not be empty");
        let draws = values
            .into_iter()
            .map(|v| Points::new(v).expect("scripted draw within the claimable range"))
            .collect();
        Self {
            draws,
            index: Mutex::new(0),
        }
    }

    /// Create with a single value returned for every draw.
    pub fn constant(value: u8) -> Self {
        Self::new(vec![value])
    }
}

impl PointsSource for NullPoints {
    fn draw(&self) -> Points {
        let mut idx = self.index.lock().unwrap();
        let current = *idx % self.draws.len();
        *idx += 1;
        self.draws[current]
    }
}
