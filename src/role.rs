//! Privacy role assigner: randomized response over contextual roles
//!
//! A person mention gets a role inferred from keyword triggers in its
//! surrounding text. The reported role is then drawn from a categorical
//! distribution: the inferred role with probability ε and each of the other
//! four candidates with `(1 - ε) / 4`. Without an inferred role all five
//! candidates are equally likely.

use crate::error::{Result, ShieldError};
use crate::types::Role;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Keyword triggers, checked in order; the first hit wins
const TRIGGERS: [(&[&str], Role); 4] = [
    (&["requested", "submitted"], Role::Requester),
    (&["approval", "confirmation"], Role::Approver),
    (&["compliance", "regulatory"], Role::Compliance),
    (&["from"], Role::Vendor),
];

/// Up to `radius` characters on each side of `start..end`
///
/// Offsets must lie on char boundaries of `text`.
pub fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let lo = if radius == 0 {
        start
    } else {
        text[..start]
            .char_indices()
            .rev()
            .nth(radius - 1)
            .map(|(i, _)| i)
            .unwrap_or(0)
    };
    let hi = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    &text[lo..hi]
}

/// Role suggested by keyword triggers in `context`, if any
pub fn infer_role(context: &str) -> Option<Role> {
    let lower = context.to_lowercase();
    TRIGGERS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, role)| *role)
}

/// Draw weights over `Role::ALL`
pub fn role_weights(inferred: Option<Role>, epsilon: f64) -> [f64; 5] {
    match inferred {
        Some(role) => {
            let rest = (1.0 - epsilon) / 4.0;
            Role::ALL.map(|r| if r == role { epsilon } else { rest })
        }
        None => [0.2; 5],
    }
}

/// Draw a reported role from `rng`
pub fn sample_role<R: Rng + ?Sized>(rng: &mut R, inferred: Option<Role>, epsilon: f64) -> Result<Role> {
    let weights = role_weights(inferred, epsilon);
    let dist = WeightedIndex::new(weights)
        .map_err(|e| ShieldError::Config(format!("invalid role weights for epsilon {}: {}", epsilon, e)))?;
    Ok(Role::ALL[dist.sample(rng)])
}

/// Seedable random source shared by every sanitization call of an engine
///
/// The lock is held only for a single draw.
pub struct RoleNoise {
    rng: Mutex<StdRng>,
}

impl RoleNoise {
    /// Seeded from `seed`, or from OS entropy when `None`
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Restart the sequence from `seed`
    pub fn reseed(&self, seed: u64) {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        *rng = StdRng::seed_from_u64(seed);
    }

    pub fn draw(&self, inferred: Option<Role>, epsilon: f64) -> Result<Role> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        sample_role(&mut *rng, inferred, epsilon)
    }
}

impl std::fmt::Debug for RoleNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleNoise").finish_non_exhaustive()
    }
}
