//! Fake-data provider capability and its `fake`-backed implementation.

mod adapter;
mod locales;

pub use adapter::FakeRsProvider;
pub use locales::LocaleKey;

use rand::RngCore;

/// Source of realistic-looking strings for entity synthesis.
///
/// Implementations draw all randomness from the supplied `rng` so that a
/// seeded run stays reproducible.
pub trait FakeDataProvider: Send + Sync {
    fn first_name(&self, rng: &mut dyn RngCore) -> String;

    fn last_name(&self, rng: &mut dyn RngCore) -> String;

    fn name(&self, rng: &mut dyn RngCore) -> String {
        let first = self.first_name(rng);
        let last = self.last_name(rng);
        format!("{first} {last}")
    }

    fn email(&self, rng: &mut dyn RngCore) -> String;

    fn city(&self, rng: &mut dyn RngCore) -> String;

    fn company(&self, rng: &mut dyn RngCore) -> String;

    fn word(&self, rng: &mut dyn RngCore) -> String;
}
