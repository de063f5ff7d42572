use fake::Fake;
use rand::RngCore;

use super::FakeDataProvider;
use super::locales::LocaleKey;

/// Pick the faker for the active locale and draw a `String` from it.
macro_rules! localized {
    ($locale:expr, $rng:expr, $module:ident :: $faker:ident) => {{
        let value: String = match $locale {
            LocaleKey::EnUs => fake::faker::$module::en::$faker().fake_with_rng($rng),
            LocaleKey::PtBr => fake::faker::$module::pt_br::$faker().fake_with_rng($rng),
        };
        value
    }};
}

/// [`FakeDataProvider`] backed by the `fake` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeRsProvider {
    locale: LocaleKey,
}

impl FakeRsProvider {
    pub fn new(locale: LocaleKey) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> LocaleKey {
        self.locale
    }
}

impl FakeDataProvider for FakeRsProvider {
    fn first_name(&self, rng: &mut dyn RngCore) -> String {
        localized!(self.locale, rng, name::FirstName)
    }

    fn last_name(&self, rng: &mut dyn RngCore) -> String {
        localized!(self.locale, rng, name::LastName)
    }

    fn email(&self, rng: &mut dyn RngCore) -> String {
        localized!(self.locale, rng, internet::SafeEmail)
    }

    fn city(&self, rng: &mut dyn RngCore) -> String {
        localized!(self.locale, rng, address::CityName)
    }

    fn company(&self, rng: &mut dyn RngCore) -> String {
        localized!(self.locale, rng, company::CompanyName)
    }

    fn word(&self, rng: &mut dyn RngCore) -> String {
        localized!(self.locale, rng, lorem::Word)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn same_seed_yields_same_values() {
        let provider = FakeRsProvider::new(LocaleKey::EnUs);
        let mut rng_a = ChaCha8Rng::seed_from_u64(7);
        let mut rng_b = ChaCha8Rng::seed_from_u64(7);

        assert_eq!(provider.name(&mut rng_a), provider.name(&mut rng_b));
        assert_eq!(provider.email(&mut rng_a), provider.email(&mut rng_b));
        assert_eq!(provider.company(&mut rng_a), provider.company(&mut rng_b));
    }

    #[test]
    fn values_are_non_empty_in_every_locale() {
        for locale in [LocaleKey::EnUs, LocaleKey::PtBr] {
            let provider = FakeRsProvider::new(locale);
            let mut rng = ChaCha8Rng::seed_from_u64(11);
            assert!(!provider.first_name(&mut rng).is_empty());
            assert!(!provider.city(&mut rng).is_empty());
            assert!(!provider.word(&mut rng).is_empty());
            assert!(provider.email(&mut rng).contains('@'));
        }
    }

    #[test]
    fn parses_known_locales_only() {
        assert_eq!(LocaleKey::parse("pt_BR"), Some(LocaleKey::PtBr));
        assert_eq!(LocaleKey::parse("fr_FR"), None);
        assert_eq!(LocaleKey::default().as_str(), "en_US");
    }
}
