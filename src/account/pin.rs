//! Activation PIN codes.

use rand::{Rng, RngCore};

/// Number of decimal digits in an activation code.
pub const PIN_DIGITS: usize = 4;

/// Generates 4-digit activation codes, uniform over `"0000"`..=`"9999"`.
///
/// Codes are not unique across users; the registry tolerates collisions and
/// activation is keyed by whichever pending row matches the code. The rng is
/// injected so tests can seed it.
#[derive(Debug)]
pub struct PinGenerator<R> {
    rng: R,
}

impl<R: RngCore> PinGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn generate(&mut self) -> String {
        format!("{:04}", self.rng.gen_range(0..=9999u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use regex::Regex;

    #[test]
    fn pins_are_four_decimal_digits() {
        let re = Regex::new(r"^\d{4}$").unwrap();
        let mut pins = PinGenerator::new(StdRng::seed_from_u64(1));
        for _ in 0..10_000 {
            let pin = pins.generate();
            assert!(re.is_match(&pin), "unexpected pin: {pin}");
        }
    }

    #[test]
    fn pins_are_roughly_uniform() {
        let mut pins = PinGenerator::new(StdRng::seed_from_u64(2));
        let mut buckets = [0u32; 10];
        for _ in 0..10_000 {
            let pin = pins.generate();
            let first = pin.as_bytes()[0] - b'0';
            buckets[first as usize] += 1;
        }
        // 1000 expected per leading digit; allow a generous band.
        for (digit, count) in buckets.iter().enumerate() {
            assert!(
                (700..=1300).contains(count),
                "digit {digit} count {count} outside expected band"
            );
        }
    }

    #[test]
    fn seeded_rng_makes_generation_deterministic() {
        let mut first = PinGenerator::new(StdRng::seed_from_u64(3));
        let mut second = PinGenerator::new(StdRng::seed_from_u64(3));
        for _ in 0..100 {
            assert_eq!(first.generate(), second.generate());
        }
    }

    #[test]
    fn zero_padding_is_preserved() {
        // Walk until a sub-1000 value shows up and check its width.
        let mut pins = PinGenerator::new(StdRng::seed_from_u64(4));
        let pin = loop {
            let pin = pins.generate();
            if pin.parse::<u16>().unwrap() < 1000 {
                break pin;
            }
        };
        assert_eq!(pin.len(), PIN_DIGITS);
        assert!(pin.starts_with('0'));
    }
}
