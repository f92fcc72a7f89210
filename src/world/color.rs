use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// color carried by blend cells that were never randomized or reborn.
    pub const SEED: Rgb = Rgb::new(0x4c, 0xaf, 0x50);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::new(rng.gen(), rng.gen(), rng.gen())
    }

    /// moves `self` toward `other` by `ratio` (0.0 keeps `self`, 1.0 yields `other`).
    pub fn lerp(self, other: Rgb, ratio: f32) -> Self {
        Self::new(
            lerp_channel(self.r, other.r, ratio),
            lerp_channel(self.g, other.g, ratio),
            lerp_channel(self.b, other.b, ratio),
        )
    }
}

fn lerp_channel(a: u8, b: u8, ratio: f32) -> u8 {
    let a = a as f32;
    let b = b as f32;
    (a + (b - a) * ratio).round().clamp(0.0, 255.0) as u8
}

impl From<Rgb> for termion::color::Rgb {
    fn from(Rgb { r, g, b }: Rgb) -> Self {
        termion::color::Rgb(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn lerp_endpoints() {
        let black = Rgb::new(0, 0, 0);
        let white = Rgb::new(255, 255, 255);
        assert_eq!(black.lerp(white, 0.0), black);
        assert_eq!(black.lerp(white, 1.0), white);
        assert_eq!(black.lerp(white, 0.5), Rgb::new(128, 128, 128));
    }

    #[test]
    fn lerp_moves_down_as_well_as_up() {
        let a = Rgb::new(200, 10, 100);
        let b = Rgb::new(100, 110, 100);
        assert_eq!(a.lerp(b, 0.25), Rgb::new(175, 35, 100));
    }

    #[test]
    fn random_is_reproducible_from_seed() {
        let mut first = StdRng::seed_from_u64(7);
        let mut second = StdRng::seed_from_u64(7);
        assert_eq!(Rgb::random(&mut first), Rgb::random(&mut second));
    }
}
