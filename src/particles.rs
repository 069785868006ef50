use rand::Rng;
use std::f32::consts::TAU;

pub const DEFAULT_RAIN_DROPS: usize = 220;
pub const DEFAULT_SNOW_FLAKES: usize = 180;

/// Per-frame inputs shared by every particle in a pool.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// Canvas height in pixels; converts pixel sizes into normalized offsets.
    pub canvas_height: f32,
}

impl FrameContext {
    pub fn new(canvas_height: f32) -> Self {
        Self { canvas_height: canvas_height.max(1.0) }
    }
}

pub trait Particle {
    fn spawn<R: Rng + ?Sized>(rng: &mut R) -> Self;
    fn advance<R: Rng + ?Sized>(&mut self, ctx: &FrameContext, rng: &mut R);
}

/// Rain streak in normalized canvas coordinates. `length` and `width` are pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainDrop {
    pub x: f32,
    pub y: f32,
    pub length: f32,
    pub speed: f32,
    pub opacity: f32,
    pub width: f32,
    pub recycled: u32,
}

impl RainDrop {
    pub const MIN_SPEED: f32 = 0.004;
    pub const MAX_LENGTH: f32 = 40.0;
}

impl Particle for RainDrop {
    fn spawn<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x: rng.gen::<f32>(),
            y: rng.gen::<f32>(),
            length: 18.0 + rng.gen::<f32>() * 22.0,
            speed: Self::MIN_SPEED + rng.gen::<f32>() * 0.006,
            opacity: 0.35 + rng.gen::<f32>() * 0.45,
            width: 0.5 + rng.gen::<f32>() * 0.5,
            recycled: 0,
        }
    }

    fn advance<R: Rng + ?Sized>(&mut self, ctx: &FrameContext, rng: &mut R) {
        let span = self.length / ctx.canvas_height;
        self.y += self.speed;
        if self.y > 1.0 + span {
            self.y = -span;
            self.x = rng.gen::<f32>();
            self.recycled = self.recycled.wrapping_add(1);
        }
    }
}

/// Snowflake with a sinusoidal horizontal drift. `radius` is pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnowFlake {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub speed_y: f32,
    pub speed_x: f32,
    pub opacity: f32,
    pub wobble: f32,
    pub recycled: u32,
}

impl SnowFlake {
    pub const WOBBLE_STEP: f32 = 0.02;
    pub const WOBBLE_AMPLITUDE: f32 = 0.0003;
}

impl Particle for SnowFlake {
    fn spawn<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x: rng.gen::<f32>(),
            y: rng.gen::<f32>(),
            radius: 1.5 + rng.gen::<f32>() * 3.0,
            speed_y: 0.0008 + rng.gen::<f32>() * 0.002,
            speed_x: (rng.gen::<f32>() - 0.5) * 0.001,
            opacity: 0.5 + rng.gen::<f32>() * 0.5,
            wobble: rng.gen::<f32>() * TAU,
            recycled: 0,
        }
    }

    fn advance<R: Rng + ?Sized>(&mut self, ctx: &FrameContext, rng: &mut R) {
        self.y += self.speed_y;
        self.wobble += Self::WOBBLE_STEP;
        self.x += self.speed_x + self.wobble.sin() * Self::WOBBLE_AMPLITUDE;
        let span = self.radius / ctx.canvas_height;
        if self.y > 1.0 + span {
            self.y = -span;
            self.x = rng.gen::<f32>();
            self.recycled = self.recycled.wrapping_add(1);
        }
        if self.x < 0.0 {
            self.x = 1.0;
        }
        if self.x > 1.0 {
            self.x = 0.0;
        }
    }
}

/// Fixed-size particle pool. Built once, recycled in place, never resized.
#[derive(Debug, Clone)]
pub struct ParticlePool<P> {
    particles: Box<[P]>,
}

impl<P: Particle> ParticlePool<P> {
    pub fn new<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let particles: Vec<P> = (0..count).map(|_| P::spawn(rng)).collect();
        Self { particles: particles.into_boxed_slice() }
    }

    pub fn advance<R: Rng + ?Sized>(&mut self, ctx: &FrameContext, rng: &mut R) {
        for particle in self.particles.iter_mut() {
            particle.advance(ctx, rng);
        }
    }
}

impl<P> ParticlePool<P> {
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, P> {
        self.particles.iter()
    }

    pub fn as_slice(&self) -> &[P] {
        &self.particles
    }
}

pub type RainPool = ParticlePool<RainDrop>;
pub type SnowPool = ParticlePool<SnowFlake>;

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn spawned_drops_stay_in_documented_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = RainPool::new(DEFAULT_RAIN_DROPS, &mut rng);
        assert_eq!(pool.len(), DEFAULT_RAIN_DROPS);
        for drop in pool.iter() {
            assert!((0.0..1.0).contains(&drop.x));
            assert!((18.0..40.0).contains(&drop.length));
            assert!((0.004..0.010).contains(&drop.speed));
            assert!((0.35..0.80).contains(&drop.opacity));
            assert!((0.5..1.0).contains(&drop.width));
        }
    }

    #[test]
    fn snow_wraps_horizontally() {
        let mut rng = StdRng::seed_from_u64(3);
        let ctx = FrameContext::new(600.0);
        let mut flake = SnowFlake {
            x: 0.0001,
            y: 0.5,
            radius: 2.0,
            speed_y: 0.001,
            speed_x: -0.0005,
            opacity: 1.0,
            wobble: -std::f32::consts::FRAC_PI_2,
            recycled: 0,
        };
        flake.advance(&ctx, &mut rng);
        assert_eq!(flake.x, 1.0);
    }

    #[test]
    fn snow_recycles_past_bottom_edge() {
        let mut rng = StdRng::seed_from_u64(11);
        let ctx = FrameContext::new(500.0);
        let mut flake = SnowFlake::spawn(&mut rng);
        flake.y = 1.0 + flake.radius / 500.0;
        flake.advance(&ctx, &mut rng);
        assert_eq!(flake.recycled, 1);
        assert!((flake.y + flake.radius / 500.0).abs() < 1e-6);
        assert!((0.0..=1.0).contains(&flake.x));
    }
}
