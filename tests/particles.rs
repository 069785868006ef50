use rand::rngs::StdRng;
use rand::SeedableRng;
use skyroom::particles::{FrameContext, RainDrop, RainPool, SnowFlake, SnowPool, DEFAULT_RAIN_DROPS};

#[test]
fn rain_pool_keeps_size_and_recycles_drops() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut pool = RainPool::new(64, &mut rng);
    let ctx = FrameContext::new(200.0);
    for _ in 0..600 {
        pool.advance(&ctx, &mut rng);
        for drop in pool.iter() {
            let span = drop.length / ctx.canvas_height;
            assert!(drop.y >= -span - 1e-6 && drop.y <= 1.0 + span + 1e-6, "drop left the band: {}", drop.y);
            assert!((0.0..=1.0).contains(&drop.x));
        }
    }
    assert_eq!(pool.len(), 64);
    assert!(pool.iter().any(|d| d.recycled > 0));
}

#[test]
fn rain_drop_parameters_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(3);
    let pool = RainPool::new(200, &mut rng);
    for drop in pool.iter() {
        assert!(drop.speed >= RainDrop::MIN_SPEED);
        assert!(drop.length >= 18.0 && drop.length <= RainDrop::MAX_LENGTH);
        assert!(drop.opacity > 0.0 && drop.opacity < 1.0);
    }
}

#[test]
fn snow_wraps_horizontally_and_vertically() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut pool = SnowPool::new(48, &mut rng);
    let ctx = FrameContext::new(120.0);
    for _ in 0..2000 {
        pool.advance(&ctx, &mut rng);
    }
    assert_eq!(pool.len(), 48);
    for flake in pool.iter() {
        assert!((0.0..=1.0).contains(&flake.x), "flake x {}", flake.x);
        let span = flake.radius / ctx.canvas_height;
        assert!(flake.y >= -span - 1e-6 && flake.y <= 1.0 + span + 1e-6);
    }
}

#[test]
fn flake_wobble_steps_every_frame() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut pool = SnowPool::new(1, &mut rng);
    let before = pool.as_slice()[0].wobble;
    pool.advance(&FrameContext::new(100.0), &mut rng);
    let after = pool.as_slice()[0].wobble;
    assert!((after - before - SnowFlake::WOBBLE_STEP).abs() < 1e-5);
}

#[test]
fn empty_pools_are_allowed() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut pool = RainPool::new(0, &mut rng);
    pool.advance(&FrameContext::new(0.0), &mut rng);
    assert!(pool.is_empty());
}

#[test]
fn every_default_drop_recycles_within_slowest_fall() {
    let mut rng = StdRng::seed_from_u64(220);
    let mut pool = RainPool::new(DEFAULT_RAIN_DROPS, &mut rng);
    let ctx = FrameContext::new(720.0);
    // slowest drop needs 1 / MIN_SPEED = 250 ticks plus its own length
    let ticks = (1.0 / RainDrop::MIN_SPEED).ceil() as usize + 50;
    for _ in 0..ticks {
        pool.advance(&ctx, &mut rng);
    }
    assert_eq!(pool.len(), 220);
    let stuck = pool.iter().filter(|d| d.recycled == 0).count();
    assert_eq!(stuck, 0, "{stuck} drops never wrapped");
}
