use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use lane_duel::core::config::DuelConfig;
use lane_duel::opponent::RandomSelector;
use lane_duel::render::{FrameEncoder, PngFrameEncoder};
use lane_duel::simulation::{Engine, SessionState, SpeedLevel};

fn engine(config: &DuelConfig) -> Engine {
    Engine::new(config.clone(), Box::new(RandomSelector::new(config, 0xBEEF)))
}

fn bench_engine_steps(c: &mut Criterion) {
    let config = DuelConfig::default();
    let dt = config.dt();
    let mut group = c.benchmark_group("engine");

    group.bench_function("full_experiment", |b| {
        b.iter_batched(
            || {
                let mut engine = engine(&config);
                engine.begin();
                engine.apply_player_input(SpeedLevel::Fast);
                engine
            },
            |mut engine| {
                while engine.state() != SessionState::Complete {
                    if engine.state() == SessionState::CountingDown {
                        engine.apply_player_input(SpeedLevel::Fast);
                    }
                    engine.step(dt);
                }
                black_box(engine.results().map(|r| r.score))
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_frame_encoding(c: &mut Criterion) {
    let config = DuelConfig::default();
    let dt = config.dt();

    // Mid-race, both cars on screen with the HUD populated
    let mut engine = engine(&config);
    engine.begin();
    engine.apply_player_input(SpeedLevel::Fastest);
    for _ in 0..180 {
        engine.step(dt);
    }
    let racing = engine.snapshot();

    let mut countdown_engine = self::engine(&config);
    countdown_engine.begin();
    let countdown = countdown_engine.snapshot();

    let mut group = c.benchmark_group("frame");
    let mut encoder = PngFrameEncoder::new(config.frame_width, config.frame_height);
    group.bench_function("png_racing_800x600", |b| {
        b.iter(|| black_box(encoder.encode(&racing).map(|f| f.data.len())))
    });
    group.bench_function("png_countdown_800x600", |b| {
        b.iter(|| black_box(encoder.encode(&countdown).map(|f| f.data.len())))
    });
    group.bench_function("rasterize_only", |b| {
        b.iter(|| black_box(encoder.rasterize(&racing).width()))
    });
    group.finish();
}

criterion_group!(benches, bench_engine_steps, bench_frame_encoding);
criterion_main!(benches);
