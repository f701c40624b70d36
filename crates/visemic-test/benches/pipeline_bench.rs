//! Benchmarks for the lip-sync pipeline stages

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use visemic_core::{Snippet, SnippetHandle};
use visemic_runtime::{AnimationHost, CurveStrategy, LipSyncConfig, Scheduler};
use visemic_text::PhonemeExtractor;
use visemic_visual::{CoarticulationModel, VisemeEvent, VisemeMapper};

const SENTENCE: &str = "The quick brown fox jumps over the lazy dog, then thinks about rhythm.";

/// Accepts everything, keeps nothing
struct NullHost;

impl AnimationHost for NullHost {
    fn schedule_snippet(&mut self, snippet: &Snippet) -> Option<SnippetHandle> {
        Some(SnippetHandle(snippet.name.clone()))
    }

    fn remove_snippet(&mut self, _handle: &SnippetHandle) {}
}

fn events_for(text: &str) -> Vec<VisemeEvent> {
    let extractor = PhonemeExtractor::new();
    let mapper = VisemeMapper::new();
    let mut offset = 0.0;
    mapper
        .map_phonemes_to_visemes(&extractor.extract_phonemes(text))
        .into_iter()
        .map(|t| {
            let e = VisemeEvent::new(t.viseme, offset, t.duration_ms);
            offset += t.duration_ms;
            e
        })
        .collect()
}

fn bench_extract_phonemes(c: &mut Criterion) {
    let extractor = PhonemeExtractor::new();

    c.bench_function("extract_phonemes_sentence", |b| {
        b.iter(|| black_box(extractor.extract_phonemes(black_box(SENTENCE))))
    });
}

fn bench_map_visemes(c: &mut Criterion) {
    let extractor = PhonemeExtractor::new();
    let mapper = VisemeMapper::new();
    let phonemes = extractor.extract_phonemes(SENTENCE);

    c.bench_function("map_phonemes_to_visemes", |b| {
        b.iter(|| black_box(mapper.map_phonemes_to_visemes(black_box(&phonemes))))
    });
}

fn bench_coarticulation(c: &mut Criterion) {
    let model = CoarticulationModel::new();
    let events = events_for(SENTENCE);

    c.bench_function("apply_coarticulation_sentence", |b| {
        b.iter(|| black_box(model.apply_coarticulation(black_box(&events), 90.0)))
    });
}

fn bench_process_unit(c: &mut Criterion) {
    for (label, strategy) in [
        ("process_unit_coarticulated", CurveStrategy::Coarticulated),
        ("process_unit_snap", CurveStrategy::Snap),
    ] {
        let config = LipSyncConfig {
            curve_strategy: strategy,
            rng_seed: Some(0),
            ..Default::default()
        };
        let mut scheduler = Scheduler::new(NullHost, config);
        let mut i = 0usize;

        c.bench_function(label, |b| {
            b.iter(|| {
                i += 1;
                let scheduled = scheduler.process_unit(black_box("wonderful"), i);
                // Keep the tracked set from growing
                scheduler.dispose();
                black_box(scheduled)
            })
        });
    }
}

criterion_group!(
    benches,
    bench_extract_phonemes,
    bench_map_visemes,
    bench_coarticulation,
    bench_process_unit,
);
criterion_main!(benches);
