//! Lip-sync scheduler
//!
//! Builds one snippet per unit of text, submits it to the host and arms a
//! cleanup timer that removes it once playback is over. The scheduler is
//! the only owner of the snippet names it creates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};
use visemic_core::{
    clamp_intensity, Curve, CurveSet, Keyframe, PlaybackTime, Snippet, SnippetCategory,
    SnippetHandle, VisemeId, LIPSYNC_PRIORITY, NEUTRAL_RETURN_PRIORITY,
};
use visemic_text::PhonemeExtractor;
use visemic_time::{TimerQueue, TimerToken};
use visemic_visual::{VisemeEvent, VisemeMapper};
use visemic_voice::{EmotionKind, EmotionModulators, EmotionalContext, EmotionalModulator};

use crate::{curve_builder, AnimationHost, LipSyncConfig};

/// Peak keyframe intensity before intensity and emotion scaling
pub const BASE_PEAK_INTENSITY: f64 = 90.0;
/// Longest unit text kept in a snippet name
pub const MAX_UNIT_NAME_LEN: usize = 24;

/// What a tracked snippet is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetKind {
    LipSync,
    NeutralReturn,
}

/// Scheduler counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub units_scheduled: u64,
    /// Host missing or declined
    pub units_dropped: u64,
    /// Units with no phonemes
    pub units_empty: u64,
    pub neutral_returns: u64,
    pub snippets_removed: u64,
}

/// A snippet the host accepted
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledSnippet {
    pub name: String,
    pub handle: SnippetHandle,
    pub kind: SnippetKind,
    /// Snippet length in seconds
    pub max_time: f64,
    pub channels: usize,
}

/// A snippet whose cleanup timer fired
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedSnippet {
    pub name: String,
    pub kind: SnippetKind,
}

#[derive(Debug)]
struct Tracked {
    handle: SnippetHandle,
    token: TimerToken,
    kind: SnippetKind,
}

/// Lowercase ASCII alphanumerics, at most [`MAX_UNIT_NAME_LEN`] chars
pub fn sanitize_unit_name(text: &str) -> String {
    let name: String = text
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_UNIT_NAME_LEN)
        .collect();
    if name.is_empty() {
        "unit".to_string()
    } else {
        name
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs.min(86_400.0))
    } else {
        Duration::ZERO
    }
}

/// Last stamp handed out by any scheduler
static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Per-unit snippet scheduler
pub struct Scheduler<H> {
    host: Option<H>,
    config: LipSyncConfig,
    extractor: PhonemeExtractor,
    mapper: VisemeMapper,
    emotion: EmotionalModulator,
    timers: TimerQueue<String>,
    tracked: HashMap<String, Tracked>,
    rng: StdRng,
    epoch_ms: u64,
    stats: SchedulerStats,
}

impl<H: AnimationHost> Scheduler<H> {
    pub fn new(host: H, config: LipSyncConfig) -> Self {
        let mut scheduler = Self::without_host(config);
        scheduler.host = Some(host);
        scheduler
    }

    /// Scheduler with no host yet. Every submission is a logged no-op
    /// until [`Scheduler::set_host`] is called.
    pub fn without_host(config: LipSyncConfig) -> Self {
        let config = config.sanitized();
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            host: None,
            config,
            extractor: PhonemeExtractor::new(),
            mapper: VisemeMapper::new(),
            emotion: EmotionalModulator::new(),
            timers: TimerQueue::new(),
            tracked: HashMap::new(),
            rng,
            epoch_ms: wall_clock_ms(),
            stats: SchedulerStats::default(),
        }
    }

    /// Share an existing extractor (and its dictionary)
    pub fn with_extractor(mut self, extractor: PhonemeExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn set_host(&mut self, host: H) {
        self.host = Some(host);
    }

    pub fn host(&self) -> Option<&H> {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> Option<&mut H> {
        self.host.as_mut()
    }

    pub fn config(&self) -> &LipSyncConfig {
        &self.config
    }

    /// Replace the configuration (clamped). Affects later units only.
    pub fn set_config(&mut self, config: LipSyncConfig) {
        self.config = config.sanitized();
    }

    pub fn extractor(&self) -> &PhonemeExtractor {
        &self.extractor
    }

    pub fn set_emotion(&mut self, kind: EmotionKind, intensity: f64) {
        self.emotion.set_emotion(kind, intensity);
    }

    pub fn set_emotional_context(&mut self, context: EmotionalContext) {
        self.emotion.set_emotional_context(context);
    }

    pub fn modulators(&self) -> EmotionModulators {
        self.emotion.get_modulators()
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    pub fn now(&self) -> PlaybackTime {
        self.timers.now()
    }

    /// Names of snippets still awaiting cleanup
    pub fn tracked(&self) -> impl Iterator<Item = &str> {
        self.tracked.keys().map(String::as_str)
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_tracking(&self, name: &str) -> bool {
        self.tracked.contains_key(name)
    }

    /// Millisecond stamp for snippet names. Wall-clock based and strictly
    /// increasing across every scheduler in the process, so schedulers
    /// sharing a host never collide.
    fn next_stamp(&self) -> u64 {
        let now = self.epoch_ms.saturating_add(self.timers.now().as_millis());
        let mut last = LAST_STAMP.load(Ordering::Relaxed);
        loop {
            let stamp = now.max(last.saturating_add(1));
            match LAST_STAMP.compare_exchange_weak(last, stamp, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return stamp,
                Err(actual) => last = actual,
            }
        }
    }

    /// Viseme events for `text` at the current rate and emotion
    pub fn build_events(&self, text: &str) -> Vec<VisemeEvent> {
        let modulators = self.emotion.get_modulators();
        let rate = self.config.speech_rate / modulators.duration_scale;

        let phonemes = self.extractor.extract_phonemes(text);
        let mut offset = 0.0;
        self.mapper
            .map_phonemes_to_visemes(&phonemes)
            .into_iter()
            .map(|timing| {
                let duration = VisemeMapper::adjust_duration(timing.duration_ms, rate);
                let event = VisemeEvent::new(timing.viseme, offset, duration);
                offset += duration;
                event
            })
            .collect()
    }

    /// Schedule one unit of text. Returns the accepted snippet, or `None`
    /// when the unit has no phonemes or the host is missing or declines.
    pub fn process_unit(&mut self, text: &str, unit_index: usize) -> Option<ScheduledSnippet> {
        let events = self.build_events(text);
        if events.is_empty() {
            self.stats.units_empty += 1;
            debug!(unit_index, "unit has no phonemes, skipping");
            return None;
        }

        let modulators = self.emotion.get_modulators();
        let mut params = self.config.coarticulation;
        params.blend_strength = (params.blend_strength * modulators.coarticulation_amount).min(1.0);

        let peak = clamp_intensity(
            BASE_PEAK_INTENSITY * self.config.lipsync_intensity * modulators.intensity_scale,
        );

        let built = curve_builder(self.config.curve_strategy, params).build(&events, peak);
        let mut curves = built.curves;
        self.jitter(&mut curves);

        let name = format!("lipsync_{}_{}", sanitize_unit_name(text), self.next_stamp());
        let snippet = Snippet::new(name, curves, built.max_time)
            .with_category(SnippetCategory::Viseme)
            .with_priority(LIPSYNC_PRIORITY)
            // Already folded into the peaks
            .with_intensity_scale(1.0)
            .with_jaw_scale(self.config.jaw_scale * modulators.jaw_scale);

        let scheduled = self.submit(&snippet, SnippetKind::LipSync)?;
        self.stats.units_scheduled += 1;
        debug!(
            unit = %scheduled.name,
            unit_index,
            events = events.len(),
            channels = scheduled.channels,
            max_time = scheduled.max_time,
            "scheduled unit"
        );
        Some(scheduled)
    }

    /// Schedule each whitespace-separated word of `text` in order,
    /// numbering units from `first_index`
    pub fn schedule_units(&mut self, text: &str, first_index: usize) -> Vec<ScheduledSnippet> {
        text.split_whitespace()
            .enumerate()
            .filter_map(|(i, word)| self.process_unit(word, first_index + i))
            .collect()
    }

    /// Short snippet that eases every channel from its current value to 0
    pub fn schedule_neutral_return(&mut self) -> Option<ScheduledSnippet> {
        let secs = self.config.neutral_return().as_secs_f64();
        let curves: CurveSet = VisemeId::all()
            .map(|id| {
                let curve = Curve::from_keyframes(vec![Keyframe::inherit(0.0), Keyframe::new(secs, 0.0)]);
                (id, curve)
            })
            .collect();

        let name = format!("neutral_return_{}", self.next_stamp());
        let snippet = Snippet::new(name, curves, secs)
            .with_category(SnippetCategory::Viseme)
            .with_priority(NEUTRAL_RETURN_PRIORITY)
            .with_jaw_scale(self.config.jaw_scale);

        let scheduled = self.submit(&snippet, SnippetKind::NeutralReturn)?;
        self.stats.neutral_returns += 1;
        debug!(unit = %scheduled.name, "scheduled neutral return");
        Some(scheduled)
    }

    fn jitter(&mut self, curves: &mut CurveSet) {
        let amount = self.config.randomness;
        if amount <= 0.0 {
            return;
        }
        let rng = &mut self.rng;
        for curve in curves.values_mut() {
            curve.map_intensity(|i| {
                if i > 0.0 {
                    i * (1.0 + amount * rng.gen_range(-0.5..=0.5))
                } else {
                    i
                }
            });
        }
    }

    fn submit(&mut self, snippet: &Snippet, kind: SnippetKind) -> Option<ScheduledSnippet> {
        let Some(host) = self.host.as_mut() else {
            self.stats.units_dropped += 1;
            warn!(snippet = %snippet.name, "no animation host, dropping snippet");
            return None;
        };
        let Some(handle) = host.schedule_snippet(snippet) else {
            self.stats.units_dropped += 1;
            warn!(snippet = %snippet.name, "host declined snippet");
            return None;
        };

        let lifetime = secs_to_duration(snippet.duration_secs()) + self.config.cleanup_buffer();
        let token = self.timers.schedule(lifetime, snippet.name.clone());
        self.tracked.insert(
            snippet.name.clone(),
            Tracked {
                handle: handle.clone(),
                token,
                kind,
            },
        );

        Some(ScheduledSnippet {
            name: snippet.name.clone(),
            handle,
            kind,
            max_time: snippet.max_time,
            channels: snippet.curves.len(),
        })
    }

    /// Advance scheduler time, removing snippets whose cleanup is due
    pub fn tick(&mut self, dt: Duration) -> Vec<CompletedSnippet> {
        let fired = self.timers.advance(dt);
        self.complete(fired)
    }

    /// Advance scheduler time to `t` (never backwards)
    pub fn advance_to(&mut self, t: PlaybackTime) -> Vec<CompletedSnippet> {
        let fired = self.timers.advance_to(t);
        self.complete(fired)
    }

    fn complete(&mut self, names: Vec<String>) -> Vec<CompletedSnippet> {
        names
            .into_iter()
            .filter_map(|name| {
                let tracked = self.tracked.remove(&name)?;
                if let Some(host) = self.host.as_mut() {
                    host.remove_snippet(&tracked.handle);
                }
                self.stats.snippets_removed += 1;
                Some(CompletedSnippet {
                    name,
                    kind: tracked.kind,
                })
            })
            .collect()
    }

    /// Remove one tracked snippet early and cancel its cleanup
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(tracked) = self.tracked.remove(name) else {
            return false;
        };
        self.timers.cancel(tracked.token);
        if let Some(host) = self.host.as_mut() {
            host.remove_snippet(&tracked.handle);
        }
        self.stats.snippets_removed += 1;
        true
    }

    /// Remove every tracked snippet and cancel all pending cleanups.
    /// Returns how many were removed.
    pub fn dispose(&mut self) -> usize {
        self.timers.drain();
        let tracked: Vec<Tracked> = self.tracked.drain().map(|(_, t)| t).collect();
        if let Some(host) = self.host.as_mut() {
            for t in &tracked {
                host.remove_snippet(&t.handle);
            }
        }
        self.stats.snippets_removed += tracked.len() as u64;
        if !tracked.is_empty() {
            debug!(count = tracked.len(), "disposed tracked snippets");
        }
        tracked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CurveStrategy;
    use proptest::prelude::*;
    use visemic_core::{ArkitViseme, MAX_INTENSITY};

    #[derive(Default)]
    struct VecHost {
        live: Vec<Snippet>,
        removed: Vec<String>,
        decline: bool,
    }

    impl AnimationHost for VecHost {
        fn schedule_snippet(&mut self, snippet: &Snippet) -> Option<SnippetHandle> {
            if self.decline {
                return None;
            }
            self.live.push(snippet.clone());
            Some(SnippetHandle(snippet.name.clone()))
        }

        fn remove_snippet(&mut self, handle: &SnippetHandle) {
            self.live.retain(|s| s.name != handle.0);
            self.removed.push(handle.0.clone());
        }
    }

    fn seeded() -> LipSyncConfig {
        LipSyncConfig {
            rng_seed: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_sanitize_unit_name() {
        assert_eq!(sanitize_unit_name("Hello!"), "hello");
        assert_eq!(sanitize_unit_name("...."), "unit");
        assert_eq!(sanitize_unit_name("ñandú"), "and");
        assert_eq!(sanitize_unit_name(&"a".repeat(40)).len(), MAX_UNIT_NAME_LEN);
    }

    #[test]
    fn test_process_unit_submits() {
        let mut scheduler = Scheduler::new(VecHost::default(), seeded());
        let scheduled = scheduler.process_unit("hello", 0).unwrap();

        assert!(scheduled.name.starts_with("lipsync_hello_"));
        assert_eq!(scheduled.kind, SnippetKind::LipSync);
        assert!(scheduler.is_tracking(&scheduled.name));

        let host = scheduler.host().unwrap();
        let snippet = &host.live[0];
        assert_eq!(snippet.priority, LIPSYNC_PRIORITY);
        assert_eq!(snippet.category, SnippetCategory::Viseme);
        assert!(snippet.curves.values().all(Curve::is_well_formed));
        let peak = snippet.curves.values().map(Curve::peak).fold(0.0, f64::max);
        assert!((peak - BASE_PEAK_INTENSITY).abs() < 1e-9);
    }

    #[test]
    fn test_lipsync_intensity_applied_once() {
        let mut config = seeded();
        config.set_lipsync_intensity(0.5);
        let mut scheduler = Scheduler::new(VecHost::default(), config);
        scheduler.process_unit("hello", 0).unwrap();

        let snippet = &scheduler.host().unwrap().live[0];
        let peak = snippet.curves.values().map(Curve::peak).fold(0.0, f64::max);
        assert!((peak - BASE_PEAK_INTENSITY * 0.5).abs() < 1e-9);
        assert_eq!(snippet.intensity_scale, 1.0);
    }

    #[test]
    fn test_names_unique_at_same_instant() {
        let mut scheduler = Scheduler::new(VecHost::default(), seeded());
        let a = scheduler.process_unit("hi", 0).unwrap();
        let b = scheduler.process_unit("hi", 1).unwrap();
        let c = scheduler.schedule_neutral_return().unwrap();
        let stamps: Vec<u64> = [&a.name, &b.name, &c.name]
            .iter()
            .map(|name| stamp_of(name))
            .collect();
        assert!(a.name.starts_with("lipsync_hi_"));
        assert!(c.name.starts_with("neutral_return_"));
        assert!(stamps.windows(2).all(|w| w[0] < w[1]), "{stamps:?}");
    }

    fn stamp_of(name: &str) -> u64 {
        name.rsplit('_').next().and_then(|s| s.parse().ok()).unwrap()
    }

    #[test]
    fn test_names_unique_across_schedulers() {
        let mut first = Scheduler::new(VecHost::default(), seeded());
        let mut second = Scheduler::new(VecHost::default(), seeded());
        let a = first.process_unit("hello", 0).unwrap();
        let b = second.process_unit("hello", 0).unwrap();
        assert_ne!(a.name, b.name);

        // Stamps follow wall-clock milliseconds
        assert!(stamp_of(&a.name) >= wall_clock_ms() - 60_000);
    }

    #[test]
    fn test_speech_rate_scales_events() {
        let mut scheduler: Scheduler<VecHost> = Scheduler::without_host(seeded());
        let slow: f64 = scheduler.build_events("hello").iter().map(|e| e.duration_ms).sum();

        let mut fast_config = seeded();
        fast_config.set_speech_rate(2.0);
        scheduler.set_config(fast_config);
        let fast: f64 = scheduler.build_events("hello").iter().map(|e| e.duration_ms).sum();

        assert_eq!(slow, 140.0 * 2.0 + 80.0 * 2.0);
        assert_eq!(fast, slow / 2.0);
    }

    #[test]
    fn test_events_are_contiguous() {
        let scheduler: Scheduler<VecHost> = Scheduler::without_host(seeded());
        let events = scheduler.build_events("hello, world");
        for pair in events.windows(2) {
            assert_eq!(pair[0].end_ms(), pair[1].offset_ms);
        }
        assert!(events.iter().any(|e| e.viseme == VisemeId::from(ArkitViseme::Sil)));
    }

    #[test]
    fn test_cleanup_after_playback() {
        let mut scheduler = Scheduler::new(VecHost::default(), seeded());
        let scheduled = scheduler.process_unit("hello", 0).unwrap();

        // max_time + 100ms buffer
        let due = secs_to_duration(scheduled.max_time) + Duration::from_millis(100);
        assert!(scheduler.tick(due - Duration::from_millis(1)).is_empty());

        let done = scheduler.tick(Duration::from_millis(1));
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].name, scheduled.name);
        assert!(scheduler.host().unwrap().live.is_empty());
        assert_eq!(scheduler.tracked_count(), 0);
        assert_eq!(scheduler.stats().snippets_removed, 1);
    }

    #[test]
    fn test_no_host_is_noop() {
        let mut scheduler: Scheduler<VecHost> = Scheduler::without_host(seeded());
        assert!(scheduler.process_unit("hello", 0).is_none());
        assert!(scheduler.schedule_neutral_return().is_none());
        assert_eq!(scheduler.stats().units_dropped, 2);
        assert_eq!(scheduler.tracked_count(), 0);
        assert_eq!(scheduler.dispose(), 0);
    }

    #[test]
    fn test_declined_unit_dropped() {
        let host = VecHost {
            decline: true,
            ..Default::default()
        };
        let mut scheduler = Scheduler::new(host, seeded());
        assert!(scheduler.process_unit("hello", 0).is_none());
        assert_eq!(scheduler.stats().units_dropped, 1);
        assert_eq!(scheduler.tracked_count(), 0);

        // Recovers once the host accepts again
        scheduler.host_mut().unwrap().decline = false;
        assert!(scheduler.process_unit("hello", 1).is_some());
    }

    #[test]
    fn test_empty_unit() {
        let mut scheduler = Scheduler::new(VecHost::default(), seeded());
        assert!(scheduler.process_unit("  ", 0).is_none());
        assert_eq!(scheduler.stats().units_empty, 1);
        assert!(scheduler.host().unwrap().live.is_empty());
    }

    #[test]
    fn test_dispose_removes_everything() {
        let mut scheduler = Scheduler::new(VecHost::default(), seeded());
        let units = scheduler.schedule_units("hello brave new world", 0);
        assert_eq!(units.len(), 4);

        assert_eq!(scheduler.dispose(), 4);
        assert!(scheduler.host().unwrap().live.is_empty());
        // Cancelled cleanups never fire
        assert!(scheduler.tick(Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn test_remove_cancels_cleanup() {
        let mut scheduler = Scheduler::new(VecHost::default(), seeded());
        let unit = scheduler.process_unit("go", 0).unwrap();
        assert!(scheduler.remove(&unit.name));
        assert!(!scheduler.remove(&unit.name));
        assert!(scheduler.tick(Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn test_emotion_scales_intensity_and_jaw() {
        let mut scheduler = Scheduler::new(VecHost::default(), seeded());
        scheduler.set_emotion(EmotionKind::Happy, 1.0);
        scheduler.process_unit("hello", 0).unwrap();

        let snippet = &scheduler.host().unwrap().live[0];
        let m = scheduler.modulators();
        assert!((snippet.jaw_scale - m.jaw_scale).abs() < 1e-9);
        let peak = snippet.curves.values().map(Curve::peak).fold(0.0, f64::max);
        assert_eq!(peak, MAX_INTENSITY.min(BASE_PEAK_INTENSITY * m.intensity_scale));
    }

    #[test]
    fn test_randomness_is_seeded() {
        let config = LipSyncConfig {
            randomness: 0.5,
            rng_seed: Some(42),
            ..Default::default()
        };
        let mut a = Scheduler::new(VecHost::default(), config.clone());
        let mut b = Scheduler::new(VecHost::default(), config);
        a.process_unit("hello", 0);
        b.process_unit("hello", 0);

        let ca = &a.host().unwrap().live[0].curves;
        let cb = &b.host().unwrap().live[0].curves;
        assert_eq!(ca, cb);
        assert!(ca.values().all(Curve::is_well_formed));
    }

    #[test]
    fn test_unspellable_unit_still_moves_mouth() {
        let mut scheduler = Scheduler::new(VecHost::default(), seeded());
        assert!(scheduler.process_unit("42", 0).is_some());
        assert!(scheduler.process_unit("日本語", 1).is_some());
        assert_eq!(scheduler.stats().units_empty, 0);
    }

    proptest! {
        #[test]
        fn prop_max_time_covers_curves(
            text in "[a-zA-Z0-9,.!? ]{1,40}",
            snap in any::<bool>(),
            randomness in 0.0f64..1.0,
            rate in 0.25f64..4.0,
        ) {
            let mut config = LipSyncConfig {
                curve_strategy: if snap { CurveStrategy::Snap } else { CurveStrategy::Coarticulated },
                randomness,
                rng_seed: Some(3),
                ..Default::default()
            };
            config.set_speech_rate(rate);
            let mut scheduler = Scheduler::new(VecHost::default(), config);

            if let Some(scheduled) = scheduler.process_unit(&text, 0) {
                let snippet = &scheduler.host().unwrap().live[0];
                prop_assert_eq!(&snippet.name, &scheduled.name);
                prop_assert!(snippet.max_time >= snippet.latest_keyframe_time());
                prop_assert!(snippet.curves.values().all(Curve::is_well_formed));
            } else {
                prop_assert!(scheduler.build_events(&text).is_empty());
            }
        }
    }
}
