//! Integration tests for Routine timing, looping and chain handoffs

mod common;
use common::*;

use neotween::{
    BuildError, ColorValue, PixelGroup, PlaybackError, RangeLayout, Routine, RoutineBuilder,
    RoutineChain, RoutineId, Tween,
};

type Builder<'a> = RoutineBuilder<'a, TestInstant, PIXELS, 2, 8, 4>;
type Chain<'a> = RoutineChain<'a, TestInstant, PIXELS, 2, 8, 4>;
type TestRoutine<'a> = Routine<'a, TestInstant, PIXELS, 2, 8>;

fn fade_chain(group: &PixelGroup<PIXELS>, duration: TestDuration) -> Chain<'_> {
    Builder::new("fade", &[group], ColorValue::OFF)
        .unwrap()
        .add(ColorValue::OFF, FULL_RGB, duration)
        .unwrap()
        .done()
        .unwrap()
}

#[test]
fn start_renders_the_first_frame() {
    let group = flat_group("g", 1);
    let mut chain = Builder::new("r", &[&group], ColorValue::BLUE)
        .unwrap()
        .add(ColorValue::RED, ColorValue::GREEN, secs(1))
        .unwrap()
        .done()
        .unwrap();
    let mut out = RecordingOutput::new();

    let next = chain.start(RoutineId(0), TestInstant(0), &mut out).unwrap();

    // Setup writes blue, then the first tween at progress zero overwrites it.
    assert_eq!(next, None);
    assert!(colors_equal(out.color(0, 0), ColorValue::RED));
    assert_eq!(out.writes(0, 0), 2);
    assert!(chain.get(RoutineId(0)).unwrap().is_running());
}

#[test]
fn progress_is_measured_from_the_start_instant() {
    let group = flat_group("g", 2);
    let mut chain = fade_chain(&group, secs(2));
    let mut out = RecordingOutput::new();

    chain.start(RoutineId(0), TestInstant(10_000), &mut out).unwrap();
    chain.update(RoutineId(0), TestInstant(11_000), &mut out).unwrap();

    assert!(colors_equal(out.color(0, 0), MID_GRAY));
    assert!(colors_equal(out.color(0, 1), MID_GRAY));
}

#[test]
fn finished_routine_without_links_goes_idle_and_stays_silent() {
    let group = flat_group("g", 1);
    let mut chain = fade_chain(&group, secs(2));
    let mut out = RecordingOutput::new();
    let id = RoutineId(0);

    chain.start(id, TestInstant(0), &mut out).unwrap();
    assert_eq!(chain.update(id, TestInstant(1000), &mut out).unwrap(), None);
    assert!(chain.get(id).unwrap().is_running());

    assert_eq!(chain.update(id, TestInstant(2500), &mut out).unwrap(), None);
    assert!(!chain.get(id).unwrap().is_running());
    assert!(colors_equal(out.color(0, 0), FULL_RGB));

    out.reset_counts();
    assert_eq!(chain.update(id, TestInstant(4000), &mut out).unwrap(), None);
    assert_eq!(out.total_writes(), 0);
}

#[test]
fn routine_end_is_inclusive() {
    let group = flat_group("g", 1);
    let mut chain = fade_chain(&group, secs(1));
    let mut out = RecordingOutput::new();
    let id = RoutineId(0);

    chain.start(id, TestInstant(0), &mut out).unwrap();
    chain.update(id, TestInstant(1000), &mut out).unwrap();
    assert!(chain.get(id).unwrap().is_running());
    assert!(colors_equal(out.color(0, 0), FULL_RGB));

    chain.update(id, TestInstant(1001), &mut out).unwrap();
    assert!(!chain.get(id).unwrap().is_running());
}

#[test]
fn duration_covers_the_most_delayed_pixel() {
    let mut wave = PixelGroup::<PIXELS>::new("wave");
    wave.add_range(STRAND, 3, RangeLayout::wave(0.5)).unwrap();

    let chain = fade_chain(&wave, secs(2));
    assert_eq!(chain.get(RoutineId(0)).unwrap().duration(), secs(4));
}

#[test]
fn offsets_stagger_pixels_through_a_routine() {
    let mut wave = PixelGroup::<PIXELS>::new("wave");
    wave.add_range(STRAND, 3, RangeLayout::wave(0.5)).unwrap();
    let mut chain = fade_chain(&wave, secs(10));
    let mut out = RecordingOutput::new();

    chain.start(RoutineId(0), TestInstant(0), &mut out).unwrap();
    chain.update(RoutineId(0), TestInstant(5000), &mut out).unwrap();

    assert!(colors_equal(out.color(0, 0), MID_GRAY));
    assert!(colors_equal(out.color(0, 1), ColorValue::OFF));
    assert!(colors_equal(out.color(0, 2), ColorValue::OFF));
}

#[test]
fn looping_advances_start_by_whole_cycles() {
    let group = flat_group("g", 1);
    let mut chain = Builder::new("pulse", &[&group], ColorValue::OFF)
        .unwrap()
        .add(ColorValue::OFF, FULL_RGB, secs(1))
        .unwrap()
        .looping(1)
        .done()
        .unwrap();
    let mut out = RecordingOutput::new();
    let id = RoutineId(0);

    chain.start(id, TestInstant(0), &mut out).unwrap();
    assert_eq!(chain.get(id).unwrap().loops_left(), 1);

    assert_eq!(chain.update(id, TestInstant(1200), &mut out).unwrap(), None);
    let routine = chain.get(id).unwrap();
    assert!(routine.is_running());
    assert_eq!(routine.loops_left(), 0);
    assert_eq!(routine.started_at(), Some(TestInstant(1000)));

    chain.update(id, TestInstant(1500), &mut out).unwrap();
    assert!(colors_equal(out.color(0, 0), MID_GRAY));

    chain.update(id, TestInstant(2100), &mut out).unwrap();
    assert!(!chain.get(id).unwrap().is_running());

    // Starting again refills the loop budget.
    chain.start(id, TestInstant(3000), &mut out).unwrap();
    assert_eq!(chain.get(id).unwrap().loops_left(), 1);
}

#[test]
fn two_routine_cycle_alternates_forever() {
    let group = flat_group("g", 1);
    let mut chain = Builder::new("a", &[&group], ColorValue::OFF)
        .unwrap()
        .add(ColorValue::OFF, ColorValue::RED, secs(1))
        .unwrap()
        .next_routine("b")
        .unwrap()
        .add(ColorValue::RED, ColorValue::OFF, secs(1))
        .unwrap()
        .loop_to_start()
        .done()
        .unwrap();
    let mut out = RecordingOutput::new();

    let mut active = RoutineId(0);
    let mut now = 0;
    chain.start(active, TestInstant(now), &mut out).unwrap();

    for cycle in 0..6 {
        now += 1100;
        let next = chain.update(active, TestInstant(now), &mut out).unwrap();
        let expected = RoutineId((cycle + 1) % 2);
        assert_eq!(next, Some(expected));
        assert!(!chain.get(active).unwrap().is_running());

        active = expected;
        chain.start(active, TestInstant(now), &mut out).unwrap();
        assert!(chain.get(active).unwrap().is_running());
    }
}

#[test]
fn last_routine_without_next_rewinds_to_the_first() {
    let group = flat_group("g", 1);
    let mut chain = Builder::new("a", &[&group], ColorValue::OFF)
        .unwrap()
        .add(ColorValue::OFF, ColorValue::RED, secs(1))
        .unwrap()
        .next_routine("b")
        .unwrap()
        .add(ColorValue::RED, ColorValue::GREEN, secs(1))
        .unwrap()
        .next_routine("c")
        .unwrap()
        .add(ColorValue::GREEN, ColorValue::BLUE, secs(1))
        .unwrap()
        .done()
        .unwrap();
    let mut out = RecordingOutput::new();
    let c = RoutineId(2);

    chain.start(c, TestInstant(0), &mut out).unwrap();
    let next = chain.update(c, TestInstant(1001), &mut out).unwrap();

    assert_eq!(next, Some(RoutineId(0)));
    assert_eq!(chain.earliest(c), RoutineId(0));
}

#[test]
fn earliest_terminates_on_prev_cycles() {
    let group = flat_group("g", 1);
    let mut chain = Chain::new();
    for name in ["x", "y", "z"] {
        let tween = Tween::new(ColorValue::OFF, ColorValue::RED, secs(1), &[&group]).unwrap();
        chain.push(TestRoutine::new(name, tween).unwrap()).unwrap();
    }
    chain.link(RoutineId(0), RoutineId(1)).unwrap();
    chain.link(RoutineId(1), RoutineId(2)).unwrap();
    chain.link(RoutineId(2), RoutineId(0)).unwrap();

    assert_eq!(chain.earliest(RoutineId(2)), RoutineId(0));
    assert_eq!(chain.earliest(RoutineId(0)), RoutineId(1));
}

#[test]
fn unknown_routines_are_reported() {
    let group = flat_group("g", 1);
    let mut chain = fade_chain(&group, secs(1));
    let mut out = RecordingOutput::new();

    assert_eq!(
        chain.update(RoutineId(9), TestInstant(0), &mut out),
        Err(PlaybackError::UnknownRoutine(RoutineId(9)))
    );
    assert_eq!(
        chain.link(RoutineId(0), RoutineId(4)),
        Err(PlaybackError::UnknownRoutine(RoutineId(4)))
    );
    assert!(chain.get(RoutineId(1)).is_none());
}

#[test]
fn chain_capacity_is_enforced() {
    let group = flat_group("g", 1);
    let mut chain = RoutineChain::<TestInstant, PIXELS, 2, 8, 1>::new();
    let tween = Tween::new(ColorValue::OFF, ColorValue::RED, secs(1), &[&group]).unwrap();
    chain.push(Routine::new("a", tween.clone()).unwrap()).unwrap();

    assert_eq!(
        chain.push(Routine::new("b", tween).unwrap()).err(),
        Some(BuildError::CapacityExceeded)
    );
}

#[test]
fn idle_and_stopped_routines_do_not_write() {
    let group = flat_group("g", 1);
    let mut chain = fade_chain(&group, secs(1));
    let mut out = RecordingOutput::new();
    let id = RoutineId(0);

    assert_eq!(chain.update(id, TestInstant(100), &mut out).unwrap(), None);
    assert_eq!(out.total_writes(), 0);

    chain.start(id, TestInstant(0), &mut out).unwrap();
    chain.get_mut(id).unwrap().stop();
    out.reset_counts();
    chain.update(id, TestInstant(500), &mut out).unwrap();
    assert_eq!(out.total_writes(), 0);
}

#[test]
fn later_tweens_win_where_they_overlap() {
    let group = flat_group("g", 1);
    let base = Tween::new(ColorValue::OFF, ColorValue::RED, secs(2), &[&group]).unwrap();
    let flicker = Tween::new(ColorValue::OFF, ColorValue::BLUE, secs(1), &[&group])
        .unwrap()
        .with_delay(ms(500));

    let mut routine = TestRoutine::new("layers", base).unwrap();
    assert_eq!(routine.push(flicker).unwrap(), 1);
    let mut out = RecordingOutput::new();

    routine.start(TestInstant(0), &mut out);
    routine.update(TestInstant(1000), &mut out);

    // Base is at 0.5, flicker at 0.5 and written after it.
    assert!(colors_equal(out.color(0, 0), ColorValue::new(0, 0, 128, 0.0)));

    // Once the flicker has latched at its end, only the base writes.
    routine.update(TestInstant(1600), &mut out);
    routine.update(TestInstant(1700), &mut out);
    assert!(colors_equal(out.color(0, 0), ColorValue::new(217, 0, 0, 0.0)));
}

#[test]
fn fill_bypasses_progress() {
    let mut wave = PixelGroup::<PIXELS>::new("wave");
    wave.add_range(STRAND, 4, RangeLayout::wave(0.3)).unwrap();
    let chain = fade_chain(&wave, secs(1));
    let mut out = RecordingOutput::new();

    chain
        .get(RoutineId(0))
        .unwrap()
        .fill(ColorValue::GREEN, &mut out);
    for i in 0..4 {
        assert!(colors_equal(out.color(0, i), ColorValue::GREEN));
    }
}

#[test]
fn describe_reports_every_tween() {
    let group = flat_group("g", 1);
    let chain = Builder::new("show", &[&group], ColorValue::OFF)
        .unwrap()
        .add(ColorValue::OFF, ColorValue::RED, secs(1))
        .unwrap()
        .named("fade in")
        .done()
        .unwrap();

    let mut report = String::new();
    chain.describe(&mut report, 3).unwrap();

    assert!(report.contains("routine 'show'"));
    assert!(report.contains("'setup'"));
    assert!(report.contains("'fade in' delay 0 ms, duration 1000 ms"));
    assert!(report.contains("rgbw(128, 0, 0, 0.00)"));
    assert!(report.contains("rgbw(255, 0, 0, 0.00)"));
    assert!(report.contains("next -> (none)"));
}
