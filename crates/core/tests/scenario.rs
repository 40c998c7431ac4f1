//! End-to-end orb sessions driven through the public API.

use orb_core::{
    animation::TRANSITION_DURATION, render_frame, FlashKind, FrameBuffer, Feeling, Mode, OrbScene,
    Palette, PlaybackClock, Recorder, RecordingSettings, Rgb, ScheduledEvent, Scheduler, Snapshot,
};

#[test]
fn idle_to_thinking_calm() {
    let mut scene = OrbScene::new(64, 64);
    let start = Snapshot::target(Mode::Idle, Feeling::Neutral);
    assert_eq!(*scene.controller().current(), start);

    let now = 10.0;
    scene.set_target(Mode::Thinking, Feeling::Calm, Palette::ModeDefault, now);

    let expected_fog = Feeling::Calm.properties().fog_density * Mode::Thinking.multipliers().fog;
    assert_eq!(*scene.controller().current(), start);
    assert_eq!(scene.controller().target().fog_density, expected_fog);

    let frame = scene.frame(now + TRANSITION_DURATION + 1e-3);
    assert_eq!(frame.snapshot.fog_density, expected_fog);
    assert_eq!(frame.colors, Mode::Thinking.default_colors());
}

#[test]
fn mid_transition_frames_move_monotonically_toward_the_target() {
    let mut scene = OrbScene::new(32, 32);
    scene.set_target(Mode::Listening, Feeling::Concern, Palette::ModeDefault, 0.0);
    let target = scene.controller().target().fog_density;

    let mut last_gap = f32::MAX;
    for step in 1..=5 {
        let frame = scene.frame(step as f64 * 0.05);
        let gap = (frame.snapshot.fog_density - target).abs();
        assert!(gap < last_gap, "step {step}: gap {gap} >= {last_gap}");
        last_gap = gap;
    }
}

#[test]
fn scripted_session_records_frames() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::new(RecordingSettings {
        output_dir: dir.path().join("out").to_string_lossy().into_owned(),
        fps: 10,
        background: Rgb::BLACK,
    });

    let mut scheduler = Scheduler::new();
    scheduler.set_events(vec![
        ScheduledEvent::new(0.0, "set orb listening"),
        ScheduledEvent::new(0.2, "say: That's wonderful! What an amazing idea."),
        ScheduledEvent::new(0.3, "flash:success"),
        ScheduledEvent::new(0.4, "reset palette"),
    ]);

    let mut scene = OrbScene::new(24, 24);
    let mut clock = PlaybackClock::default();
    let mut buffer = FrameBuffer::default();
    recorder.start().unwrap();

    let mut saw_flash = false;
    for _ in 0..8 {
        scheduler.tick(&clock, &mut scene);
        let inputs = scene.frame(clock.time_seconds);
        saw_flash |= inputs.flash.map(|f| f.kind) == Some(FlashKind::Success);
        render_frame(&inputs, &mut buffer);
        recorder.write_frame(&buffer).unwrap();
        clock.advance(0.1);
    }
    recorder.stop().unwrap();

    assert!(saw_flash);
    assert!(scheduler.is_finished());
    assert_eq!(recorder.frames_written(), 8);
    assert!(recorder.frame_path(7).exists());
    assert_eq!(scene.controller().mode(), Mode::Listening);
    assert_eq!(scene.controller().feeling(), Feeling::Delight);
    assert_eq!(scene.controller().palette(), Palette::ModeDefault);
}

#[test]
fn audio_and_pointer_reach_the_renderer() {
    let mut scene = OrbScene::new(40, 30);
    scene.set_audio_level(0.8);
    scene.set_pointer(0.9, 0.1, true);
    let inputs = scene.frame(1.25);
    assert_eq!(inputs.audio_level, 0.8);
    assert!(inputs.pointer.hovering);

    let mut buffer = FrameBuffer::default();
    render_frame(&inputs, &mut buffer);
    assert_eq!(buffer.pixels().len(), 40 * 30);
    assert!(buffer.pixels().iter().any(|p| p.alpha > 0.0));
}
