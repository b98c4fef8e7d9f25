use chrono::{NaiveDate, NaiveDateTime};
use crazy_eyes::{
    animation::Schedule,
    face::{self, Shape},
    settings::{ConfigUpdate, Settings},
    AccelSample, AppContext, DeviceProfile, Event, RuntimeStatus, Timer,
};
use embedded_graphics::{pixelcolor::Rgb565, prelude::*};

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 4)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn sample(x: i16, y: i16) -> Option<AccelSample> {
    Some(AccelSample {
        x,
        y,
        z: 0,
        did_vibrate: false,
    })
}

/// Centers of the two black pupil disks
fn pupils(app: &AppContext) -> Vec<Point> {
    let radius = app.profile().layout.pupil_radius as u32;
    app.render()
        .shapes()
        .iter()
        .filter_map(|shape| match *shape {
            Shape::FillCircle {
                center,
                radius: r,
                color,
            } if r == radius && color == Rgb565::BLACK => {
                Some(center)
            }
            _ => None,
        })
        .collect()
}

#[test]
fn googly_pupils_follow_gravity_together() {
    let mut app = AppContext::new(
        DeviceProfile::default(),
        Settings::default(),
        RuntimeStatus::default(),
        at(6, 0),
    );
    let (left, right) = face::eye_centers(app.profile());

    assert!(app.handle(Event::AccelTap).arm_googly);
    for _ in 0..150 {
        assert_eq!(app.on_timer(Timer::Googly, sample(1000, 0)), Schedule::Rearm);
    }

    let pupils = pupils(&app);
    assert_eq!(pupils.len(), 2);
    let (l, r) = (pupils[0] - left, pupils[1] - right);
    assert_eq!(l, r);
    // Gravity along +x pulls the pupils to 3 o'clock
    let orbit = app.profile().layout.pupil_orbit();
    assert!((l.x - orbit).abs() <= 1, "{:?}", l);
    assert!(l.y.abs() <= 1, "{:?}", l);

    // Back to telling the time
    app.handle(Event::AccelTap);
    let pupils = self::pupils(&app);
    assert_eq!(pupils[0] - left, Point::new(0, orbit));
    assert_eq!(pupils[1] - right, Point::new(0, -orbit));
}

#[test]
fn failed_samples_freeze_the_pupils() {
    let mut app = AppContext::new(
        DeviceProfile::default(),
        Settings::default(),
        RuntimeStatus::default(),
        at(6, 30),
    );
    app.handle(Event::AccelTap);
    for _ in 0..5 {
        app.on_timer(Timer::Googly, sample(0, -1000));
    }
    let before = *app.animation();
    app.take_frame();

    assert_eq!(app.on_timer(Timer::Googly, None), Schedule::Rearm);
    assert_eq!(*app.animation(), before);
    assert!(app.take_frame().is_none());
}

#[test]
fn settings_survive_a_reboot() {
    let mut app = AppContext::new(
        DeviceProfile::default(),
        Settings::default(),
        RuntimeStatus::default(),
        at(12, 0),
    );
    // eyebrows off, angryness 3, unknown key 9, odd trailing byte
    let effects = app.handle(Event::SettingsChanged(ConfigUpdate::parse(&[
        0, 0, 7, 3, 9, 1, 4,
    ])));
    assert!(effects.persist);
    assert!(!app.settings().show_eyebrows);
    assert_eq!(app.settings().angryness.level(), 3);

    let stored = app.settings().to_record();
    assert_eq!(Settings::load(&stored), *app.settings());
    assert_eq!(Settings::load(&[0xff; 6]), Settings::default());
}

#[test]
fn day_long_run_stays_consistent() {
    let mut app = AppContext::new(
        DeviceProfile::PINETIME,
        Settings::default(),
        RuntimeStatus::default(),
        at(23, 59),
    );
    let start = *app.animation();
    for minute in 0..24 * 60 {
        let effects = app.handle(Event::MinuteTick(at(minute / 60, minute % 60)));
        assert!(effects.arm_blink);
        while app.on_timer(Timer::Blink, None).is_rearm() {}
        assert!(app.take_frame().is_some());
    }
    // one hue step per minute
    assert_eq!(
        app.animation().background.hue(),
        (start.background.hue() + (24 * 60 % 64) as u8) % 64
    );
    assert!(app.animation().blink.is_idle());
}
