//! Application context
//!
//! [`AppContext`] owns everything the face needs between events. The host feeds it
//! [`Event`]s and timer expiries, carries out the returned [`Effects`] and paints whatever
//! [`AppContext::take_frame`] hands out.

use chrono::{NaiveDateTime, Timelike};

use crate::animation::{AnimationState, Schedule};
use crate::device::DeviceProfile;
use crate::face::{self, Frame};
use crate::settings::{ConfigUpdate, Settings};
use crate::status::{AccelSample, RuntimeStatus};

/// Something that happened outside the face.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Current wall clock time. Only a minute not shown yet blinks.
    MinuteTick(NaiveDateTime),
    AccelTap,
    BatteryChanged { percent: u8, charging: bool },
    BluetoothChanged(bool),
    SettingsChanged(ConfigUpdate),
}

/// Animation timers owned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timer {
    Blink,
    Googly,
}

/// Work the host has to do after an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Effects {
    /// Start the blink timer
    pub arm_blink: bool,
    /// Start the googly timer
    pub arm_googly: bool,
    /// Buzz twice
    pub vibrate: bool,
    /// Write [`AppContext::settings`] to storage
    pub persist: bool,
}

impl Effects {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub struct AppContext {
    profile: DeviceProfile,
    settings: Settings,
    status: RuntimeStatus,
    animation: AnimationState,
    time: NaiveDateTime,
    dirty: bool,
}

impl AppContext {
    /// Context with eyes open and a frame pending.
    pub fn new(
        profile: DeviceProfile,
        settings: Settings,
        status: RuntimeStatus,
        time: NaiveDateTime,
    ) -> Self {
        Self {
            profile,
            settings,
            status,
            animation: AnimationState::for_profile(&profile),
            time,
            dirty: true,
        }
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn status(&self) -> &RuntimeStatus {
        &self.status
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn time(&self) -> NaiveDateTime {
        self.time
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Request a redraw. Several requests before the next paint give one frame.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Nightstand mode is on and the watch sits on the charger.
    pub fn nightstand_active(&self) -> bool {
        self.settings.nightstand_mode && self.status.charging
    }

    pub fn handle(&mut self, event: Event) -> Effects {
        let mut effects = Effects::default();
        match event {
            Event::MinuteTick(time) => {
                let new_minute = time.date() != self.time.date()
                    || (time.hour(), time.minute()) != (self.time.hour(), self.time.minute());
                self.time = time;
                self.mark_dirty();
                if !new_minute {
                    debug!("minute already shown");
                    return effects;
                }
                if self.nightstand_active() {
                    return effects;
                }
                self.animation.background = self.animation.background.advance();
                if self.settings.minute_blink {
                    let (blink, schedule) = self.animation.blink.start();
                    self.animation.blink = blink;
                    effects.arm_blink = schedule.is_rearm();
                }
            }
            Event::AccelTap => {
                if !self.settings.googly_eyes || self.nightstand_active() {
                    debug!("tap ignored");
                    return effects;
                }
                let (googly, schedule) = self.animation.googly.toggle();
                self.animation.googly = googly;
                effects.arm_googly = schedule.is_rearm();
                self.mark_dirty();
            }
            Event::BatteryChanged { percent, charging } => {
                let percent = percent.min(100);
                if percent != self.status.battery_percent || charging != self.status.charging {
                    info!("battery {}% charging {}", percent, charging);
                    self.status.battery_percent = percent;
                    self.status.charging = charging;
                    self.mark_dirty();
                    self.calm_down();
                }
            }
            Event::BluetoothChanged(connected) => {
                if connected != self.status.bluetooth_connected {
                    info!("bluetooth {}", if connected { "connected" } else { "disconnected" });
                    self.status.bluetooth_connected = connected;
                    effects.vibrate = !connected && self.settings.vibrate_on_disconnect;
                    self.mark_dirty();
                }
            }
            Event::SettingsChanged(update) => {
                if self.settings.apply(&update) {
                    effects.persist = true;
                    self.mark_dirty();
                    self.calm_down();
                }
            }
        }
        effects
    }

    /// Stop googly eyes that are no longer allowed.
    fn calm_down(&mut self) {
        let allowed = self.settings.googly_eyes && !self.nightstand_active();
        if self.animation.googly.is_active() && !allowed {
            info!("googly eyes stopped");
            self.animation.googly = self.animation.googly.stopped();
            self.mark_dirty();
        }
    }

    /// Advance the animation owning `timer`. The sample is only read by the googly timer.
    pub fn on_timer(&mut self, timer: Timer, sample: Option<AccelSample>) -> Schedule {
        let schedule = match timer {
            Timer::Blink => {
                let (blink, schedule) = self.animation.blink.tick();
                if blink != self.animation.blink {
                    self.mark_dirty();
                }
                self.animation.blink = blink;
                schedule
            }
            Timer::Googly => {
                let (googly, schedule) = self.animation.googly.tick(sample);
                if googly != self.animation.googly {
                    self.mark_dirty();
                }
                self.animation.googly = googly;
                schedule
            }
        };
        if !schedule.is_rearm() {
            debug!("{} timer done", timer);
        }
        schedule
    }

    /// Frame for the current state, ignoring the dirty flag.
    pub fn render(&self) -> Frame {
        face::render(
            &self.profile,
            self.time,
            &self.animation,
            &self.settings,
            &self.status,
        )
    }

    /// Frame to paint if anything changed since the last one.
    pub fn take_frame(&mut self) -> Option<Frame> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::BlinkPhase;
    use crate::settings::ConfigKey;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 21)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn context() -> AppContext {
        AppContext::new(
            DeviceProfile::default(),
            Settings::default(),
            RuntimeStatus {
                bluetooth_connected: true,
                ..RuntimeStatus::default()
            },
            at(10, 8),
        )
    }

    fn sample(x: i16, y: i16) -> Option<AccelSample> {
        Some(AccelSample {
            x,
            y,
            z: 0,
            did_vibrate: false,
        })
    }

    #[test]
    fn redraws_coalesce() {
        let mut app = context();
        assert!(app.take_frame().is_some());
        assert!(app.take_frame().is_none());

        app.handle(Event::BatteryChanged {
            percent: 40,
            charging: false,
        });
        app.handle(Event::BluetoothChanged(false));
        assert!(app.take_frame().is_some());
        assert!(app.take_frame().is_none());
    }

    #[test]
    fn unchanged_status_is_not_a_redraw() {
        let mut app = context();
        app.take_frame();
        let effects = app.handle(Event::BluetoothChanged(true));
        assert!(effects.is_empty());
        assert!(!app.is_dirty());
    }

    #[test]
    fn minute_tick_blinks_once() {
        let mut app = context();
        let effects = app.handle(Event::MinuteTick(at(10, 9)));
        assert!(effects.arm_blink);
        assert_eq!(app.time(), at(10, 9));

        let mut ticks = 0;
        while app.on_timer(Timer::Blink, None).is_rearm() {
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(app.animation().blink.phase(), BlinkPhase::Idle);
        assert_eq!(app.animation().blink.offset(), 0);
        assert_eq!(app.on_timer(Timer::Blink, None), Schedule::Stop);
    }

    #[test]
    fn repeated_minute_blinks_once() {
        let mut app = context();
        let hue = app.animation().background.hue();
        let mut blinks = 0;
        for second in [0, 0, 31] {
            let time = at(10, 5).with_second(second).unwrap();
            if app.handle(Event::MinuteTick(time)).arm_blink {
                blinks += 1;
            }
            while app.on_timer(Timer::Blink, None).is_rearm() {}
        }
        assert_eq!(blinks, 1);
        assert_eq!(app.animation().background.hue(), (hue + 1) % 64);
        assert_eq!(app.time(), at(10, 5).with_second(31).unwrap());
        assert!(app.take_frame().is_some());
    }

    #[test]
    fn blinking_disabled_keeps_eyes_open() {
        let mut app = context();
        let mut update = ConfigUpdate::new();
        update.set(ConfigKey::Blinking, 0);
        assert!(app.handle(Event::SettingsChanged(update)).persist);

        let effects = app.handle(Event::MinuteTick(at(10, 9)));
        assert!(!effects.arm_blink);
        assert!(app.animation().blink.is_idle());
    }

    #[test]
    fn minute_tick_advances_hue() {
        let mut app = context();
        let hue = app.animation().background.hue();
        app.handle(Event::MinuteTick(at(10, 9)));
        assert_eq!(app.animation().background.hue(), (hue + 1) % 64);
    }

    #[test]
    fn taps_toggle_googly() {
        let mut app = context();
        assert!(app.handle(Event::AccelTap).arm_googly);
        assert!(app.animation().googly.is_active());
        assert!(app.on_timer(Timer::Googly, sample(1000, 0)).is_rearm());

        assert!(!app.handle(Event::AccelTap).arm_googly);
        assert!(!app.animation().googly.is_active());
        assert_eq!(app.on_timer(Timer::Googly, sample(1000, 0)), Schedule::Stop);
    }

    #[test]
    fn googly_disabled_ignores_taps() {
        let mut app = context();
        let mut update = ConfigUpdate::new();
        update.set(ConfigKey::Googly, 0);
        app.handle(Event::SettingsChanged(update));
        assert!(app.handle(Event::AccelTap).is_empty());
        assert!(!app.animation().googly.is_active());
    }

    #[test]
    fn disconnect_vibrates_only_when_enabled() {
        let mut app = context();
        assert!(app.handle(Event::BluetoothChanged(false)).vibrate);
        assert!(!app.handle(Event::BluetoothChanged(true)).vibrate);

        let mut update = ConfigUpdate::new();
        update.set(ConfigKey::Vibrate, 0);
        app.handle(Event::SettingsChanged(update));
        assert!(!app.handle(Event::BluetoothChanged(false)).vibrate);
    }

    #[test]
    fn nightstand_calms_the_face() {
        let mut app = context();
        let mut update = ConfigUpdate::new();
        update.set(ConfigKey::Nightstand, 1);
        app.handle(Event::SettingsChanged(update));
        app.handle(Event::AccelTap);
        assert!(app.animation().googly.is_active());

        app.handle(Event::BatteryChanged {
            percent: 80,
            charging: true,
        });
        assert!(app.nightstand_active());
        assert!(!app.animation().googly.is_active());

        let hue = app.animation().background.hue();
        let effects = app.handle(Event::MinuteTick(at(10, 9)));
        assert!(!effects.arm_blink);
        assert_eq!(app.animation().background.hue(), hue);
        assert!(app.take_frame().is_some());
        assert!(app.handle(Event::AccelTap).is_empty());

        app.handle(Event::BatteryChanged {
            percent: 80,
            charging: false,
        });
        assert!(!app.nightstand_active());
        assert!(app.handle(Event::MinuteTick(at(10, 10))).arm_blink);
    }

    #[test]
    fn empty_update_is_not_persisted() {
        let mut app = context();
        app.take_frame();
        let effects = app.handle(Event::SettingsChanged(ConfigUpdate::parse(&[42, 1])));
        assert!(!effects.persist);
        assert!(!app.is_dirty());
    }
}
