#![no_std]
#![no_main]

mod peripherals;
mod system;

// Panic handler and debugging
use defmt::unwrap;

use defmt_rtt as _;
use panic_probe as _;

// Core
use core::{
    cell::{Cell, RefCell},
    sync::atomic::AtomicBool,
};

// Device
use embassy_embedded_hal::shared_bus::blocking::spi::SpiDevice;
use embassy_executor::Spawner;
use embassy_nrf::{
    bind_interrupts,
    gpio::{Input, Level, Output, OutputDrive, Pull},
    peripherals::{P0_05, SPI2, TWISPI1},
    saadc::{self, ChannelConfig, Resolution, Saadc},
    spim::{self, Spim},
    twim::{self, Twim},
};
use embassy_sync::{
    blocking_mutex::{
        raw::{NoopRawMutex, ThreadModeRawMutex},
        Mutex, NoopMutex,
    },
    channel::Channel,
    signal::Signal,
};
use embassy_time::{with_timeout, Duration, Instant, Ticker, Timer};
use nrf_softdevice::Softdevice;
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    SAADC => saadc::InterruptHandler;
    SPIM1_SPIS1_TWIM1_TWIS1_SPI1_TWI1 => twim::InterruptHandler<TWISPI1>;
    SPIM2_SPIS2_SPI2 => spim::InterruptHandler<SPI2>;
});

// Crate
use crazy_eyes::{
    animation::FRAME_INTERVAL_MS,
    status::{AccelSample, Accelerometer, TapDetector},
    AppContext, DeviceProfile, Event, RuntimeStatus, Timer as FaceTimer,
};
use peripherals::{
    accelerometer::Bma421,
    battery::Battery,
    display::{BacklightPins, Display},
    flash::Flash,
    vibration::VibrationMotor,
};
use system::{
    bluetooth::{self, Clock, Server},
    config::SystemConfig,
    time::{TimeManager, TimeReference},
};

// Others
use chrono::Timelike;

// Include current UTC epoch at compile time
include!(concat!(env!("OUT_DIR"), "/utc.rs"));
const TIMEZONE: i64 = 1 * 3_600;

const FRAME_INTERVAL: Duration = Duration::from_millis(FRAME_INTERVAL_MS);
const BRIGHTNESS: u8 = 3;
const NIGHTSTAND_BRIGHTNESS: u8 = 1;
/// Pulses per disconnect alert
const DISCONNECT_PULSES: u8 = 2;

type FlashSpi = SpiDevice<'static, NoopRawMutex, Spim<'static, SPI2>, Output<'static, P0_05>>;

// Communication channels
static EVENTS: Channel<ThreadModeRawMutex, Event, 8> = Channel::new();
static NOTIFY: Signal<ThreadModeRawMutex, u8> = Signal::new();
static LATEST_ACCEL: Mutex<ThreadModeRawMutex, Cell<Option<AccelSample>>> =
    Mutex::new(Cell::new(None));
static VIBRATING: AtomicBool = AtomicBool::new(false);

static CLOCK: StaticCell<Clock> = StaticCell::new();
static SERVER: StaticCell<Server> = StaticCell::new();
static SPI_BUS: StaticCell<NoopMutex<RefCell<Spim<'static, SPI2>>>> = StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn bluetooth_task(sd: &'static Softdevice, server: &'static Server, clock: &'static Clock) {
    bluetooth::run(sd, server, clock, EVENTS.sender()).await
}

/// Vibrate the signaled amount of times
#[embassy_executor::task(pool_size = 1)]
async fn notify(mut motor: VibrationMotor<'static>) {
    loop {
        let count = NOTIFY.wait().await;
        motor.pulse_times(Some(200), count).await;
    }
}

/// Fetch the battery status from the hardware every 10s.
#[embassy_executor::task(pool_size = 1)]
async fn update_battery_status(mut battery: Battery<'static>, server: &'static Server) {
    let mut tick = Ticker::every(Duration::from_secs(10));
    loop {
        if let Some(info) = battery.update().await {
            defmt::info!("Battery status updated: {}", info);
            server.update_battery(info.percent);
            EVENTS
                .send(Event::BatteryChanged {
                    percent: info.percent,
                    charging: info.charging,
                })
                .await;
        }
        tick.next().await;
    }
}

/// Emit a minute tick at every full minute.
#[embassy_executor::task(pool_size = 1)]
async fn update_time(clock: &'static Clock) {
    loop {
        let now = clock.lock(|c| c.borrow().get_time());
        let to_next_minute = 60 - u64::from(now.second());
        Timer::after(Duration::from_secs(to_next_minute)).await;

        let now = clock.lock(|c| c.borrow().get_time());
        EVENTS.send(Event::MinuteTick(now)).await;
    }
}

/// Sample the accelerometer at frame rate, detect taps.
#[embassy_executor::task(pool_size = 1)]
async fn poll_accelerometer(mut accel: Bma421<'static, Twim<'static, TWISPI1>>) {
    let mut taps = TapDetector::default();
    let mut tick = Ticker::every(FRAME_INTERVAL);
    loop {
        let sample = match accel.sample() {
            Ok(sample) => Some(sample),
            Err(e) => {
                defmt::warn!("accelerometer read failed: {}", e);
                None
            }
        };
        LATEST_ACCEL.lock(|latest| latest.set(sample));

        if let Some(sample) = sample {
            if taps.update(sample) {
                defmt::debug!("tap");
                EVENTS.send(Event::AccelTap).await;
            }
        }
        tick.next().await;
    }
}

/// Own the face: apply events, run the animation timers, paint.
#[embassy_executor::task(pool_size = 1)]
async fn face(mut app: AppContext, mut display: Display, mut flash: Flash<FlashSpi>) {
    let mut blink_armed = false;
    let mut googly_armed = false;
    let mut next_frame = Instant::now();
    let mut nightstand = false;

    loop {
        if let Some(frame) = app.take_frame() {
            if let Err(e) = display.show(&frame) {
                defmt::warn!("frame not painted: {}", e);
            }
        }
        if app.nightstand_active() != nightstand {
            nightstand = app.nightstand_active();
            display.set_brightness(if nightstand {
                NIGHTSTAND_BRIGHTNESS
            } else {
                BRIGHTNESS
            });
        }

        let animating = blink_armed || googly_armed;
        let event = if animating {
            let remaining = next_frame.saturating_duration_since(Instant::now());
            with_timeout(remaining, EVENTS.receive()).await.ok()
        } else {
            Some(EVENTS.receive().await)
        };

        match event {
            Some(event) => {
                let effects = app.handle(event);
                if !animating && (effects.arm_blink || effects.arm_googly) {
                    next_frame = Instant::now() + FRAME_INTERVAL;
                }
                blink_armed |= effects.arm_blink;
                googly_armed |= effects.arm_googly;
                if effects.vibrate {
                    NOTIFY.signal(DISCONNECT_PULSES);
                }
                if effects.persist {
                    if let Err(e) = flash.store_settings(app.settings()).await {
                        defmt::warn!("settings not saved: {}", e);
                    }
                }
            }
            None => {
                if blink_armed {
                    blink_armed = app.on_timer(FaceTimer::Blink, None).is_rearm();
                }
                if googly_armed {
                    let sample = LATEST_ACCEL.lock(|latest| latest.get());
                    googly_armed = app.on_timer(FaceTimer::Googly, sample).is_rearm();
                }
                // Skip frames that were missed while painting
                next_frame = (next_frame + FRAME_INTERVAL).max(Instant::now());
            }
        }
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(SystemConfig::new());
    SystemConfig::driver_priorities();
    defmt::info!("Initializing");

    // Initialize Bluetooth
    let sd = Softdevice::enable(&bluetooth::generate_config());
    let server = SERVER.init(unwrap!(Server::new(sd)));
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(softdevice_task(sd)));

    // Initialize clock
    let reference = unwrap!(TimeReference::from_timestamp(UTC_EPOCH + TIMEZONE));
    let clock = CLOCK.init(Mutex::new(RefCell::new(TimeManager::init(reference))));

    // Initialize SAADC
    let mut saadc_config = saadc::Config::default();
    // Set resolution to 12bit, necessary for correct battery status calculation
    saadc_config.resolution = Resolution::_12BIT;
    // Pin P0.31: Voltage level
    let channel_config = ChannelConfig::single_ended(p.P0_31);
    let saadc = Saadc::new(p.SAADC, Irqs, saadc_config, [channel_config]);
    saadc.calibrate().await;

    // Initialize Battery
    let battery = Battery::init(saadc, Input::new(p.P0_12, Pull::None));

    // Initialize vibration motor
    let vibration = VibrationMotor::init(
        Output::new(p.P0_16, Level::High, OutputDrive::Standard),
        &VIBRATING,
    );

    // Initialize I2C
    let mut i2c_config = twim::Config::default();
    // Use I2C at 400KHz (the fastest clock available on the nRF52832),
    i2c_config.frequency = twim::Frequency::K400;
    let i2c = Twim::new(p.TWISPI1, Irqs, p.P0_06, p.P0_07, i2c_config);

    // Initialize accelerometer
    let mut accel = Bma421::new(i2c, &VIBRATING);
    if let Err(e) = accel.init() {
        // Googly eyes hold still without samples
        defmt::warn!("accelerometer unavailable: {}", e);
    }

    // Initialize SPI
    let mut spim_config = spim::Config::default();
    // Use SPI at 8MHz (the fastest clock available on the nRF52832),
    // otherwise refreshing will be super slow.
    spim_config.frequency = spim::Frequency::M8;
    // SPI must be used in mode 3. Mode 0 (the default) won't work.
    spim_config.mode = spim::MODE_3;
    let spim = Spim::new(p.SPI2, Irqs, p.P0_02, p.P0_04, p.P0_03, spim_config);
    let spi_bus = SPI_BUS.init(NoopMutex::new(RefCell::new(spim)));

    // Initialize flash and load settings
    let flash_spi = SpiDevice::new(
        spi_bus,
        Output::new(p.P0_05, Level::High, OutputDrive::Standard),
    );
    let mut flash = unwrap!(Flash::init(flash_spi).await);
    let settings = flash.load_settings();

    // Initialize LCD
    let backlight = BacklightPins::init(
        Output::new(p.P0_14, Level::High, OutputDrive::Standard),
        Output::new(p.P0_22, Level::High, OutputDrive::Standard),
        Output::new(p.P0_23, Level::High, OutputDrive::Standard),
    );
    let display = unwrap!(Display::init(
        SpiDevice::new(
            spi_bus,
            Output::new(p.P0_25, Level::High, OutputDrive::Standard),
        ),
        Output::new(p.P0_18, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_26, Level::Low, OutputDrive::Standard),
        backlight,
        BRIGHTNESS,
    ));

    let now = clock.lock(|c| c.borrow().get_time());
    let app = AppContext::new(
        DeviceProfile::PINETIME,
        settings,
        RuntimeStatus::default(),
        now,
    );

    defmt::info!("Initialization finished");

    // Schedule tasks
    unwrap!(spawner.spawn(bluetooth_task(sd, server, clock)));
    unwrap!(spawner.spawn(update_battery_status(battery, server)));
    unwrap!(spawner.spawn(update_time(clock)));
    unwrap!(spawner.spawn(poll_accelerometer(accel)));
    unwrap!(spawner.spawn(notify(vibration)));
    unwrap!(spawner.spawn(face(app, display, flash)));
}
