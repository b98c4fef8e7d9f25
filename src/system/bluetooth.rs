//! Bluetooth module

// Core
use core::{cell::RefCell, mem};

// BLE
use nrf_softdevice::{
    self,
    ble::{
        advertisement_builder::{
            Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
            ServiceUuid16,
        },
        gatt_server, peripheral, Connection,
    },
    raw, Config, Softdevice,
};

// Others
use crazy_eyes::{app::Event, settings::ConfigUpdate};
use embassy_sync::{
    blocking_mutex::{raw::ThreadModeRawMutex, Mutex},
    channel::Sender,
};
use heapless::Vec;

use super::time::{TimeManager, TimeReference, CTS_LEN};

/// Longest configuration write, one (key, value) pair per key
pub const CONFIG_MAX_LEN: usize = 16;

pub type Clock = Mutex<ThreadModeRawMutex, RefCell<TimeManager>>;
pub type Events = Sender<'static, ThreadModeRawMutex, Event, 8>;

pub static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_16(
        ServiceList::Incomplete,
        &[ServiceUuid16::BATTERY, ServiceUuid16::CURRENT_TIME],
    )
    .full_name("CrazyEyes")
    .build();

pub static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .services_16(
        ServiceList::Incomplete,
        &[ServiceUuid16::BATTERY, ServiceUuid16::CURRENT_TIME],
    )
    .build();

/// Link of the current central, used for notifications from other tasks
static CONNECTION: Mutex<ThreadModeRawMutex, RefCell<Option<Connection>>> =
    Mutex::new(RefCell::new(None));

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub bas: BatteryService,
    pub cts: CurrentTimeService,
    pub face: FaceConfigService,
}

#[nrf_softdevice::gatt_service(uuid = "180f")]
pub struct BatteryService {
    #[characteristic(uuid = "2a19", read, notify)]
    pub battery_level: u8,
}

#[nrf_softdevice::gatt_service(uuid = "1805")]
pub struct CurrentTimeService {
    #[characteristic(uuid = "2a2b", read, write)]
    pub current_time: [u8; CTS_LEN],
}

/// Face settings as (key, value) byte pairs
#[nrf_softdevice::gatt_service(uuid = "c7e5e000-5ac0-4d8e-9b1d-7f3b2c61a0e1")]
pub struct FaceConfigService {
    #[characteristic(uuid = "c7e5e001-5ac0-4d8e-9b1d-7f3b2c61a0e1", write)]
    pub config: Vec<u8, CONFIG_MAX_LEN>,
}

pub fn generate_config() -> Config {
    Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_XTAL as u8,
            rc_ctiv: 0,
            rc_temp_ctiv: 0,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_20_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 128 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: b"CrazyEyes" as *const u8 as _,
            current_len: 9,
            max_len: 9,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

impl Server {
    /// Store the battery level and notify a connected central.
    pub fn update_battery(&self, percent: u8) {
        if self.bas.battery_level_set(&percent).is_err() {
            defmt::warn!("battery level not stored");
        }
        if let Some(conn) = CONNECTION.lock(|c| c.borrow().clone()) {
            // Fails when the central has not subscribed
            let _ = self.bas.battery_level_notify(&conn, &percent);
        }
    }
}

/// Advertise, serve one central until it leaves, repeat.
pub async fn run(
    sd: &'static Softdevice,
    server: &'static Server,
    clock: &'static Clock,
    events: Events,
) -> ! {
    let config = peripheral::Config::default();
    loop {
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };
        let conn = match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => conn,
            Err(e) => {
                defmt::warn!("advertising failed: {:?}", e);
                continue;
            }
        };

        defmt::info!("central connected");
        CONNECTION.lock(|c| c.replace(Some(conn.clone())));
        events.send(Event::BluetoothChanged(true)).await;

        let reason = gatt_server::run(&conn, server, |e| match e {
            ServerEvent::Bas(BatteryServiceEvent::BatteryLevelCccdWrite { notifications }) => {
                defmt::debug!("battery notifications: {}", notifications);
            }
            ServerEvent::Cts(CurrentTimeServiceEvent::CurrentTimeWrite(bytes)) => {
                match TimeReference::from_cts_bytes(&bytes) {
                    Some(reference) => {
                        let now = clock.lock(|c| {
                            let mut clock = c.borrow_mut();
                            clock.set_time(reference);
                            clock.get_time()
                        });
                        send(&events, Event::MinuteTick(now));
                    }
                    None => defmt::warn!("invalid current time {:x}", bytes),
                }
            }
            ServerEvent::Face(FaceConfigServiceEvent::ConfigWrite(bytes)) => {
                let update = ConfigUpdate::parse(&bytes);
                if update.is_empty() {
                    defmt::debug!("config write without known keys");
                } else {
                    send(&events, Event::SettingsChanged(update));
                }
            }
        })
        .await;

        defmt::info!("central disconnected: {:?}", reason);
        CONNECTION.lock(|c| c.replace(None));
        events.send(Event::BluetoothChanged(false)).await;
    }
}

/// Queue from inside the synchronous GATT callback, where waiting is not possible.
fn send(events: &Events, event: Event) {
    if events.try_send(event).is_err() {
        defmt::warn!("event queue full, dropping bluetooth event");
    }
}
