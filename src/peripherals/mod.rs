pub(super) mod accelerometer;
pub(super) mod battery;
pub(super) mod display;
pub(super) mod flash;
pub(super) mod vibration;
