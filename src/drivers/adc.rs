//! Soil-moisture probe on ADC1 (oneshot driver).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: configures one ADC1 channel through the oneshot API at
//! construction and reads it on every [`SensorPort::sample`].  Raw 12-bit
//! readings are shifted down to the 10-bit domain the thresholds use.  A
//! failed conversion is reported as `-1`, which the pipeline's range check
//! rejects.
//!
//! On host/test: reads from a static `AtomicI32` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicI32, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

use crate::app::ports::SensorPort;
use crate::error::{Error, Result};
#[cfg(target_os = "espidf")]
use crate::pins;

/// Value reported when a conversion fails.
pub const CONVERSION_FAILED: i32 = -1;

#[cfg(not(target_os = "espidf"))]
static SIM_MOISTURE_ADC: AtomicI32 = AtomicI32::new(512);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_moisture_adc(raw: i32) {
    SIM_MOISTURE_ADC.store(raw, Ordering::Relaxed);
}

pub struct MoistureAdc {
    #[cfg(target_os = "espidf")]
    handle: adc_oneshot_unit_handle_t,
    channel: u32,
}

#[cfg(target_os = "espidf")]
impl MoistureAdc {
    pub fn new(channel: u32) -> Result<Self> {
        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_1,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
        // SAFETY: called once from main() before the control loop starts.
        let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(Error::Init("ADC1 unit"));
        }

        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        // SAFETY: `handle` was just created by adc_oneshot_new_unit.
        let ret = unsafe { adc_oneshot_config_channel(handle, channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(Error::Init("ADC1 channel"));
        }

        info!(
            "SENSOR | ADC1 CH{channel} configured (GPIO {})",
            pins::SOIL_MOISTURE_ADC_GPIO
        );
        Ok(Self { handle, channel })
    }

    fn read_raw(&mut self) -> i32 {
        let mut raw: i32 = 0;
        // SAFETY: handle is valid for the lifetime of self; single-threaded
        // main-loop access only.
        let ret = unsafe { adc_oneshot_read(self.handle, self.channel, &mut raw) };
        if ret != ESP_OK as i32 {
            return CONVERSION_FAILED;
        }
        raw >> pins::ADC_TO_10BIT_SHIFT
    }
}

#[cfg(not(target_os = "espidf"))]
impl MoistureAdc {
    pub fn new(channel: u32) -> Result<Self> {
        if channel > 9 {
            return Err(Error::Init("ADC1 channel"));
        }
        Ok(Self { channel })
    }

    fn read_raw(&mut self) -> i32 {
        SIM_MOISTURE_ADC.load(Ordering::Relaxed)
    }
}

impl MoistureAdc {
    pub fn channel(&self) -> u32 {
        self.channel
    }
}

impl SensorPort for MoistureAdc {
    fn sample(&mut self) -> i32 {
        self.read_raw()
    }
}
