//! ESP-IDF implementation of [`SyncHal`].
//!
//! - Clock: `esp_timer_get_time()` (µs since boot, monotonic)
//! - Inputs: `gpio_config()` with pull-down and rising-edge interrupt
//! - ISRs: shared GPIO ISR service, one handler per pin
//! - Wake-up: FreeRTOS direct-to-task notification
//! - Task: `xTaskCreatePinnedToCore`, no affinity unless configured

use alloc::boxed::Box;
use core::ffi::c_void;
use core::num::NonZeroU32;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use esp_idf_svc::hal::delay::BLOCK;
use esp_idf_svc::hal::task;
use esp_idf_svc::sys;

use super::{SyncHal, TaskBody};
use crate::channel::Signal;
use crate::clock::MonotonicClock;
use crate::config::{PinConfig, TaskConfig};
use crate::error::SyncError;
use crate::event::EventKind;
use crate::isr::IsrHandler;

/// `esp_timer` clock.
#[derive(Clone, Copy, Default)]
pub struct EspTimerClock;

impl MonotonicClock for EspTimerClock {
    #[inline]
    fn now_us(&self) -> i64 {
        // SAFETY: esp_timer_get_time is ISR-safe and always callable after boot
        unsafe { sys::esp_timer_get_time() }
    }
}

/// Wakes the correlator task with a FreeRTOS notification.
///
/// Notifications sent before the task attaches are skipped; the task drains
/// the channel before its first wait, so nothing is lost.
pub struct TaskSignal {
    task: AtomicPtr<sys::tskTaskControlBlock>,
}

impl TaskSignal {
    pub const fn new() -> Self {
        Self {
            task: AtomicPtr::new(ptr::null_mut()),
        }
    }
}

impl Default for TaskSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl Signal for TaskSignal {
    fn attach(&self) {
        if let Some(handle) = task::current() {
            self.task.store(handle, Ordering::Release);
        }
    }

    #[inline]
    fn notify(&self) {
        let handle = self.task.load(Ordering::Acquire);
        if handle.is_null() {
            return;
        }
        // SAFETY: The handle belongs to the correlator task, which never exits
        unsafe {
            task::notify_and_yield(handle, NonZeroU32::MIN);
        }
    }

    fn wait(&self) {
        let _ = task::wait_notification(BLOCK);
    }
}

/// The real board.
#[derive(Default)]
pub struct EspSyncHal;

impl EspSyncHal {
    pub fn new() -> Self {
        Self
    }
}

/// FreeRTOS entry point for the correlator task.
unsafe extern "C" fn task_entry(arg: *mut c_void) {
    // SAFETY: `arg` is the Box<TaskBody> leaked by spawn_task, handed over exactly once
    let body = unsafe { Box::from_raw(arg as *mut TaskBody) };
    body();

    // A FreeRTOS task function must never return
    unsafe { sys::vTaskDelete(ptr::null_mut()) };
}

impl SyncHal for EspSyncHal {
    type Signal = TaskSignal;
    type Clock = EspTimerClock;

    fn signal(&mut self) -> TaskSignal {
        TaskSignal::new()
    }

    fn clock(&mut self) -> EspTimerClock {
        EspTimerClock
    }

    fn configure_inputs(&mut self, pins: &PinConfig) -> Result<(), SyncError> {
        let io_conf = sys::gpio_config_t {
            pin_bit_mask: (1u64 << pins.trigger_pin) | (1u64 << pins.pps_pin),
            mode: sys::gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: sys::gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: sys::gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            intr_type: sys::gpio_int_type_t_GPIO_INTR_POSEDGE,
            ..Default::default()
        };

        // SAFETY: io_conf outlives the call
        sys::esp!(unsafe { sys::gpio_config(&io_conf) })
            .map_err(|e| SyncError::GpioConfig(e.code()))
    }

    fn install_isr_service(&mut self) -> Result<(), SyncError> {
        // SAFETY: Plain driver call; flags 0 = default-priority, non-IRAM service
        let err = unsafe { sys::gpio_install_isr_service(0) };

        if err == sys::ESP_OK as sys::esp_err_t
            || err == sys::ESP_ERR_INVALID_STATE as sys::esp_err_t
        {
            // INVALID_STATE: another component installed it already
            Ok(())
        } else {
            Err(SyncError::IsrService(err))
        }
    }

    fn register_isr(
        &mut self,
        kind: EventKind,
        pin: i32,
        handler: IsrHandler,
        arg: *mut c_void,
    ) -> Result<(), SyncError> {
        // SAFETY: arg points at a leaked 'static SyncCore matching `handler`
        sys::esp!(unsafe { sys::gpio_isr_handler_add(pin, Some(handler), arg) })
            .map_err(|e| SyncError::HandlerRegister {
                kind,
                code: e.code(),
            })
    }

    fn spawn_task(&mut self, config: &TaskConfig, body: TaskBody) -> Result<(), SyncError> {
        let core_id = config
            .core
            .map(i32::from)
            .unwrap_or(sys::tskNO_AFFINITY as i32);

        let arg = Box::into_raw(Box::new(body)) as *mut c_void;
        let mut handle: sys::TaskHandle_t = ptr::null_mut();

        // SAFETY: task_entry takes ownership of `arg` only if the task was created
        let created = unsafe {
            sys::xTaskCreatePinnedToCore(
                Some(task_entry as unsafe extern "C" fn(*mut c_void)),
                config.name.as_ptr(),
                config.stack_size as _,
                arg,
                config.priority as _,
                &mut handle,
                core_id as _,
            )
        };

        if created == sys::pdPASS as sys::BaseType_t {
            Ok(())
        } else {
            // SAFETY: The task never started, so `arg` is still ours
            drop(unsafe { Box::from_raw(arg as *mut TaskBody) });
            Err(SyncError::TaskSpawn(sys::ESP_ERR_NO_MEM as sys::esp_err_t))
        }
    }
}
