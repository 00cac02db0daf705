//! Trigger/PPS sync firmware entry point.
//!
//! 1. Bind `log` to the ESP-IDF logger
//! 2. Bring up the trigger/PPS subsystem
//! 3. Drain its diagnostic log and report counters from the main task

#[cfg(target_os = "espidf")]
fn main() {
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::sys;
    use trigger_pps_sync::hal::esp::EspSyncHal;
    use trigger_pps_sync::{init, LatestOffset, LogDrain, MonotonicClock, SyncConfig};

    /// Most recent offset, read by whatever exposes it (BLE, console, ...).
    static LATEST_OFFSET: LatestOffset = LatestOffset::new();

    const STATS_INTERVAL_US: i64 = 60_000_000;

    sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("{}", env!("VERSION_STRING"));

    let config = SyncConfig::default();
    let core = match init(&mut EspSyncHal::new(), &config, &LATEST_OFFSET) {
        Ok(core) => core,
        Err(_) => {
            // init already logged the cause. Nothing to measure; stay up for the console
            loop {
                FreeRtos::delay_ms(1000);
            }
        }
    };

    let mut drain = LogDrain::new();
    let mut last_stats_us = 0i64;

    loop {
        let now_us = core.clock().now_us();
        let forwarded = drain.poll(core.log(), now_us);

        if now_us - last_stats_us >= STATS_INTERVAL_US {
            let snap = core.stats().snapshot();
            log::info!(
                "triggers {} (+{} bounces), PPS {}, offsets {}, skipped {}, dropped {}, last offset {:?} us",
                snap.triggers_admitted,
                snap.triggers_rejected,
                snap.pps_admitted,
                snap.offsets_published,
                snap.pps_skipped,
                snap.events_dropped,
                LATEST_OFFSET.get()
            );
            last_stats_us = now_us;
        }

        if forwarded == 0 {
            FreeRtos::delay_ms(10);
        }
    }
}

/// Host build: replay a short edge sequence through the same core.
#[cfg(not(target_os = "espidf"))]
fn main() {
    use trigger_pps_sync::{LatestOffset, ManualClock, SpinSignal, SyncConfig, SyncCore};

    let config = SyncConfig::default();
    let core = match SyncCore::try_new(&config, SpinSignal::new(), ManualClock::new(0)) {
        Ok(core) => core,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let sink = LatestOffset::new();
    let mut correlator = core.correlator();

    // trigger, bounce, PPS, PPS
    for (at_us, is_pps) in [
        (1_000_000, false),
        (1_004_000, false),
        (1_050_000, true),
        (2_050_000, true),
    ] {
        core.clock().set(at_us);
        if is_pps {
            core.on_pps_edge();
        } else {
            core.on_trigger_edge();
        }
    }
    correlator.drain(&core, &sink);

    while let Some(entry) = core.log().drain() {
        println!("[{:10}] {}: {}", entry.timestamp_us, entry.level.as_str(), entry.message_str());
    }
    println!("{}", env!("VERSION_STRING"));
    println!("{:?}", core.stats().snapshot());
}
