//! Integration tests for the device health monitor: parallel sweeps, probe
//! failure mapping, and the background refresh loop.

mod helpers;

use helpers::{MockTransport, ProbeBehavior, TestStock};
use picklight_core::config::CoreConfig;
use picklight_core::domain::Device;
use picklight_core::infra::Event;
use picklight_core::Core;
use std::time::Duration;
use tokio::time::Instant;

fn test_config() -> CoreConfig {
	let mut config = CoreConfig::default();
	config.monitor.probe_interval_secs = 60;
	config.monitor.probe_timeout_secs = 10;
	config
}

fn add_devices(core: &Core, transport: &MockTransport, count: usize) -> Vec<Device> {
	(0..count)
		.map(|i| {
			let device = core
				.ctx
				.registry
				.create_device(format!("rack-a-{i:02}"), format!("10.0.8.{}", 10 + i), 60)
				.expect("create device");
			transport.set_probe(&device.address, ProbeBehavior::Online);
			device
		})
		.collect()
}

#[tokio::test(start_paused = true)]
async fn one_hung_device_never_blocks_the_sweep() {
	let transport = MockTransport::new();
	let stock = TestStock::new();
	let core = Core::new(test_config(), stock, transport.clone());

	let devices = add_devices(&core, &transport, 5);
	for device in &devices[..4] {
		transport.set_probe(&device.address, ProbeBehavior::OnlineWithRssi(-61));
	}
	transport.set_probe(&devices[4].address, ProbeBehavior::Hang);

	let started = Instant::now();
	let summary = core.health.refresh_all().await;

	// Bounded by the probe timeout, not by the hung socket
	assert!(
		started.elapsed() <= Duration::from_secs(11),
		"sweep took {:?}",
		started.elapsed()
	);
	assert_eq!(summary.online_count, 4);
	assert_eq!(summary.offline_count, 1);

	for device in &devices[..4] {
		let health = core.health.health(device.id).await.expect("cached health");
		assert!(health.online);
		assert_eq!(health.signal_strength, Some(-61));
		assert!(health.last_seen.is_some());
	}
	let hung = core.health.health(devices[4].id).await.expect("cached health");
	assert!(!hung.online);
}

#[tokio::test(start_paused = true)]
async fn probe_failures_are_data_not_errors() {
	let transport = MockTransport::new();
	let stock = TestStock::new();
	let core = Core::new(test_config(), stock, transport.clone());

	let devices = add_devices(&core, &transport, 3);
	transport.set_probe(&devices[0].address, ProbeBehavior::Error);
	transport.set_probe(&devices[1].address, ProbeBehavior::SelfReportedOffline);

	let summary = core.health.refresh_all().await;
	assert_eq!(summary.online_count, 1);
	assert_eq!(summary.offline_count, 2);

	assert_eq!(core.health.is_online(devices[0].id).await, Some(false));
	assert_eq!(core.health.is_online(devices[1].id).await, Some(false));
	assert_eq!(core.health.is_online(devices[2].id).await, Some(true));

	let all = core.health.all().await;
	assert_eq!(all.len(), 3);
	assert_eq!(all.values().filter(|h| h.online).count(), 1);
}

#[tokio::test(start_paused = true)]
async fn offline_probe_preserves_the_last_sighting() {
	let transport = MockTransport::new();
	let stock = TestStock::new();
	let core = Core::new(test_config(), stock, transport.clone());

	let devices = add_devices(&core, &transport, 1);
	core.health.refresh_all().await;
	let first = core.health.health(devices[0].id).await.expect("health");
	let seen = first.last_seen.expect("online probe records a sighting");

	transport.set_probe(&devices[0].address, ProbeBehavior::Error);
	core.health.refresh_all().await;

	let second = core.health.health(devices[0].id).await.expect("health");
	assert!(!second.online);
	assert_eq!(second.last_seen, Some(seen));
}

#[tokio::test(start_paused = true)]
async fn checking_marker_is_set_during_a_sweep_and_cleared_after() {
	let transport = MockTransport::new();
	let stock = TestStock::new();
	let core = Core::new(test_config(), stock, transport.clone());

	let devices = add_devices(&core, &transport, 2);
	transport.set_probe(&devices[1].address, ProbeBehavior::Hang);

	let health = core.health.clone();
	let sweep = tokio::spawn(async move { health.refresh_all().await });

	// Let the sweep reach its probes without letting the timeout fire
	for _ in 0..10 {
		tokio::task::yield_now().await;
	}
	assert!(core.health.is_checking(devices[1].id).await);

	let summary = sweep.await.expect("sweep completes");
	assert_eq!(summary.offline_count, 1);
	assert!(!core.health.is_checking(devices[1].id).await);
}

#[tokio::test(start_paused = true)]
async fn background_loop_sweeps_until_shutdown() {
	picklight_core::init_logging();
	let transport = MockTransport::new();
	let stock = TestStock::new();
	let core = Core::new(test_config(), stock, transport.clone());
	add_devices(&core, &transport, 1);

	let mut rx = core.ctx.events.subscribe();
	core.start();

	// Let the loop register its first timer before the clock moves
	for _ in 0..10 {
		tokio::task::yield_now().await;
	}
	tokio::time::advance(Duration::from_secs(61)).await;
	for _ in 0..20 {
		tokio::task::yield_now().await;
	}

	let event = rx.try_recv().expect("background sweep event");
	assert!(matches!(event, Event::DeviceHealthRefreshed { online: 1, .. }));

	core.shutdown().await;
	while rx.try_recv().is_ok() {}

	tokio::time::advance(Duration::from_secs(300)).await;
	for _ in 0..20 {
		tokio::task::yield_now().await;
	}
	assert!(
		rx.try_recv().is_err(),
		"no sweeps may run after shutdown"
	);
}
