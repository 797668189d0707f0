//! Integration tests for the sync coordinator: bulk push, partial success,
//! offline skip, and targeted re-sync.

mod helpers;

use helpers::{MockTransport, ProbeBehavior, TestStock};
use picklight_core::config::CoreConfig;
use picklight_core::domain::Segment;
use picklight_core::render::color::{LOW_STOCK_WARNING, STOCK_OK};
use picklight_core::service::SyncError;
use picklight_core::Core;
use uuid::Uuid;

fn wired_core() -> (std::sync::Arc<Core>, std::sync::Arc<MockTransport>, std::sync::Arc<TestStock>) {
	let transport = MockTransport::new();
	let stock = TestStock::new();
	let core = Core::new(CoreConfig::default(), stock.clone(), transport.clone());
	(core, transport, stock)
}

#[tokio::test]
async fn sync_all_pushes_every_segment() {
	let (core, transport, stock) = wired_core();
	let device = core
		.ctx
		.registry
		.create_device("rack-a-01".into(), "10.0.8.11".into(), 60)
		.expect("device");

	let product_a = stock.add_product(20, 5);
	let product_b = stock.add_product(3, 5);
	core.ctx
		.registry
		.insert_segment(Segment::new(device.id, product_a, 0, 12))
		.expect("segment");
	core.ctx
		.registry
		.insert_segment(Segment::new(device.id, product_b, 12, 12))
		.expect("segment");

	let report = core.sync.sync_all(device.id).await.expect("sync");
	assert_eq!(report.synced_segments, 2);
	assert!(report.segments_per_sec() > 0.0);

	let sent = transport.sent();
	assert_eq!(sent.len(), 2);
	assert!(sent.iter().all(|s| s.address == "10.0.8.11"));

	// Frames carry resolved stock state: healthy product gets the ok color,
	// low product gets the forced warning color
	let healthy = sent.iter().find(|s| s.frame.start_led == 0).expect("frame");
	assert!(healthy.frame.leds[4..8].iter().all(|led| led.color == STOCK_OK));
	let low = sent.iter().find(|s| s.frame.start_led == 12).expect("frame");
	assert!(low.frame.leds[4..8]
		.iter()
		.all(|led| led.color == LOW_STOCK_WARNING));
}

#[tokio::test]
async fn a_failed_segment_does_not_abort_the_batch() {
	let (core, transport, stock) = wired_core();
	let device = core
		.ctx
		.registry
		.create_device("rack-a-01".into(), "10.0.8.11".into(), 60)
		.expect("device");

	for slot in 0..3 {
		let product = stock.add_product(10, 2);
		core.ctx
			.registry
			.insert_segment(Segment::new(device.id, product, slot * 12, 12))
			.expect("segment");
	}

	// First command fails; the remaining two must still go out
	transport.fail_next_sends(1);
	let report = core.sync.sync_all(device.id).await.expect("sync");
	assert_eq!(report.synced_segments, 2);
	assert_eq!(transport.sent_count(), 2);
}

#[tokio::test]
async fn known_offline_devices_are_skipped() {
	let (core, transport, stock) = wired_core();
	let device = core
		.ctx
		.registry
		.create_device("rack-a-01".into(), "10.0.8.11".into(), 60)
		.expect("device");
	let product = stock.add_product(10, 2);
	core.ctx
		.registry
		.insert_segment(Segment::new(device.id, product, 0, 12))
		.expect("segment");

	transport.set_probe(&device.address, ProbeBehavior::Error);
	core.health.refresh_all().await;

	let err = core
		.sync
		.sync_all(device.id)
		.await
		.expect_err("offline device must be skipped");
	assert!(matches!(err, SyncError::DeviceOffline(_)));
	assert_eq!(transport.sent_count(), 0, "no commands for an offline device");
}

#[tokio::test]
async fn unknown_devices_and_segments_are_hard_errors() {
	let (core, _transport, _stock) = wired_core();

	assert!(matches!(
		core.sync.sync_all(Uuid::new_v4()).await,
		Err(SyncError::DeviceNotFound(_))
	));
	assert!(matches!(
		core.sync.sync_one(Uuid::new_v4()).await,
		Err(SyncError::SegmentNotFound(_))
	));
}

#[tokio::test]
async fn sync_one_pushes_a_single_frame() {
	let (core, transport, stock) = wired_core();
	let device = core
		.ctx
		.registry
		.create_device("rack-a-01".into(), "10.0.8.11".into(), 60)
		.expect("device");
	let product = stock.add_product(10, 2);
	let segment = core
		.ctx
		.registry
		.insert_segment(Segment::new(device.id, product, 24, 12))
		.expect("segment");

	core.sync.sync_one(segment.id).await.expect("sync one");

	let sent = transport.sent();
	assert_eq!(sent.len(), 1);
	assert_eq!(sent[0].frame.start_led, 24);
	assert_eq!(sent[0].frame.leds.len(), 12);
}

#[tokio::test]
async fn per_device_syncs_are_independent() {
	let (core, transport, stock) = wired_core();
	let reachable = core
		.ctx
		.registry
		.create_device("rack-a-01".into(), "10.0.8.11".into(), 60)
		.expect("device");
	let dead = core
		.ctx
		.registry
		.create_device("rack-a-02".into(), "10.0.8.12".into(), 60)
		.expect("device");

	for device in [&reachable, &dead] {
		let product = stock.add_product(10, 2);
		core.ctx
			.registry
			.insert_segment(Segment::new(device.id, product, 0, 12))
			.expect("segment");
	}
	transport.set_send_failure(&dead.address, true);

	let results = core.sync.sync_devices(vec![reachable.id, dead.id]).await;
	assert_eq!(results.len(), 2);

	let reachable_report = results
		.iter()
		.find(|(id, _)| *id == reachable.id)
		.and_then(|(_, r)| r.as_ref().ok())
		.expect("reachable device syncs");
	assert_eq!(reachable_report.synced_segments, 1);

	// The dead device's sync "succeeds" with zero segments pushed - its
	// failures are per-segment, not batch-fatal
	let dead_report = results
		.iter()
		.find(|(id, _)| *id == dead.id)
		.and_then(|(_, r)| r.as_ref().ok())
		.expect("dead device still reports");
	assert_eq!(dead_report.synced_segments, 0);
}
