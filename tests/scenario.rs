//! End-to-end scenarios over the library API: ingest a log, report, sweep.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;

use beaconwatch::config::MonitorConfig;
use beaconwatch::detect::{Category, Monotonicity, Timestamp};
use beaconwatch::ingest::{ingest, IngestOptions, LineFormat};
use beaconwatch::monitor::BeaconMonitor;
use beaconwatch::report::{Report, ReportMode};
use beaconwatch::scheduler::spawn_sweeper;

fn at(h: u32, m: u32, s: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(2004, 5, 18)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

/// A server coming up backs off its beacons: 0.1, 0.2, 0.4, ... seconds.
fn startup_log(server: &str) -> String {
    let mut t = 0.0f64;
    let mut out = String::new();
    let mut gap = 0.1;
    for _ in 0..12 {
        let secs = 3600.0 + t;
        out.push_str(&format!(
            "{}  2004-05-18 {:02}:{:02}:{:012.9}\n",
            server,
            (secs / 3600.0) as u32 + 12,
            ((secs % 3600.0) / 60.0) as u32,
            secs % 60.0
        ));
        t += gap;
        gap *= 2.0;
    }
    out
}

#[tokio::test]
async fn test_batch_classifies_startup_and_regular_servers() {
    let mut log = startup_log("booting:5064");
    for i in 0..20 {
        log.push_str(&format!("steady:5064  2004-05-18 12:30:{:02}.000\n", i * 2));
    }

    let monitor = BeaconMonitor::new(MonitorConfig::default());
    let stats = ingest(log.as_bytes(), &monitor, &IngestOptions::default())
        .await
        .unwrap();
    assert_eq!(stats.events_recorded, 32);
    assert_eq!(stats.lines_skipped, 0);

    let report = monitor.report(ReportMode::ByServer).await;
    let Report::ByServer(servers) = &report else {
        panic!("expected a by-server report");
    };
    assert_eq!(servers.len(), 2);

    // steady was first seen at 12:30, booting at 13:00.
    assert_eq!(servers[0].server, "steady:5064");
    assert_eq!(servers[0].groups.len(), 1);
    let steady = &servers[0].groups[0];
    assert_eq!(steady.category, Category::Regular);
    assert_eq!(steady.event_count, 20);
    assert!((steady.mean - 2.0).abs() < 1e-9);

    assert_eq!(servers[1].server, "booting:5064");
    let booting = &servers[1].groups;
    // Only the last gap (102.4 s) exceeds the 60 s timeout.
    assert_eq!(booting.len(), 2);
    assert_eq!(booting[0].category, Category::ServerComingUp);
    assert_eq!(booting[0].monotonicity, Monotonicity::MonotonicIncreasing);
    assert_eq!(booting[0].event_count, 11);
    assert_eq!(booting[1].category, Category::Single);
}

#[tokio::test]
async fn test_oag_log_with_noise() {
    let log = "\
# OAG data logger
iocs3vp:5064  2004/05/12 00:08:08.0134  2004/05/12 00:08:08.0000
iocs3vp:5064  2004/05/12 00:08:07.0134  2004/05/12 00:08:07.0000
iocs3vp:5064  2004/05/12 00:08:09.0134  2004/05/12 00:08:09.0000

iocs3vp:5064  2004-05-12 00:08:10.0134
";
    let monitor = BeaconMonitor::new(MonitorConfig::default());
    let options = IngestOptions {
        format: LineFormat::Oag,
        echo: false,
    };
    let stats = ingest(log.as_bytes(), &monitor, &options).await.unwrap();
    assert_eq!(stats.lines_read, 6);
    assert_eq!(stats.events_recorded, 3);
    assert_eq!(stats.lines_skipped, 3);

    let report = monitor.report(ReportMode::ByGroup).await;
    let groups = report.groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].out_of_order, 1);
    assert_eq!(groups[0].category, Category::OutOfOrder);
}

#[tokio::test(start_paused = true)]
async fn test_live_session_sweeps_then_drains() {
    let monitor = Arc::new(BeaconMonitor::new(MonitorConfig::default()));
    for s in [0, 10, 20] {
        monitor.record_event("early", at(12, 0, s)).await;
    }
    for s in [0, 30] {
        monitor.record_event("late", at(12, 5, s)).await;
    }

    let swept = Arc::new(Mutex::new(Vec::new()));
    let sink = swept.clone();
    let handle = spawn_sweeper(
        monitor.clone(),
        Duration::from_millis(10),
        Box::new(|| at(12, 6, 0)),
        move |report| sink.lock().unwrap().extend(report.groups().into_iter().cloned()),
    );
    // Nine ticks on the paused clock; only the first finds anything.
    tokio::time::sleep(Duration::from_millis(95)).await;
    assert_eq!(handle.stop().await.unwrap(), 9);

    {
        let swept = swept.lock().unwrap();
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].server, "early");
        assert_eq!(swept[0].event_count, 3);
    }

    // "late" is still open; end of input reports it without evicting.
    let remaining = monitor.report(ReportMode::ByGroup).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining.groups()[0].server, "late");
    assert_eq!(monitor.server_count().await, 1);
}

#[tokio::test]
async fn test_batch_report_is_repeatable() {
    let monitor = BeaconMonitor::new(MonitorConfig::default());
    for (server, s) in [("a", 0), ("b", 1), ("a", 5), ("b", 2), ("a", 59)] {
        monitor.record_event(server, at(12, 0, s)).await;
    }
    let first = monitor.report(ReportMode::ByGroup).await;
    let second = monitor.report(ReportMode::ByGroup).await;
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
