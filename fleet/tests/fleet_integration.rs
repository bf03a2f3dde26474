use std::time::Duration;

use corelib::Part;
use fleet::config::AppConfig;
use fleet::Fleet;

fn test_config() -> AppConfig {
    AppConfig {
        robot_count: 1,
        station_count: 1,
        capacity_hint: 1_000,
        max_battery: 100,
        low_battery_threshold: 30,
        avg_battery_drain: 10,
        task_duration: Duration::from_millis(20),
        idle_poll: Duration::from_millis(10),
        charge_tick: Duration::from_millis(10),
        charge_per_tick: 20,
        charging_timeout: Duration::from_millis(200),
        ingest_poll: Duration::from_millis(50),
        ingest_path: None,
        report_path: None,
        json_logs: false,
    }
}

#[tokio::test(start_paused = true)]
async fn happy_path_dispatch_end_to_end() {
    let bolt = Part::new("P1001", "Bolt", "M6 hex bolt");
    let fleet = Fleet::start(test_config(), [(bolt.clone(), 10)]);
    let handle = fleet.handle();

    let request = handle.submit(bolt.clone(), 5).unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(handle.inventory()[0].level, 5);
    let record = handle.terminal_records().into_iter().find(|r| r.id == request.id).unwrap();
    assert_eq!(record.status, corelib::RequestStatus::Completed);

    fleet.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stop_is_observably_complete_and_idle() {
    let bolt = Part::new("P1001", "Bolt", "M6 hex bolt");
    let fleet = Fleet::start(test_config(), [(bolt.clone(), 10)]);
    let handle = fleet.handle();

    fleet.stop().await;
    assert!(!handle.is_running());
}
