mod common;

use std::sync::Arc;

use common::*;
use parking_lot::Mutex;
use timeattack_tracking::{pump, MemoryRunStore, ReplaySource, TrackingConfig, TrackingSession, REPORT_BACKLOG};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn replay_through_pump_finishes_lap() {
    init_logs();
    let voice = RecordingVoice::default();
    let mut sess = TrackingSession::new(TrackingConfig::default(), start_cp(), finish_cp(FINISH_M))
        .with_voice(voice.clone())
        .with_store(MemoryRunStore::new());
    assert!(sess.confirm_route());
    let sess = Arc::new(Mutex::new(sess));

    let source = ReplaySource::new(crossing_fixes(50_000)).with_speed(0.0);
    let handle = pump(source, Arc::clone(&sess), None, &tokio::runtime::Handle::current());

    let reports = handle.reports;
    let thread = handle.thread;
    tokio::task::spawn_blocking(move || thread.join())
        .await
        .unwrap()
        .unwrap();

    let reports: Vec<_> = reports.try_iter().collect();
    assert_eq!(reports.len(), 4);
    let finished = reports.iter().find_map(|r| r.finished.clone()).expect("lap should finish");
    assert_eq!(finished.duration_ms, 12_400);
    assert_eq!(voice.count("Finish"), 1);
    assert_eq!(sess.lock().store().runs_for_course("start_finish").unwrap().len(), 1);
}

#[test]
fn undrained_reports_are_capped() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let sess = TrackingSession::new(TrackingConfig::default(), start_cp(), finish_cp(5_000.0));
    let sess = Arc::new(Mutex::new(sess));

    let total = REPORT_BACKLOG as u64 + 50;
    let fixes = (1..=total).map(|i| fix_at(i as f64, i * 1_000, 0.0)).collect();
    let handle = pump(ReplaySource::new(fixes).with_speed(0.0), Arc::clone(&sess), None, rt.handle());
    handle.thread.join().unwrap();

    let reports: Vec<_> = handle.reports.try_iter().collect();
    assert_eq!(reports.len(), REPORT_BACKLOG);
    assert_eq!(reports[0].location.timestamp_ms, 1_000);
    // every fix still reached the session
    let last = sess.lock().extrapolate(total * 1_000).unwrap();
    assert_eq!(last.timestamp_ms, total * 1_000);
}
