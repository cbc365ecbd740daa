// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const WINDOW: Duration = Duration::from_secs(30 * 60);
const BASE: Duration = Duration::from_secs(60);
const MAX: Duration = Duration::from_secs(15 * 60);

#[test]
fn cooldown_doubles_per_crash_in_window() {
    let mut tracker = CrashTracker::default();
    let start = Instant::now();

    assert_eq!(tracker.record_crash(start, WINDOW, BASE, MAX), Duration::from_secs(60));
    let t2 = start + Duration::from_secs(120);
    assert_eq!(tracker.record_crash(t2, WINDOW, BASE, MAX), Duration::from_secs(120));
    let t3 = start + Duration::from_secs(400);
    assert_eq!(tracker.record_crash(t3, WINDOW, BASE, MAX), Duration::from_secs(240));
    let t4 = start + Duration::from_secs(700);
    assert_eq!(tracker.record_crash(t4, WINDOW, BASE, MAX), Duration::from_secs(480));
}

#[test]
fn cooldown_caps_at_max() {
    let mut tracker = CrashTracker::default();
    let start = Instant::now();
    let mut at = start;
    for _ in 0..8 {
        at += Duration::from_secs(10);
        tracker.record_crash(at, WINDOW, BASE, MAX);
    }
    assert_eq!(tracker.record_crash(at, WINDOW, BASE, MAX), MAX);
}

#[test]
fn crashes_outside_window_do_not_count() {
    let mut tracker = CrashTracker::default();
    let start = Instant::now();
    tracker.record_crash(start, WINDOW, BASE, MAX);
    tracker.record_crash(start + Duration::from_secs(60), WINDOW, BASE, MAX);

    // Both crashes age out of the 30-minute window
    let later = start + Duration::from_secs(40 * 60);
    assert_eq!(tracker.crashes_in_window(later, WINDOW), 0);
    assert_eq!(tracker.record_crash(later, WINDOW, BASE, MAX), Duration::from_secs(60));
}

#[test]
fn remaining_counts_down_and_expires() {
    let mut tracker = CrashTracker::default();
    let start = Instant::now();
    tracker.record_crash(start, WINDOW, BASE, MAX);

    let mid = start + Duration::from_secs(30);
    assert_eq!(tracker.remaining(mid), Some(Duration::from_secs(30)));
    assert_eq!(tracker.remaining(start + Duration::from_secs(60)), None);
}
