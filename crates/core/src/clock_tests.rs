// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new();
    let start = clock.now();

    clock.advance(Duration::from_secs(90));
    assert_eq!(clock.now(), start + Duration::from_secs(90));
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let other = clock.clone();

    clock.advance(Duration::from_secs(5));
    assert_eq!(other.now(), clock.now());
}

#[test]
fn fake_clock_set_pins_time() {
    let clock = FakeClock::new();
    let target = SystemTime::UNIX_EPOCH + Duration::from_secs(42);

    clock.set(target);
    assert_eq!(clock.now(), target);
}
