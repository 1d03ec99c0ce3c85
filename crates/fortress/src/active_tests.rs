// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[test]
fn new_tracker_is_idle() {
    let active = ActiveVisits::new();
    assert_eq!(active.count(), 0);
}

#[test]
fn permits_count_until_dropped() {
    let active = ActiveVisits::new();

    let first = active.enter();
    let second = active.enter();
    assert_eq!(active.count(), 2);

    drop(first);
    assert_eq!(active.count(), 1);

    drop(second);
    assert_eq!(active.count(), 0);
}

#[test]
fn clones_share_the_same_count() {
    let active = ActiveVisits::new();
    let other = active.clone();

    let _permit = other.enter();
    assert_eq!(active.count(), 1);
}

#[tokio::test]
async fn wait_idle_returns_immediately_when_idle() {
    let active = ActiveVisits::new();

    tokio::time::timeout(Duration::from_millis(100), active.wait_idle())
        .await
        .expect("idle tracker should not block");
}

#[tokio::test]
async fn wait_idle_blocks_until_last_permit_drops() {
    let active = ActiveVisits::new();
    let first = active.enter();
    let second = active.enter();

    let waiter = {
        let active = active.clone();
        tokio::spawn(async move { active.wait_idle().await })
    };

    drop(first);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    drop(second);
    tokio::time::timeout(Duration::from_millis(200), waiter)
        .await
        .expect("waiter should finish once idle")
        .unwrap();
}

#[tokio::test]
async fn permit_is_released_when_task_panics() {
    let active = ActiveVisits::new();
    let permit = active.enter();

    let result = tokio::spawn(async move {
        let _permit = permit;
        panic!("visit blew up");
    })
    .await;

    assert!(result.is_err());
    assert_eq!(active.count(), 0);
}
