use super::*;

#[test]
fn starts_idle() {
    let machine = RedirectMachine::new(5);
    assert_eq!(machine.state(), RedirectState::Idle);
    assert!(!machine.attempted());
}

#[test]
fn begin_enters_countdown_once() {
    let mut machine = RedirectMachine::new(5);
    assert_eq!(machine.begin(), Some(5));
    assert_eq!(machine.state(), RedirectState::CountingDown { remaining: 5 });

    machine.tick();
    // A second qualifying signal neither restarts nor resets.
    assert_eq!(machine.begin(), None);
    assert_eq!(machine.state(), RedirectState::CountingDown { remaining: 4 });
}

#[test]
fn expires_exactly_after_countdown_ticks() {
    let mut machine = RedirectMachine::new(5);
    machine.begin();

    let ticks: Vec<Tick> = std::iter::from_fn(|| machine.tick()).collect();
    assert_eq!(
        ticks,
        vec![Tick::Remaining(4), Tick::Remaining(3), Tick::Remaining(2), Tick::Remaining(1), Tick::Expired]
    );
    assert_eq!(machine.state(), RedirectState::Navigated);
}

#[test]
fn tick_outside_countdown_is_none() {
    let mut machine = RedirectMachine::new(5);
    assert_eq!(machine.tick(), None);
    machine.finish();
    assert_eq!(machine.tick(), None);
}

#[test]
fn finish_from_idle_blocks_later_sessions() {
    let mut machine = RedirectMachine::new(5);
    machine.finish();
    assert_eq!(machine.state(), RedirectState::Navigated);
    assert_eq!(machine.begin(), None);
}

#[test]
fn finish_during_countdown_navigates() {
    let mut machine = RedirectMachine::new(5);
    machine.begin();
    machine.tick();
    machine.finish();
    assert_eq!(machine.state(), RedirectState::Navigated);
}

#[test]
fn single_tick_countdown_expires_on_first_tick() {
    let mut machine = RedirectMachine::new(1);
    machine.begin();
    assert_eq!(machine.tick(), Some(Tick::Expired));
}

#[test]
fn state_serializes_with_tag() {
    let value = serde_json::to_value(RedirectState::CountingDown { remaining: 3 }).unwrap();
    assert_eq!(value, serde_json::json!({"state": "counting-down", "remaining": 3}));
}
