use std::sync::Arc;

use glam::Vec2;
use parking_lot::Mutex;

use super::profile::layout;
use super::*;
use crate::config::GamepadManagerConfig;
use crate::input::direction::Dir;

const DT: f32 = 0.016;

fn manager_with(config: GamepadManagerConfig) -> GamepadManager {
    GamepadManager::new(config, ProfileDatabase::new())
}

fn manager() -> GamepadManager {
    manager_with(GamepadManagerConfig {
        connection_check_interval: 0.0,
        ..GamepadManagerConfig::default()
    })
}

fn recorder(manager: &mut GamepadManager) -> Arc<Mutex<Vec<ConnectionEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    manager.subscribe(move |e| sink.lock().push(e.clone()));
    log
}

/// Push a stick to full deflection after the ready latch saw it at rest
fn touch_left_stick(manager: &mut GamepadManager, host: &mut ScriptedHost, hw: usize) {
    host.set_axis(hw, layout::AXIS_LEFT_X, 0.0);
    manager.update(DT, host);
    host.set_axis(hw, layout::AXIS_LEFT_X, 1.0);
    manager.update(DT, host);
}

#[test]
fn test_unchanged_device_list_is_idempotent() {
    let mut m = manager();
    let log = recorder(&mut m);
    let mut host = ScriptedHost::with_devices(["PadA"]);

    m.update(DT, &mut host);
    assert_eq!(
        log.lock().as_slice(),
        &[ConnectionEvent::Connected { slot: 0, device: "PadA".into() }]
    );

    m.update(DT, &mut host);
    m.update(DT, &mut host);
    assert_eq!(log.lock().len(), 1);
    assert_eq!(m.connected_count(), 1);
    assert_eq!(m.device_name(0), Some("PadA"));
}

#[test]
fn test_device_list_polled_at_interval() {
    let mut m = manager_with(GamepadManagerConfig {
        connection_check_interval: 0.1,
        ..GamepadManagerConfig::default()
    });
    let mut host = ScriptedHost::with_devices(["PadA"]);

    for _ in 0..5 {
        m.update(0.03, &mut host);
    }
    // Tick 1, then once the 0.1s interval has elapsed
    assert_eq!(host.name_queries(), 2);

    m.force_connection_check();
    m.update(0.0, &mut host);
    assert_eq!(host.name_queries(), 3);
}

#[test]
fn test_auto_activation_on_first_input() {
    let mut m = manager();
    let mut host = ScriptedHost::with_devices(["Xbox Controller", "PadB"]);
    m.update(DT, &mut host);
    assert_eq!(m.active_count(), 0);

    touch_left_stick(&mut m, &mut host, 1);
    assert!(m.slot(1).unwrap().is_activated());
    assert!(!m.slot(0).unwrap().is_activated());
    assert_eq!(m.combined().stick_dir(StickId::LeftStick), Dir::E);

    let events = m.take_events();
    assert!(events.contains(&ConnectionEvent::Activated { slot: 1 }));
    assert!(m.take_events().is_empty());
}

#[test]
fn test_stuck_input_at_connection_does_not_activate() {
    let mut m = manager();
    let mut host = ScriptedHost::with_devices(["PadA"]);
    host.set_key(0, layout::KEY_START, true);

    for _ in 0..3 {
        m.update(DT, &mut host);
    }
    assert_eq!(m.active_count(), 0);
    assert!(!m.slot(0).unwrap().is_ready());
}

#[test]
fn test_reconnect_keeps_slot() {
    let mut m = manager();
    let log = recorder(&mut m);
    let mut host = ScriptedHost::with_devices(["PadA", "PadB"]);
    m.update(DT, &mut host);
    touch_left_stick(&mut m, &mut host, 0);
    assert!(m.slot(0).unwrap().is_activated());

    // PadA unplugged
    host.set_devices(["", "PadB"]);
    m.update(DT, &mut host);
    assert!(!m.is_connected(0));
    assert!(m.is_connected(1));
    {
        let events = log.lock();
        let tail = &events[events.len() - 2..];
        assert_eq!(
            tail,
            &[
                ConnectionEvent::Disactivated { slot: 0, reason: DisconnectionReason::HardwareDisconnection },
                ConnectionEvent::Disconnected {
                    slot: 0,
                    device: "PadA".into(),
                    reason: DisconnectionReason::HardwareDisconnection
                },
            ]
        );
    }

    // A new pad takes a never-used slot, not PadA's
    host.set_devices(["", "PadB", "PadC"]);
    m.update(DT, &mut host);
    assert_eq!(m.device_name(2), Some("PadC"));

    // PadA comes back under another hardware id and gets slot 0 again
    host.set_devices(["", "PadB", "PadC", "PadA"]);
    m.update(DT, &mut host);
    assert_eq!(m.device_name(0), Some("PadA"));
    assert_eq!(m.slot(0).unwrap().hardware_id(), Some(3));
    assert!(!m.slot(0).unwrap().is_activated());
}

#[test]
fn test_pool_exhaustion_drops_connection() {
    let mut m = manager_with(GamepadManagerConfig {
        max_slots: 1,
        connection_check_interval: 0.0,
        ..GamepadManagerConfig::default()
    });
    let mut host = ScriptedHost::with_devices(["PadA", "PadB"]);
    m.update(DT, &mut host);
    assert_eq!(m.connected_count(), 1);
    assert_eq!(m.device_name(0), Some("PadA"));

    // Picked up once the slot frees
    host.set_devices(["", "PadB"]);
    m.update(DT, &mut host);
    assert_eq!(m.device_name(0), Some("PadB"));
    assert_eq!(m.slot(0).unwrap().hardware_id(), Some(1));
}

#[test]
fn test_unplaced_device_tracked_until_it_gets_a_slot() {
    let mut m = manager_with(GamepadManagerConfig {
        max_slots: 1,
        connection_check_interval: 0.0,
        ..GamepadManagerConfig::default()
    });
    let mut host = ScriptedHost::with_devices(["PadA", "PadB"]);
    for _ in 0..3 {
        m.update(DT, &mut host);
        assert_eq!(m.unplaced_devices().collect::<Vec<_>>(), vec!["PadB"]);
    }

    // Unplugged while waiting: forgotten
    host.set_devices(["PadA"]);
    m.update(DT, &mut host);
    assert_eq!(m.unplaced_devices().count(), 0);

    host.set_devices(["PadA", "PadB"]);
    m.update(DT, &mut host);
    assert_eq!(m.unplaced_devices().collect::<Vec<_>>(), vec!["PadB"]);

    host.set_devices(["", "PadB"]);
    m.update(DT, &mut host);
    assert_eq!(m.device_name(0), Some("PadB"));
    assert_eq!(m.unplaced_devices().count(), 0);
}

#[test]
fn test_combined_pad_merges_active_slots() {
    let mut m = manager();
    let mut host = ScriptedHost::with_devices(["PadA", "PadB"]);
    m.update(DT, &mut host);
    touch_left_stick(&mut m, &mut host, 0);
    host.set_key(1, layout::KEY_SOUTH, true);
    m.update(DT, &mut host);
    assert_eq!(m.active_count(), 2);

    // Opposite sticks cancel, keys OR together
    host.set_axis(1, layout::AXIS_LEFT_X, -1.0);
    host.set_key(1, layout::KEY_SOUTH, false);
    m.update(DT, &mut host);
    host.set_key(0, layout::KEY_SOUTH, true);
    m.update(DT, &mut host);
    assert_eq!(m.combined_stick_vec(StickId::LeftStick), Vec2::ZERO);
    assert!(m.combined().key(GamepadKey::Action1));

    // Blocking PadA leaves PadB alone in the mix
    m.set_blocked(0, true);
    m.update(DT, &mut host);
    assert_eq!(m.combined().stick_dir(StickId::LeftStick), Dir::W);
    assert!(m.combined().key_up(GamepadKey::Action1));
}

#[test]
fn test_trigger_analog_is_max_merged() {
    let mut m = manager();
    let mut host = ScriptedHost::with_devices(["Xbox One", "Xbox 360"]);
    m.update(DT, &mut host);
    m.activate(0);
    m.activate(1);

    host.set_axis(0, layout::AXIS_RIGHT_Z, 0.55);
    host.set_axis(1, layout::AXIS_RIGHT_Z, 1.0);
    m.update(DT, &mut host);
    assert_eq!(m.combined().key_analog(GamepadKey::R2), 1.0);
    assert!(m.slot(0).unwrap().key_analog(GamepadKey::R2) < 1.0);
}

#[test]
fn test_disactivation_reasons() {
    let mut m = manager();
    let mut host = ScriptedHost::with_devices(["PadA", "PadB"]);
    m.update(DT, &mut host);
    assert!(m.activate(0));
    assert!(!m.activate(0));
    assert!(m.activate(1));
    m.take_events();

    assert!(m.disactivate(1));
    assert!(!m.disactivate(1));
    assert_eq!(m.disactivate_all(), 1);
    assert_eq!(
        m.take_events(),
        vec![
            ConnectionEvent::Disactivated { slot: 1, reason: DisconnectionReason::Disactivation },
            ConnectionEvent::Disactivated { slot: 0, reason: DisconnectionReason::MassDisactivation },
        ]
    );

    // Still held after disactivation: must return to rest before reactivating
    host.set_axis(0, layout::AXIS_LEFT_X, 1.0);
    m.update(DT, &mut host);
    assert!(!m.slot(0).unwrap().is_activated());
}

#[test]
fn test_disable_disconnects_and_enable_reconnects() {
    let mut m = manager();
    let mut host = ScriptedHost::with_devices(["PadA"]);
    m.update(DT, &mut host);
    m.activate(0);
    m.take_events();

    m.set_enabled(false);
    assert_eq!(
        m.take_events(),
        vec![
            ConnectionEvent::Disactivated { slot: 0, reason: DisconnectionReason::ManagerDisabled },
            ConnectionEvent::Disconnected {
                slot: 0,
                device: "PadA".into(),
                reason: DisconnectionReason::ManagerDisabled
            },
        ]
    );
    m.update(DT, &mut host);
    assert_eq!(m.connected_count(), 0);

    m.set_enabled(true);
    m.update(DT, &mut host);
    assert_eq!(m.device_name(0), Some("PadA"));
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let mut m = manager();
    let count = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&count);
    let id = m.subscribe(move |_| *sink.lock() += 1);

    let mut host = ScriptedHost::with_devices(["PadA"]);
    m.update(DT, &mut host);
    assert_eq!(*count.lock(), 1);

    assert!(m.unsubscribe(id));
    host.set_devices(Vec::<String>::new());
    m.update(DT, &mut host);
    assert_eq!(*count.lock(), 1);
}

#[test]
fn test_support_and_profile_queries() {
    let mut m = manager();
    let mut host = ScriptedHost::with_devices(["Xbox Wireless Controller", "Mystery Stick"]);
    m.update(DT, &mut host);

    assert!(m.is_supported(0));
    assert_eq!(m.profile_name(0), Some("xinput"));
    assert!(!m.is_supported(1));
    assert_eq!(m.profile_name(1), Some("generic"));
    assert!(!m.is_supported(2));
    assert_eq!(m.profile_name(2), None);
}
