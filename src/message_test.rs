use serde_json::json;

use super::*;

// =============================================================================
// NavigationEvent decoding
// =============================================================================

#[test]
fn decodes_navigation() {
    let event = NavigationEvent::from_message(&json!({"type": "navigation", "url": "https://kagi.com/"}));
    assert_eq!(event, Some(NavigationEvent::Navigation { url: "https://kagi.com/".into() }));
}

#[test]
fn decodes_link_click() {
    let event = NavigationEvent::from_message(&json!({"type": "link-click", "url": "https://example.com/x"}));
    assert_eq!(event, Some(NavigationEvent::LinkClick { url: "https://example.com/x".into() }));
}

#[test]
fn ignores_unrelated_shapes() {
    for value in [
        json!({"foo": "bar"}),
        json!({"type": "navigation"}),
        json!({"type": "navigation", "url": 7}),
        json!({"type": "resize", "url": "https://kagi.com/"}),
        json!("navigation"),
        json!(null),
        json!([{"type": "navigation", "url": "https://kagi.com/"}]),
    ] {
        assert_eq!(NavigationEvent::from_message(&value), None, "accepted {value}");
    }
}

#[test]
fn encodes_with_type_tag() {
    let value = NavigationEvent::LinkClick { url: "https://example.com/x".into() }.to_message();
    assert_eq!(value, json!({"type": "link-click", "url": "https://example.com/x"}));
}

#[test]
fn url_accessor_covers_both_variants() {
    assert_eq!(NavigationEvent::Navigation { url: "a".into() }.url(), "a");
    assert_eq!(NavigationEvent::LinkClick { url: "b".into() }.url(), "b");
}

// =============================================================================
// KeyChord
// =============================================================================

#[test]
fn chord_parses_modifiers_and_key() {
    let chord: KeyChord = "Ctrl+Shift+A".parse().unwrap();
    assert!(chord.ctrl && chord.shift && !chord.alt && !chord.meta);
    assert_eq!(chord.key, "a");
    assert_eq!(chord.to_string(), "Ctrl+Shift+A");
}

#[test]
fn chord_rejects_empty_key_and_unknown_modifier() {
    assert!("Ctrl+".parse::<KeyChord>().is_err());
    assert!("".parse::<KeyChord>().is_err());
    assert!("Hyper+A".parse::<KeyChord>().is_err());
}

#[test]
fn chord_match_is_exact_on_modifiers() {
    let chord: KeyChord = "Ctrl+Shift+A".parse().unwrap();
    let pressed = KeyChord { key: "A".into(), ctrl: true, shift: true, ..KeyChord::default() };
    assert!(chord.matches(&pressed));

    let ctrl_only = KeyChord { key: "a".into(), ctrl: true, ..KeyChord::default() };
    assert!(!chord.matches(&ctrl_only));
}

// =============================================================================
// ShellInput wire shape
// =============================================================================

#[test]
fn shell_input_decodes_each_channel() {
    let msg: ShellInput =
        serde_json::from_value(json!({"channel": "message", "data": {"type": "navigation", "url": "u"}})).unwrap();
    assert_eq!(msg, ShellInput::Message { data: json!({"type": "navigation", "url": "u"}) });

    let key: ShellInput = serde_json::from_value(json!({"channel": "key", "key": "a", "ctrl": true})).unwrap();
    assert_eq!(key, ShellInput::Key(KeyChord { key: "a".into(), ctrl: true, ..KeyChord::default() }));

    let go: ShellInput = serde_json::from_value(json!({"channel": "go-to-target"})).unwrap();
    assert_eq!(go, ShellInput::GoToTarget);

    let loaded: ShellInput = serde_json::from_value(json!({"channel": "content-loaded"})).unwrap();
    assert_eq!(loaded, ShellInput::ContentLoaded);
}
