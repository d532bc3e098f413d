use super::*;

#[test]
fn defaults_are_valid() {
    ValidationSettings::default().validate().unwrap();
}

#[test]
fn rejects_out_of_range_values() {
    let cases = [
        ValidationSettings {
            tolerance: -1.0,
            ..ValidationSettings::default()
        },
        ValidationSettings {
            max_step: 0.0,
            ..ValidationSettings::default()
        },
        ValidationSettings {
            min_step: 1.0,
            max_step: 0.5,
            ..ValidationSettings::default()
        },
        ValidationSettings {
            max_checks: 0,
            ..ValidationSettings::default()
        },
        ValidationSettings {
            dof_weights: vec![1.0, f64::NAN],
            ..ValidationSettings::default()
        },
    ];
    for s in cases {
        assert!(s.validate().is_err(), "{s:?}");
    }
}

#[test]
fn workspace_speed_applies_weights() {
    let plain = ValidationSettings::default();
    assert_eq!(plain.workspace_speed(&[1.0, 2.0]).unwrap(), 3.0);
    let weighted = ValidationSettings {
        dof_weights: vec![2.0, 0.5],
        ..ValidationSettings::default()
    };
    assert_eq!(weighted.workspace_speed(&[1.0, 2.0]).unwrap(), 3.0);
    assert!(weighted.workspace_speed(&[1.0]).is_err());
}

#[test]
fn settings_fill_defaults_from_json() {
    let s: ValidationSettings = serde_json::from_str(r#"{"tolerance": 0.01}"#).unwrap();
    assert_eq!(s.tolerance, 0.01);
    assert_eq!(s.max_step, ValidationSettings::default().max_step);
}

#[test]
fn cancel_token_is_shared_between_clones() {
    let token = CancelToken::new();
    let other = token.clone();
    assert!(!token.is_cancelled());
    other.cancel();
    assert!(token.is_cancelled());
}
