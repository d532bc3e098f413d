use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        KinoError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        KinoError::projection("x")
            .to_string()
            .contains("projection error:")
    );
    assert!(
        KinoError::precondition("x")
            .to_string()
            .contains("precondition violated:")
    );
    assert!(
        KinoError::not_implemented("x")
            .to_string()
            .contains("not implemented:")
    );
    assert!(
        KinoError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = KinoError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn projection_is_detectable() {
    assert!(KinoError::projection("end").is_projection());
    assert!(!KinoError::validation("end").is_projection());
}
