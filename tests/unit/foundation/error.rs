use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(MixplayError::asset("x").to_string().contains("asset error:"));
    assert!(
        MixplayError::composition("x")
            .to_string()
            .contains("composition error:")
    );
    assert!(MixplayError::render("x").to_string().contains("render error:"));
    assert!(MixplayError::args("x").to_string().contains("argument error:"));
    assert!(MixplayError::config("x").to_string().contains("config error:"));
}

#[test]
fn surface_codes_group_load_failures() {
    assert_eq!(MixplayError::asset("no video track").code(), "load");
    assert_eq!(MixplayError::composition("rejected").code(), "load");
    assert_eq!(MixplayError::args("baseUrl").code(), "args");
    assert_eq!(MixplayError::render("no source frame").code(), "render");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MixplayError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.code(), "internal");
}
