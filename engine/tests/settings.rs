use std::io::Write;

use engine::{Calculator, Settings, SettingsError, Timing, Workbench};

#[test]
fn defaults() {
    let settings = Settings::default();
    assert_eq!(settings.fences.open, "```calc");
    assert_eq!(settings.fences.close, "```");
    assert_eq!(settings.empty_placeholder, "# empty");
    assert!(settings.timing.is_empty());
    assert_eq!(Settings::from_toml_str("").unwrap(), settings);
}

#[test]
fn timing_overrides_apply_to_the_registry() {
    let settings = Settings::from_toml_str(
        r#"
        [timing]
        mod = "immediate"
        "+" = "on-submit"
        "#,
    )
    .unwrap();
    let registry = settings.registry().unwrap();
    assert_eq!(registry.find_operation("mod").unwrap().timing, Timing::Immediate);
    assert_eq!(registry.find_operation("+").unwrap().timing, Timing::OnSubmit);
    assert_eq!(registry.find_operation("-").unwrap().timing, Timing::Immediate);
}

#[test]
fn unknown_operator_and_keys_are_rejected() {
    let settings = Settings::from_toml_str("[timing]\npow = \"immediate\"").unwrap();
    assert!(matches!(
        settings.registry(),
        Err(SettingsError::UnknownOperator(token)) if token == "pow"
    ));

    assert!(matches!(
        Settings::from_toml_str("colour = true"),
        Err(SettingsError::Parse(_))
    ));
    assert!(matches!(
        Settings::from_toml_str("[timing]\n\"+\" = \"later\""),
        Err(SettingsError::Parse(_))
    ));
}

#[test]
fn load_from_file_and_drive_a_calculator() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "empty_placeholder = \"(nothing)\"\n[fences]\nopen = \"~~~rpn\"\nclose = \"~~~\""
    )
    .unwrap();

    let settings = Settings::load(file.path()).unwrap();
    let mut calculator = Calculator::from_settings(&settings).unwrap();
    calculator
        .registry_mut()
        .register("drop", |_: &[f64]| Ok(Vec::new()), Timing::Immediate);

    let mut bench = Workbench::new(calculator);
    bench.open("file:///t.md", "~~~rpn\n2\n\n~~~");
    bench.type_at_line_end("file:///t.md", 2, "drop").unwrap();
    assert_eq!(bench.text("file:///t.md"), Some("~~~rpn\n(nothing)\n~~~"));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("calcdoc.toml");
    assert!(matches!(
        Settings::load(&missing),
        Err(SettingsError::Io { .. })
    ));
}
