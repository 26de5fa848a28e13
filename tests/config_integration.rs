use std::path::PathBuf;

use htmlpen::config::{ConfigFlags, ThemeMode, load_config_flags, parse_flag_tokens};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".htmlpenrc");
    let content = r"
# comment
--no-persist

--theme light

--export-dir=out
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.no_persist);
    assert_eq!(flags.theme, Some(ThemeMode::Light));
    assert_eq!(flags.export_dir, Some(PathBuf::from("out")));
}

#[test]
fn test_missing_config_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("nope")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".htmlpenrc");
    let content = "--no-auto-format\n--indent 4\n--store file.json\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "htmlpen".to_string(),
        "--indent".to_string(),
        "8".to_string(),
        "--no-persist".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.no_auto_format, "file flags should remain enabled");
    assert!(effective.no_persist, "cli flags should be applied");
    assert_eq!(effective.indent, Some(8), "cli should override indent");
    assert_eq!(
        effective.store,
        Some(PathBuf::from("file.json")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let args = vec![
        "htmlpen".to_string(),
        "--theme=dark".to_string(),
        "--log-file=htmlpen.log".to_string(),
        "--width=100".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.theme, Some(ThemeMode::Dark));
    assert_eq!(flags.log_file, Some(PathBuf::from("htmlpen.log")));
    assert_eq!(flags.width, Some(100));
}

#[test]
fn test_effective_flags_drive_playground_settings() {
    let file = ConfigFlags {
        width: Some(60),
        key: Some("scratch".to_string()),
        ..ConfigFlags::default()
    };
    let cli = ConfigFlags {
        no_auto_format: true,
        ..ConfigFlags::default()
    };
    let settings = file.union(&cli).playground_settings();
    assert_eq!(settings.options.max_line_width, 60);
    assert_eq!(settings.storage_key, "scratch");
    assert!(!settings.auto_format);
}
