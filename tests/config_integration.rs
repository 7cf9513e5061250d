use mdmd::config::{
    ConfigFlags, EnvSettings, RenderOptions, load_config_flags, parse_flag_tokens,
};
use mdmd::diagram::Charset;
use mdmd::pager::TerminalInfo;

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".mdmdrc");
    let content = r"
# comment
--no-pager

--charset ascii

--width=64
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.no_pager);
    assert_eq!(flags.charset, Some(Charset::Ascii));
    assert_eq!(flags.width, Some(64));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".mdmdrc");
    std::fs::write(&path, "--no-highlight\n--width 100\n--charset ascii\n").unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "mdmd".to_string(),
        "--width".to_string(),
        "40".to_string(),
        "--no-color".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.no_highlight, "file flags should remain enabled");
    assert!(effective.no_color, "cli flags should be applied");
    assert_eq!(effective.width, Some(40), "cli should override width");
    assert_eq!(
        effective.charset,
        Some(Charset::Ascii),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_global_then_local_then_cli_precedence() {
    let global = ConfigFlags {
        width: Some(120),
        no_pager: true,
        ..ConfigFlags::default()
    };
    let local = ConfigFlags {
        width: Some(90),
        ..ConfigFlags::default()
    };
    let cli = ConfigFlags::default();

    let effective = global.union(&local).union(&cli);
    assert_eq!(effective.width, Some(90));
    assert!(effective.no_pager);
}

#[test]
fn test_effective_flags_resolve_to_render_options() {
    let flags = parse_flag_tokens(&["--no-color".to_string(), "-w".to_string(), "30".to_string()]);
    let terminal = TerminalInfo {
        is_terminal: true,
        columns: Some(200),
        rows: Some(50),
    };
    let options = RenderOptions::resolve(&flags, &EnvSettings::default(), &terminal);
    assert!(!options.color);
    assert_eq!(options.width, 30);
    assert!(options.pager);
}
