use super::*;

fn parse(args: &[&str]) -> Result<Command, CliParseError> {
    parse_command(args.iter().map(|arg| (*arg).to_owned()))
}

fn run_args(args: &[&str]) -> RunArgs {
    match parse(args).expect("parse") {
        Command::Run(run) => run,
        Command::Help => panic!("expected run command"),
    }
}

#[test]
fn help_flag_wins() {
    assert_eq!(parse(&["--help"]).expect("parse"), Command::Help);
    assert_eq!(parse(&["--plain", "-h"]).expect("parse"), Command::Help);
}

#[test]
fn first_positional_starts_the_child_command() {
    let run = run_args(&["--plain", "pidcat", "--min-level", "W", "com.example"]);
    assert!(run.plain);
    assert_eq!(run.command, vec!["pidcat", "--min-level", "W", "com.example"]);
}

#[test]
fn double_dash_ends_option_parsing() {
    let run = run_args(&["--device", "emulator-5554", "--", "--weird-binary", "-x"]);
    assert_eq!(run.device.as_deref(), Some("emulator-5554"));
    assert_eq!(run.command, vec!["--weird-binary", "-x"]);
}

#[test]
fn options_are_collected() {
    let run = run_args(&[
        "--config",
        "custom.toml",
        "-e",
        "A=1",
        "--env",
        "B=x=y",
        "--cwd",
        "/tmp",
        "--mode",
        "pipe",
        "--grep",
        "ActivityManager",
        "-i",
        "--export",
        "out.jsonl",
        "logcat",
    ]);
    assert_eq!(run.config, Some(PathBuf::from("custom.toml")));
    assert_eq!(
        run.env,
        vec![
            ("A".to_owned(), "1".to_owned()),
            ("B".to_owned(), "x=y".to_owned())
        ]
    );
    assert_eq!(run.cwd, Some(PathBuf::from("/tmp")));
    assert_eq!(run.mode, Some(CaptureMode::Pipe));
    assert_eq!(run.grep.as_deref(), Some("ActivityManager"));
    assert!(run.ignore_case);
    assert_eq!(run.export, Some(PathBuf::from("out.jsonl")));
    assert_eq!(run.command, vec!["logcat"]);
}

#[test]
fn malformed_arguments_are_rejected() {
    assert_eq!(
        parse(&["--device"]).expect_err("missing value"),
        CliParseError::MissingValue("--device")
    );
    assert_eq!(
        parse(&["--env", "NOVALUE"]).expect_err("bad env"),
        CliParseError::InvalidEnv("NOVALUE".to_owned())
    );
    assert_eq!(
        parse(&["--env", "=1"]).expect_err("empty key"),
        CliParseError::InvalidEnv("=1".to_owned())
    );
    assert_eq!(
        parse(&["--mode", "serial"]).expect_err("bad mode"),
        CliParseError::InvalidValue {
            flag: "--mode",
            value: "serial".to_owned()
        }
    );
    assert_eq!(
        parse(&["--bogus"]).expect_err("unknown"),
        CliParseError::UnknownArgument("--bogus".to_owned())
    );
}

#[test]
fn launch_spec_layers_config_then_flags() {
    let mut config = PidviewConfig::default();
    config.launch.command = vec!["pidcat".to_owned(), "com.example".to_owned()];
    config.launch.device = Some("from-config".to_owned());
    config
        .capture
        .env
        .insert("FORCE_COLOR".to_owned(), "0".to_owned());

    let run = run_args(&["--device", "from-flag", "-e", "FORCE_COLOR=1"]);
    let spec = run.launch_spec(&config).expect("launch spec");
    assert_eq!(spec.program, "pidcat");
    assert_eq!(spec.args, vec!["com.example"]);
    assert_eq!(
        spec.env.get(DEVICE_ENV).map(String::as_str),
        Some("from-flag")
    );
    assert_eq!(spec.env.get("FORCE_COLOR").map(String::as_str), Some("1"));
}

#[test]
fn command_line_command_replaces_config_command() {
    let mut config = PidviewConfig::default();
    config.launch.command = vec!["pidcat".to_owned()];
    let spec = run_args(&["adb", "logcat"])
        .launch_spec(&config)
        .expect("launch spec");
    assert_eq!(spec.display_command(), "adb logcat");
    assert!(!spec.env.contains_key(DEVICE_ENV));
}

#[test]
fn missing_command_everywhere_is_an_error() {
    let error = run_args(&["--plain"])
        .launch_spec(&PidviewConfig::default())
        .expect_err("no command");
    assert_eq!(error, CliParseError::MissingCommand);
}
