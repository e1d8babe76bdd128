//! Unit tests for CLI commands

use crate::cli::{Cli, Commands, ServeArgs};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_serve_flags_parse() {
    let cli = Cli::try_parse_from([
        "servlet-engine",
        "serve",
        "--addr",
        "127.0.0.1:9000",
        "--line-length",
        "512",
    ])
    .unwrap();

    match cli.command {
        Commands::Serve(args) => {
            assert_eq!(args.addr.as_deref(), Some("127.0.0.1:9000"));
            assert_eq!(args.line_length, Some(512));
        }
        other => panic!("Expected Serve command, got {other:?}"),
    }
}

#[test]
fn test_locate_command_defaults() {
    let cli = Cli::try_parse_from(["servlet-engine", "locate", "/shop/items"]).unwrap();
    match cli.command {
        Commands::Locate {
            app_base,
            host,
            path,
        } => {
            assert_eq!(app_base, PathBuf::from("webapps"));
            assert_eq!(host, "localhost");
            assert_eq!(path, "/shop/items");
        }
        other => panic!("Expected Locate command, got {other:?}"),
    }
}

#[test]
fn test_flags_override_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "addr: 0.0.0.0:7000\nread_timeout_secs: 5\n").unwrap();

    let args = ServeArgs {
        config: Some(path),
        addr: Some("127.0.0.1:7001".into()),
        ..ServeArgs::default()
    };
    let config = args.resolve_config().unwrap();
    assert_eq!(config.addr, "127.0.0.1:7001");
    assert_eq!(config.read_timeout_secs, 5);
}

#[test]
fn test_zero_line_length_is_rejected() {
    let args = ServeArgs {
        line_length: Some(0),
        ..ServeArgs::default()
    };
    assert!(args.resolve_config().is_err());
}

#[test]
fn test_all_commands_parse() {
    let commands = vec![
        vec!["servlet-engine", "serve"],
        vec!["servlet-engine", "serve", "--config", "config.yaml"],
        vec!["servlet-engine", "routes", "--app-base", "apps"],
        vec!["servlet-engine", "locate", "--host", "shop.example.com", "/items"],
    ];

    for args in commands {
        let cli = Cli::try_parse_from(&args);
        assert!(cli.is_ok(), "Failed to parse command: {:?}", args);
    }
}

#[cfg(unix)]
#[test]
fn test_shutdown_signal_is_delivered() {
    use signal_hook::consts::SIGTERM;

    let mut signals = super::commands::shutdown_signals().unwrap();
    signal_hook::low_level::raise(SIGTERM).unwrap();
    assert_eq!(signals.forever().next(), Some(SIGTERM));
}
