//! CLI argument parsing tests

use clap::Parser;
use snapscan::app::cli::args::*;
use snapscan::store::api::Area;
use std::path::PathBuf;

#[test]
fn test_serve_with_global_flags() {
    let args = Args::try_parse_from([
        "snapscan",
        "--config",
        "/etc/snapscan.toml",
        "--log-format",
        "json",
        "--log-file",
        "/var/log/snapscan.log",
        "serve",
    ])
    .unwrap();

    assert_eq!(args.command, Command::Serve);
    assert_eq!(args.config, Some(PathBuf::from("/etc/snapscan.toml")));
    assert_eq!(args.log_format.as_deref(), Some("json"));
    assert_eq!(args.log_file, Some(PathBuf::from("/var/log/snapscan.log")));
}

#[test]
fn test_submit_short_flags() {
    let args = Args::try_parse_from([
        "snapscan",
        "submit",
        "-t",
        "docker-image",
        "-T",
        "alpine:3.20",
        "-s",
        "filecontent",
    ])
    .unwrap();

    match args.command {
        Command::Submit {
            target_type,
            target,
            scanners,
        } => {
            assert_eq!(target_type, "docker-image");
            assert_eq!(target, "alpine:3.20");
            assert_eq!(scanners, vec!["filecontent".to_string()]);
        }
        other => panic!("expected submit, got {:?}", other),
    }
}

#[test]
fn test_submit_without_scanners_is_allowed() {
    let args =
        Args::try_parse_from(["snapscan", "submit", "-t", "docker-image", "-T", "busybox"]).unwrap();
    assert!(matches!(args.command, Command::Submit { scanners, .. } if scanners.is_empty()));
}

#[test]
fn test_submit_requires_type_and_target() {
    assert!(Args::try_parse_from(["snapscan", "submit", "-T", "busybox"]).is_err());
    assert!(Args::try_parse_from(["snapscan", "submit", "-t", "docker-image"]).is_err());
}

#[test]
fn test_list_areas() {
    for (name, area) in [
        ("queue", Area::Queue),
        ("processing", Area::Processing),
        ("done", Area::Done),
        ("failed", Area::Failed),
    ] {
        let args = Args::try_parse_from(["snapscan", "list", "-a", name]).unwrap();
        assert_eq!(args.command, Command::List { area: Some(area) });
    }
    let args = Args::try_parse_from(["snapscan", "list"]).unwrap();
    assert_eq!(args.command, Command::List { area: None });
}

#[test]
fn test_show_requires_id() {
    assert!(Args::try_parse_from(["snapscan", "show"]).is_err());
}

#[test]
fn test_missing_subcommand_is_rejected() {
    assert!(Args::try_parse_from(["snapscan", "--no-color"]).is_err());
}

#[test]
fn test_color_resolution() {
    let args = Args::try_parse_from(["snapscan", "scanners"]).unwrap();
    assert!(args.use_color(true));
    assert!(!args.use_color(false));

    let args = Args::try_parse_from(["snapscan", "--color", "scanners"]).unwrap();
    assert!(args.use_color(false));
}
