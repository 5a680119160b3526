use super::args::{CliArgs, Command, DirectionArg, InclusionArg};
use clap::Parser;
use std::path::PathBuf;
use typecodec_gen::Direction;
use typecodec_types::Inclusion;

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(args).expect("arguments should parse")
}

#[test]
fn parses_plan_command_with_direction_alias() {
    let args = parse(&[
        "typecodec",
        "plan",
        "--model",
        "model.json",
        "--type",
        "com.example.Box<java.lang.String>",
        "-d",
        "de",
    ]);
    match args.command {
        Some(Command::Plan { model, ty, direction }) => {
            assert_eq!(model, PathBuf::from("model.json"));
            assert_eq!(ty, "com.example.Box<java.lang.String>");
            assert_eq!(direction, Some(DirectionArg::Deserialize));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn decode_input_is_optional() {
    let args = parse(&["typecodec", "decode", "-m", "model.json", "-t", "com.example.Point"]);
    let Some(Command::Decode { input, reencode, .. }) = args.command else {
        panic!("expected decode");
    };
    assert_eq!(input, None);
    assert!(!reencode);

    let args = parse(&[
        "typecodec",
        "decode",
        "-m",
        "model.json",
        "-t",
        "com.example.Point",
        "point.json",
        "--reencode",
    ]);
    let Some(Command::Decode { input, reencode, .. }) = args.command else {
        panic!("expected decode");
    };
    assert_eq!(input, Some(PathBuf::from("point.json")));
    assert!(reencode);
}

#[test]
fn global_flags_follow_the_subcommand() {
    let args = parse(&[
        "typecodec",
        "check",
        "-m",
        "model.json",
        "--ignoreUnknown",
        "--inclusion",
        "Non-Empty",
        "--max-depth",
        "16",
        "--no-color",
    ]);
    assert!(args.ignore_unknown);
    assert_eq!(args.inclusion, Some(InclusionArg::NonEmpty));
    assert_eq!(args.max_depth, Some(16));
    assert!(args.no_color);
    assert!(matches!(args.command, Some(Command::Check { .. })));
}

#[test]
fn show_config_needs_no_command() {
    let args = parse(&["typecodec", "--showConfig", "--bigDecimalForFloats"]);
    assert!(args.show_config);
    assert!(args.big_decimal_for_floats);
    assert!(args.command.is_none());
}

#[test]
fn plan_requires_a_type() {
    assert!(CliArgs::try_parse_from(["typecodec", "plan", "--model", "model.json"]).is_err());
}

#[test]
fn value_enums_map_to_generator_types() {
    assert_eq!(InclusionArg::NonAbsent.to_inclusion(), Inclusion::NonAbsent);
    assert_eq!(InclusionArg::Always.to_inclusion(), Inclusion::Always);
    assert_eq!(DirectionArg::Serialize.to_direction(), Direction::Serialize);
}
