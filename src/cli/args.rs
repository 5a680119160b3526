use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use typecodec_gen::Direction;
use typecodec_types::Inclusion;

/// CLI arguments for the typecodec binary.
#[derive(Parser, Debug)]
#[command(
    name = "typecodec",
    version,
    about = "Type-directed JSON codec generator"
)]
pub struct CliArgs {
    // ==================== Configuration ====================
    /// Path to typecodec.json or a directory containing it.
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the resolved configuration instead of running a command.
    #[arg(long = "showConfig", alias = "show-config")]
    pub show_config: bool,

    // ==================== Generator Options ====================
    /// Skip unknown properties for classes that do not say otherwise.
    #[arg(long = "ignoreUnknown", alias = "ignore-unknown", global = true)]
    pub ignore_unknown: bool,

    /// Inclusion policy for properties without their own annotation.
    #[arg(long, value_enum, ignore_case = true, global = true)]
    pub inclusion: Option<InclusionArg>,

    // ==================== Decoder Options ====================
    /// Decode untyped floating point numbers as BigDecimal.
    #[arg(long = "bigDecimalForFloats", alias = "big-decimal-for-floats", global = true)]
    pub big_decimal_for_floats: bool,

    /// Decode untyped integers as BigInteger.
    #[arg(long = "bigIntegerForInts", alias = "big-integer-for-ints", global = true)]
    pub big_integer_for_ints: bool,

    /// Maximum nesting of codec invocations while decoding one document.
    #[arg(long = "maxDepth", alias = "max-depth", global = true)]
    pub max_depth: Option<u32>,

    // ==================== Output Formatting ====================
    /// Disable colored problem output.
    #[arg(long = "noColor", alias = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the decode and encode plans generated for a type.
    Plan {
        /// JSON model descriptor.
        #[arg(short, long)]
        model: PathBuf,
        /// Root type, e.g. `com.example.Box<java.lang.String>`.
        #[arg(short = 't', long = "type")]
        ty: String,
        /// Only print the plan for this direction.
        #[arg(short, long, value_enum)]
        direction: Option<DirectionArg>,
    },
    /// Decode a JSON document through the generated plan and print the value.
    Decode {
        /// JSON model descriptor.
        #[arg(short, long)]
        model: PathBuf,
        /// Root type of the document.
        #[arg(short = 't', long = "type")]
        ty: String,
        /// Input document; `-` or absent reads stdin.
        input: Option<PathBuf>,
        /// Encode the decoded value again and print the resulting JSON.
        #[arg(long)]
        reencode: bool,
    },
    /// Generate codecs for every serializable bean and report all problems.
    Check {
        /// JSON model descriptor.
        #[arg(short, long)]
        model: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum InclusionArg {
    Always,
    #[value(name = "non-null", alias = "non_null")]
    NonNull,
    #[value(name = "non-absent", alias = "non_absent")]
    NonAbsent,
    #[value(name = "non-empty", alias = "non_empty")]
    NonEmpty,
    #[value(name = "non-default", alias = "non_default")]
    NonDefault,
}

impl InclusionArg {
    pub fn to_inclusion(self) -> Inclusion {
        match self {
            InclusionArg::Always => Inclusion::Always,
            InclusionArg::NonNull => Inclusion::NonNull,
            InclusionArg::NonAbsent => Inclusion::NonAbsent,
            InclusionArg::NonEmpty => Inclusion::NonEmpty,
            InclusionArg::NonDefault => Inclusion::NonDefault,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    #[value(alias = "ser", alias = "encode")]
    Serialize,
    #[value(alias = "de", alias = "decode")]
    Deserialize,
}

impl DirectionArg {
    pub fn to_direction(self) -> Direction {
        match self {
            DirectionArg::Serialize => Direction::Serialize,
            DirectionArg::Deserialize => Direction::Deserialize,
        }
    }
}
