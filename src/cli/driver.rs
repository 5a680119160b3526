use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cli::args::{CliArgs, Command};
use crate::cli::config::{ResolvedOptions, load_options};
use crate::cli::model::{LoadedModel, load_model};
use typecodec_common::Problem;
use typecodec_gen::{Direction, Evaluator, GeneratedCodec, Linker, Registry, SingletonGenerator};
use typecodec_runtime::JsonDecoder;
use typecodec_types::TypeExpr;

/// What a command produced: text for stdout and problems for stderr.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub output: String,
    pub problems: Vec<Problem>,
}

impl Outcome {
    fn text(output: String) -> Self {
        Outcome {
            output,
            problems: Vec::new(),
        }
    }

    fn failed(problems: Vec<Problem>) -> Self {
        Outcome {
            output: String::new(),
            problems,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(Problem::is_error)
    }
}

/// A loaded model with its registry, ready to generate.
pub struct Session {
    pub model: LoadedModel,
    pub registry: Registry,
    pub options: ResolvedOptions,
}

impl Session {
    pub fn new(model: LoadedModel, options: ResolvedOptions) -> Self {
        let registry = Registry::for_model(&model.table);
        Session {
            model,
            registry,
            options,
        }
    }

    pub fn load(path: &Path, options: ResolvedOptions) -> Result<Self> {
        Ok(Self::new(load_model(path)?, options))
    }

    pub fn linker(&self) -> Linker<'_> {
        Linker::new(&self.model.table, &self.registry, self.options.generator)
    }

    /// Render the plans of `ty`, or only the one for `direction`.
    pub fn plan(&self, ty: &TypeExpr, direction: Option<Direction>) -> Result<Outcome> {
        let linker = self.linker();
        let codec = match SingletonGenerator::new(&linker).generate(ty) {
            Ok(codec) => codec,
            Err(problems) => return Ok(Outcome::failed(problems)),
        };

        let name = ty.display(&self.model.table).to_string();
        let directions = match direction {
            Some(direction) => {
                if codec.plan(direction).is_none() {
                    bail!("{name} has no {direction}");
                }
                vec![direction]
            }
            None => vec![Direction::Serialize, Direction::Deserialize],
        };

        let mut sections = Vec::new();
        for direction in directions {
            if let Some(plan) = codec.plan(direction) {
                let text = plan.display().to_string();
                sections.push(format!("// {name} {direction}\n{}\n", text.trim_end()));
            }
        }
        Ok(Outcome::text(sections.join("\n")))
    }

    /// Decode `input` as a `ty` and print the value, plus its re-encoding
    /// when `reencode` is set.
    pub fn decode(&self, ty: &TypeExpr, input: &str, reencode: bool) -> Result<Outcome> {
        let linker = self.linker();
        let output = SingletonGenerator::new(&linker).generate_all(std::slice::from_ref(ty));
        if !output.is_ok() {
            return Ok(Outcome::failed(output.problems));
        }

        let name = ty.display(&self.model.table).to_string();
        let evaluator =
            Evaluator::new(&self.model.table, &output.codecs).with_max_depth(self.options.max_document_depth);
        let decoder = JsonDecoder::with_config(input, self.options.decoder).context("malformed JSON input")?;
        let value = evaluator
            .decode(ty, decoder)
            .with_context(|| format!("failed to decode {name}"))?;
        debug!(target: "typecodec::cli", ty = %name, kind = value.kind_name(), "decoded");

        let mut text = serde_json::to_string_pretty(&value)?;
        text.push('\n');
        if reencode {
            let encoded = evaluator
                .encode_to_string(ty, &value)
                .with_context(|| format!("failed to encode {name}"))?;
            text.push_str(&encoded);
            text.push('\n');
        }
        Ok(Outcome::text(text))
    }

    /// Generate every root and every generated codec they inject, one
    /// parallel wave at a time, and collect all problems.
    pub fn check(&self) -> Outcome {
        let linker = self.linker();
        let mut seen: FxHashSet<TypeExpr> = FxHashSet::default();
        let mut wave: Vec<TypeExpr> = self
            .model
            .roots
            .iter()
            .filter(|root| seen.insert((*root).clone()))
            .cloned()
            .collect();

        let mut generated = Vec::new();
        let mut problems = Vec::new();
        let mut skipped = 0usize;
        while !wave.is_empty() {
            let results: Vec<Result<GeneratedCodec, Vec<Problem>>> = wave
                .par_iter()
                .map(|ty| SingletonGenerator::new(&linker).generate(ty))
                .collect();
            let mut next = Vec::new();
            for result in results {
                match result {
                    Ok(codec) => {
                        next.extend(
                            codec
                                .generated_dependencies()
                                .filter(|declared| seen.insert((*declared).clone()))
                                .cloned(),
                        );
                        generated.push(codec);
                    }
                    Err(found) => {
                        skipped += 1;
                        problems.extend(found);
                    }
                }
            }
            debug!(target: "typecodec::cli", wave = wave.len(), next = next.len(), "check wave");
            wave = next;
        }

        let mut output = String::new();
        for codec in &generated {
            let mut directions = Vec::new();
            if codec.serializer.is_some() {
                directions.push("serializer");
            }
            if codec.deserializer.is_some() {
                directions.push("deserializer");
            }
            output.push_str(&format!(
                "{}: {}\n",
                codec.ty.display(&self.model.table),
                directions.join(", ")
            ));
        }
        output.push_str(&format!("Generated {} codecs, skipped {} types.\n", generated.len(), skipped));
        info!(
            target: "typecodec::cli",
            generated = generated.len(),
            skipped,
            problems = problems.len(),
            "check finished"
        );
        Outcome { output, problems }
    }
}

/// Execute the command named by `args`.
pub fn run(args: &CliArgs, cwd: &Path) -> Result<Outcome> {
    let options = load_options(cwd, args)?;
    if args.show_config {
        let mut text = serde_json::to_string_pretty(&options.to_config())?;
        text.push('\n');
        return Ok(Outcome::text(text));
    }

    let Some(command) = &args.command else {
        bail!("no command given; expected one of plan, decode, check");
    };
    match command {
        Command::Plan { model, ty, direction } => {
            let session = Session::load(&resolve_path(cwd, model), options)?;
            let ty = session.model.parse_type(ty)?;
            session.plan(&ty, direction.map(|d| d.to_direction()))
        }
        Command::Decode {
            model,
            ty,
            input,
            reencode,
        } => {
            let session = Session::load(&resolve_path(cwd, model), options)?;
            let ty = session.model.parse_type(ty)?;
            let text = read_input(cwd, input.as_deref())?;
            session.decode(&ty, &text, *reencode)
        }
        Command::Check { model } => {
            let session = Session::load(&resolve_path(cwd, model), options)?;
            Ok(session.check())
        }
    }
}

fn resolve_path(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

fn read_input(cwd: &Path, input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => {
            let path = resolve_path(cwd, path);
            std::fs::read_to_string(&path).with_context(|| format!("failed to read input: {}", path.display()))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}
