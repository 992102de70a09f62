use std::{
    env,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const SOURCE_EXTENSION: &str = "lumo";
pub const HOST_EXTENSION: &str = "oz";
pub const DEFAULT_HOST_COMPILER: &str = "ozc";

pub const USAGE: &str = "\
Usage: lumo [options] <file.lumo>...

Options:
  -d, --out-dir DIR     write generated files to DIR (default: .)
  -o, --output NAME     name of the generated file (single input only)
      --tokenize        stop after tokenizing and print the tokens
      --parse           stop after parsing and print the tree
      --pre-analyze     stop after pre-analysis and print the tree
      --analyze         stop after resolution and print the scopes
  -c, --host-compile    run the host compiler on the generated file
      --clean           delete the generated file after a host compile
  -h, --help            print this help

Environment:
  LUMO_HOST_COMPILER    host compiler program (default: ozc)
  LUMO_DEBUG_TRACE      trace phases and resolution steps to stderr";

/// Last phase to run for every input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Tokenize,
    Parse,
    PreAnalyze,
    Analyze,
    Emit,
}

impl Phase {
    fn flag(self) -> &'static str {
        match self {
            Phase::Tokenize => "--tokenize",
            Phase::Parse => "--parse",
            Phase::PreAnalyze => "--pre-analyze",
            Phase::Analyze => "--analyze",
            Phase::Emit => "",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    pub inputs: Vec<PathBuf>,
    pub out_dir: PathBuf,
    pub output: Option<String>,
    pub stop_after: Phase,
    pub host_compile: bool,
    pub clean: bool,
    pub host_compiler: String,
    pub trace: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            out_dir: PathBuf::from("."),
            output: None,
            stop_after: Phase::Emit,
            host_compile: false,
            clean: false,
            host_compiler: DEFAULT_HOST_COMPILER.to_string(),
            trace: false,
        }
    }
}

impl CompileOptions {
    /// Fills the settings that come from the environment.
    pub fn with_environment(mut self) -> Self {
        if let Some(program) = env::var_os("LUMO_HOST_COMPILER") {
            self.host_compiler = program.to_string_lossy().into_owned();
        }
        self.trace = env::var_os("LUMO_DEBUG_TRACE").is_some();
        self
    }

    /// Name of the generated file for `input`.
    pub fn output_name(&self, input: &Path) -> String {
        if let Some(name) = &self.output {
            return name.clone();
        }
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out".to_string());
        format!("{stem}.{HOST_EXTENSION}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Compile(CompileOptions),
    Help,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("option `{0}` needs a value")]
    MissingValue(String),
    #[error("`{0}` and `{1}` cannot be combined")]
    ConflictingPhases(&'static str, &'static str),
    #[error("no input files")]
    NoInputs,
    #[error("`--output` needs exactly one input file")]
    OutputWithManyInputs,
    #[error("`--clean` needs `--host-compile`")]
    CleanWithoutHostCompile,
    #[error("invalid file extension for {0}: only .lumo files are accepted")]
    WrongExtension(String),
}

/// Parses the arguments after the program name.
pub fn parse_args<I>(args: I) -> Result<Command, UsageError>
where
    I: IntoIterator<Item = String>,
{
    let mut options = CompileOptions::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-d" | "--out-dir" => {
                let dir = args.next().ok_or_else(|| UsageError::MissingValue(arg.clone()))?;
                options.out_dir = PathBuf::from(dir);
            }
            "-o" | "--output" => {
                let name = args.next().ok_or_else(|| UsageError::MissingValue(arg.clone()))?;
                options.output = Some(name);
            }
            "--tokenize" => set_phase(&mut options, Phase::Tokenize)?,
            "--parse" => set_phase(&mut options, Phase::Parse)?,
            "--pre-analyze" => set_phase(&mut options, Phase::PreAnalyze)?,
            "--analyze" => set_phase(&mut options, Phase::Analyze)?,
            "-c" | "--host-compile" => options.host_compile = true,
            "--clean" => options.clean = true,
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(UsageError::UnknownOption(arg));
            }
            _ => {
                let path = PathBuf::from(&arg);
                let lumo = path
                    .extension()
                    .is_some_and(|extension| extension == SOURCE_EXTENSION);
                if !lumo {
                    return Err(UsageError::WrongExtension(arg));
                }
                options.inputs.push(path);
            }
        }
    }

    if options.inputs.is_empty() {
        return Err(UsageError::NoInputs);
    }
    if options.output.is_some() && options.inputs.len() > 1 {
        return Err(UsageError::OutputWithManyInputs);
    }
    if options.clean && !options.host_compile {
        return Err(UsageError::CleanWithoutHostCompile);
    }
    Ok(Command::Compile(options))
}

fn set_phase(options: &mut CompileOptions, phase: Phase) -> Result<(), UsageError> {
    if options.stop_after != Phase::Emit && options.stop_after != phase {
        return Err(UsageError::ConflictingPhases(
            options.stop_after.flag(),
            phase.flag(),
        ));
    }
    options.stop_after = phase;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    fn compile(line: &str) -> CompileOptions {
        match parse_args(args(line)).expect("valid arguments") {
            Command::Compile(options) => options,
            Command::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn defaults_emit_into_current_directory() {
        let options = compile("main.lumo");
        assert_eq!(options.inputs, [PathBuf::from("main.lumo")]);
        assert_eq!(options.out_dir, PathBuf::from("."));
        assert_eq!(options.stop_after, Phase::Emit);
        assert_eq!(options.host_compiler, "ozc");
        assert_eq!(options.output_name(&options.inputs[0]), "main.oz");
    }

    #[test]
    fn flags_and_values() {
        let options = compile("-d build -o app.oz -c --clean src/app.lumo");
        assert_eq!(options.out_dir, PathBuf::from("build"));
        assert_eq!(options.output.as_deref(), Some("app.oz"));
        assert!(options.host_compile);
        assert!(options.clean);
        assert_eq!(options.output_name(&options.inputs[0]), "app.oz");
    }

    #[test]
    fn help_wins() {
        assert_eq!(parse_args(args("a.lumo --help")), Ok(Command::Help));
    }

    #[test]
    fn phases_are_exclusive() {
        let err = parse_args(args("--parse --analyze a.lumo")).expect_err("conflict");
        let msg = err.to_string();
        insta::assert_snapshot!(msg, @"`--parse` and `--analyze` cannot be combined");
        assert_eq!(compile("--parse --parse a.lumo").stop_after, Phase::Parse);
    }

    #[test]
    fn usage_errors() {
        assert_eq!(parse_args(args("")), Err(UsageError::NoInputs));
        assert_eq!(
            parse_args(args("-o x.oz a.lumo b.lumo")),
            Err(UsageError::OutputWithManyInputs)
        );
        assert_eq!(
            parse_args(args("--clean a.lumo")),
            Err(UsageError::CleanWithoutHostCompile)
        );
        assert_eq!(
            parse_args(args("--out-dir")),
            Err(UsageError::MissingValue("--out-dir".to_string()))
        );
        assert_eq!(
            parse_args(args("--fast a.lumo")),
            Err(UsageError::UnknownOption("--fast".to_string()))
        );
        assert_eq!(
            parse_args(args("notes.txt")),
            Err(UsageError::WrongExtension("notes.txt".to_string()))
        );
    }
}
