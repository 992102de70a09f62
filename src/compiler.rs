use crate::{
    diagnostics::{
        emit_lex_errors, emit_line_error, emit_semantic, emit_syntax_errors, report_io_error,
        SourceFile,
    },
    language::{
        ast::Program,
        diagnostics::Diagnostics,
        emit::{emit_program, Emitter, TokenTable},
        errors::SyntaxError,
        lexer::{tokenize, LexError},
        parser::parse,
        preanalyze::{preanalyze, MalformedTree},
        resolve::resolve_program,
        scopes::{CallableKind, Context, ScopeKind},
        token::Token,
    },
    options::{CompileOptions, Phase},
};
use std::{
    fmt::Write as _,
    fs::{self, File},
    io::{self, BufWriter},
    path::{Path, PathBuf},
    process::Command,
};
use thiserror::Error;

/// Conditions that stop the current file.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("could not read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("{} syntax error(s)", .0.len())]
    Syntax(Vec<SyntaxError>),
    #[error("{} invalid token(s)", .0.len())]
    Lex(Vec<LexError>),
    #[error(transparent)]
    Malformed(#[from] MalformedTree),
    #[error("host compiler `{program}` failed: {detail}")]
    HostCompiler { program: String, detail: String },
}

/// What one input produced.
#[derive(Debug, Default)]
pub struct FileReport {
    pub diagnostics: Diagnostics,
    /// Generated file, when emission ran and was kept.
    pub output: Option<PathBuf>,
    /// Structural dump for the stop-after phases.
    pub dump: Option<String>,
}

impl FileReport {
    pub fn failed(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

fn trace(options: &CompileOptions, message: impl AsRef<str>) {
    if options.trace {
        eprintln!("[lumo-debug] {}", message.as_ref());
    }
}

/// Runs the phases on one source text up to `options.stop_after`.
pub fn compile_file(
    options: &CompileOptions,
    path: &Path,
    source: &str,
) -> Result<FileReport, CompileError> {
    let mut report = FileReport::default();

    trace(options, format!("phase tokenize {}", path.display()));
    let tokens = tokenize(source).map_err(CompileError::Lex)?;
    if options.stop_after == Phase::Tokenize {
        report.dump = Some(dump_tokens(&tokens));
        return Ok(report);
    }

    trace(options, format!("phase parse {}", path.display()));
    let mut program = parse(&tokens).map_err(|errs| CompileError::Syntax(errs.errors))?;
    if options.stop_after == Phase::Parse {
        report.dump = Some(format!("{program:#?}\n"));
        return Ok(report);
    }

    trace(options, format!("phase pre-analyze {}", path.display()));
    preanalyze(&program)?;
    if options.stop_after == Phase::PreAnalyze {
        report.dump = Some(format!("{program:#?}\n"));
        return Ok(report);
    }

    trace(options, format!("phase analyze {}", path.display()));
    let ctx = resolve_program(&mut program, &mut report.diagnostics);
    if options.stop_after == Phase::Analyze {
        report.dump = Some(dump_scopes(&ctx));
        return Ok(report);
    }
    if report.diagnostics.has_errors() {
        trace(
            options,
            format!(
                "skipping emission: {} error(s)",
                report.diagnostics.error_count()
            ),
        );
        return Ok(report);
    }

    let target = options.out_dir.join(options.output_name(path));
    trace(options, format!("phase emit {}", target.display()));
    write_output(&program, &target)?;

    if options.host_compile {
        trace(
            options,
            format!("phase host-compile {} {}", options.host_compiler, target.display()),
        );
        host_compile(&options.host_compiler, &target)?;
        if options.clean {
            fs::remove_file(&target).map_err(|source| CompileError::Write {
                path: target.clone(),
                source,
            })?;
            return Ok(report);
        }
    }
    report.output = Some(target);
    Ok(report)
}

fn write_output(program: &Program, target: &Path) -> Result<(), CompileError> {
    let write_error = |source| CompileError::Write {
        path: target.to_path_buf(),
        source,
    };
    if let Some(dir) = target.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(write_error)?;
    }
    let file = File::create(target).map_err(write_error)?;
    let table = TokenTable::oz();
    let mut out = Emitter::new(BufWriter::new(file), &table);
    let written = emit_program(program, &mut out).and_then(|()| out.finish().map(drop));
    if let Err(source) = written {
        let _ = fs::remove_file(target);
        return Err(write_error(source));
    }
    Ok(())
}

fn host_compile(program: &str, target: &Path) -> Result<(), CompileError> {
    let output = Command::new(program)
        .arg("-c")
        .arg(target)
        .output()
        .map_err(|err| CompileError::HostCompiler {
            program: program.to_string(),
            detail: format!("failed to spawn: {err}"),
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(CompileError::HostCompiler {
            program: program.to_string(),
            detail: if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            },
        });
    }
    Ok(())
}

fn dump_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        let _ = writeln!(out, "{:>4}  {}", token.line, token.kind.describe());
    }
    out
}

fn dump_scopes(ctx: &Context) -> String {
    const KINDS: [CallableKind; 4] = [
        CallableKind::Function,
        CallableKind::Procedure,
        CallableKind::Class,
        CallableKind::Functor,
    ];
    let mut out = String::new();
    for id in ctx.ids() {
        let scope = ctx.scope(id);
        let parent = scope
            .parent
            .map(|parent| format!(" parent {}", parent.index()))
            .unwrap_or_default();
        let _ = writeln!(out, "scope {}{parent}: {:?}", id.index(), scope.kind);
        if let ScopeKind::Functor { imports, .. } = &scope.kind {
            for import in imports {
                let _ = writeln!(out, "  import {import}");
            }
        }
        for var in scope.variables() {
            let _ = writeln!(
                out,
                "  var {} : {} ({:?}, {:?}{})",
                var.name,
                var.ty,
                var.mutability,
                var.kind,
                if var.bound { ", bound" } else { "" }
            );
        }
        for kind in KINDS {
            for callable in scope.callables(kind) {
                let returns = callable
                    .return_type
                    .map(|ty| format!(" -> {ty}"))
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "  {} {}/{}{returns} as {}{}",
                    kind.noun(),
                    callable.name,
                    callable.arity,
                    callable.host_name,
                    if callable.cell { " (cell)" } else { "" }
                );
            }
        }
    }
    out
}

pub fn read_source(path: &Path) -> Result<String, CompileError> {
    fs::read_to_string(path).map_err(|source| CompileError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Compiles every input in order. Returns `true` when no file recorded an
/// error.
pub fn run(options: &CompileOptions) -> bool {
    let mut ok = true;
    for path in &options.inputs {
        let source = match read_source(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("{err}");
                ok = false;
                continue;
            }
        };
        let file = SourceFile::new(path, source);
        match compile_file(options, path, file.source()) {
            Ok(report) => {
                emit_semantic(&file, report.diagnostics.entries());
                if let Some(dump) = &report.dump {
                    print!("{dump}");
                }
                if report.failed() {
                    ok = false;
                }
            }
            Err(err) => {
                report_compile_error(&file, &err);
                ok = false;
            }
        }
    }
    ok
}

fn report_compile_error(file: &SourceFile, err: &CompileError) {
    match err {
        CompileError::Syntax(errors) => emit_syntax_errors(file, errors),
        CompileError::Lex(errors) => emit_lex_errors(file, errors),
        CompileError::Malformed(tree) => emit_line_error(file, tree.line(), &tree.to_string()),
        CompileError::Read { path, source } | CompileError::Write { path, source } => {
            report_io_error(path, source)
        }
        CompileError::HostCompiler { .. } => eprintln!("{}: {err}", file.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dir: &Path, stop_after: Phase) -> CompileOptions {
        CompileOptions {
            inputs: vec![PathBuf::from("demo.lumo")],
            out_dir: dir.to_path_buf(),
            stop_after,
            ..CompileOptions::default()
        }
    }

    #[test]
    fn emission_writes_the_host_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let opts = options(dir.path(), Phase::Emit);
        let report = compile_file(&opts, Path::new("demo.lumo"), "val x = 1 {Show x}")
            .expect("compiles");
        let target = dir.path().join("demo.oz");
        assert_eq!(report.output.as_deref(), Some(target.as_path()));
        let text = fs::read_to_string(&target).expect("written");
        assert_eq!(text, "local\n  X = 1\nin\n  {Show X}\nend\n");
    }

    #[test]
    fn semantic_errors_suppress_emission() {
        let dir = tempfile::tempdir().expect("tempdir");
        let opts = options(dir.path(), Phase::Emit);
        let report =
            compile_file(&opts, Path::new("demo.lumo"), "{Show y}").expect("no fatal error");
        assert!(report.failed());
        assert!(report.output.is_none());
        assert!(!dir.path().join("demo.oz").exists());
    }

    #[test]
    fn warnings_still_emit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let opts = options(dir.path(), Phase::Emit);
        let report = compile_file(
            &opts,
            Path::new("demo.lumo"),
            "val v = if true then 1 else \"a\" end",
        )
        .expect("compiles");
        assert!(!report.failed());
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.output.is_some());
    }

    #[test]
    fn tokenize_phase_dumps_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let opts = options(dir.path(), Phase::Tokenize);
        let report = compile_file(&opts, Path::new("demo.lumo"), "skip\nskip").expect("tokens");
        let dump = report.dump.expect("dump");
        assert_eq!(dump.lines().count(), 3);
        assert!(dump.ends_with("end of input\n"), "{dump}");
        assert!(report.output.is_none());
    }

    #[test]
    fn analyze_phase_lists_scopes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let opts = options(dir.path(), Phase::Analyze);
        let report = compile_file(&opts, Path::new("demo.lumo"), "fun {Sq X} X * X end")
            .expect("analyzes");
        let dump = report.dump.expect("dump");
        assert!(dump.contains("function Sq/1 -> Int as Sq"), "{dump}");
        assert!(!dir.path().join("demo.oz").exists());
    }

    #[test]
    fn analyze_phase_lists_functor_imports() {
        let dir = tempfile::tempdir().expect("tempdir");
        let opts = options(dir.path(), Phase::Analyze);
        let report = compile_file(
            &opts,
            Path::new("demo.lumo"),
            "functor M import System Browser define skip end",
        )
        .expect("analyzes");
        let dump = report.dump.expect("dump");
        assert!(dump.contains("  import System\n  import Browser\n"), "{dump}");
    }

    #[test]
    fn malformed_trees_are_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let opts = options(dir.path(), Phase::Emit);
        let err = compile_file(&opts, Path::new("demo.lumo"), "for i in 0;i < 3 do skip end")
            .expect_err("missing step");
        assert!(matches!(err, CompileError::Malformed(_)), "{err:?}");
    }

    #[test]
    fn missing_host_compiler_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut opts = options(dir.path(), Phase::Emit);
        opts.host_compile = true;
        opts.host_compiler = "lumo-no-such-host-compiler".to_string();
        let err = compile_file(&opts, Path::new("demo.lumo"), "skip").expect_err("no host");
        let msg = err.to_string();
        assert!(msg.starts_with("host compiler `lumo-no-such-host-compiler` failed"), "{msg}");
        assert!(dir.path().join("demo.oz").exists());
    }
}
