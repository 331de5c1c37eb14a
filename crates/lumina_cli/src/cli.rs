//! `lumina` command-line surface (spec §6.1), grounded on the teacher's
//! `largo` CLI (`src/cli.rs`): a `clap`-derived `Cli`/`Commands` pair and
//! one `cmd_*` function per subcommand that reads/writes through stderr
//! and process exit codes rather than a logging framework.

use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};

use lumina_base::Diagnostic;
use lumina_codegen::SourceMapMode;
use lumina_infer::{analyze, InferEngine, SemanticOptions};
use lumina_project::{find_lockfile, Lockfile, PackageEntry, ProjectConfig, Target};
use lumina_syntax::{grammar::{CompileOptions as GrammarCompileOptions, GrammarCompiler}, Parser as LuminaParser};

use crate::pipeline::{run_pipeline, validate_out_path, CompileOptions};
use crate::watcher::{expand_watch_paths, FsWatcher, PollingWatcher};

#[derive(Parser)]
#[command(name = "lumina")]
#[command(about = "The lumina compiler toolchain", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args, Default)]
pub struct CommonFlags {
    #[arg(long)]
    pub out: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub target: Option<CliTarget>,
    #[arg(long)]
    pub grammar: Option<PathBuf>,
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long)]
    pub recovery: bool,
    #[arg(long, value_enum)]
    pub source_map: Option<CliSourceMap>,
    #[arg(long)]
    pub sourcemap: bool,
    #[arg(long)]
    pub inline_sourcemap: bool,
    #[arg(long)]
    pub no_optimize: bool,
    #[arg(long)]
    pub ast_js: bool,
    #[arg(long)]
    pub debug_ir: bool,
    #[arg(long)]
    pub profile_cache: bool,
    #[arg(long)]
    pub list_config: bool,
    #[arg(long)]
    pub allow_system_dirs: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliTarget {
    Cjs,
    Esm,
    Wasm,
}

impl From<CliTarget> for Target {
    fn from(t: CliTarget) -> Target {
        match t {
            CliTarget::Cjs => Target::Cjs,
            CliTarget::Esm => Target::Esm,
            CliTarget::Wasm => Target::Wasm,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliSourceMap {
    Inline,
    External,
    None,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a source file and emit target text or a stack module
    Compile {
        file: PathBuf,
        #[command(flatten)]
        common: CommonFlags,
    },
    /// Parse and analyze a source file without emitting output
    Check {
        file: PathBuf,
        #[command(flatten)]
        common: CommonFlags,
    },
    /// Recompile on every change to the configured watch paths
    Watch {
        #[command(flatten)]
        common: CommonFlags,
    },
    /// Start an interactive read-eval-print loop
    Repl,
    /// Compile a PEG-style grammar file and report diagnostics
    Grammar {
        #[arg(long)]
        grammar: PathBuf,
    },
    /// Scaffold a new lumina project in the current directory
    Init {
        #[arg(long)]
        name: Option<String>,
    },
    /// Install every package recorded in the lockfile (no network fetch)
    Install,
    /// Record a package entry in the lockfile
    Add {
        name: String,
        version: String,
        resolved: String,
    },
    /// Remove a package entry from the lockfile
    Remove {
        name: String,
    },
    /// List packages recorded in the lockfile
    List,
}

pub fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Compile { file, common } => cmd_compile(&file, &common, false),
        Commands::Check { file, common } => cmd_compile(&file, &common, true),
        Commands::Watch { common } => cmd_watch(&common),
        Commands::Repl => cmd_repl(),
        Commands::Grammar { grammar } => cmd_grammar(&grammar),
        Commands::Init { name } => cmd_init(name.as_deref()),
        Commands::Install => cmd_install(),
        Commands::Add { name, version, resolved } => cmd_add(&name, &version, &resolved),
        Commands::Remove { name } => cmd_remove(&name),
        Commands::List => cmd_list(),
    }
}

fn resolve_config(common: &CommonFlags) -> Result<ProjectConfig, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let mut config = ProjectConfig::load(&cwd)?;
    if let Some(grammar) = &common.grammar {
        config.grammar_path = Some(grammar.to_string_lossy().into_owned());
    }
    if let Some(target) = common.target {
        config.target = target.into();
    }
    if common.recovery {
        config.recovery = true;
    }
    Ok(config)
}

fn resolve_source_map(common: &CommonFlags) -> SourceMapMode {
    if let Some(mode) = common.source_map {
        return match mode {
            CliSourceMap::Inline => SourceMapMode::Inline,
            CliSourceMap::External => SourceMapMode::External,
            CliSourceMap::None => SourceMapMode::None,
        };
    }
    if common.inline_sourcemap {
        return SourceMapMode::Inline;
    }
    if common.sourcemap {
        return SourceMapMode::External;
    }
    SourceMapMode::None
}

fn print_diagnostics(diagnostics: &[Diagnostic], file: &str, source: &str) {
    let color = io::stderr().is_terminal();
    for diag in diagnostics {
        eprintln!("{}", diag.render(file, source, color));
    }
}

fn cmd_compile(file: &Path, common: &CommonFlags, check_only: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(common)?;

    if common.list_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let text = fs::read_to_string(file).map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let compile_opts = CompileOptions {
        target: config.target,
        no_optimize: common.no_optimize,
        source_map: resolve_source_map(common),
        file_name: file.to_string_lossy().into_owned(),
        debug_ir: common.debug_ir,
        recovery: common.recovery || config.recovery,
    };

    let outcome = run_pipeline(&text, &compile_opts);
    print_diagnostics(&outcome.diagnostics, &file.to_string_lossy(), &text);

    if common.profile_cache {
        let mut stats = crate::cache_stats::CacheStats::default();
        stats.record_miss();
        if !outcome.has_errors() {
            stats.record_write();
        }
        println!("{}", stats.report(1, 0));
    }

    if outcome.has_errors() {
        return Err("compilation failed".into());
    }

    let run_as_check = check_only || common.dry_run;
    if run_as_check {
        println!("Check passed");
        return Ok(());
    }

    let code = outcome.code.unwrap_or_default();

    if common.debug_ir {
        let dot = crate::dot::ir_to_dot(&outcome.ir_functions);
        let dot_path = file.with_extension("ir.dot");
        fs::write(&dot_path, dot)?;
        println!("Wrote {}", dot_path.display());
    }

    let out_path = common.out.clone().unwrap_or_else(|| default_out_path(file, config.target));
    validate_out_path(&out_path, common.allow_system_dirs).map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;
    fs::write(&out_path, &code)?;

    if let Some(map_json) = &outcome.source_map_json {
        if resolve_source_map(common) == SourceMapMode::External {
            fs::write(out_path.with_extension("map"), map_json)?;
        }
    }

    println!("Compiled {}", out_path.display());
    Ok(())
}

fn default_out_path(file: &Path, target: Target) -> PathBuf {
    let ext = match target {
        Target::Wasm => "wat",
        Target::Cjs | Target::Esm => "js",
    };
    file.with_extension(ext)
}

fn cmd_watch(common: &CommonFlags) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(common)?;
    let roots = if config.watch.is_empty() { config.entries.clone() } else { config.watch.clone() };
    if roots.is_empty() {
        return Err("no watch paths configured (set \"watch\" or \"entries\" in lumina.config.json)".into());
    }
    let paths = expand_watch_paths(&roots, &config.file_extensions);
    println!("Watching {} file(s)", paths.len());
    let mut watcher = PollingWatcher::new(paths, Duration::from_millis(250));
    loop {
        let changed = watcher.poll_changes();
        for path in changed {
            let Ok(text) = fs::read_to_string(&path) else { continue };
            let compile_opts = CompileOptions {
                target: config.target,
                no_optimize: common.no_optimize,
                source_map: SourceMapMode::None,
                file_name: path.to_string_lossy().into_owned(),
                debug_ir: false,
                recovery: common.recovery || config.recovery,
            };
            let outcome = run_pipeline(&text, &compile_opts);
            print_diagnostics(&outcome.diagnostics, &path.to_string_lossy(), &text);
            if outcome.has_errors() {
                eprintln!("{}: errors", path.display());
            } else {
                println!("{}: ok", path.display());
            }
        }
    }
}

fn cmd_repl() -> Result<(), Box<dyn std::error::Error>> {
    println!("lumina repl — one declaration or expression per line, Ctrl-D to exit");
    let stdin = io::stdin();
    print!("> ");
    io::stdout().flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            print!("> ");
            io::stdout().flush()?;
            continue;
        }
        let source = if line.trim_end().ends_with('}') || line.trim_end().ends_with(';') {
            line.clone()
        } else {
            format!("fn __repl() -> i32 {{ {line}; return 0; }}")
        };
        let mut parser = LuminaParser::new(&source);
        match parser.parse_program() {
            Ok(program) => {
                let no_externs: std::collections::HashSet<String> = std::collections::HashSet::new();
                let no_imports: std::collections::HashSet<String> = std::collections::HashSet::new();
                let opts = SemanticOptions { extern_symbols: &no_externs, imported_names: &no_imports };
                let semantic = analyze(&program, &opts);
                let infer = InferEngine::new().infer_program(&program);
                for d in semantic.diagnostics.iter().chain(infer.diagnostics.iter()) {
                    println!("{}", d.render("<repl>", &source, false));
                }
                if semantic.diagnostics.is_empty() && infer.diagnostics.is_empty() {
                    println!("ok");
                }
            }
            Err(e) => println!("parse error: {}", e.message),
        }
        print!("> ");
        io::stdout().flush()?;
    }
    println!();
    Ok(())
}

fn cmd_grammar(grammar_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(grammar_path)?;
    let options = GrammarCompileOptions::default();
    match GrammarCompiler::compile(&text, &options) {
        Ok(compiled) => {
            println!("Grammar compiled: {} rule(s)", compiled.rule_names().len());
            Ok(())
        }
        Err(e) => Err(format!("{}:{}: {}", grammar_path.display(), e.location.line, e.message).into()),
    }
}

fn cmd_init(name: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let current_dir = std::env::current_dir()?;
    let project_name = name.map(String::from).unwrap_or_else(|| {
        current_dir.file_name().and_then(|n| n.to_str()).map(String::from).unwrap_or_else(|| "project".to_string())
    });

    let config_path = current_dir.join("lumina.config.json");
    if config_path.exists() {
        return Err("lumina.config.json already exists".into());
    }

    fs::create_dir_all(current_dir.join("src"))?;

    let config = ProjectConfig { entries: vec!["src/main.lm".to_string()], ..ProjectConfig::default() };
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    let main_path = current_dir.join("src/main.lm");
    if !main_path.exists() {
        fs::write(&main_path, "fn main() -> i32 {\n  return 0;\n}\n")?;
    }

    println!("Initialized lumina project '{}'", project_name);
    Ok(())
}

fn cmd_install() -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let Some(lock_path) = find_lockfile(&cwd) else {
        println!("No lumina.lock.json found; nothing to install");
        return Ok(());
    };
    let lockfile = Lockfile::load(&lock_path)?;
    for (name, entry) in &lockfile.packages {
        println!("{} {} -> {}", name, entry.version, entry.resolved);
    }
    println!("{} package(s) resolved from {}", lockfile.packages.len(), lock_path.display());
    Ok(())
}

fn cmd_add(name: &str, version: &str, resolved: &str) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let lock_path = find_lockfile(&cwd).unwrap_or_else(|| cwd.join("lumina.lock.json"));
    let mut lockfile = Lockfile::load_or_default(&lock_path)?;
    lockfile.packages.insert(
        name.to_string(),
        PackageEntry { version: version.to_string(), resolved: resolved.to_string(), integrity: None, lumina: None },
    );
    lockfile.save(&lock_path)?;
    println!("Added {} {} to {}", name, version, lock_path.display());
    Ok(())
}

fn cmd_remove(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let Some(lock_path) = find_lockfile(&cwd) else {
        return Err("no lumina.lock.json found".into());
    };
    let mut lockfile = Lockfile::load(&lock_path)?;
    if lockfile.packages.remove(name).is_none() {
        return Err(format!("no such package: {name}").into());
    }
    lockfile.save(&lock_path)?;
    println!("Removed {} from {}", name, lock_path.display());
    Ok(())
}

fn cmd_list() -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let Some(lock_path) = find_lockfile(&cwd) else {
        println!("No lumina.lock.json found");
        return Ok(());
    };
    let lockfile = Lockfile::load(&lock_path)?;
    let mut names: Vec<&String> = lockfile.packages.keys().collect();
    names.sort();
    for name in names {
        let entry = &lockfile.packages[name];
        println!("{} {}", name, entry.version);
    }
    Ok(())
}
