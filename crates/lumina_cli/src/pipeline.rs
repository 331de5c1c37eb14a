//! Orchestrates the phases for `compile`/`check`/`watch` (spec §6.1, §7).
//!
//! Grounded on the teacher's `cmd_build`/`cmd_check`
//! (`src/cli.rs`): find the project, load the manifest/config, run the
//! compiler, print a one-line result. The propagation policy (diagnostics
//! accumulate across every phase; the orchestrator halts emission only at
//! an error-severity diagnostic) is the teacher's "run everything, report
//! everything" posture rather than bailing on the first failure.

use std::collections::HashSet;
use std::path::Path;

use lumina_base::Diagnostic;
use lumina_codegen::{emit_program, emit_stack_module, monomorphize, EmitOptions, SourceMapMode};
use lumina_infer::{analyze, InferEngine, SemanticOptions};
use lumina_ir::{lower_program, optimize, IrFunction};
use lumina_project::Target;
use lumina_syntax::{parse_with_recovery, Parser};

pub struct CompileOptions {
    pub target: Target,
    pub no_optimize: bool,
    pub source_map: SourceMapMode,
    pub file_name: String,
    pub debug_ir: bool,
    pub recovery: bool,
}

pub struct CompileOutcome {
    pub diagnostics: Vec<Diagnostic>,
    pub code: Option<String>,
    pub source_map_json: Option<String>,
    pub ir_functions: Vec<IrFunction>,
}

impl CompileOutcome {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Runs the full pipeline (parse, analyze, infer, monomorphize, lower +
/// optimize, emit) on a single source text. `check` and `compile` share
/// this; `check` simply ignores the `code`/`source_map_json` fields.
pub fn run_pipeline(text: &str, options: &CompileOptions) -> CompileOutcome {
    let mut diagnostics = Vec::new();

    let mut program = if options.recovery {
        let recovered = parse_with_recovery(text);
        diagnostics.extend(recovered.diagnostics);
        recovered.program
    } else {
        let mut parser = Parser::new(text);
        match parser.parse_program() {
            Ok(p) => p,
            Err(e) => {
                let diag = Diagnostic::error(
                    "syntax-error",
                    e.message.clone(),
                    e.location.span(),
                    e.location.start.line,
                    e.location.start.column,
                );
                return CompileOutcome { diagnostics: vec![diag], code: None, source_map_json: None, ir_functions: Vec::new() };
            }
        }
    };

    let no_externs = HashSet::new();
    let no_imports = HashSet::new();
    let semantic_opts = SemanticOptions { extern_symbols: &no_externs, imported_names: &no_imports };
    let semantic = analyze(&program, &semantic_opts);
    diagnostics.extend(semantic.diagnostics);

    let infer = InferEngine::new().infer_program(&program);

    monomorphize(&mut program, &infer);

    diagnostics.extend(infer.diagnostics);

    if diagnostics.iter().any(Diagnostic::is_error) {
        return CompileOutcome { diagnostics, code: None, source_map_json: None, ir_functions: Vec::new() };
    }

    let mut ir_functions = lower_program(&program);
    for f in &mut ir_functions {
        optimize(f, options.no_optimize);
    }

    match options.target {
        Target::Wasm => {
            let stack_out = emit_stack_module(&program);
            diagnostics.extend(stack_out.diagnostics);
            CompileOutcome { diagnostics, code: Some(stack_out.text), source_map_json: None, ir_functions }
        }
        Target::Cjs | Target::Esm => {
            let emit_opts = EmitOptions { source_map: options.source_map, file_name: options.file_name.clone() };
            let output = emit_program(&program, &emit_opts);
            CompileOutcome { diagnostics, code: Some(output.code), source_map_json: output.source_map_json, ir_functions }
        }
    }
}

/// Validates `--out`: no `..` traversal, no NUL bytes, and (absent
/// `allow_system_dirs`) not under a handful of well-known system
/// directories.
pub fn validate_out_path(path: &Path, allow_system_dirs: bool) -> Result<(), String> {
    let raw = path.to_string_lossy();
    if raw.contains('\0') {
        return Err("output path contains a null byte".to_string());
    }
    if path.components().any(|c| c.as_os_str() == "..") {
        return Err("output path may not contain '..'".to_string());
    }
    if !allow_system_dirs {
        const SYSTEM_DIRS: &[&str] = &["/etc", "/usr", "/bin", "/sbin", "/sys", "/proc", "/boot", "/dev"];
        if SYSTEM_DIRS.iter().any(|d| raw.starts_with(d)) {
            return Err(format!("refusing to write under a system directory: {raw} (pass --allow-system-dirs to override)"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(target: Target) -> CompileOptions {
        CompileOptions { target, no_optimize: false, source_map: SourceMapMode::None, file_name: "main.lm".to_string(), debug_ir: false, recovery: false }
    }

    #[test]
    fn compiles_a_simple_function_to_cjs() {
        let outcome = run_pipeline("fn add(a: i32, b: i32) -> i32 { return a + b; }", &opts(Target::Cjs));
        assert!(!outcome.has_errors());
        assert!(outcome.code.unwrap().contains("function add(a, b)"));
    }

    #[test]
    fn wasm_target_emits_a_module() {
        let outcome = run_pipeline("fn add(a: i32, b: i32) -> i32 { return a + b; }", &opts(Target::Wasm));
        assert!(!outcome.has_errors());
        assert!(outcome.code.unwrap().contains("(module"));
    }

    #[test]
    fn syntax_error_halts_before_emission() {
        let outcome = run_pipeline("fn add(a: i32, b: i32) -> i32 { return a +", &opts(Target::Cjs));
        assert!(outcome.has_errors());
        assert!(outcome.code.is_none());
    }

    #[test]
    fn rejects_path_traversal_in_out() {
        let result = validate_out_path(Path::new("../../etc/passwd"), false);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_system_directory_without_allow_flag() {
        let result = validate_out_path(Path::new("/etc/lumina-out.js"), false);
        assert!(result.is_err());
        assert!(validate_out_path(Path::new("/etc/lumina-out.js"), true).is_ok());
    }
}
