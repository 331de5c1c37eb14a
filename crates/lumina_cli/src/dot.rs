//! Graphviz dot export for the optimized IR (`--debug-ir`).
//!
//! No teacher analog (the teacher emits Rust text, never a graph); grounded
//! on the plain string-building style used throughout `lumina-codegen`'s
//! emitters rather than pulling in a dedicated graph-writing crate.

use lumina_ir::{Instr, IrFunction};

pub fn ir_to_dot(functions: &[IrFunction]) -> String {
    let mut out = String::new();
    out.push_str("digraph ir {\n  node [shape=box, fontname=\"monospace\"];\n");
    for f in functions {
        out.push_str(&format!("  subgraph cluster_{} {{\n    label=\"{}\";\n", sanitize(&f.name), f.name));
        let mut block_id = 0usize;
        let mut lines = Vec::new();
        for instr in &f.body {
            if let Instr::Label(id) = instr {
                if !lines.is_empty() {
                    emit_node(&mut out, &f.name, block_id, &lines);
                    block_id += 1;
                    lines.clear();
                }
                lines.push(format!("{}:", id));
            } else {
                lines.push(format!("{:?}", instr));
            }
        }
        if !lines.is_empty() {
            emit_node(&mut out, &f.name, block_id, &lines);
        }
        out.push_str("  }\n");
    }
    out.push_str("}\n");
    out
}

fn emit_node(out: &mut String, fn_name: &str, id: usize, lines: &[String]) {
    let label = lines.join("\\l");
    out.push_str(&format!("    {}_{} [label=\"{}\\l\"];\n", sanitize(fn_name), id, escape(&label)));
}

fn sanitize(name: &str) -> String {
    name.chars().map(|c| if c.is_alphanumeric() { c } else { '_' }).collect()
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ir::lower_program;
    use lumina_syntax::Parser;

    #[test]
    fn dot_output_wraps_each_function_in_a_cluster() {
        let mut parser = Parser::new("fn add(a: i32, b: i32) -> i32 { return a + b; }");
        let program = parser.parse_program().unwrap();
        let functions = lower_program(&program);
        let dot = ir_to_dot(&functions);
        assert!(dot.starts_with("digraph ir {"));
        assert!(dot.contains("cluster_add"));
    }
}
