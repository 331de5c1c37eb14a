//! Match exhaustiveness checking (spec §4.5 step 6, code `LUM-003`).

use std::collections::HashSet;

use lumina_syntax::ast::Pattern;

use crate::registry::AdtRegistry;

pub struct ExhaustivenessReport {
    pub exhaustive: bool,
    pub missing_variants: Vec<String>,
}

/// Computes the enum's defined variant set and subtracts covered variants.
/// A literal pattern or a binding pattern does not count toward enum
/// coverage; a wildcard (`_`) or a plain binding in arm position makes the
/// match exhaustive regardless of remaining variants.
pub fn check_match_exhaustive(enum_name: &str, arms: &[Pattern], registry: &AdtRegistry) -> ExhaustivenessReport {
    let Some(variants) = registry.enum_variants(enum_name) else {
        return ExhaustivenessReport { exhaustive: true, missing_variants: Vec::new() };
    };
    let all: HashSet<&str> = variants.iter().map(|v| v.name.as_str()).collect();
    let mut covered: HashSet<&str> = HashSet::new();
    let mut has_catch_all = false;

    for pat in arms {
        match pat {
            Pattern::Wildcard { .. } | Pattern::Binding { .. } => has_catch_all = true,
            Pattern::Enum { variant, .. } => {
                covered.insert(variant.as_str());
            }
            _ => {}
        }
    }

    if has_catch_all {
        return ExhaustivenessReport { exhaustive: true, missing_variants: Vec::new() };
    }

    let mut missing: Vec<String> = all.difference(&covered).map(|s| s.to_string()).collect();
    missing.sort();
    ExhaustivenessReport { exhaustive: missing.is_empty(), missing_variants: missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_syntax::ast::{EnumDecl, NodeId, VariantDecl, Visibility};

    fn option_registry() -> AdtRegistry {
        let mut reg = AdtRegistry::new();
        reg.register_enum(&EnumDecl {
            id: NodeId(0),
            name: "Option".to_string(),
            type_params: Vec::new(),
            variants: vec![
                VariantDecl { name: "Some".to_string(), payload: vec![] },
                VariantDecl { name: "None".to_string(), payload: vec![] },
            ],
            visibility: Visibility::Public,
            location: None,
        });
        reg
    }

    #[test]
    fn reports_missing_variant_when_not_covered() {
        let reg = option_registry();
        let arms = vec![Pattern::Enum { id: NodeId(0), enum_name: None, variant: "Some".to_string(), bindings: vec![], location: None }];
        let report = check_match_exhaustive("Option", &arms, &reg);
        assert!(!report.exhaustive);
        assert_eq!(report.missing_variants, vec!["None".to_string()]);
    }

    #[test]
    fn wildcard_arm_makes_match_exhaustive() {
        let reg = option_registry();
        let arms = vec![
            Pattern::Enum { id: NodeId(0), enum_name: None, variant: "Some".to_string(), bindings: vec![], location: None },
            Pattern::Wildcard { id: NodeId(1), location: None },
        ];
        let report = check_match_exhaustive("Option", &arms, &reg);
        assert!(report.exhaustive);
    }

    #[test]
    fn covering_all_variants_is_exhaustive() {
        let reg = option_registry();
        let arms = vec![
            Pattern::Enum { id: NodeId(0), enum_name: None, variant: "Some".to_string(), bindings: vec![], location: None },
            Pattern::Enum { id: NodeId(1), enum_name: None, variant: "None".to_string(), bindings: vec![], location: None },
        ];
        let report = check_match_exhaustive("Option", &arms, &reg);
        assert!(report.exhaustive);
    }
}
