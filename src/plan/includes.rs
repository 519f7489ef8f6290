//! # Include Plan Builder
//!
//! Turns `include=wallet,wallet.bank_account` into eager loads of
//! `Wallet` and `Wallet.BankAccount`.
//!
//! Unlike filters and sorts, an include missing from a non-empty allow-list
//! is dropped rather than rejected.

use tracing::debug;

use crate::spec::QuerySpec;

use super::allow::AllowList;
use super::errors::PlanResult;
use super::query::QueryBuilder;

/// Normalize a dotted include path into PascalCase segments.
///
/// Each segment has `-` treated as `_`, is split on `_`, and every piece is
/// capitalized: first character upper, the rest lower. A piece that already
/// contains a lowercase-to-uppercase transition keeps its casing, so
/// normalizing a normalized name is a no-op. Empty segments are dropped.
pub fn normalize_include_name(raw: &str) -> String {
    raw.split('.')
        .filter(|segment| !segment.is_empty())
        .map(pascal_case)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

fn pascal_case(segment: &str) -> String {
    segment
        .replace('-', "_")
        .split('_')
        .map(capitalize)
        .collect()
}

fn capitalize(piece: &str) -> String {
    let mut chars = piece.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let rest = chars.as_str();

    let mut out: String = first.to_uppercase().collect();
    if is_camel_cased(piece) {
        out.push_str(rest);
    } else {
        out.push_str(&rest.to_lowercase());
    }
    out
}

fn is_camel_cased(piece: &str) -> bool {
    piece
        .chars()
        .zip(piece.chars().skip(1))
        .any(|(a, b)| a.is_lowercase() && b.is_uppercase())
}

/// Normalize, record and eager-load every accepted include.
///
/// `relationships` receives the normalized name of each include in the
/// order it was requested.
pub fn apply_includes(
    query: &mut dyn QueryBuilder,
    spec: &QuerySpec,
    allow: &AllowList<String>,
    relationships: &mut Vec<String>,
) -> PlanResult<()> {
    for raw in &spec.includes {
        if !allow.is_empty() && !allow.contains(raw) {
            debug!(include = %raw, "include dropped by allow-list");
            continue;
        }

        let relation = normalize_include_name(raw);
        if relation.is_empty() {
            continue;
        }
        query.eager_load(&relation)?;
        relationships.push(relation);
    }

    Ok(())
}
