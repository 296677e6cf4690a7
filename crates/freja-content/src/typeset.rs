// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Math typesetting seam.  Rendering collaborators implement
//! [`MathTypesetter`]; [`typeset_or_fallback`] guarantees the caller always
//! gets *something* renderable — a failed expression is re-wrapped in its
//! original delimiters instead of surfacing an error.

use anyhow::bail;

/// Renders one math expression to display markup.
pub trait MathTypesetter: Send + Sync {
    /// Typeset `expr`.  `display` selects block-level vs run-in-text layout.
    fn typeset(&self, expr: &str, display: bool) -> anyhow::Result<String>;
}

/// Typeset with per-segment failure recovery: on any renderer error the
/// original expression is returned wrapped in its `\[..\]` / `\(..\)`
/// delimiters so the user sees the raw notation rather than a broken
/// render.  Failures never propagate and never affect sibling segments.
pub fn typeset_or_fallback(t: &dyn MathTypesetter, expr: &str, display: bool) -> String {
    match t.typeset(expr, display) {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::debug!(error = %e, expr, "math typesetting failed, using fallback");
            if display {
                format!("\\[{expr}\\]")
            } else {
                format!("\\({expr}\\)")
            }
        }
    }
}

/// Terminal typesetter: translates a small LaTeX subset to Unicode.
///
/// Handles greek letters, common operator macros, `\frac`/`\sqrt`, and
/// superscript/subscript runs where Unicode has the glyphs.  Anything it
/// cannot map is an error, which [`typeset_or_fallback`] turns into the
/// delimiter-wrapped original.
#[derive(Debug, Default)]
pub struct UnicodeTypesetter;

impl MathTypesetter for UnicodeTypesetter {
    fn typeset(&self, expr: &str, _display: bool) -> anyhow::Result<String> {
        let mut out = String::with_capacity(expr.len());
        let mut chars = expr.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    let name: String = {
                        let mut n = String::new();
                        while let Some(&p) = chars.peek() {
                            if p.is_ascii_alphabetic() {
                                n.push(p);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        n
                    };
                    match name.as_str() {
                        "frac" => {
                            let num = take_group(&mut chars)?;
                            let den = take_group(&mut chars)?;
                            out.push_str(&self.typeset(&num, false)?);
                            out.push('/');
                            out.push_str(&self.typeset(&den, false)?);
                        }
                        "sqrt" => {
                            let arg = take_group(&mut chars)?;
                            out.push('√');
                            out.push_str(&self.typeset(&arg, false)?);
                        }
                        _ => out.push_str(macro_glyph(&name)?),
                    }
                }
                '^' => out.push_str(&script_run(&mut chars, superscript)?),
                '_' => out.push_str(&script_run(&mut chars, subscript)?),
                '{' | '}' => {}
                other => out.push(other),
            }
        }

        Ok(out)
    }
}

/// Read one `{...}` group, or a single character when unbraced (`x^2`).
fn take_group(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> anyhow::Result<String> {
    match chars.next() {
        Some('{') => {
            let mut depth = 1;
            let mut group = String::new();
            for c in chars.by_ref() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return Ok(group);
                        }
                    }
                    _ => {}
                }
                group.push(c);
            }
            bail!("unclosed group")
        }
        Some(c) => Ok(c.to_string()),
        None => bail!("missing argument"),
    }
}

/// Map a `^`/`_` argument through a per-character glyph table.
fn script_run(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    glyph: fn(char) -> Option<char>,
) -> anyhow::Result<String> {
    let arg = take_group(chars)?;
    let mut out = String::with_capacity(arg.len());
    for c in arg.chars() {
        match glyph(c) {
            Some(g) => out.push(g),
            None => bail!("no script glyph for {c:?}"),
        }
    }
    Ok(out)
}

fn superscript(c: char) -> Option<char> {
    Some(match c {
        '0' => '⁰', '1' => '¹', '2' => '²', '3' => '³', '4' => '⁴',
        '5' => '⁵', '6' => '⁶', '7' => '⁷', '8' => '⁸', '9' => '⁹',
        '+' => '⁺', '-' => '⁻', '(' => '⁽', ')' => '⁾',
        'n' => 'ⁿ', 'i' => 'ⁱ',
        _ => return None,
    })
}

fn subscript(c: char) -> Option<char> {
    Some(match c {
        '0' => '₀', '1' => '₁', '2' => '₂', '3' => '₃', '4' => '₄',
        '5' => '₅', '6' => '₆', '7' => '₇', '8' => '₈', '9' => '₉',
        '+' => '₊', '-' => '₋', '(' => '₍', ')' => '₎',
        _ => return None,
    })
}

fn macro_glyph(name: &str) -> anyhow::Result<&'static str> {
    Ok(match name {
        "alpha" => "α", "beta" => "β", "gamma" => "γ", "delta" => "δ",
        "epsilon" => "ε", "theta" => "θ", "lambda" => "λ", "mu" => "μ",
        "pi" => "π", "sigma" => "σ", "phi" => "φ", "omega" => "ω",
        "Delta" => "Δ", "Sigma" => "Σ", "Omega" => "Ω", "Pi" => "Π",
        "times" => "×", "cdot" => "·", "div" => "÷", "pm" => "±",
        "le" => "≤", "leq" => "≤", "ge" => "≥", "geq" => "≥",
        "ne" => "≠", "neq" => "≠", "approx" => "≈", "equiv" => "≡",
        "to" => "→", "rightarrow" => "→", "leftarrow" => "←",
        "infty" => "∞", "sum" => "Σ", "prod" => "Π", "int" => "∫",
        "partial" => "∂", "nabla" => "∇", "in" => "∈", "notin" => "∉",
        "subset" => "⊂", "cup" => "∪", "cap" => "∩", "forall" => "∀",
        "exists" => "∃", "ldots" => "…", "dots" => "…",
        // space control macros render as a single space
        "quad" | "qquad" => " ",
        _ => bail!("unknown macro \\{name}"),
    })
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
