// SPDX-License-Identifier: MIT OR Apache-2.0
//! Generated reconstruction procedure.
//!
//! A plan rendered as one Scene API call per line:
//!
//! ```text
//! # shaderio procedure 1
//! n0 = create_node("shadingEngine", "blinn1SG")
//! n1 = create_node("blinn", "blinn1")
//! set_attribute(n1, "eccentricity", 0.25)
//! connect(n1, "outColor", n0, "surfaceShader")
//! assign(n0, "pCubeShape1", faces("0:3,7"))
//! ```
//!
//! [`parse`] reads the text back into the same [`ReconstructionPlan`], so a
//! procedure runs through the same [`Executor`](super::Executor) as a live
//! import.

use super::{PlanOp, ReconstructionPlan};
use crate::error::ProcedureError;
use crate::faces::FaceSet;
use crate::record::NodeId;
use crate::value::AttributeValue;
use logos::Logos;
use std::collections::HashSet;
use std::iter::Peekable;
use std::path::PathBuf;

/// Current procedure syntax version
pub const PROCEDURE_VERSION: u32 = 1;

const HEADER: &str = "# shaderio procedure";

/// Render `plan` as procedure text
pub fn render(plan: &ReconstructionPlan) -> String {
    let mut lines = vec![format!("{HEADER} {PROCEDURE_VERSION}")];

    if let Some(dir) = &plan.source_dir {
        lines.push(format!("source_dir({})", quote(&dir.to_string_lossy())));
    }
    for name in &plan.skipped_roots {
        lines.push(format!("skip_network({})", quote(name)));
    }

    for op in &plan.ops {
        lines.push(match op {
            PlanOp::CreateNode { id, node_type, name } => {
                format!("{} = create_node({}, {})", var(*id), quote(node_type), quote(name))
            }
            PlanOp::SetAttribute { id, attribute, value } => {
                format!("set_attribute({}, {}, {})", var(*id), quote(attribute), render_value(value))
            }
            PlanOp::Connect {
                source,
                source_attr,
                dest,
                dest_attr,
            } => format!(
                "connect({}, {}, {}, {})",
                var(*source),
                quote(source_attr),
                var(*dest),
                quote(dest_attr)
            ),
            PlanOp::Assign { root, mesh_name, faces } => {
                let faces = match faces {
                    Some(faces) => format!("faces({})", quote(&faces.to_string())),
                    None => "all".to_string(),
                };
                format!("assign({}, {}, {faces})", var(*root), quote(mesh_name))
            }
        });
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn var(id: NodeId) -> String {
    format!("n{}", id.0)
}

fn quote(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

fn render_float(v: f64) -> String {
    format!("{v:?}")
}

fn render_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Bool(b) => b.to_string(),
        AttributeValue::Int(i) => i.to_string(),
        AttributeValue::Float(f) => render_float(*f),
        AttributeValue::Vector(items) => {
            let items: Vec<_> = items.iter().map(|v| render_float(*v)).collect();
            format!("[{}]", items.join(", "))
        }
        AttributeValue::String(s) => quote(s),
        AttributeValue::FilePath(path) => format!("file({})", quote(path)),
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
enum Token<'a> {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token("=")]
    Equals,
    #[token("-")]
    Minus,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Ident(&'a str),
    #[regex(r"[-+]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][-+]?[0-9]+)?", |lex| lex.slice())]
    Number(&'a str),
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    Str(&'a str),
}

type LineResult<T> = std::result::Result<T, String>;

/// Parses the tokens of one line
struct LineParser<'a> {
    iter: Peekable<logos::Lexer<'a, Token<'a>>>,
}

impl<'a> LineParser<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            iter: Token::lexer(line).peekable(),
        }
    }

    fn fetch_next(&mut self) -> LineResult<Token<'a>> {
        match self.iter.next() {
            Some(Ok(token)) => Ok(token),
            Some(Err(())) => Err("unexpected character".to_string()),
            None => Err("unexpected end of line".to_string()),
        }
    }

    fn is_next(&mut self, expected: &Token) -> bool {
        matches!(self.iter.peek(), Some(Ok(t)) if t == expected)
    }

    fn ensure_next(&mut self, expected: Token) -> LineResult<()> {
        let token = self.fetch_next()?;
        if token == expected {
            Ok(())
        } else {
            Err(format!("expected {expected:?}, got {token:?}"))
        }
    }

    fn ensure_end(&mut self) -> LineResult<()> {
        match self.iter.next() {
            None => Ok(()),
            Some(token) => Err(format!("trailing input {token:?}")),
        }
    }

    fn fetch_ident(&mut self) -> LineResult<&'a str> {
        match self.fetch_next()? {
            Token::Ident(ident) => Ok(ident),
            other => Err(format!("expected a name, got {other:?}")),
        }
    }

    fn fetch_str(&mut self) -> LineResult<String> {
        match self.fetch_next()? {
            Token::Str(literal) => {
                serde_json::from_str(literal).map_err(|e| format!("bad string {literal}: {e}"))
            }
            other => Err(format!("expected a string, got {other:?}")),
        }
    }

    fn fetch_var(&mut self) -> LineResult<NodeId> {
        let ident = self.fetch_ident()?;
        ident
            .strip_prefix('n')
            .and_then(|digits| digits.parse().ok())
            .map(NodeId)
            .ok_or_else(|| format!("{ident} is not a node variable"))
    }

    /// `(` string `)`
    fn fetch_str_arg(&mut self) -> LineResult<String> {
        self.ensure_next(Token::LParen)?;
        let s = self.fetch_str()?;
        self.ensure_next(Token::RParen)?;
        Ok(s)
    }

    fn fetch_float(&mut self) -> LineResult<f64> {
        match self.fetch_next()? {
            Token::Number(n) => n.parse().map_err(|_| format!("bad number {n}")),
            Token::Ident("NaN") => Ok(f64::NAN),
            Token::Ident("inf") => Ok(f64::INFINITY),
            Token::Minus => match self.fetch_next()? {
                Token::Ident("inf") => Ok(f64::NEG_INFINITY),
                other => Err(format!("expected inf, got {other:?}")),
            },
            other => Err(format!("expected a number, got {other:?}")),
        }
    }

    fn fetch_value(&mut self) -> LineResult<AttributeValue> {
        let value = match self.iter.peek() {
            Some(Ok(Token::Number(n))) => {
                let n = *n;
                self.iter.next();
                if n.contains(['.', 'e', 'E']) {
                    AttributeValue::Float(n.parse().map_err(|_| format!("bad number {n}"))?)
                } else {
                    AttributeValue::Int(n.parse().map_err(|_| format!("bad integer {n}"))?)
                }
            }
            Some(Ok(Token::Ident("NaN" | "inf") | Token::Minus)) => AttributeValue::Float(self.fetch_float()?),
            Some(Ok(Token::Str(_))) => AttributeValue::String(self.fetch_str()?),
            Some(Ok(Token::LBracket)) => {
                self.iter.next();
                let mut items = Vec::new();
                while !self.is_next(&Token::RBracket) {
                    if !items.is_empty() {
                        self.ensure_next(Token::Comma)?;
                    }
                    items.push(self.fetch_float()?);
                }
                self.ensure_next(Token::RBracket)?;
                AttributeValue::Vector(items)
            }
            _ => match self.fetch_ident()? {
                "true" => AttributeValue::Bool(true),
                "false" => AttributeValue::Bool(false),
                "file" => AttributeValue::FilePath(self.fetch_str_arg()?),
                other => return Err(format!("unknown value {other}")),
            },
        };
        Ok(value)
    }

    fn fetch_faces(&mut self) -> LineResult<Option<FaceSet>> {
        match self.fetch_ident()? {
            "all" => Ok(None),
            "faces" => {
                let text = self.fetch_str_arg()?;
                text.parse().map(Some).map_err(|e| format!("{e}"))
            }
            other => Err(format!("expected all or faces(...), got {other}")),
        }
    }
}

/// Builds a plan statement by statement, checking variable use
#[derive(Default)]
struct PlanBuilder {
    plan: ReconstructionPlan,
    defined: HashSet<NodeId>,
}

impl PlanBuilder {
    fn defined(&self, id: NodeId) -> LineResult<NodeId> {
        if self.defined.contains(&id) {
            Ok(id)
        } else {
            Err(format!("n{} is used before create_node", id.0))
        }
    }

    fn statement(&mut self, p: &mut LineParser<'_>) -> LineResult<()> {
        let head = p.fetch_ident()?;

        if p.is_next(&Token::Equals) {
            p.ensure_next(Token::Equals)?;
            let id = head
                .strip_prefix('n')
                .and_then(|digits| digits.parse().ok())
                .map(NodeId)
                .ok_or_else(|| format!("{head} is not a node variable"))?;
            let call = p.fetch_ident()?;
            if call != "create_node" {
                return Err(format!("only create_node returns a node, got {call}"));
            }
            p.ensure_next(Token::LParen)?;
            let node_type = p.fetch_str()?;
            p.ensure_next(Token::Comma)?;
            let name = p.fetch_str()?;
            p.ensure_next(Token::RParen)?;
            if !self.defined.insert(id) {
                return Err(format!("{head} is created twice"));
            }
            self.plan.ops.push(PlanOp::CreateNode { id, node_type, name });
            return p.ensure_end();
        }

        match head {
            "source_dir" => {
                self.plan.source_dir = Some(PathBuf::from(p.fetch_str_arg()?));
            }
            "skip_network" => {
                let name = p.fetch_str_arg()?;
                self.plan.skipped_roots.push(name);
            }
            "set_attribute" => {
                p.ensure_next(Token::LParen)?;
                let id = self.defined(p.fetch_var()?)?;
                p.ensure_next(Token::Comma)?;
                let attribute = p.fetch_str()?;
                p.ensure_next(Token::Comma)?;
                let value = p.fetch_value()?;
                p.ensure_next(Token::RParen)?;
                self.plan.ops.push(PlanOp::SetAttribute { id, attribute, value });
            }
            "connect" => {
                p.ensure_next(Token::LParen)?;
                let source = self.defined(p.fetch_var()?)?;
                p.ensure_next(Token::Comma)?;
                let source_attr = p.fetch_str()?;
                p.ensure_next(Token::Comma)?;
                let dest = self.defined(p.fetch_var()?)?;
                p.ensure_next(Token::Comma)?;
                let dest_attr = p.fetch_str()?;
                p.ensure_next(Token::RParen)?;
                self.plan.ops.push(PlanOp::Connect {
                    source,
                    source_attr,
                    dest,
                    dest_attr,
                });
            }
            "assign" => {
                p.ensure_next(Token::LParen)?;
                let root = self.defined(p.fetch_var()?)?;
                p.ensure_next(Token::Comma)?;
                let mesh_name = p.fetch_str()?;
                p.ensure_next(Token::Comma)?;
                let faces = p.fetch_faces()?;
                p.ensure_next(Token::RParen)?;
                self.plan.ops.push(PlanOp::Assign { root, mesh_name, faces });
            }
            other => return Err(format!("unknown call {other}")),
        }
        p.ensure_end()
    }
}

/// Parse procedure text back into a plan.
///
/// Blank lines and `#` comments are ignored. A header naming a newer
/// procedure version is rejected.
pub fn parse(text: &str) -> Result<ReconstructionPlan, ProcedureError> {
    let mut builder = PlanBuilder::default();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if let Some(version) = trimmed.strip_prefix(HEADER) {
            match version.trim().parse::<u32>() {
                Ok(v) if v <= PROCEDURE_VERSION => continue,
                _ => {
                    return Err(ProcedureError {
                        line,
                        message: format!("unsupported procedure version {}", version.trim()),
                    })
                }
            }
        }
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parser = LineParser::new(trimmed);
        builder
            .statement(&mut parser)
            .map_err(|message| ProcedureError { line, message })?;
    }

    tracing::debug!("Parsed procedure with {} operations", builder.plan.ops.len());
    Ok(builder.plan)
}
