// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Addon templates are written with `[[ ]]` actions so they can embed
//! `{{ }}` text meant for the cluster. Actions are translated into Tera
//! source, everything else is passed through untouched.
//!
//! Supported actions:
//! - `[[ .Args.key ]]`, `[[ .Name ]]` and `[[ index .Args "key" ]]`
//! - pipes into `default "x"`, `quote`, `upper`, `lower`, `trim`, `b64enc`
//! - `[[ if ... ]]`, `[[ else if ... ]]`, `[[ else ]]`, `[[ end ]]` with
//!   `eq`, `ne`, `lt`, `le`, `gt`, `ge`, `and`, `or`, `not`
//! - `[[/* comments */]]` and `[[-`/`-]]` whitespace trimming

use crate::infrastructure::constants::{TEMPLATE_LEFT_DELIM, TEMPLATE_RIGHT_DELIM};
use crate::shared::error::VelaError;
use base64::Engine;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

const TEMPLATE_NAME: &str = "addon";

/// Appended to every `.Args` lookup: an argument that was not given renders
/// as an empty string and is false in conditions.
const MISSING_ARG: &str = " | default(value=\"\")";

/// Render an addon template against `context`. Missing arguments render
/// empty; any other undefined variable is an error.
pub fn render(source: &str, context: &Context) -> Result<String, VelaError> {
    let translated = translate(source)?;

    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.register_filter("quote", quote);
    tera.register_filter("b64enc", b64enc);
    tera.add_raw_template(TEMPLATE_NAME, &translated)
        .map_err(|e| VelaError::TemplateParse(describe(&e)))?;

    tera.render(TEMPLATE_NAME, context)
        .map_err(|e| VelaError::TemplateRender(describe(&e)))
}

/// Translate `[[ ]]` actions into Tera tags.
pub fn translate(source: &str) -> Result<String, VelaError> {
    let mut out = String::with_capacity(source.len());
    let mut open_blocks = 0usize;
    let mut rest = source;

    while let Some(start) = rest.find(TEMPLATE_LEFT_DELIM) {
        push_literal(&mut out, &rest[..start]);

        let offset = source.len() - rest.len() + start;
        let after = &rest[start + TEMPLATE_LEFT_DELIM.len()..];
        let end = after.find(TEMPLATE_RIGHT_DELIM).ok_or_else(|| {
            VelaError::TemplateParse(format!(
                "unclosed action at line {}",
                line_of(source, offset)
            ))
        })?;

        translate_action(&after[..end], &mut out, &mut open_blocks)
            .map_err(|e| at_line(e, line_of(source, offset)))?;
        rest = &after[end + TEMPLATE_RIGHT_DELIM.len()..];
    }
    push_literal(&mut out, rest);

    if open_blocks > 0 {
        return Err(VelaError::TemplateParse(format!(
            "unexpected EOF, {} if block(s) not closed",
            open_blocks
        )));
    }
    Ok(out)
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

fn at_line(err: VelaError, line: usize) -> VelaError {
    match err {
        VelaError::TemplateParse(msg) => {
            VelaError::TemplateParse(format!("line {}: {}", line, msg))
        }
        other => other,
    }
}

fn push_literal(out: &mut String, literal: &str) {
    if literal.is_empty() {
        return;
    }
    let needs_raw =
        ["{{", "{%", "{#"].iter().any(|t| literal.contains(t)) || literal.ends_with('{');
    if needs_raw {
        out.push_str("{% raw %}");
        out.push_str(literal);
        out.push_str("{% endraw %}");
    } else {
        out.push_str(literal);
    }
}

fn parse_err(msg: impl Into<String>) -> VelaError {
    VelaError::TemplateParse(msg.into())
}

struct Tag {
    trim_left: bool,
    trim_right: bool,
}

impl Tag {
    fn wrap(&self, open: &str, body: &str, close: &str) -> String {
        let left = if self.trim_left { "-" } else { "" };
        let right = if self.trim_right { "-" } else { "" };
        format!("{}{} {} {}{}", open, left, body, right, close)
    }
}

fn translate_action(
    action: &str,
    out: &mut String,
    open_blocks: &mut usize,
) -> Result<(), VelaError> {
    let (trim_left, body) = match action.strip_prefix('-') {
        Some(b) if b.starts_with(char::is_whitespace) => (true, b),
        _ => (false, action),
    };
    let (trim_right, body) = match body.strip_suffix('-') {
        Some(b) if b.ends_with(char::is_whitespace) => (true, b),
        _ => (false, body),
    };
    let body = body.trim();
    let tag = Tag { trim_left, trim_right };

    if body.starts_with("/*") && body.ends_with("*/") {
        return Ok(());
    }
    if body.is_empty() {
        return Err(parse_err("missing value for command"));
    }

    let (keyword, rest) = match body.split_once(char::is_whitespace) {
        Some((k, r)) => (k, r.trim()),
        None => (body, ""),
    };

    match keyword {
        "if" => {
            *open_blocks += 1;
            out.push_str(&tag.wrap("{%", &format!("if {}", translate_pipeline(rest)?), "%}"));
        }
        "else" => {
            if *open_blocks == 0 {
                return Err(parse_err("unexpected else"));
            }
            if rest.is_empty() {
                out.push_str(&tag.wrap("{%", "else", "%}"));
            } else if let Some(cond) = rest.strip_prefix("if ") {
                let cond = translate_pipeline(cond.trim())?;
                out.push_str(&tag.wrap("{%", &format!("elif {}", cond), "%}"));
            } else {
                return Err(parse_err(format!("unexpected '{}' after else", rest)));
            }
        }
        "end" => {
            if *open_blocks == 0 {
                return Err(parse_err("unexpected end"));
            }
            *open_blocks -= 1;
            out.push_str(&tag.wrap("{%", "endif", "%}"));
        }
        "range" | "with" | "define" | "template" | "block" | "break" | "continue" => {
            return Err(parse_err(format!("unsupported action: {}", keyword)));
        }
        _ => {
            out.push_str(&tag.wrap("{{", &translate_pipeline(body)?, "}}"));
        }
    }
    Ok(())
}

fn translate_pipeline(expr: &str) -> Result<String, VelaError> {
    let stages = split_stages(expr)?;
    let mut stages = stages.iter();

    let first = stages.next().ok_or_else(|| parse_err("missing value for command"))?;
    let mut result = translate_command(&tokenize(first)?)?;
    for stage in stages {
        result = apply_filter(result, &tokenize(stage)?)?;
    }
    Ok(result)
}

fn translate_command(tokens: &[String]) -> Result<String, VelaError> {
    let (head, args) = tokens
        .split_first()
        .ok_or_else(|| parse_err("missing value for command"))?;

    if is_operand(head) {
        if !args.is_empty() {
            return Err(parse_err(format!("{} is not a function", head)));
        }
        return operand(head);
    }

    let arity = |n: usize| {
        if args.len() == n {
            Ok(())
        } else {
            Err(parse_err(format!(
                "wrong number of args for {}: want {} got {}",
                head,
                n,
                args.len()
            )))
        }
    };

    match head.as_str() {
        "index" => {
            if args.len() < 2 {
                return Err(parse_err("index needs a value and at least one key"));
            }
            let mut out = without_fallback(operand(&args[0])?);
            for key in &args[1..] {
                out.push('[');
                out.push_str(&operand(key)?);
                out.push(']');
            }
            if is_args_path(&args[0]) {
                out.push_str(MISSING_ARG);
            }
            Ok(out)
        }
        "default" => {
            arity(2)?;
            Ok(format!(
                "{} | default(value={})",
                without_fallback(operand(&args[1])?),
                operand(&args[0])?
            ))
        }
        "quote" | "upper" | "lower" | "trim" | "b64enc" => {
            arity(1)?;
            Ok(format!("{} | {}", operand(&args[0])?, head))
        }
        "eq" | "ne" | "lt" | "le" | "gt" | "ge" => {
            arity(2)?;
            let op = match head.as_str() {
                "eq" => "==",
                "ne" => "!=",
                "lt" => "<",
                "le" => "<=",
                "gt" => ">",
                _ => ">=",
            };
            Ok(format!("{} {} {}", operand(&args[0])?, op, operand(&args[1])?))
        }
        "and" | "or" => {
            if args.len() < 2 {
                return Err(parse_err(format!("{} needs at least two arguments", head)));
            }
            let parts = args.iter().map(|a| operand(a)).collect::<Result<Vec<_>, _>>()?;
            Ok(parts.join(&format!(" {} ", head)))
        }
        "not" => {
            arity(1)?;
            Ok(format!("not {}", operand(&args[0])?))
        }
        other => Err(parse_err(format!("function \"{}\" not defined", other))),
    }
}

fn apply_filter(value: String, tokens: &[String]) -> Result<String, VelaError> {
    let (name, args) = tokens
        .split_first()
        .ok_or_else(|| parse_err("missing command after pipe"))?;

    match (name.as_str(), args.len()) {
        ("default", 1) => Ok(format!(
            "{} | default(value={})",
            without_fallback(value),
            operand(&args[0])?
        )),
        ("quote" | "upper" | "lower" | "trim" | "b64enc", 0) => Ok(format!("{} | {}", value, name)),
        _ => Err(parse_err(format!("unsupported pipe command: {}", tokens.join(" ")))),
    }
}

fn is_operand(token: &str) -> bool {
    token.starts_with('.')
        || token.starts_with('"')
        || token.starts_with('`')
        || token == "true"
        || token == "false"
        || token.parse::<f64>().is_ok()
}

fn operand(token: &str) -> Result<String, VelaError> {
    if token.starts_with('"') || token.starts_with('`') || token == "true" || token == "false" {
        return Ok(token.to_string());
    }
    if token.parse::<f64>().is_ok() {
        return Ok(token.to_string());
    }

    let path = token
        .strip_prefix('.')
        .ok_or_else(|| parse_err(format!("unsupported operand: {}", token)))?;
    if path.is_empty() {
        return Err(parse_err("the dot context can not be rendered directly"));
    }

    let segments: Vec<&str> = path.split('.').collect();
    let valid = segments.iter().all(|s| {
        !s.is_empty()
            && !s.starts_with(|c: char| c.is_ascii_digit())
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    if !valid {
        return Err(parse_err(format!("bad field path: {}", token)));
    }
    let path = segments.join(".");
    if segments.len() > 1 && segments[0] == "Args" {
        return Ok(path + MISSING_ARG);
    }
    Ok(path)
}

fn is_args_path(token: &str) -> bool {
    token == ".Args" || token.starts_with(".Args.")
}

/// `default` replaces empty values too, so the empty-string fallback must
/// not shadow it.
fn without_fallback(value: String) -> String {
    match value.strip_suffix(MISSING_ARG) {
        Some(stripped) => stripped.to_string(),
        None => value,
    }
}

/// Split a pipeline on `|` outside string literals.
fn split_stages(expr: &str) -> Result<Vec<String>, VelaError> {
    let mut stages = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in expr.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' && q == '"' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '`' => {
                    quote = Some(c);
                    current.push(c);
                }
                '|' => stages.push(std::mem::take(&mut current)),
                '(' | ')' => return Err(parse_err("parenthesized pipelines are not supported")),
                '$' => return Err(parse_err("template variables are not supported")),
                _ => current.push(c),
            },
        }
    }

    if quote.is_some() {
        return Err(parse_err("unterminated quoted string"));
    }
    stages.push(current);

    if stages.iter().any(|s| s.trim().is_empty()) {
        return Err(parse_err("missing command in pipeline"));
    }
    Ok(stages)
}

/// Split one pipeline stage into whitespace separated tokens, keeping string
/// literals intact.
fn tokenize(stage: &str) -> Result<Vec<String>, VelaError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in stage.trim().chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' && q == '"' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => {
                if c == '"' || c == '`' {
                    quote = Some(c);
                }
                current.push(c);
            }
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn quote(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let quoted = Value::String(as_text(value)).to_string();
    Ok(Value::String(quoted))
}

fn b64enc(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(as_text(value));
    Ok(Value::String(encoded))
}
