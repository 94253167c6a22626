//! Default `{{ ... }}` evaluator.
//!
//! Supported actions:
//!
//! - `{{ .path.to.key }}` looks a value up in the context (`{{ . }}` renders
//!   the whole context)
//! - `{{ "text" }}` emits a quoted literal, which is how a literal `{{` is written
//! - `{{ env "NAME" }}` reads an environment variable
//! - `{{ default "fallback" EXPR }}` yields `fallback` when `EXPR` cannot be resolved

use std::fmt;

use serde_json::Value;

use super::{render_value, Context, TemplateError, TemplateEvaluator};

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub struct Evaluator {
    env_lookup: EnvLookup,
}

impl Evaluator {
    /// Creates an evaluator that reads `env` actions from the process environment.
    pub fn new() -> Self {
        Self::with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Creates an evaluator with a custom lookup for `env` actions.
    pub fn with_env_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            env_lookup: Box::new(lookup),
        }
    }

    fn render(&self, input: &str, context: &Context) -> Result<String, TemplateError> {
        let mut result = String::with_capacity(input.len());
        let mut rest = input;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);

            let body = &rest[start + 2..];
            let end = find_action_end(body).ok_or(TemplateError::Unclosed(offset + start))?;
            let action = body[..end].trim();
            result.push_str(&self.eval_action(action, context)?);

            let consumed = start + 2 + end + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }

        result.push_str(rest);
        Ok(result)
    }

    fn eval_action(&self, action: &str, context: &Context) -> Result<String, TemplateError> {
        let tokens = tokenize(action)?;
        self.eval_tokens(&tokens, action, context)
    }

    fn eval_tokens(
        &self,
        tokens: &[Token],
        action: &str,
        context: &Context,
    ) -> Result<String, TemplateError> {
        match tokens {
            [] => Err(TemplateError::syntax(action, "empty action")),
            [Token::Str(literal)] => Ok(literal.clone()),
            [Token::Word(word)] if word.starts_with('.') => lookup(context, word, action),
            [Token::Word(func), Token::Str(name)] if func == "env" => {
                (self.env_lookup)(name.as_str()).ok_or_else(|| TemplateError::MissingEnv(name.clone()))
            }
            [Token::Word(func), Token::Str(fallback), rest @ ..]
                if func == "default" && !rest.is_empty() =>
            {
                match self.eval_tokens(rest, action, context) {
                    Ok(value) => Ok(value),
                    Err(e @ TemplateError::Syntax { .. }) => Err(e),
                    Err(_) => Ok(fallback.clone()),
                }
            }
            [Token::Word(func), ..] if func == "env" || func == "default" => Err(
                TemplateError::syntax(action, format!("wrong arguments for '{func}'")),
            ),
            [Token::Word(word), ..] if !word.starts_with('.') => Err(TemplateError::syntax(
                action,
                format!("unknown function '{word}'"),
            )),
            _ => Err(TemplateError::syntax(action, "unexpected trailing tokens")),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator").finish_non_exhaustive()
    }
}

impl TemplateEvaluator for Evaluator {
    fn evaluate(&self, input: &str, context: &Context) -> Result<String, TemplateError> {
        self.render(input, context)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Str(String),
}

/// Returns the byte offset of the closing `}}`, skipping quoted strings.
fn find_action_end(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
        } else if b == b'"' {
            in_string = true;
        } else if b == b'}' && bytes.get(i + 1) == Some(&b'}') {
            return Some(i);
        }
    }
    None
}

fn tokenize(action: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = action.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else if ch == '"' {
            chars.next();
            let mut literal = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some('n') => literal.push('\n'),
                        Some('t') => literal.push('\t'),
                        Some(other) => literal.push(other),
                        None => break,
                    },
                    _ => literal.push(c),
                }
            }
            if !closed {
                return Err(TemplateError::syntax(action, "unterminated string literal"));
            }
            tokens.push(Token::Str(literal));
        } else {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '"' {
                    break;
                }
                word.push(c);
                chars.next();
            }
            tokens.push(Token::Word(word));
        }
    }

    Ok(tokens)
}

/// Looks up a `.dotted.path` in the context.
fn lookup(context: &Context, path: &str, action: &str) -> Result<String, TemplateError> {
    let trimmed = &path[1..];
    if trimmed.is_empty() {
        return Ok(Value::Object(context.clone()).to_string());
    }

    let parts: Vec<&str> = trimmed.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(TemplateError::syntax(action, "empty path segment"));
    }

    let missing = || TemplateError::MissingKey(trimmed.to_string());
    let mut current = context.get(parts[0]).ok_or_else(missing)?;
    for part in &parts[1..] {
        current = current
            .as_object()
            .and_then(|map| map.get(*part))
            .ok_or_else(missing)?;
    }

    Ok(render_value(current))
}
