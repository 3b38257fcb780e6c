use crate::ast::*;
use crate::types::Origin;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use winnow::ascii::multispace0;
use winnow::combinator::{preceded, repeat};
use winnow::token::take_till;
use winnow::{ModalResult, Parser};

static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

static KNOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*={2,}\s*(\w+)\b.*$").unwrap());

static STITCH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*=\s*(\w+)\b.*$").unwrap());

static OPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*[*+](?:\s*[*+])*\s*(?:\[\s*(?P<bracket>[^\]]*?)\s*\].*|(?P<bare>[^#]*?))\s*(?:#.*)?$",
    )
    .unwrap()
});

static FLOW_DIALOGUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-\s*[A-Z][A-Z0-9_]*.*:").unwrap());

static EXPRESSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-\s*(?P<clause>[^#]+?)\s*:\s*(?P<rest>.*)$").unwrap());

static CLAUSE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<clause>(?:\([^)]*\)|[^#\-*+=/{}\s(])(?:\([^)]*\)|[^#\s(])*?)\s*:\s*$")
        .unwrap()
});

// A clause that is really a speaker, with or without a qualifier.
static SPEAKER_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*(?:\s*\([^)]*\))?$").unwrap());

static DIALOGUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*-?\s*(?P<speaker>[A-Z0-9_]+)\s*(?:\(\s*(?P<qualifier>.*?)\s*\))?\s*:\s*(?:\(\s*(?P<direction>.*?)\s*\))?\s*(?P<text>\w.*?)(?P<tags>(?:\s+#\S+)*)\s*$",
    )
    .unwrap()
});

static ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*-?\s*(?P<text>\w.*?)(?P<tags>(?:\s+#\S+)+)\s*$").unwrap()
});

static GROUP_OPENER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\s*\w+:").unwrap());

static SCRIPT_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:~|(?:INCLUDE|VAR|CONST|LIST|EXTERNAL|TODO)\b)").unwrap()
});

pub(crate) const ID_PREFIX: &str = "id:";

/// Removes `/* ... */` spans, keeping the line breaks they contained.
pub fn strip_block_comments(text: &str) -> String {
    BLOCK_COMMENT
        .replace_all(text, |caps: &Captures| {
            caps[0]
                .chars()
                .filter(|c| *c == '\r' || *c == '\n')
                .collect::<String>()
        })
        .into_owned()
}

/// Splits on `\r\n`, `\n` or `\r`, keeping empty lines so numbering stays intact.
pub fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                lines.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    lines.push(&text[start..]);
    lines
}

pub fn preprocess(text: &str, source_path: &str) -> Vec<SourceLine> {
    let text = text.trim_start_matches('\u{feff}');
    if text.is_empty() {
        return Vec::new();
    }
    let stripped = strip_block_comments(text);
    split_lines(&stripped)
        .into_iter()
        .enumerate()
        .map(|(idx, line)| SourceLine {
            text: line.to_string(),
            origin: Origin::new(source_path, idx + 1),
        })
        .collect()
}

fn hash_token<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    preceded('#', take_till(0.., '#')).parse_next(input)
}

fn spaced_tag<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    preceded((multispace0, '#'), take_till(1.., char::is_whitespace)).parse_next(input)
}

/// Splits `#a #b c #d` into `["a", "b c", "d"]`; `None` when any token is blank.
fn hash_tokens(text: &str) -> Option<Vec<String>> {
    let tokens: Vec<&str> = repeat(1.., hash_token).parse(text).ok()?;
    let tokens: Vec<String> = tokens.iter().map(|t| t.trim().to_string()).collect();
    if tokens.iter().any(|t| t.is_empty()) {
        return None;
    }
    Some(tokens)
}

/// Splits a trailing run such as ` #id:x #loc` into `["id:x", "loc"]`.
fn trailing_tags(run: &str) -> Vec<String> {
    let run = run.trim_end();
    let tokens: Vec<&str> = repeat(0.., spaced_tag).parse(run).unwrap_or_default();
    tokens.into_iter().map(str::to_string).collect()
}

/// Pulls the first non-empty `id:` tag out of the list.
pub fn extract_id(tags: &mut Vec<String>) -> Option<String> {
    let pos = tags
        .iter()
        .position(|t| t.starts_with(ID_PREFIX) && t.len() > ID_PREFIX.len())?;
    let tag = tags.remove(pos);
    Some(tag[ID_PREFIX.len()..].to_string())
}

/// A line made only of `#token` groups.
pub fn parse_tag_line(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if !trimmed.starts_with('#') {
        return None;
    }
    hash_tokens(trimmed)
}

pub fn parse_comment(line: &str) -> Option<&str> {
    line.strip_prefix("//").map(str::trim)
}

/// Splits off a `//` comment that does not start the line.
pub fn split_trailing_comment(line: &str) -> (&str, Option<&str>) {
    if line.starts_with("//") {
        return (line, None);
    }
    match line.rfind("//") {
        Some(idx) if idx > 0 => (line[..idx].trim(), Some(line[idx + 2..].trim())),
        _ => (line, None),
    }
}

pub fn brace_kind(line: &str) -> Option<BraceKind> {
    let (open, close) = line.chars().fold((0usize, 0usize), |(o, c), ch| match ch {
        '{' => (o + 1, c),
        '}' => (o, c + 1),
        _ => (o, c),
    });
    if open > close {
        Some(BraceKind::Opening)
    } else if close > open {
        Some(BraceKind::Closing)
    } else {
        None
    }
}

pub fn is_group_opener(line: &str) -> bool {
    GROUP_OPENER.is_match(line)
}

pub fn parse_knot(line: &str) -> Option<&str> {
    KNOT.captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn parse_stitch(line: &str) -> Option<&str> {
    STITCH
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn parse_option(line: &str) -> Option<String> {
    let caps = OPTION.captures(line)?;
    if let Some(bracket) = caps.name("bracket") {
        let text = bracket.as_str();
        let text = text.split_once('#').map_or(text, |(head, _)| head);
        return Some(text.trim().to_string());
    }
    caps.name("bare").map(|m| m.as_str().trim().to_string())
}

pub fn is_gather(line: &str) -> bool {
    line.trim() == "-"
}

pub fn is_flow_breaking(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }
    line.starts_with('*')
        || line.starts_with('-')
        || line.starts_with('+')
        || line.contains("->")
        || line.contains("<-")
}

pub fn is_flow_breaking_dialogue(line: &str) -> bool {
    FLOW_DIALOGUE.is_match(line.trim())
}

pub fn is_script_statement(line: &str) -> bool {
    SCRIPT_STATEMENT.is_match(line)
}

pub fn parse_expression_clause(line: &str) -> Option<ExpressionClause> {
    let caps = EXPRESSION.captures(line)?;
    let clause = caps["clause"].to_string();
    if SPEAKER_CLAUSE.is_match(&clause) {
        return None;
    }
    let rest = caps["rest"].trim();
    if rest.is_empty() {
        Some(ExpressionClause::Bare(clause))
    } else {
        Some(ExpressionClause::WithContent {
            clause,
            rest: rest.to_string(),
        })
    }
}

/// `2:` or `(label):` with no dash, nothing after the colon and no spaces outside parentheses.
pub fn parse_clause_label(line: &str) -> Option<&str> {
    let caps = CLAUSE_LABEL.captures(line)?;
    let clause = caps.name("clause")?.as_str();
    if SPEAKER_CLAUSE.is_match(clause) {
        return None;
    }
    Some(clause)
}

fn non_empty(m: Option<regex::Match<'_>>) -> Option<String> {
    m.map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn parse_dialogue(line: &str) -> Option<DialogueShape> {
    let caps = DIALOGUE.captures(line)?;
    let mut tags = trailing_tags(caps.name("tags").map_or("", |m| m.as_str()));
    let id = extract_id(&mut tags).unwrap_or_default();
    Some(DialogueShape {
        speaker_id: caps["speaker"].to_string(),
        qualifier: non_empty(caps.name("qualifier")),
        direction: non_empty(caps.name("direction")),
        text: caps["text"].trim().to_string(),
        id,
        tags,
    })
}

pub fn parse_action(line: &str) -> Option<ActionShape> {
    let caps = ACTION.captures(line)?;
    let mut tags = trailing_tags(&caps["tags"]);
    let id = extract_id(&mut tags).unwrap_or_default();
    Some(ActionShape {
        text: caps["text"].trim().to_string(),
        id,
        tags,
    })
}

/// Any line carrying exactly one `#id:` among a run of tags.
pub fn parse_tagged_line(line: &str) -> Option<TaggedLine> {
    let start = line.find('#')?;
    let run = &line[start..];
    let run = run.split_once(']').map_or(run, |(head, _)| head);
    let mut tags = hash_tokens(run.trim_end())?;
    let id_count = tags
        .iter()
        .filter(|t| t.starts_with(ID_PREFIX) && t.len() > ID_PREFIX.len())
        .count();
    if id_count != 1 {
        return None;
    }
    let id = extract_id(&mut tags)?;
    Some(TaggedLine { id, tags })
}
