//! Stylesheet post-processing shared by the code view and render output.

use crate::error::{ParseError, ParseResult};
use cssparser::{ParseError as CssParseError, Parser, ParserInput, Token};
use regex::Regex;
use std::sync::LazyLock;

/// Rules a canvas emits unconditionally that carry no authored intent.
///
/// Each pattern only matches at the start of the text or right after a rule or
/// declaration boundary, so descendant selectors like `.a * {}` and class
/// names like `.body` are never touched.
static NOISE_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(^|[};])\s*\*\s*\{\s*\}",
        r"(^|[};])\s*\*\s*\{\s*box-sizing\s*:\s*border-box\s*;?\s*\}",
        r"(^|[};])\s*body\s*\{\s*margin\s*:\s*0(px)?\s*;?\s*\}",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid noise rule pattern"))
    .collect()
});

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*(\r?\n[ \t]*)+").expect("valid blank line pattern"));

/// Remove canvas noise rules and blank lines. Idempotent.
pub fn strip_noise_rules(css: &str) -> String {
    let mut text = css.to_string();

    // Removing one rule can expose another at a boundary; run to a fixpoint
    loop {
        let mut next = text.clone();
        for pattern in NOISE_RULES.iter() {
            next = pattern.replace_all(&next, "${1}").into_owned();
        }
        if next == text {
            break;
        }
        text = next;
    }

    BLANK_LINES.replace_all(&text, "\n").trim().to_string()
}

/// Pretty-print a stylesheet: one declaration per line, nested blocks indented
pub fn pretty_css(css: &str, indent: &str) -> String {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut lines = Vec::new();
    write_rules(&mut parser, indent, 0, &mut lines);
    lines.join("\n")
}

type Nested<'i> = Result<(), CssParseError<'i, ()>>;

fn write_rules(parser: &mut Parser<'_, '_>, indent: &str, depth: usize, lines: &mut Vec<String>) {
    let pad = indent.repeat(depth);
    let mut pending = parser.position();

    loop {
        let before = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::Comment(_) => {
                flush_declaration(parser.slice(pending..before), depth, &pad, lines);
                lines.push(format!("{}{}", pad, parser.slice_from(before).trim()));
                pending = parser.position();
            }
            Token::Semicolon => {
                flush_declaration(parser.slice(pending..before), depth, &pad, lines);
                pending = parser.position();
            }
            Token::CurlyBracketBlock => {
                let prelude = collapse_whitespace(parser.slice(pending..before));
                lines.push(format!("{}{} {{", pad, prelude));
                let nested: Nested<'_> = parser.parse_nested_block(|block| {
                    write_rules(block, indent, depth + 1, &mut *lines);
                    Ok(())
                });
                lines.push(format!("{}}}", pad));
                if nested.is_err() {
                    return;
                }
                pending = parser.position();
            }
            _ => {}
        }
    }
    flush_declaration(parser.slice_from(pending), depth, &pad, lines);
}

fn flush_declaration(text: &str, depth: usize, pad: &str, lines: &mut Vec<String>) {
    let text = collapse_whitespace(text);
    if text.is_empty() {
        return;
    }

    let line = match text.split_once(':') {
        Some((property, value)) if depth > 0 => {
            format!("{}: {};", property.trim(), value.trim())
        }
        _ => format!("{};", text),
    };
    lines.push(format!("{}{}", pad, line));
}

/// Check that a stylesheet tokenizes cleanly with balanced blocks
pub fn validate_css(css: &str) -> ParseResult<()> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut problem = None;
    check_blocks(&mut parser, &mut problem);
    problem.map_or(Ok(()), Err)
}

fn check_blocks(parser: &mut Parser<'_, '_>, problem: &mut Option<ParseError>) {
    while problem.is_none() {
        let start = parser.position();
        let line = u64::from(parser.current_source_location().line) + 1;
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return,
        };

        let closer = match token {
            Token::CurlyBracketBlock => '}',
            Token::ParenthesisBlock | Token::Function(_) => ')',
            Token::SquareBracketBlock => ']',
            Token::CloseCurlyBracket | Token::CloseParenthesis | Token::CloseSquareBracket => {
                let found = parser.slice_from(start).trim();
                *problem = Some(ParseError::invalid_syntax(line, format!("unexpected '{}'", found)));
                return;
            }
            Token::BadString(_) => {
                *problem = Some(ParseError::invalid_syntax(line, "unterminated string"));
                return;
            }
            Token::BadUrl(_) => {
                *problem = Some(ParseError::invalid_syntax(line, "malformed url"));
                return;
            }
            _ => continue,
        };

        let nested: Nested<'_> = parser.parse_nested_block(|block| {
            check_blocks(block, &mut *problem);
            Ok(())
        });
        if problem.is_none() && (nested.is_err() || !parser.slice_from(start).ends_with(closer)) {
            *problem = Some(ParseError::invalid_syntax(
                line,
                format!("block is never closed with '{}'", closer),
            ));
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
