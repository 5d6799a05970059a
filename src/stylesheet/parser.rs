use cssparser::{ParseError, Parser, ParserInput, Token};

use super::{AtRule, Comment, Declaration, Node, Rule};

/// Parse stylesheet text into top level nodes plus trailing whitespace.
pub(super) fn parse(source: &str) -> (Vec<Node>, String) {
    let mut input = ParserInput::new(source);
    let mut parser = Parser::new(&mut input);
    parse_nodes(&mut parser, source)
}

/// Token classes the tree builder cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Space,
    Comment,
    Colon,
    Bang,
    Important,
    AtKeyword,
    Other,
}

/// One top level token of a statement with its byte range in the source.
#[derive(Debug, Clone, Copy)]
struct Piece {
    kind: Kind,
    start: usize,
    end: usize,
}

impl Piece {
    fn is_trivia(&self) -> bool {
        matches!(self.kind, Kind::Space | Kind::Comment)
    }
}

/// Statement terminator found while scanning.
enum Terminator {
    Semicolon,
    Block,
    End,
}

struct Statement {
    pieces: Vec<Piece>,
    /// Byte offset of the terminator (or of the end of the enclosing block).
    end: usize,
    terminator: Terminator,
}

impl Statement {
    fn start(&self) -> usize {
        self.pieces.first().map_or(self.end, |piece| piece.start)
    }

    fn raw<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start()..self.end]
    }
}

fn parse_nodes(parser: &mut Parser<'_, '_>, source: &str) -> (Vec<Node>, String) {
    let mut nodes = Vec::new();
    loop {
        let before = take_whitespace(parser);
        let start = parser.state();
        let leading_comment = match parser.next_including_whitespace_and_comments() {
            Ok(token) => matches!(token, Token::Comment(_)),
            Err(_) => return (nodes, before),
        };

        if leading_comment {
            let raw = parser.slice_from(start.position());
            nodes.push(Node::Comment(comment_node(before, raw)));
            continue;
        }

        parser.reset(&start);
        let statement = scan_statement(parser);
        let node = match statement.terminator {
            Terminator::Block => {
                let (children, after) = parser
                    .parse_nested_block(|block| {
                        Ok::<_, ParseError<'_, ()>>(parse_nodes(block, source))
                    })
                    .unwrap_or_default();
                block_node(before, source, &statement, children, after)
            }
            Terminator::Semicolon => statement_node(before, source, &statement, true),
            Terminator::End => statement_node(before, source, &statement, false),
        };
        nodes.push(node);
    }
}

fn take_whitespace(parser: &mut Parser<'_, '_>) -> String {
    let start = parser.position();
    loop {
        let state = parser.state();
        let is_space = matches!(
            parser.next_including_whitespace_and_comments(),
            Ok(Token::WhiteSpace(_))
        );
        if !is_space {
            parser.reset(&state);
            break;
        }
    }
    parser.slice_from(start).to_string()
}

/// Collect top level tokens up to the next `;`, `{` or the end of the enclosing block.
/// Parenthesised groups, functions and `url(...)` are consumed as a single piece.
fn scan_statement(parser: &mut Parser<'_, '_>) -> Statement {
    let mut pieces = Vec::new();
    loop {
        let start = parser.position().byte_index();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => {
                return Statement {
                    pieces,
                    end: start,
                    terminator: Terminator::End,
                };
            }
        };

        let kind = match token {
            Token::Semicolon => {
                return Statement {
                    pieces,
                    end: start,
                    terminator: Terminator::Semicolon,
                };
            }
            Token::CurlyBracketBlock => {
                return Statement {
                    pieces,
                    end: start,
                    terminator: Terminator::Block,
                };
            }
            Token::WhiteSpace(_) => Kind::Space,
            Token::Comment(_) => Kind::Comment,
            Token::Colon => Kind::Colon,
            Token::Delim('!') => Kind::Bang,
            Token::Ident(name) if name.eq_ignore_ascii_case("important") => Kind::Important,
            Token::AtKeyword(_) => Kind::AtKeyword,
            Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock => {
                skip_block(parser);
                Kind::Other
            }
            _ => Kind::Other,
        };

        pieces.push(Piece {
            kind,
            start,
            end: parser.position().byte_index(),
        });
    }
}

fn skip_block(parser: &mut Parser<'_, '_>) {
    let _ = parser.parse_nested_block(|block| {
        while block.next_including_whitespace_and_comments().is_ok() {}
        Ok::<_, ParseError<'_, ()>>(())
    });
}

fn comment_node(before: String, raw: &str) -> Comment {
    let body = raw.strip_prefix("/*").unwrap_or(raw);
    let body = body.strip_suffix("*/").unwrap_or(body);
    let text = body.trim();
    let left_len = body.len() - body.trim_start().len();
    let left = body[..left_len].to_string();
    let right = if text.is_empty() {
        String::new()
    } else {
        body[left_len + text.len()..].to_string()
    };

    Comment {
        before,
        text: text.to_string(),
        left,
        right,
    }
}

fn block_node(
    before: String,
    source: &str,
    statement: &Statement,
    children: Vec<Node>,
    after: String,
) -> Node {
    if let Some((name, after_name, params, between)) = split_at_rule(source, statement) {
        return Node::AtRule(AtRule {
            before,
            name,
            after_name,
            params,
            between,
            nodes: Some(children),
            after,
            semicolon: false,
        });
    }

    let (selector, between) = split_trailing_whitespace(statement.raw(source));
    Node::Rule(Rule {
        before,
        selector: selector.to_string(),
        between: between.to_string(),
        nodes: children,
        after,
    })
}

fn statement_node(before: String, source: &str, statement: &Statement, semicolon: bool) -> Node {
    if let Some((name, after_name, params, between)) = split_at_rule(source, statement) {
        return Node::AtRule(AtRule {
            before,
            name,
            after_name,
            params,
            between,
            nodes: None,
            after: String::new(),
            semicolon,
        });
    }

    Node::Declaration(declaration(before, source, statement, semicolon))
}

/// Split a declaration into property, value and the raw text around them.
///
/// Comments and whitespace directly after the colon belong to `between`; trailing
/// comments, whitespace and an `!important` flag belong to `suffix`. Comments between
/// value components stay in the value text.
fn declaration(
    before: String,
    source: &str,
    statement: &Statement,
    semicolon: bool,
) -> Declaration {
    let pieces = &statement.pieces;
    let start = statement.start();

    let Some(colon) = pieces.iter().position(|piece| piece.kind == Kind::Colon) else {
        let (prop, suffix) = split_trailing_whitespace(statement.raw(source));
        return Declaration {
            before,
            prop: prop.to_string(),
            between: String::new(),
            value: String::new(),
            important: false,
            suffix: suffix.to_string(),
            semicolon,
        };
    };

    let prop = source[start..pieces[colon].start].trim_end_matches(is_css_whitespace);
    let prop_end = start + prop.len();

    let mut first = colon + 1;
    while pieces.get(first).is_some_and(Piece::is_trivia) {
        first += 1;
    }
    let mut last = trim_trivia_end(pieces, first, pieces.len());

    let mut important = false;
    if last > first && pieces[last - 1].kind == Kind::Important {
        let bang = trim_trivia_end(pieces, first, last - 1);
        if bang > first && pieces[bang - 1].kind == Kind::Bang {
            important = true;
            last = trim_trivia_end(pieces, first, bang - 1);
        }
    }

    let value_start = pieces.get(first).map_or(statement.end, |piece| piece.start);
    let value_end = if last > first {
        pieces[last - 1].end
    } else {
        value_start
    };

    Declaration {
        before,
        prop: prop.to_string(),
        between: source[prop_end..value_start].to_string(),
        value: source[value_start..value_end].to_string(),
        important,
        suffix: source[value_end..statement.end].to_string(),
        semicolon,
    }
}

/// Step `end` back over whitespace and comments, never past `floor`.
fn trim_trivia_end(pieces: &[Piece], floor: usize, mut end: usize) -> usize {
    while end > floor && pieces[end - 1].is_trivia() {
        end -= 1;
    }
    end
}

fn split_at_rule(source: &str, statement: &Statement) -> Option<(String, String, String, String)> {
    let keyword = statement.pieces.first().filter(|piece| piece.kind == Kind::AtKeyword)?;
    let name = &source[keyword.start + 1..keyword.end];
    let rest = &source[keyword.end..statement.end];
    let params_start = rest.len() - rest.trim_start_matches(is_css_whitespace).len();
    let (params, between) = split_trailing_whitespace(&rest[params_start..]);
    Some((
        name.to_string(),
        rest[..params_start].to_string(),
        params.to_string(),
        between.to_string(),
    ))
}

fn split_trailing_whitespace(raw: &str) -> (&str, &str) {
    let trimmed = raw.trim_end_matches(is_css_whitespace);
    (trimmed, &raw[trimmed.len()..])
}

fn is_css_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}
