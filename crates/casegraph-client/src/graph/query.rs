use casegraph_core::{Graph, Node, NodeKey};
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashSet;

const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Key,
    Id,
    Name,
    Type,
    Summary,
    Notes,
    Date,
    Time,
    Property(String),
}

impl Field {
    fn parse(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        match lower.as_str() {
            "key" => Field::Key,
            "id" => Field::Id,
            "name" => Field::Name,
            "type" => Field::Type,
            "summary" => Field::Summary,
            "notes" => Field::Notes,
            "date" => Field::Date,
            "time" => Field::Time,
            other => Field::Property(
                other
                    .strip_prefix("properties.")
                    .unwrap_or(other)
                    .to_string(),
            ),
        }
    }

    fn value_of(&self, node: &Node) -> Option<String> {
        let raw = match self {
            Field::Key => Some(node.key.0.clone()),
            Field::Id => Some(node.id.clone()),
            Field::Name => Some(node.name.clone()),
            Field::Type => Some(node.node_type.clone()),
            Field::Summary => node.summary.clone(),
            Field::Notes => node.notes.clone(),
            Field::Date => node.date.clone(),
            Field::Time => node.time.clone(),
            Field::Property(name) => node
                .properties
                .iter()
                .find(|(k, _)| k.to_lowercase() == *name)
                .and_then(|(_, v)| stringify(v)),
        };
        raw.map(|s| s.to_lowercase())
    }
}

fn stringify(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Contains,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CmpOp {
    fn apply(self, actual: &str, expected: &str) -> bool {
        match self {
            CmpOp::Contains => actual.contains(expected),
            CmpOp::Eq => actual == expected,
            CmpOp::Ne => actual != expected,
            CmpOp::Gt => compare(actual, expected) == Ordering::Greater,
            CmpOp::Ge => compare(actual, expected) != Ordering::Less,
            CmpOp::Lt => compare(actual, expected) == Ordering::Less,
            CmpOp::Le => compare(actual, expected) != Ordering::Greater,
        }
    }
}

// numeric when both sides are numbers, lexical otherwise (ISO dates sort fine)
fn compare(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    All,
    Term(String),
    Field {
        field: Field,
        op: CmpOp,
        value: String,
    },
    Not(Box<Ast>),
    And(Vec<Ast>),
    Or(Vec<Ast>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Term(String),
    Field {
        field: Field,
        op: CmpOp,
        value: String,
    },
}

#[derive(Debug)]
struct Malformed(&'static str);

// Never fails: unparsable input becomes a conjunction of its words.
pub fn parse(query: &str) -> Ast {
    let q = query.trim();
    if q.is_empty() {
        return Ast::All;
    }
    match tokenize(q).and_then(|tokens| Parser::new(tokens).parse()) {
        Ok(ast) => ast,
        Err(Malformed(reason)) => {
            tracing::debug!(query = q, reason, "malformed query, falling back to bare terms");
            fallback(q)
        }
    }
}

fn fallback(q: &str) -> Ast {
    let terms: Vec<Ast> = q
        .split_whitespace()
        .filter(|w| !matches!(*w, "AND" | "OR" | "NOT"))
        .map(|w| w.trim_matches(|c| matches!(c, '(' | ')' | '"')).trim_start_matches('-'))
        .filter(|w| !w.is_empty())
        .map(|w| Ast::Term(w.to_lowercase()))
        .collect();
    match terms.len() {
        0 => Ast::All,
        1 => terms.into_iter().next().unwrap_or(Ast::All),
        _ => Ast::And(terms),
    }
}

fn split_operator(word: &str) -> Option<(usize, CmpOp, usize)> {
    let bytes = word.as_bytes();
    for (i, c) in word.char_indices() {
        let next = bytes.get(i + 1).copied();
        let found = match (c, next) {
            ('>', Some(b'=')) => Some((CmpOp::Ge, 2)),
            ('<', Some(b'=')) => Some((CmpOp::Le, 2)),
            ('!', Some(b'=')) => Some((CmpOp::Ne, 2)),
            (':', _) => Some((CmpOp::Contains, 1)),
            ('=', _) => Some((CmpOp::Eq, 1)),
            ('>', _) => Some((CmpOp::Gt, 1)),
            ('<', _) => Some((CmpOp::Lt, 1)),
            _ => None,
        };
        if let Some((op, len)) = found {
            return Some((i, op, len));
        }
    }
    None
}

fn tokenize(q: &str) -> Result<Vec<Token>, Malformed> {
    let chars: Vec<char> = q.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '(' => {
                out.push(Token::LParen);
                i += 1;
                continue;
            }
            ')' => {
                out.push(Token::RParen);
                i += 1;
                continue;
            }
            '-' if chars.get(i + 1).is_some_and(|n| !n.is_whitespace()) => {
                out.push(Token::Not);
                i += 1;
                continue;
            }
            _ => {}
        }

        let mut word = String::new();
        let mut quoted_value: Option<String> = None;
        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() || c == '(' || c == ')' {
                break;
            }
            if c == '"' {
                let (phrase, next) = read_quoted(&chars, i)?;
                i = next;
                quoted_value = Some(phrase);
                break;
            }
            word.push(c);
            i += 1;
        }

        out.push(classify(word, quoted_value)?);
    }
    Ok(out)
}

fn read_quoted(chars: &[char], open: usize) -> Result<(String, usize), Malformed> {
    let mut j = open + 1;
    let mut s = String::new();
    while j < chars.len() {
        if chars[j] == '"' {
            return Ok((s, j + 1));
        }
        s.push(chars[j]);
        j += 1;
    }
    Err(Malformed("unterminated quote"))
}

fn classify(word: String, quoted: Option<String>) -> Result<Token, Malformed> {
    if quoted.is_none() {
        match word.as_str() {
            "AND" => return Ok(Token::And),
            "OR" => return Ok(Token::Or),
            "NOT" => return Ok(Token::Not),
            _ => {}
        }
    }

    match split_operator(&word) {
        Some((0, _, _)) => Err(Malformed("operator without field")),
        Some((pos, op, len)) => {
            let field = Field::parse(&word[..pos]);
            let mut value = word[pos + len..].to_string();
            if let Some(q) = quoted {
                if !value.is_empty() {
                    return Err(Malformed("quote inside value"));
                }
                value = q;
            }
            if value.is_empty() {
                return Err(Malformed("empty field value"));
            }
            Ok(Token::Field {
                field,
                op,
                value: value.to_lowercase(),
            })
        }
        None => {
            let text = match quoted {
                Some(q) if word.is_empty() => q,
                Some(_) => return Err(Malformed("quote inside word")),
                None => word,
            };
            Ok(Token::Term(text.to_lowercase()))
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn parse(mut self) -> Result<Ast, Malformed> {
        if self.tokens.is_empty() {
            return Ok(Ast::All);
        }
        let ast = self.parse_or()?;
        if self.pos < self.tokens.len() {
            return Err(Malformed("trailing tokens"));
        }
        Ok(ast)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn parse_or(&mut self) -> Result<Ast, Malformed> {
        let mut items = vec![self.parse_and()?];
        while matches!(self.peek(), Some(Token::Or)) {
            self.pos += 1;
            items.push(self.parse_and()?);
        }
        Ok(collapse(items, Ast::Or))
    }

    fn parse_and(&mut self) -> Result<Ast, Malformed> {
        let mut items = vec![self.parse_unary()?];
        loop {
            match self.peek() {
                Some(Token::And) => {
                    self.pos += 1;
                    items.push(self.parse_unary()?);
                }
                Some(Token::Term(_) | Token::Field { .. } | Token::Not | Token::LParen) => {
                    items.push(self.parse_unary()?);
                }
                _ => break,
            }
        }
        Ok(collapse(items, Ast::And))
    }

    fn parse_unary(&mut self) -> Result<Ast, Malformed> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.pos += 1;
            self.enter()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Ast::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Ast, Malformed> {
        let Some(tok) = self.tokens.get(self.pos).cloned() else {
            return Err(Malformed("unexpected end of query"));
        };
        self.pos += 1;
        match tok {
            Token::LParen => {
                self.enter()?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                if !matches!(self.peek(), Some(Token::RParen)) {
                    return Err(Malformed("unbalanced parenthesis"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Token::Term(t) => Ok(Ast::Term(t)),
            Token::Field { field, op, value } => Ok(Ast::Field { field, op, value }),
            Token::RParen | Token::And | Token::Or | Token::Not => {
                Err(Malformed("unexpected operator"))
            }
        }
    }

    fn enter(&mut self) -> Result<(), Malformed> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Malformed("nesting too deep"));
        }
        Ok(())
    }
}

fn collapse(mut items: Vec<Ast>, wrap: fn(Vec<Ast>) -> Ast) -> Ast {
    if items.len() == 1 {
        items.pop().unwrap_or(Ast::All)
    } else {
        wrap(items)
    }
}

pub fn evaluate(ast: &Ast, node: &Node) -> bool {
    match ast {
        Ast::All => true,
        Ast::Term(t) => {
            node.name.to_lowercase().contains(t)
                || node.node_type.to_lowercase().contains(t)
                || node
                    .summary
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(t))
        }
        Ast::Field { field, op, value } => match field.value_of(node) {
            Some(actual) => op.apply(&actual, value),
            None => *op == CmpOp::Ne,
        },
        Ast::Not(inner) => !evaluate(inner, node),
        Ast::And(items) => items.iter().all(|a| evaluate(a, node)),
        Ast::Or(items) => items.iter().any(|a| evaluate(a, node)),
    }
}

// A blank query hands back the input graph itself. Anything else rebuilds
// it, so links to nodes that did not survive are always dropped.
pub fn filter<'a>(graph: &'a Graph, query: &str) -> Cow<'a, Graph> {
    if query.trim().is_empty() {
        return Cow::Borrowed(graph);
    }
    Cow::Owned(filter_ast(graph, &parse(query)))
}

pub fn filter_ast(graph: &Graph, ast: &Ast) -> Graph {
    let nodes: Vec<Node> = graph
        .nodes
        .iter()
        .filter(|n| evaluate(ast, n))
        .cloned()
        .collect();
    let keep: HashSet<&NodeKey> = nodes.iter().map(|n| &n.key).collect();
    let links = graph
        .links
        .iter()
        .filter(|l| keep.contains(l.source_key()) && keep.contains(l.target_key()))
        .cloned()
        .collect();
    Graph::new(nodes, links)
}
