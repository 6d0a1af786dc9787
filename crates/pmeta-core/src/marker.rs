//! # Environment Markers (PEP 508)
//!
//! Recursive-descent parser and canonical renderer for the marker language:
//!
//! ```text
//! marker     := marker_and ('or' marker_and)*
//! marker_and := marker_atom ('and' marker_atom)*
//! marker_atom:= '(' marker ')' | value op value
//! value      := variable | quoted string
//! op         := '===' | '==' | '!=' | '<=' | '>=' | '~=' | '<' | '>'
//!             | 'not' 'in' | 'in'
//! ```
//!
//! The parsed tree keeps explicit parenthesization ([`MarkerTree::Group`]) so
//! the rendered form preserves the author's grouping. Literals compared
//! against `extra` (and the left operand of `in extras`) are stored in
//! canonical form, which makes `extra == "Dev_Tools"` render as
//! `extra == "dev-tools"`.

use std::fmt;
use std::str::FromStr;

use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::name::{canonicalize_name, ExtraName};

// ---------------------------------------------------------------------------
// Variables, values, operators
// ---------------------------------------------------------------------------

/// A marker environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerVariable {
    PythonVersion,
    PythonFullVersion,
    OsName,
    SysPlatform,
    PlatformRelease,
    PlatformSystem,
    PlatformVersion,
    PlatformMachine,
    PlatformPythonImplementation,
    ImplementationName,
    ImplementationVersion,
    Extra,
    Extras,
    DependencyGroups,
}

impl MarkerVariable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PythonVersion => "python_version",
            Self::PythonFullVersion => "python_full_version",
            Self::OsName => "os_name",
            Self::SysPlatform => "sys_platform",
            Self::PlatformRelease => "platform_release",
            Self::PlatformSystem => "platform_system",
            Self::PlatformVersion => "platform_version",
            Self::PlatformMachine => "platform_machine",
            Self::PlatformPythonImplementation => "platform_python_implementation",
            Self::ImplementationName => "implementation_name",
            Self::ImplementationVersion => "implementation_version",
            Self::Extra => "extra",
            Self::Extras => "extras",
            Self::DependencyGroups => "dependency_groups",
        }
    }

    /// Resolve a variable name, accepting the legacy dotted aliases.
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "python_version" => Self::PythonVersion,
            "python_full_version" => Self::PythonFullVersion,
            "os_name" | "os.name" => Self::OsName,
            "sys_platform" | "sys.platform" => Self::SysPlatform,
            "platform_release" => Self::PlatformRelease,
            "platform_system" => Self::PlatformSystem,
            "platform_version" | "platform.version" => Self::PlatformVersion,
            "platform_machine" | "platform.machine" => Self::PlatformMachine,
            "platform_python_implementation"
            | "platform.python_implementation"
            | "python_implementation" => Self::PlatformPythonImplementation,
            "implementation_name" => Self::ImplementationName,
            "implementation_version" => Self::ImplementationVersion,
            "extra" => Self::Extra,
            "extras" => Self::Extras,
            "dependency_groups" => Self::DependencyGroups,
            _ => return None,
        })
    }
}

impl fmt::Display for MarkerVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operand of a marker comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerValue {
    Variable(MarkerVariable),
    Literal(String),
}

impl MarkerValue {
    fn is_variable(&self, variable: MarkerVariable) -> bool {
        matches!(self, Self::Variable(v) if *v == variable)
    }

    fn literal(&self) -> Option<&str> {
        match self {
            Self::Literal(s) => Some(s),
            Self::Variable(_) => None,
        }
    }
}

impl fmt::Display for MarkerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(v) => write!(f, "{v}"),
            Self::Literal(s) if s.contains('"') => write!(f, "'{s}'"),
            Self::Literal(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Marker comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerOperator {
    ArbitraryEqual,
    Equal,
    NotEqual,
    LessThanEqual,
    GreaterThanEqual,
    Compatible,
    LessThan,
    GreaterThan,
    NotIn,
    In,
}

impl MarkerOperator {
    const SYMBOLS: [MarkerOperator; 8] = [
        Self::ArbitraryEqual,
        Self::Equal,
        Self::NotEqual,
        Self::LessThanEqual,
        Self::GreaterThanEqual,
        Self::Compatible,
        Self::LessThan,
        Self::GreaterThan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArbitraryEqual => "===",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThanEqual => "<=",
            Self::GreaterThanEqual => ">=",
            Self::Compatible => "~=",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::NotIn => "not in",
            Self::In => "in",
        }
    }
}

impl fmt::Display for MarkerOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `value op value` comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerExpression {
    pub lhs: MarkerValue,
    pub op: MarkerOperator,
    pub rhs: MarkerValue,
}

impl MarkerExpression {
    /// `extra == "<name>"`.
    pub fn extra_equals(extra: &ExtraName) -> Self {
        Self {
            lhs: MarkerValue::Variable(MarkerVariable::Extra),
            op: MarkerOperator::Equal,
            rhs: MarkerValue::Literal(extra.as_str().to_string()),
        }
    }

    fn normalize_extra_literals(mut self) -> Self {
        let compares_extra = matches!(
            self.op,
            MarkerOperator::Equal | MarkerOperator::NotEqual | MarkerOperator::ArbitraryEqual
        );
        if compares_extra && self.rhs.is_variable(MarkerVariable::Extra) {
            if let MarkerValue::Literal(s) = &mut self.lhs {
                *s = canonicalize_name(s);
            }
        }
        let names_extra = (compares_extra && self.lhs.is_variable(MarkerVariable::Extra))
            || (matches!(self.op, MarkerOperator::In | MarkerOperator::NotIn)
                && self.rhs.is_variable(MarkerVariable::Extras));
        if names_extra {
            let target = if self.lhs.is_variable(MarkerVariable::Extra) {
                &mut self.rhs
            } else {
                &mut self.lhs
            };
            if let MarkerValue::Literal(s) = target {
                *s = canonicalize_name(s);
            }
        }
        self
    }

    /// The extra this expression requires to be active, if any.
    fn required_extra(&self) -> Option<&str> {
        match self.op {
            MarkerOperator::Equal | MarkerOperator::ArbitraryEqual => {
                if self.lhs.is_variable(MarkerVariable::Extra) {
                    self.rhs.literal()
                } else if self.rhs.is_variable(MarkerVariable::Extra) {
                    self.lhs.literal()
                } else {
                    None
                }
            }
            MarkerOperator::In if self.rhs.is_variable(MarkerVariable::Extras) => {
                self.lhs.literal()
            }
            _ => None,
        }
    }
}

impl fmt::Display for MarkerExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op, self.rhs)
    }
}

// ---------------------------------------------------------------------------
// MarkerTree
// ---------------------------------------------------------------------------

/// A parsed environment marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerTree {
    Expression(MarkerExpression),
    And(Vec<MarkerTree>),
    Or(Vec<MarkerTree>),
    /// An explicitly parenthesized sub-marker.
    Group(Box<MarkerTree>),
}

impl MarkerTree {
    /// Parse a complete marker string.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut cursor = Cursor::new(input);
        let tree = parse_or(&mut cursor)?;
        cursor.eat_whitespace();
        if !cursor.is_eof() {
            return Err(marker_error(&cursor, "unexpected trailing input"));
        }
        Ok(tree)
    }

    /// Returns `true` if the top level of the marker is an `or`.
    pub fn is_disjunction(&self) -> bool {
        matches!(self, Self::Or(_))
    }

    /// Conjoin `extra == "<extra>"` to this marker.
    ///
    /// A top-level disjunction is parenthesized first so the extra applies to
    /// every alternative.
    pub fn and_extra(self, extra: &ExtraName) -> Self {
        let clause = Self::Expression(MarkerExpression::extra_equals(extra));
        match self {
            Self::Or(_) => Self::And(vec![Self::Group(Box::new(self)), clause]),
            Self::And(mut items) => {
                items.push(clause);
                Self::And(items)
            }
            other => Self::And(vec![other, clause]),
        }
    }

    /// Canonical names of every extra referenced through `extra == "x"`
    /// (either operand order, also `===`) or `"x" in extras`, in order of
    /// appearance.
    pub fn referenced_extras(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_extras(&mut out);
        out
    }

    fn collect_extras(&self, out: &mut Vec<String>) {
        match self {
            Self::Expression(expr) => {
                if let Some(name) = expr.required_extra() {
                    out.push(name.to_string());
                }
            }
            Self::And(items) | Self::Or(items) => {
                for item in items {
                    item.collect_extras(out);
                }
            }
            Self::Group(inner) => inner.collect_extras(out),
        }
    }
}

impl fmt::Display for MarkerTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(expr) => write!(f, "{expr}"),
            Self::And(items) => write_joined(f, items, " and "),
            Self::Or(items) => write_joined(f, items, " or "),
            Self::Group(inner) => write!(f, "({inner})"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[MarkerTree], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl FromStr for MarkerTree {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

fn marker_error(cursor: &Cursor<'_>, reason: &'static str) -> ParseError {
    ParseError::InvalidMarker {
        position: cursor.pos(),
        reason,
    }
}

fn parse_or(cursor: &mut Cursor<'_>) -> Result<MarkerTree, ParseError> {
    let mut items = vec![parse_and(cursor)?];
    loop {
        cursor.eat_whitespace();
        if !cursor.eat_keyword("or") {
            break;
        }
        items.push(parse_and(cursor)?);
    }
    Ok(if items.len() == 1 {
        items.remove(0)
    } else {
        MarkerTree::Or(items)
    })
}

fn parse_and(cursor: &mut Cursor<'_>) -> Result<MarkerTree, ParseError> {
    let mut items = vec![parse_atom(cursor)?];
    loop {
        cursor.eat_whitespace();
        if !cursor.eat_keyword("and") {
            break;
        }
        items.push(parse_atom(cursor)?);
    }
    Ok(if items.len() == 1 {
        items.remove(0)
    } else {
        MarkerTree::And(items)
    })
}

fn parse_atom(cursor: &mut Cursor<'_>) -> Result<MarkerTree, ParseError> {
    cursor.eat_whitespace();
    if cursor.eat("(") {
        let inner = parse_or(cursor)?;
        cursor.eat_whitespace();
        if !cursor.eat(")") {
            return Err(marker_error(cursor, "expected a closing parenthesis"));
        }
        return Ok(MarkerTree::Group(Box::new(inner)));
    }

    let lhs = parse_value(cursor)?;
    cursor.eat_whitespace();
    let op = parse_operator(cursor)?;
    cursor.eat_whitespace();
    let rhs = parse_value(cursor)?;
    Ok(MarkerTree::Expression(
        MarkerExpression { lhs, op, rhs }.normalize_extra_literals(),
    ))
}

fn parse_value(cursor: &mut Cursor<'_>) -> Result<MarkerValue, ParseError> {
    match cursor.peek() {
        Some(quote @ ('\'' | '"')) => {
            cursor.bump();
            let text = cursor.take_while(|c| c != quote);
            if !cursor.eat(&quote.to_string()) {
                return Err(marker_error(cursor, "unterminated string literal"));
            }
            Ok(MarkerValue::Literal(text.to_string()))
        }
        Some(c) if c.is_ascii_alphabetic() => {
            let start = cursor.pos();
            let name = cursor.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
            MarkerVariable::from_name(name)
                .map(MarkerValue::Variable)
                .ok_or(ParseError::InvalidMarker {
                    position: start,
                    reason: "unknown marker variable",
                })
        }
        _ => Err(marker_error(
            cursor,
            "expected a quoted string or marker variable",
        )),
    }
}

fn parse_operator(cursor: &mut Cursor<'_>) -> Result<MarkerOperator, ParseError> {
    for op in MarkerOperator::SYMBOLS {
        if cursor.eat(op.as_str()) {
            return Ok(op);
        }
    }
    if cursor.eat_keyword("in") {
        return Ok(MarkerOperator::In);
    }
    if cursor.eat_keyword("not") {
        let before = cursor.pos();
        cursor.eat_whitespace();
        if cursor.pos() > before && cursor.eat_keyword("in") {
            return Ok(MarkerOperator::NotIn);
        }
        return Err(marker_error(cursor, "expected 'in' after 'not'"));
    }
    Err(marker_error(cursor, "expected a marker operator"))
}
