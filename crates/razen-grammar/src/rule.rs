//! Combinators describing a grammar rule.
//!
//! ```text
//! seq([lit("if"), field("condition", sym("_expression")), sym("block")])
//! ```

use crate::Assoc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rule {
    Blank,
    /// Text matched verbatim, producing an anonymous token.
    Literal(Box<str>),
    /// Reference to a rule, a scanned token or an external token.
    Symbol(Box<str>),
    Seq(Vec<Rule>),
    Choice(Vec<Rule>),
    /// One or more repetitions.
    Repeat(Box<Rule>),
    Prec { precedence: i32, assoc: Assoc, rule: Box<Rule> },
    Field { name: Box<str>, rule: Box<Rule> },
}

pub fn blank() -> Rule {
    Rule::Blank
}

pub fn lit(text: &str) -> Rule {
    Rule::Literal(text.into())
}

pub fn sym(name: &str) -> Rule {
    Rule::Symbol(name.into())
}

pub fn seq(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Seq(rules.into_iter().collect())
}

pub fn choice(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Choice(rules.into_iter().collect())
}

pub fn optional(rule: Rule) -> Rule {
    choice([rule, Rule::Blank])
}

/// Zero or more repetitions.
pub fn repeat(rule: Rule) -> Rule {
    optional(repeat1(rule))
}

pub fn repeat1(rule: Rule) -> Rule {
    Rule::Repeat(Box::new(rule))
}

pub fn prec(precedence: i32, rule: Rule) -> Rule {
    Rule::Prec { precedence, assoc: Assoc::None, rule: Box::new(rule) }
}

pub fn prec_left(precedence: i32, rule: Rule) -> Rule {
    Rule::Prec { precedence, assoc: Assoc::Left, rule: Box::new(rule) }
}

pub fn prec_right(precedence: i32, rule: Rule) -> Rule {
    Rule::Prec { precedence, assoc: Assoc::Right, rule: Box::new(rule) }
}

pub fn field(name: &str, rule: Rule) -> Rule {
    Rule::Field { name: name.into(), rule: Box::new(rule) }
}

/// `rule` separated by `separator`, at least once.
pub fn sep1(rule: Rule, separator: &str) -> Rule {
    seq([rule.clone(), repeat(seq([lit(separator), rule]))])
}

pub fn sep(rule: Rule, separator: &str) -> Rule {
    optional(sep1(rule, separator))
}

impl Rule {
    /// Visits every literal in source order.
    pub(crate) fn for_each_literal<'r>(&'r self, f: &mut impl FnMut(&'r str)) {
        match self {
            Self::Literal(text) => f(text),
            Self::Blank | Self::Symbol(_) => {}
            Self::Seq(rules) | Self::Choice(rules) => {
                rules.iter().for_each(|rule| rule.for_each_literal(f));
            }
            Self::Repeat(rule) | Self::Prec { rule, .. } | Self::Field { rule, .. } => {
                rule.for_each_literal(f);
            }
        }
    }
}
