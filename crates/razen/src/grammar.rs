use razen_grammar::rule::{lit, optional, repeat, seq, sep1, sym};
use razen_grammar::{ConflictPolicy, GrammarBuilder, Rule};

mod exprs;
mod items;
mod literals;
mod statements;
mod types;

pub(crate) const NAME: &str = "razen";
pub(crate) const VERSION: u32 = 1;

/// Binding strength of the operators, loosest last.
mod precedence {
    pub(super) const PRIMARY: i32 = 8;
    pub(super) const UNARY: i32 = 7;
    pub(super) const POWER: i32 = 6;
    pub(super) const MULTIPLICATIVE: i32 = 5;
    pub(super) const ADDITIVE: i32 = 4;
    pub(super) const SHIFT: i32 = 3;
    pub(super) const BITWISE_AND: i32 = 2;
    pub(super) const BITWISE_XOR: i32 = 1;
    pub(super) const BITWISE_OR: i32 = 0;
    pub(super) const COMPARATIVE: i32 = -1;
    pub(super) const AND: i32 = -2;
    pub(super) const OR: i32 = -3;
    pub(super) const TERNARY: i32 = -4;
    pub(super) const ASSIGN: i32 = -5;
}

/// The Razen grammar. Comments and whitespace are trivia of the scanner.
pub fn grammar() -> GrammarBuilder {
    let mut builder = GrammarBuilder::new(NAME);
    builder
        .version(VERSION)
        .token("identifier")
        .token("integer_literal")
        .token("float_literal")
        .external("string_content")
        .external("fstring_content")
        .external("escape_sequence")
        .word("identifier")
        // `-x++` is ambiguous between the unary and the update expression.
        .conflict_policy(ConflictPolicy::PreferShift)
        .rule("source_file", repeat(sym("_statement")));

    statements::rules(&mut builder);
    items::rules(&mut builder);
    types::rules(&mut builder);
    exprs::rules(&mut builder);
    literals::rules(&mut builder);
    builder
}

/// `rule (',' rule)* ','?`
fn comma_list(rule: Rule) -> Rule {
    seq([sep1(rule, ","), optional(lit(","))])
}

/// `open comma_list(rule)? close`
fn delimited(open: &str, rule: Rule, close: &str) -> Rule {
    seq([lit(open), optional(comma_list(rule)), lit(close)])
}
