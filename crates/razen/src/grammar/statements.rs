use razen_grammar::GrammarBuilder;
use razen_grammar::rule::{choice, field, lit, optional, repeat, repeat1, seq, sym};

const STATEMENTS: &[&str] = &[
    "variable_declaration",
    "constant_declaration",
    "function_declaration",
    "struct_declaration",
    "enum_declaration",
    "impl_block",
    "type_alias",
    "module_declaration",
    "use_statement",
    "if_statement",
    "while_statement",
    "for_statement",
    "match_statement",
    "try_statement",
    "return_statement",
    "break_statement",
    "continue_statement",
    "throw_statement",
    "expression_statement",
    "block",
];

pub(super) fn rules(builder: &mut GrammarBuilder) {
    builder
        .rule("_statement", choice(STATEMENTS.iter().map(|&name| sym(name))))
        .rule(
            "if_statement",
            seq([
                lit("if"),
                field("condition", sym("_expression")),
                field("consequence", sym("block")),
                repeat(sym("elif_clause")),
                optional(sym("else_clause")),
            ]),
        )
        .rule(
            "elif_clause",
            seq([
                lit("elif"),
                field("condition", sym("_expression")),
                field("consequence", sym("block")),
            ]),
        )
        .rule("else_clause", seq([lit("else"), field("body", sym("block"))]))
        .rule(
            "while_statement",
            seq([
                lit("while"),
                field("condition", sym("_expression")),
                field("body", sym("block")),
            ]),
        )
        .rule(
            "for_statement",
            seq([
                lit("for"),
                sym("identifier"),
                lit("in"),
                field("iterable", sym("_expression")),
                field("body", sym("block")),
            ]),
        )
        .rule(
            "match_statement",
            seq([
                lit("match"),
                field("value", sym("_expression")),
                lit("{"),
                repeat(sym("match_arm")),
                lit("}"),
            ]),
        )
        .rule(
            "match_arm",
            seq([
                sym("pattern"),
                lit("=>"),
                choice([sym("_expression"), sym("block")]),
                lit(","),
            ]),
        )
        .rule("pattern", choice([sym("identifier"), sym("_literal"), lit("_")]))
        .rule("try_statement", seq([lit("try"), sym("block"), repeat1(sym("catch_clause"))]))
        .rule(
            "catch_clause",
            seq([
                lit("catch"),
                optional(seq([lit("("), sym("identifier"), lit(")")])),
                sym("block"),
            ]),
        )
        .rule("return_statement", seq([lit("return"), optional(sym("_expression")), lit(";")]))
        .rule("break_statement", seq([lit("break"), lit(";")]))
        .rule("continue_statement", seq([lit("continue"), lit(";")]))
        .rule("throw_statement", seq([lit("throw"), sym("_expression"), lit(";")]))
        .rule("expression_statement", seq([sym("_expression"), lit(";")]))
        .rule("block", seq([lit("{"), repeat(sym("_statement")), lit("}")]));
}
