use razen_grammar::rule::{choice, field, lit, prec, prec_left, prec_right, seq, sym};
use razen_grammar::{GrammarBuilder, Rule};

use super::{comma_list, delimited, precedence};

const EXPRESSIONS: &[&str] = &[
    "identifier",
    "_literal",
    "binary_expression",
    "unary_expression",
    "call_expression",
    "index_expression",
    "member_expression",
    "assignment_expression",
    "update_expression",
    "ternary_expression",
    "range_expression",
    "array_literal",
    "map_literal",
    "parenthesized_expression",
    "self",
];

const BINARY_OPERATORS: &[(i32, &[&str])] = &[
    (precedence::OR, &["||"]),
    (precedence::AND, &["&&"]),
    (precedence::BITWISE_OR, &["|"]),
    (precedence::BITWISE_XOR, &["^"]),
    (precedence::BITWISE_AND, &["&"]),
    (precedence::COMPARATIVE, &["==", "!=", "<", ">", "<=", ">="]),
    (precedence::SHIFT, &["<<", ">>"]),
    (precedence::ADDITIVE, &["+", "-"]),
    (precedence::MULTIPLICATIVE, &["*", "/", "%"]),
    (precedence::POWER, &["**"]),
];

const ASSIGNMENT_OPERATORS: &[&str] =
    &["=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>="];

pub(super) fn rules(builder: &mut GrammarBuilder) {
    builder
        .rule("_expression", choice(EXPRESSIONS.iter().map(|&name| sym(name))))
        .rule(
            "binary_expression",
            choice(BINARY_OPERATORS.iter().map(|&(level, operators)| {
                prec_left(
                    level,
                    seq([
                        field("left", sym("_expression")),
                        field("operator", literals(operators)),
                        field("right", sym("_expression")),
                    ]),
                )
            })),
        )
        .rule(
            "unary_expression",
            prec(
                precedence::UNARY,
                seq([
                    field("operator", literals(&["!", "-", "+", "~"])),
                    field("argument", sym("_expression")),
                ]),
            ),
        )
        .rule(
            "update_expression",
            choice([
                prec_left(precedence::UNARY, seq([sym("_expression"), literals(&["++", "--"])])),
                prec_right(precedence::UNARY, seq([literals(&["++", "--"]), sym("_expression")])),
            ]),
        )
        .rule(
            "ternary_expression",
            prec_right(
                precedence::TERNARY,
                seq([
                    field("condition", sym("_expression")),
                    lit("?"),
                    field("consequence", sym("_expression")),
                    lit(":"),
                    field("alternative", sym("_expression")),
                ]),
            ),
        )
        .rule(
            "assignment_expression",
            prec_right(
                precedence::ASSIGN,
                seq([
                    field(
                        "left",
                        choice([
                            sym("identifier"),
                            sym("member_expression"),
                            sym("index_expression"),
                        ]),
                    ),
                    field("operator", literals(ASSIGNMENT_OPERATORS)),
                    field("right", sym("_expression")),
                ]),
            ),
        )
        .rule(
            "call_expression",
            prec(
                precedence::PRIMARY,
                seq([
                    field("function", choice([sym("identifier"), sym("member_expression")])),
                    field("arguments", sym("argument_list")),
                ]),
            ),
        )
        .rule("argument_list", delimited("(", sym("_expression"), ")"))
        .rule(
            "member_expression",
            prec(
                precedence::PRIMARY,
                seq([
                    field("object", sym("_expression")),
                    lit("."),
                    field("property", sym("identifier")),
                ]),
            ),
        )
        .rule(
            "index_expression",
            prec(
                precedence::PRIMARY,
                seq([
                    field("object", sym("_expression")),
                    lit("["),
                    field("index", sym("_expression")),
                    lit("]"),
                ]),
            ),
        )
        .rule(
            "range_expression",
            prec_left(
                precedence::COMPARATIVE,
                seq([sym("_expression"), literals(&["..", "..="]), sym("_expression")]),
            ),
        )
        .rule("array_literal", delimited("[", sym("_expression"), "]"))
        .rule("map_literal", prec(1, seq([lit("{"), comma_list(sym("map_entry")), lit("}")])))
        .rule(
            "map_entry",
            seq([
                field("key", sym("_expression")),
                lit(":"),
                field("value", sym("_expression")),
            ]),
        )
        .rule("parenthesized_expression", seq([lit("("), sym("_expression"), lit(")")]))
        .rule("self", lit("self"));
}

fn literals(texts: &[&str]) -> Rule {
    choice(texts.iter().map(|&text| lit(text)))
}
