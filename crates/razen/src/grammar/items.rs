use razen_grammar::{GrammarBuilder, Rule};
use razen_grammar::rule::{choice, field, lit, optional, repeat, sep, sep1, seq, sym};

use super::delimited;

pub(super) fn rules(builder: &mut GrammarBuilder) {
    builder
        .rule(
            "variable_declaration",
            seq([
                optional(sym("pub")),
                lit("var"),
                sym("identifier"),
                type_annotation(),
                optional(seq([lit("="), sym("_expression")])),
                lit(";"),
            ]),
        )
        .rule(
            "constant_declaration",
            seq([
                optional(sym("pub")),
                lit("const"),
                sym("identifier"),
                type_annotation(),
                lit("="),
                sym("_expression"),
                lit(";"),
            ]),
        )
        .rule(
            "function_declaration",
            seq([
                optional(sym("pub")),
                lit("fun"),
                field("name", sym("identifier")),
                field("parameters", sym("parameter_list")),
                optional(seq([lit("->"), field("return_type", sym("_type"))])),
                field("body", sym("block")),
            ]),
        )
        .rule("parameter_list", delimited("(", sym("parameter"), ")"))
        .rule(
            "parameter",
            choice([sym("self"), seq([sym("identifier"), lit(":"), sym("_type")])]),
        )
        .rule(
            "struct_declaration",
            seq([
                optional(sym("pub")),
                lit("struct"),
                field("name", sym("identifier")),
                lit("{"),
                repeat(sym("struct_field")),
                lit("}"),
            ]),
        )
        .rule(
            "struct_field",
            seq([optional(sym("pub")), sym("identifier"), lit(":"), sym("_type"), lit(",")]),
        )
        .rule(
            "enum_declaration",
            seq([
                optional(sym("pub")),
                lit("enum"),
                field("name", sym("identifier")),
                lit("{"),
                repeat(sym("enum_variant")),
                lit("}"),
            ]),
        )
        .rule(
            "enum_variant",
            seq([
                sym("identifier"),
                optional(seq([lit("("), sep(sym("_type"), ","), lit(")")])),
                lit(","),
            ]),
        )
        .rule(
            "impl_block",
            seq([
                lit("impl"),
                field("type", sym("identifier")),
                lit("{"),
                repeat(sym("function_declaration")),
                lit("}"),
            ]),
        )
        .rule(
            "type_alias",
            seq([
                optional(sym("pub")),
                lit("type"),
                sym("identifier"),
                lit("="),
                sym("_type"),
                lit(";"),
            ]),
        )
        .rule(
            "module_declaration",
            seq([lit("mod"), sym("identifier"), choice([lit(";"), sym("block")])]),
        )
        .rule(
            "use_statement",
            seq([
                lit("use"),
                choice([
                    sym("identifier"),
                    seq([sym("identifier"), lit("::"), sym("identifier")]),
                    seq([lit("from"), sym("identifier"), lit("use"), sep1(sym("identifier"), ",")]),
                ]),
                optional(seq([lit("as"), sym("identifier")])),
                lit(";"),
            ]),
        )
        .rule("pub", lit("pub"));
}

fn type_annotation() -> Rule {
    optional(seq([lit(":"), sym("_type")]))
}
