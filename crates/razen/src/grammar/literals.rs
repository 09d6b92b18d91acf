use razen_grammar::GrammarBuilder;
use razen_grammar::rule::{choice, lit, repeat, seq, sym};

pub(super) fn rules(builder: &mut GrammarBuilder) {
    builder
        .rule(
            "_literal",
            choice([
                sym("integer_literal"),
                sym("float_literal"),
                sym("string_literal"),
                sym("fstring_literal"),
                sym("boolean_literal"),
                sym("null_literal"),
            ]),
        )
        .rule(
            "string_literal",
            seq([
                lit("\""),
                repeat(choice([sym("string_content"), sym("escape_sequence")])),
                lit("\""),
            ]),
        )
        .rule(
            "fstring_literal",
            seq([
                lit("f\""),
                repeat(choice([
                    sym("fstring_content"),
                    sym("fstring_interpolation"),
                    sym("escape_sequence"),
                ])),
                lit("\""),
            ]),
        )
        .rule("fstring_interpolation", seq([lit("{"), sym("_expression"), lit("}")]))
        .rule("boolean_literal", choice([lit("true"), lit("false")]))
        .rule("null_literal", lit("null"));
}
