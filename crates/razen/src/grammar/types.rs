use razen_grammar::GrammarBuilder;
use razen_grammar::rule::{choice, lit, seq, sym};

const PRIMITIVES: &[&str] = &["int", "float", "str", "bool", "char", "any"];

pub(super) fn rules(builder: &mut GrammarBuilder) {
    builder
        .rule(
            "_type",
            choice([sym("primitive_type"), sym("array_type"), sym("map_type"), sym("identifier")]),
        )
        .rule("primitive_type", choice(PRIMITIVES.iter().map(|&name| lit(name))))
        .rule("array_type", seq([lit("array"), lit("<"), sym("_type"), lit(">")]))
        .rule(
            "map_type",
            seq([lit("map"), lit("<"), sym("_type"), lit(","), sym("_type"), lit(">")]),
        );
}
