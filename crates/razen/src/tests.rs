use std::fs;
use std::path::{Path, PathBuf};

use expect_test::{Expect, expect};
use proptest::prelude::*;
use razen_errors::Diagnostic;
use razen_grammar::{ConfigurationError, GrammarTable};
use razen_yellow::{GreenNode, NodeOrToken, SyntaxNode, TextRange, TextSize};

use crate::{
    InputEdit, Language, ParseError, Parser, RegistryBuilder, RegistryError, SyntaxTree, language,
    parse, registry,
};

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct TestCase {
    path: PathBuf,
    text: String,
}

impl TestCase {
    fn list(dir: &str) -> Vec<Self> {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("test_data").join(dir);
        let mut cases = fs::read_dir(&dir)
            .unwrap_or_else(|err| panic!("Cannot read directory {}: {err}", dir.display()))
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension()? == "rz" {
                    let text = fs::read_to_string(&path).ok()?;
                    Some(Self { path, text })
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();
        cases.sort();
        assert!(!cases.is_empty(), "no test data in {}", dir.display());
        cases
    }
}

fn check(text: &str, expect: Expect) {
    let tree = parse("razen", text, None, None).unwrap();
    expect.assert_eq(&dump(&tree));
}

fn dump(tree: &SyntaxTree) -> String {
    format!("{tree:?}")
}

/// Named nodes and tokens as an s-expression.
fn sexp(node: SyntaxNode<'_>) -> String {
    let mut out = format!("({}", node.kind_name());
    for child in node.children_with_tokens() {
        match child {
            NodeOrToken::Node(node) => {
                out.push(' ');
                out.push_str(&sexp(node));
            }
            NodeOrToken::Token(token) if token.is_named() && !token.is_error() => {
                out.push(' ');
                out.push_str(token.kind_name());
            }
            NodeOrToken::Token(_) => {}
        }
    }
    out.push(')');
    out
}

fn first_statement(text: &str) -> String {
    let tree = parse("razen", text, None, None).unwrap();
    let statement = tree.root().first_child().unwrap();
    sexp(statement)
}

fn leaves(tree: &SyntaxTree) -> Vec<u8> {
    tree.root()
        .descendants_with_tokens()
        .filter_map(NodeOrToken::into_token)
        .flat_map(|token| token.text().to_vec())
        .collect()
}

fn full_range(text: &[u8]) -> TextRange {
    TextRange::up_to(TextSize::new(text.len() as u32))
}

/// Applies the edit to a fresh parse of `text` and compares with parsing the result directly.
fn check_reparse(text: &[u8], start: usize, old_end: usize, insert: &[u8]) {
    let old = parse("razen", text, None, None).unwrap();
    let (edit, new_text) = InputEdit::replace(text, start, old_end, insert).unwrap();
    let new = parse("razen", &new_text, Some(&old), Some(&edit)).unwrap();
    let fresh = parse("razen", &new_text, None, None).unwrap();
    assert_eq!(
        dump(&new),
        dump(&fresh),
        "{start}..{old_end} -> {:?} in {:?}",
        String::from_utf8_lossy(insert),
        String::from_utf8_lossy(text),
    );
}

#[test]
fn valid_files_parse_without_errors() {
    for case in TestCase::list("ok") {
        let tree = parse("razen", &case.text, None, None).unwrap();
        let diagnostics: Vec<_> = Diagnostic::collect(&tree)
            .iter()
            .map(|diagnostic| format!("{:?} {}", diagnostic.range(), diagnostic.message()))
            .collect();
        assert!(diagnostics.is_empty(), "{}: {diagnostics:?}\n{tree:?}", case.path.display());
        assert!(!tree.root().has_error(), "{}", case.path.display());
        assert_eq!(tree.root().text_range(), full_range(case.text.as_bytes()));
        assert_eq!(leaves(&tree), case.text.as_bytes(), "{}", case.path.display());
    }
}

#[test]
fn invalid_files_keep_their_text() {
    for case in TestCase::list("err") {
        let tree = parse("razen", &case.text, None, None).unwrap();
        assert!(tree.root().has_error(), "{}", case.path.display());
        assert!(!Diagnostic::collect(&tree).is_empty(), "{}", case.path.display());
        assert_eq!(leaves(&tree), case.text.as_bytes(), "{}", case.path.display());
    }
}

#[test]
fn variable_declaration() {
    check(
        "var x: int = 1 + 2;",
        expect![[r#"
            source_file@0..19
              variable_declaration@0..19
                'var'@0..3
                identifier@4..5 "x"
                ':'@5..6
                primitive_type@6..10
                  'int'@7..10
                '='@11..12
                binary_expression@12..18
                  left: integer_literal@13..14 "1"
                  operator: '+'@15..16
                  right: integer_literal@17..18 "2"
                ';'@18..19
        "#]],
    );
}

#[test]
fn fstring_interpolation() {
    check(
        r#"f"a{b}\n";"#,
        expect![[r#"
            source_file@0..10
              expression_statement@0..10
                fstring_literal@0..9
                  'f"'@0..2
                  fstring_content@2..3 "a"
                  fstring_interpolation@3..6
                    '{'@3..4
                    identifier@4..5 "b"
                    '}'@5..6
                  escape_sequence@6..8 "\\n"
                  '"'@8..9
                ';'@9..10
        "#]],
    );
}

#[test]
fn operator_precedence() {
    assert_eq!(
        first_statement("a + b * c;"),
        "(expression_statement (binary_expression identifier (binary_expression identifier identifier)))"
    );
    assert_eq!(
        first_statement("a - b - c;"),
        "(expression_statement (binary_expression (binary_expression identifier identifier) identifier))"
    );
    assert_eq!(
        first_statement("a || b && c;"),
        "(expression_statement (binary_expression identifier (binary_expression identifier identifier)))"
    );
    assert_eq!(
        first_statement("-a ** 2;"),
        "(expression_statement (binary_expression (unary_expression identifier) integer_literal))"
    );
    assert_eq!(
        first_statement("x = y = 1;"),
        "(expression_statement (assignment_expression identifier (assignment_expression identifier integer_literal)))"
    );
    assert_eq!(
        first_statement("c ? a : b ? d : e;"),
        "(expression_statement (ternary_expression identifier identifier (ternary_expression identifier identifier identifier)))"
    );
}

#[test]
fn postfix_chains() {
    assert_eq!(
        first_statement("a.b(1)[2];"),
        "(expression_statement (index_expression (call_expression (member_expression identifier identifier) (argument_list integer_literal)) integer_literal))"
    );
    assert_eq!(first_statement("i++;"), "(expression_statement (update_expression identifier))");
    assert_eq!(
        first_statement("for i in 0..10 { }"),
        "(for_statement identifier (range_expression integer_literal integer_literal) (block))"
    );
}

#[test]
fn fields_name_the_parts_of_statements() {
    let text = "if a < b { x(); } elif c { } else { y(); }";
    let tree = parse("razen", text, None, None).unwrap();
    let statement = tree.root().first_child().unwrap();
    assert_eq!(statement.kind_name(), "if_statement");

    let field_text = |node: &SyntaxNode<'_>, name: &str| match node.child_by_field(name) {
        Some(NodeOrToken::Node(child)) => text[child.trimmed_range()].to_owned(),
        Some(NodeOrToken::Token(child)) => text[child.trimmed_range()].to_owned(),
        None => panic!("no `{name}` in {node:?}"),
    };
    assert_eq!(field_text(&statement, "condition"), "a < b");
    assert_eq!(field_text(&statement, "consequence"), "{ x(); }");

    let clauses: Vec<_> = statement.children().map(|child| child.kind_name()).collect();
    assert_eq!(clauses, ["binary_expression", "block", "elif_clause", "else_clause"]);
    let else_clause = statement.children().last().unwrap();
    assert_eq!(field_text(&else_clause, "body"), "{ y(); }");
}

#[test]
fn keywords_are_identifiers_where_no_keyword_fits() {
    assert_eq!(
        first_statement("var map = type;"),
        "(variable_declaration identifier identifier)"
    );
}

#[test]
fn syntax_errors_are_reported() {
    let tree = parse("razen", "var x = 1 1;\nvar y = 2;", None, None).unwrap();
    let diagnostics = Diagnostic::collect(&tree);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message(), "unexpected integer_literal");
    assert_eq!(diagnostics[0].range(), TextRange::new(10.into(), 11.into()));
    let statements: Vec<_> = tree.root().children().map(|node| node.kind_name()).collect();
    assert_eq!(statements, ["variable_declaration", "variable_declaration"]);
}

#[test]
fn builtin_language_is_registered() {
    let language = registry::lookup("razen").unwrap();
    assert_eq!(language.name(), "razen");
    assert!(language.kind_id("function_declaration").is_some());
    assert!(language.kind_id("_statement").is_some_and(|kind| !language.is_visible(kind)));
    assert!(registry::registry().unwrap().languages().any(|language| language.name() == "razen"));
}

#[test]
fn unknown_languages_are_rejected() {
    assert_eq!(
        parse("cobol", "", None, None).unwrap_err(),
        ParseError::Configuration(ConfigurationError::UnknownLanguage("cobol".to_owned()))
    );
}

#[test]
fn registry_is_written_once() {
    registry::registry().unwrap();
    assert_eq!(
        registry::install(RegistryBuilder::new()).unwrap_err(),
        RegistryError::AlreadyInstalled
    );
}

#[test]
fn duplicate_languages_are_rejected() {
    let builder =
        RegistryBuilder::new().language(language().unwrap()).language(language().unwrap());
    assert_eq!(builder.build().err(), Some(RegistryError::Duplicate("razen".to_owned())));
}

#[test]
fn explicit_languages_bypass_the_registry() {
    let language = language().unwrap();
    let tree = parse(&language, "x;", None, None).unwrap();
    assert_eq!(tree.language(), language.id());
}

#[test]
fn foreign_trees_are_rejected() {
    let mut builder = crate::grammar();
    builder.version(2);
    let other = crate::Language::new(&builder, Box::new(crate::scanner::RazenScanner)).unwrap();
    let old = parse(&other, "x;", None, None).unwrap();
    let before = dump(&old);
    let error = parse("razen", "x;", Some(&old), None).unwrap_err();
    assert!(matches!(
        error,
        ParseError::Configuration(ConfigurationError::IncompatibleTree { .. })
    ));
    assert_eq!(dump(&old), before);
    assert_eq!(old.language(), other.id());
}

#[test]
fn malformed_edits_are_rejected() {
    let old = parse("razen", "x;", None, None).unwrap();
    let before = dump(&old);
    let green = old.green().clone();

    let edit = InputEdit::new(1.into(), 0.into(), 1.into());
    assert!(matches!(parse("razen", "x;", Some(&old), Some(&edit)), Err(ParseError::Edit(_))));
    let edit = InputEdit::new(0.into(), 1.into(), 1.into());
    assert!(matches!(parse("razen", "xy;", Some(&old), Some(&edit)), Err(ParseError::Edit(_))));

    assert_eq!(dump(&old), before);
    assert!(old.green().ptr_eq(&green));
    let again = parse("razen", "x;", Some(&old), None).unwrap();
    assert!(again.green().ptr_eq(&green));
}

#[test]
fn edits_inside_a_function_keep_the_rest() {
    let case = TestCase::list("ok")
        .into_iter()
        .find(|case| case.path.ends_with("declarations.rz"))
        .unwrap();
    let text = &case.text;
    let old = parse("razen", text, None, None).unwrap();

    let start = text.find("a + b").unwrap();
    let (edit, new_text) =
        InputEdit::replace(text.as_bytes(), start, start + 5, b"a * (b - 1)").unwrap();
    let new = parse("razen", &new_text, Some(&old), Some(&edit)).unwrap();
    assert_eq!(dump(&new), dump(&parse("razen", &new_text, None, None).unwrap()));
    assert!(!new.root().has_error());

    let find = |tree: &SyntaxTree, kind: &str| {
        tree.root().children().find(|node| node.kind_name() == kind).unwrap().green().clone()
    };
    assert!(find(&new, "struct_declaration").ptr_eq(&find(&old, "struct_declaration")));
    assert!(find(&new, "impl_block").ptr_eq(&find(&old, "impl_block")));
    assert!(!find(&new, "function_declaration").ptr_eq(&find(&old, "function_declaration")));
}

#[test]
fn statements_before_an_edit_are_shared() {
    let text = "type A = int;\ntype B = int;\nvar c = 1;\nvar d = 2;\nvar e = 3;";
    let old = parse("razen", text, None, None).unwrap();
    let start = text.find('2').unwrap();
    let (edit, new_text) = InputEdit::replace(text.as_bytes(), start, start + 1, b"20").unwrap();
    let new = parse("razen", &new_text, Some(&old), Some(&edit)).unwrap();
    assert_eq!(dump(&new), dump(&parse("razen", &new_text, None, None).unwrap()));

    let old_statements: Vec<_> = old.root().children().collect();
    let new_statements: Vec<_> = new.root().children().collect();
    let shared: Vec<_> = new_statements
        .iter()
        .zip(&old_statements)
        .map(|(new, old)| new.green().ptr_eq(old.green()))
        .collect();
    assert_eq!(shared, [true, true, true, false, true]);
}

#[test]
fn edits_around_else_match_a_fresh_parse() {
    let text = b"var x = 1;{if a { b(); } else { c(); }";
    for start in [15, 16, 17, 18, 22, 23] {
        check_reparse(text, start, start, b"{");
    }
    check_reparse(text, 25, 29, b"elif d");
    check_reparse(b"if a { b(); } elif c { }", 20, 20, b"}");
}

#[test]
fn single_byte_edits_match_a_fresh_parse() {
    for case in TestCase::list("ok") {
        let text = case.text.as_bytes();
        for start in 0..text.len() {
            check_reparse(text, start, start + 1, b"");
            check_reparse(text, start, start, b"{");
        }
    }
}

#[test]
fn languages_and_trees_cross_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Language>();
    assert_send_sync::<GrammarTable>();
    assert_send_sync::<SyntaxTree>();
    assert_send_sync::<GreenNode>();

    let language = registry::lookup("razen").unwrap();
    let texts: Vec<String> =
        (0..4).map(|index| format!("var x{index} = {index};\nfun f() {{ }}")).collect();
    let trees: Vec<SyntaxTree> = std::thread::scope(|scope| {
        let handles: Vec<_> = texts
            .iter()
            .map(|text| scope.spawn(move || Parser::new(language).parse(text)))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });
    for (tree, text) in trees.iter().zip(&texts) {
        assert!(!tree.root().has_error());
        assert_eq!(tree.language(), language.id());
        assert_eq!(dump(tree), dump(&Parser::new(language).parse(text)));
    }

    let old = trees.into_iter().next().unwrap();
    let reparsed = std::thread::spawn(move || {
        let (edit, new_text) = InputEdit::replace(old.text(), 9, 10, b"10").unwrap();
        Parser::new(language).reparse(&old, &edit, new_text).unwrap()
    })
    .join()
    .unwrap();
    assert_eq!(leaves(&reparsed), b"var x0 = 10;\nfun f() { }");
}

#[test]
fn previous_tree_without_edit_is_diffed() {
    let old = parse("razen", "var a = 1;\nvar b = 2;\n", None, None).unwrap();
    let new_text = "var a = 1;\nvar b = 20;\n";
    let new = parse("razen", new_text, Some(&old), None).unwrap();
    assert_eq!(dump(&new), dump(&parse("razen", new_text, None, None).unwrap()));

    let first = |tree: &SyntaxTree| tree.root().first_child().unwrap().green().clone();
    assert!(first(&new).ptr_eq(&first(&old)));
}

#[test]
fn edit_without_previous_tree_parses_from_scratch() {
    let edit = InputEdit::new(0.into(), 0.into(), 1.into());
    let tree = parse("razen", "x;", None, Some(&edit)).unwrap();
    assert_eq!(dump(&tree), dump(&parse("razen", "x;", None, None).unwrap()));
}

const FRAGMENTS: &[&str] = &[
    "var x = 1;",
    "fun f(a: int) -> int { return a * 2; }",
    "if a { b(); } else { c(); }",
    "} else {",
    "} elif x {",
    "else",
    "\"text\\n\"",
    "f\"{x}\"",
    "{",
    "}",
    ";",
    " ",
    "\n",
    "// note\n",
    "x.y[0] += 3;",
    "match v { 1 => 2, _ => { }, }",
    "[1, 2]",
    "{a: 1}",
    "$",
];

fn source() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..12).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn any_input_yields_a_lossless_tree(text in prop::collection::vec(any::<u8>(), 0..64)) {
        let tree = parse("razen", &text, None, None).unwrap();
        prop_assert_eq!(leaves(&tree), text.clone());
        prop_assert_eq!(tree.root().text_range(), full_range(&text));
    }

    #[test]
    fn fragments_yield_lossless_trees(text in source()) {
        let tree = parse("razen", &text, None, None).unwrap();
        prop_assert_eq!(leaves(&tree), text.as_bytes());
    }

    #[test]
    fn reparsing_matches_parsing(
        text in source(),
        insert in source(),
        start in 0usize..1000,
        len in 0usize..8,
    ) {
        let old = parse("razen", &text, None, None).unwrap();
        let start = start % (text.len() + 1);
        let old_end = (start + len).min(text.len());
        let (edit, new_text) =
            InputEdit::replace(text.as_bytes(), start, old_end, insert.as_bytes()).unwrap();
        let new = parse("razen", &new_text, Some(&old), Some(&edit)).unwrap();
        let fresh = Parser::new(registry::lookup("razen").unwrap()).parse(&new_text);
        prop_assert_eq!(dump(&new), dump(&fresh));
    }
}
