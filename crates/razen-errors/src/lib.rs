use std::fmt::Display;

pub use annotate_snippets::Renderer;
use annotate_snippets::{Level, Snippet};
use razen_yellow::{KindId, NodeOrToken, SyntaxNode, SyntaxTree, WalkEvent};
pub use text_size::TextRange;

/// A syntax error found in a tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    message: String,
    range: TextRange,
}

impl Diagnostic {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn error(message: impl Into<String>, range: TextRange) -> Self {
        Self { message: message.into(), range }
    }

    /// One diagnostic per outermost `ERROR` node, in text order.
    pub fn collect(tree: &SyntaxTree) -> Vec<Self> {
        let mut diagnostics = Vec::new();
        let mut preorder = tree.root().preorder();
        while let Some(event) = preorder.next() {
            if let WalkEvent::Enter(node) = event
                && node.is_error()
            {
                diagnostics.push(Self::for_error_node(&node));
                preorder.skip_subtree();
            }
        }
        diagnostics
    }

    fn for_error_node(node: &SyntaxNode<'_>) -> Self {
        let unexpected = node
            .descendants_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .find(|token| token.kind() != KindId::END && !token.is_error());
        let message = match unexpected {
            None => "unrecognized input".to_owned(),
            Some(token) if token.is_named() => format!("unexpected {}", token.kind_name()),
            Some(token) => format!("unexpected `{}`", token.kind_name()),
        };
        Self { message, range: node.trimmed_range() }
    }

    pub fn render<'a>(
        &'a self,
        renderer: &'a Renderer,
        path: &'a str,
        text: &'a str,
    ) -> impl Display + 'a {
        let message = Level::Error.title(&self.message).snippet(
            Snippet::source(text)
                .origin(path)
                .annotation(Level::Error.span(self.range.into()).label("here"))
                .fold(true),
        );
        renderer.render(message)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use razen_yellow::{
        GreenChild, GreenNode, GreenToken, GreenTrivia, KindInfo, KindTable, LanguageId, LexMode,
        NodeInfo, TriviaPiece, TriviaPieceKind,
    };

    use super::*;

    const NUMBER: KindId = KindId(2);
    const PLUS: KindId = KindId(3);
    const EXPR: KindId = KindId(4);

    fn token(kind: KindId, leading: u32, len: u32) -> GreenChild {
        let leading = if leading == 0 {
            GreenTrivia::empty()
        } else {
            GreenTrivia::new(&[TriviaPiece::new(TriviaPieceKind::Whitespace, leading.into())])
        };
        GreenChild::new(GreenToken::new(kind, leading, len.into(), LexMode(1), 0), None)
    }

    fn error(children: Vec<GreenChild>) -> GreenChild {
        GreenChild::new(GreenNode::new(KindId::ERROR, children, NodeInfo::default()), None)
    }

    /// `1 + $`: a stray operator and an unknown byte.
    fn tree() -> SyntaxTree {
        let mut kinds = KindTable::new();
        for (name, named, terminal) in [
            ("end", true, true),
            ("ERROR", true, true),
            ("number", true, true),
            ("+", false, true),
            ("expr", true, false),
        ] {
            kinds.push(KindInfo { name: name.into(), named, visible: true, terminal });
        }
        let root = GreenNode::new(
            EXPR,
            vec![
                token(NUMBER, 0, 1),
                error(vec![token(PLUS, 1, 2)]),
                error(vec![token(KindId::ERROR, 1, 2)]),
            ],
            NodeInfo::default(),
        );
        let language = LanguageId { name: "test".into(), version: 1, fingerprint: 0 };
        SyntaxTree::new(root, Arc::from(&b"1 + $"[..]), Arc::new(kinds), language)
    }

    #[test]
    fn one_diagnostic_per_error_node() {
        let diagnostics = Diagnostic::collect(&tree());
        let summary: Vec<_> = diagnostics
            .iter()
            .map(|diagnostic| format!("{:?} {}", diagnostic.range(), diagnostic.message()))
            .collect();
        assert_eq!(summary, ["2..3 unexpected `+`", "4..5 unrecognized input"]);
    }

    #[test]
    fn renders_with_the_source() {
        let diagnostic = Diagnostic::error("unexpected `+`", TextRange::new(2.into(), 3.into()));
        let renderer = Renderer::plain();
        let rendered = diagnostic.render(&renderer, "main.rz", "1 + $").to_string();
        assert!(rendered.contains("error: unexpected `+`"), "{rendered}");
        assert!(rendered.contains("main.rz"), "{rendered}");
        assert!(rendered.contains("1 + $"), "{rendered}");
    }
}
