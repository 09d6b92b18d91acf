//! Flattening of rule trees into productions.
//!
//! Choices and optionals are distributed into separate productions, every
//! `repeat1` gets a hidden helper `rep -> rep rep | body`, and literals
//! become anonymous terminals.

use indexmap::IndexSet;
use razen_yellow::{FieldId, KindId, KindInfo, KindTable};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::builder::ConflictPolicy;
use crate::symbol::{Production, Step};
use crate::{
    Assoc, ConfigurationError, GrammarBuilder, LexicalGrammar, NonterminalId, ProductionKind, Rule,
    Symbol,
};

pub(crate) const START: NonterminalId = NonterminalId(0);

pub(crate) struct Grammar {
    pub(crate) name: String,
    pub(crate) version: u32,
    pub(crate) kinds: KindTable,
    pub(crate) terminal_count: usize,
    pub(crate) productions: Vec<Production>,
    pub(crate) repeats: Vec<bool>,
    pub(crate) lexical: LexicalGrammar,
    pub(crate) policy: ConflictPolicy,
}

impl Grammar {
    pub(crate) fn nonterminal_count(&self) -> usize {
        self.kinds.len() - self.terminal_count
    }

    pub(crate) fn symbol_kind(&self, symbol: Symbol) -> KindId {
        match symbol {
            Symbol::Terminal(kind) => kind,
            Symbol::Nonterminal(id) => KindId((self.terminal_count + id.index()) as u16),
        }
    }

    pub(crate) fn symbol_name(&self, symbol: Symbol) -> &str {
        self.kinds.name(self.symbol_kind(symbol))
    }
}

#[derive(Clone, Copy, Default)]
struct Context {
    precedence: i32,
    assoc: Assoc,
    field: Option<FieldId>,
}

#[derive(Clone, Default)]
struct Alternative {
    steps: Vec<Step>,
    /// Precedence of the last step, or of the context of an empty sequence.
    end: Option<(i32, Assoc)>,
}

struct Normalizer<'b> {
    kinds: KindTable,
    terminal_count: usize,
    symbols: FxHashMap<&'b str, Symbol>,
    literals: FxHashMap<&'b str, KindId>,
    productions: Vec<Production>,
    repeats: Vec<bool>,
    rule: &'b str,
    repeat_counter: usize,
}

pub(crate) fn normalize(builder: &GrammarBuilder) -> Result<Grammar, ConfigurationError> {
    let Some(start) = builder.rules.keys().next() else {
        return Err(ConfigurationError::MissingStart(builder.name.clone()));
    };
    if start.starts_with('_') {
        return Err(ConfigurationError::HiddenStart(start.clone()));
    }
    if let Some(duplicate) = builder.duplicates.first() {
        return Err(ConfigurationError::DuplicateRule(duplicate.clone()));
    }

    let mut seen = FxHashSet::default();
    for name in builder.tokens.iter().chain(&builder.externals).chain(builder.rules.keys()) {
        if !seen.insert(name.as_str()) {
            return Err(ConfigurationError::DuplicateRule(name.clone()));
        }
    }
    if let Some(word) = &builder.word
        && !builder.tokens.contains(word)
    {
        return Err(ConfigurationError::InvalidWord(word.clone()));
    }

    let mut kinds = KindTable::new();
    let mut symbols = FxHashMap::default();
    let mut lexical = LexicalGrammar::default();

    kinds.push(KindInfo { name: "end".into(), named: true, visible: true, terminal: true });
    kinds.push(KindInfo { name: "ERROR".into(), named: true, visible: true, terminal: true });
    for (names, out) in
        [(&builder.tokens, &mut lexical.tokens), (&builder.externals, &mut lexical.externals)]
    {
        for name in names {
            let kind = kinds.push(KindInfo {
                name: name.as_str().into(),
                named: true,
                visible: !name.starts_with('_'),
                terminal: true,
            });
            symbols.insert(name.as_str(), Symbol::Terminal(kind));
            out.push(kind);
        }
    }
    lexical.word = builder.word.as_deref().and_then(|word| match symbols.get(word) {
        Some(Symbol::Terminal(kind)) => Some(*kind),
        _ => None,
    });

    let mut texts = IndexSet::new();
    for (name, rule) in &builder.rules {
        let mut empty = false;
        rule.for_each_literal(&mut |text| {
            empty |= text.is_empty();
            texts.insert(text);
        });
        if empty {
            return Err(ConfigurationError::EmptyLiteral(name.clone()));
        }
    }
    let mut literals = FxHashMap::default();
    for text in texts {
        let kind =
            kinds.push(KindInfo { name: text.into(), named: false, visible: true, terminal: true });
        literals.insert(text, kind);
        lexical.literals.push((text.into(), kind));
    }

    let terminal_count = kinds.len();
    for (index, name) in builder.rules.keys().enumerate() {
        kinds.push(KindInfo {
            name: name.as_str().into(),
            named: true,
            visible: !name.starts_with('_'),
            terminal: false,
        });
        symbols.insert(name.as_str(), Symbol::Nonterminal(NonterminalId(index as u16)));
    }

    let mut normalizer = Normalizer {
        kinds,
        terminal_count,
        symbols,
        literals,
        productions: Vec::new(),
        repeats: vec![false; builder.rules.len()],
        rule: start.as_str(),
        repeat_counter: 0,
    };

    for (index, (name, rule)) in builder.rules.iter().enumerate() {
        normalizer.rule = name.as_str();
        normalizer.repeat_counter = 0;
        let lhs = NonterminalId(index as u16);
        for alternative in normalizer.expand(rule, Context::default())? {
            normalizer.push(lhs, alternative, Context::default(), ProductionKind::Plain);
        }
    }

    if normalizer.kinds.len() > u16::MAX as usize {
        return Err(ConfigurationError::TooMany { what: "symbols", limit: u16::MAX as usize });
    }

    let grammar = Grammar {
        name: builder.name.clone(),
        version: builder.version,
        kinds: normalizer.kinds,
        terminal_count,
        productions: normalizer.productions,
        repeats: normalizer.repeats,
        lexical,
        policy: builder.conflict_policy,
    };
    check_productive(&grammar)?;

    tracing::debug!(
        terminals = grammar.terminal_count,
        nonterminals = grammar.nonterminal_count(),
        productions = grammar.productions.len(),
        "normalized grammar"
    );
    Ok(grammar)
}

impl<'b> Normalizer<'b> {
    fn step(&self, symbol: Symbol, context: Context) -> Alternative {
        let step = Step { symbol, field: context.field, precedence: context.precedence };
        Alternative { steps: vec![step], end: Some((context.precedence, context.assoc)) }
    }

    fn push(
        &mut self,
        lhs: NonterminalId,
        alt: Alternative,
        context: Context,
        kind: ProductionKind,
    ) {
        let (precedence, assoc) = alt.end.unwrap_or((context.precedence, context.assoc));
        self.productions.push(Production { lhs, steps: alt.steps, precedence, assoc, kind });
    }

    fn expand(
        &mut self,
        rule: &'b Rule,
        context: Context,
    ) -> Result<Vec<Alternative>, ConfigurationError> {
        Ok(match rule {
            Rule::Blank => {
                vec![Alternative { steps: Vec::new(), end: None }]
            }
            Rule::Literal(text) => {
                vec![self.step(Symbol::Terminal(self.literals[&**text]), context)]
            }
            Rule::Symbol(name) => {
                let Some(&symbol) = self.symbols.get(&**name) else {
                    return Err(ConfigurationError::UndefinedSymbol {
                        rule: self.rule.to_owned(),
                        symbol: name.to_string(),
                    });
                };
                vec![self.step(symbol, context)]
            }
            Rule::Seq(rules) => {
                let mut product = vec![Alternative::default()];
                for rule in rules {
                    let parts = self.expand(rule, context)?;
                    product = product
                        .iter()
                        .flat_map(|prefix| {
                            parts.iter().map(move |part| Alternative {
                                steps: prefix.steps.iter().chain(&part.steps).cloned().collect(),
                                end: part.end.or(prefix.end),
                            })
                        })
                        .collect();
                }
                product
            }
            Rule::Choice(rules) => {
                let mut alternatives = Vec::new();
                for rule in rules {
                    alternatives.extend(self.expand(rule, context)?);
                }
                alternatives
            }
            Rule::Repeat(body) => {
                let helper = self.repeat(body, context)?;
                vec![self.step(Symbol::Nonterminal(helper), context)]
            }
            Rule::Prec { precedence, assoc, rule } => {
                self.expand(rule, Context { precedence: *precedence, assoc: *assoc, ..context })?
            }
            Rule::Field { name, rule } => {
                let field = self.kinds.push_field(name);
                self.expand(rule, Context { field: Some(field), ..context })?
            }
        })
    }

    fn repeat(
        &mut self,
        body: &'b Rule,
        context: Context,
    ) -> Result<NonterminalId, ConfigurationError> {
        self.repeat_counter += 1;
        let id = NonterminalId((self.kinds.len() - self.terminal_count) as u16);
        self.kinds.push(KindInfo {
            name: format!("{}_repeat{}", self.rule.trim_start_matches('_'), self.repeat_counter)
                .into(),
            named: true,
            visible: false,
            terminal: false,
        });
        self.repeats.push(true);

        let inner = Context { field: None, ..context };
        let alternatives = self.expand(body, inner)?;
        for alternative in alternatives {
            if alternative.steps.is_empty() {
                return Err(ConfigurationError::EmptyRepeat(self.rule.to_owned()));
            }
            self.push(id, alternative, inner, ProductionKind::RepeatBase);
        }
        let half = Step { symbol: Symbol::Nonterminal(id), field: None, precedence: 0 };
        let steps = vec![half.clone(), half];
        let join = Alternative { steps, end: None };
        self.push(id, join, Context::default(), ProductionKind::RepeatJoin);
        Ok(id)
    }
}

fn check_productive(grammar: &Grammar) -> Result<(), ConfigurationError> {
    let mut productive = vec![false; grammar.nonterminal_count()];
    loop {
        let mut changed = false;
        for production in &grammar.productions {
            if productive[production.lhs.index()] {
                continue;
            }
            let derives = production.steps.iter().all(|step| match step.symbol {
                Symbol::Terminal(_) => true,
                Symbol::Nonterminal(id) => productive[id.index()],
            });
            if derives {
                productive[production.lhs.index()] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    match productive.iter().position(|&derives| !derives) {
        Some(index) => Err(ConfigurationError::UnproductiveRule(
            grammar.symbol_name(Symbol::Nonterminal(NonterminalId(index as u16))).to_owned(),
        )),
        None => Ok(()),
    }
}
