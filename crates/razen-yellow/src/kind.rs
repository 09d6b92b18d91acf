//! Integer-indexed node kinds and the table that names them.

use rustc_hash::FxHashMap;

/// Index of a grammar symbol in a [`KindTable`].
///
/// Terminals come first, nonterminals follow. The first two ids are reserved
/// for the end-of-input token and for error tokens and nodes.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct KindId(pub u16);

impl KindId {
    pub const END: Self = Self(0);
    pub const ERROR: Self = Self(1);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a field name in a [`KindTable`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FieldId(pub u16);

/// Automaton state a subtree was pushed from.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StateId(pub u16);

impl StateId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a set of terminals the lexer may produce.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LexMode(pub u16);

impl LexMode {
    /// Every terminal except the immediate ones is acceptable.
    pub const ERROR: Self = Self(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindInfo {
    pub name: Box<str>,
    /// Named kinds come from rule or token names, anonymous ones from literals.
    pub named: bool,
    pub visible: bool,
    pub terminal: bool,
}

/// Names and properties of every kind produced by a language.
#[derive(Clone, Debug, Default)]
pub struct KindTable {
    kinds: Vec<KindInfo>,
    fields: Vec<Box<str>>,
    by_name: FxHashMap<Box<str>, KindId>,
}

impl KindTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a kind. Later kinds with the same name shadow earlier ones in
    /// [`KindTable::kind_id`] only when the earlier one is anonymous.
    pub fn push(&mut self, info: KindInfo) -> KindId {
        let id = KindId(self.kinds.len() as u16);
        match self.by_name.get(&info.name) {
            Some(existing) if self.kinds[existing.index()].named => {}
            _ => {
                self.by_name.insert(info.name.clone(), id);
            }
        }
        self.kinds.push(info);
        id
    }

    pub fn push_field(&mut self, name: &str) -> FieldId {
        if let Some(index) = self.fields.iter().position(|field| &**field == name) {
            return FieldId(index as u16);
        }
        self.fields.push(name.into());
        FieldId(self.fields.len() as u16 - 1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    #[inline]
    pub fn info(&self, kind: KindId) -> &KindInfo {
        &self.kinds[kind.index()]
    }

    pub fn name(&self, kind: KindId) -> &str {
        self.kinds.get(kind.index()).map_or("<unknown>", |info| &info.name)
    }

    pub fn kind_id(&self, name: &str) -> Option<KindId> {
        self.by_name.get(name).copied()
    }

    pub fn field_name(&self, field: FieldId) -> &str {
        &self.fields[field.0 as usize]
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.fields.iter().position(|field| &**field == name).map(|index| FieldId(index as u16))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (KindId, &KindInfo)> {
        self.kinds.iter().enumerate().map(|(index, info)| (KindId(index as u16), info))
    }
}
