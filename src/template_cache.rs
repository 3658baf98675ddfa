use std::collections::HashMap;

/// A literal value captured from a template body, emitted verbatim for every
/// instance of the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFixedPair {
    pub key: String,
    pub value: String,
}

/// A substitution hole in a template body: the key it renders under and the
/// value type it was declared with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateArgPair {
    pub key: String,
    pub value_type: u8,
}

/// Everything the renderer needs to know about one template: the literal
/// pairs in the order the body produced them, and the keyed substitutions.
#[derive(Debug, Clone, Default)]
pub struct TemplateDescription {
    fixed: Vec<TemplateFixedPair>,
    args: HashMap<u16, TemplateArgPair>,
}

impl TemplateDescription {
    pub fn register_fixed_pair(&mut self, key: &str, value: &str) {
        self.fixed.push(TemplateFixedPair {
            key: key.to_owned(),
            value: value.to_owned(),
        });
    }

    /// The first registration for a substitution index wins; templates that
    /// reuse an index keep the key from its first appearance.
    pub fn register_arg_pair(&mut self, key: Option<&str>, value_type: u8, index: u16) {
        self.args.entry(index).or_insert_with(|| TemplateArgPair {
            key: key.unwrap_or("").to_owned(),
            value_type,
        });
    }

    pub fn fixed_pairs(&self) -> &[TemplateFixedPair] {
        &self.fixed
    }

    pub fn arg(&self, index: u16) -> Option<&TemplateArgPair> {
        self.args.get(&index)
    }
}

pub type TemplateId = u32;

/// Per-chunk mapping from a template's 32-bit short ID to its description.
///
/// Chunks are self-contained; a fresh cache is created for every chunk, which
/// keeps template lifetimes scoped and lets multiple files parse concurrently
/// without shared state.
#[derive(Debug, Default)]
pub struct TemplateCache(HashMap<TemplateId, TemplateDescription>);

impl TemplateCache {
    pub fn new() -> Self {
        TemplateCache(HashMap::new())
    }

    pub fn is_known(&self, id: TemplateId) -> bool {
        self.0.contains_key(&id)
    }

    /// Marks an ID as known before its body has been decoded, so the body's
    /// own token stream sees the ID as registered.
    pub fn register(&mut self, id: TemplateId) {
        self.0.entry(id).or_default();
    }

    pub fn insert(&mut self, id: TemplateId, description: TemplateDescription) {
        self.0.insert(id, description);
    }

    pub fn get(&self, id: TemplateId) -> Option<&TemplateDescription> {
        self.0.get(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
