/// Elements and attributes nest shallowly in event XML; anything deeper than
/// this is either garbage or an attack on the parser.
const MAX_NAME_STACK_DEPTH: usize = 20;

/// A bounded LIFO of the element/attribute names currently open.
///
/// The decoder consults the top entry (the current key) and the one beneath
/// it (the enclosing element) when deciding how to label a value. Pushes past
/// the depth cap are silently dropped.
#[derive(Debug, Default)]
pub struct NameStack {
    names: Vec<String>,
}

impl NameStack {
    pub fn new() -> Self {
        NameStack {
            names: Vec::with_capacity(MAX_NAME_STACK_DEPTH),
        }
    }

    pub fn push(&mut self, name: &str) {
        if self.names.len() >= MAX_NAME_STACK_DEPTH {
            return;
        }
        self.names.push(name.to_owned());
    }

    pub fn pop(&mut self) {
        self.names.pop();
    }

    pub fn top(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    /// The name one level beneath the top, i.e. the enclosing element of the
    /// current key.
    pub fn parent(&self) -> Option<&str> {
        if self.names.len() < 2 {
            return None;
        }
        self.names.get(self.names.len() - 2).map(String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
