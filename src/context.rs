/// Dynamic scope of one generation pass.
///
/// Passed by value down the recursion, so a container body can never leak its
/// nested flag into the siblings that follow it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenContext {
    /// True while assembling the body of an enclosing conditional.
    pub nested: bool,
    /// Aggregate nesting depth, drives indentation of multi-line literals.
    pub depth: usize,
}

impl GenContext {
    pub fn top_level() -> Self {
        Self::default()
    }

    /// Runs `body` with the nested flag set to `active`. Entering an active
    /// scope also opens one aggregate level.
    pub fn with_nested<T>(self, active: bool, body: impl FnOnce(GenContext) -> T) -> T {
        let inner = GenContext {
            nested: active,
            depth: if active { self.depth + 1 } else { self.depth },
        };
        body(inner)
    }
}

/// Leading whitespace for one aggregate element at `depth`.
pub fn indent(depth: usize) -> String {
    " ".repeat(depth * 4)
}
