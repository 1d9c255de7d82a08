use super::LineSide;

/// Grammar continuation state kept per side of a hunk.
///
/// Removed lines continue from the last removed line (or the shared context
/// before them), added lines likewise from the last added line. Context
/// lines continue from the last context line, falling back to the add side
/// when a hunk starts with changes.
#[derive(Debug, Clone)]
pub struct GrammarSlots<S> {
    pub context: Option<S>,
    pub add: Option<S>,
    pub remove: Option<S>,
}

impl<S> Default for GrammarSlots<S> {
    fn default() -> Self {
        Self {
            context: None,
            add: None,
            remove: None,
        }
    }
}

impl<S: Clone> GrammarSlots<S> {
    /// State to resume from when tokenizing a line on `side`.
    pub fn prior(&self, side: LineSide) -> Option<S> {
        let slot = match side {
            LineSide::Remove => self.remove.as_ref().or(self.context.as_ref()),
            LineSide::Add => self.add.as_ref().or(self.context.as_ref()),
            LineSide::Context => self.context.as_ref().or(self.add.as_ref()),
        };
        slot.cloned()
    }

    /// Records the state produced by a line on `side`.
    ///
    /// A context line ends a change block, so the add and remove slots are
    /// cleared and the next block forks from this context state.
    pub fn advance(&mut self, side: LineSide, next: S) {
        match side {
            LineSide::Context => {
                self.context = Some(next);
                self.add = None;
                self.remove = None;
            }
            LineSide::Add => self.add = Some(next),
            LineSide::Remove => self.remove = Some(next),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
