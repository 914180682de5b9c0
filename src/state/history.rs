use std::collections::VecDeque;

/// Number of prior states retained on the undo stack.
pub const UNDO_CAPACITY: usize = 10;

/// Bounded linear undo/redo history of snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoHistory<T> {
    undo: VecDeque<T>,
    redo: VecDeque<T>,
    capacity: usize,
}

impl<T> Default for UndoHistory<T> {
    fn default() -> Self {
        Self::with_capacity(UNDO_CAPACITY)
    }
}

impl<T: Clone> UndoHistory<T> {
    /// Empty history with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a history from persisted stacks (oldest first), trimming to the capacity.
    pub fn from_stacks(undo: Vec<T>, redo: Vec<T>) -> Self {
        let mut history = Self::default();
        history.undo = undo.into();
        history.redo = redo.into();
        history.trim();
        history
    }
}

impl<T> UndoHistory<T> {
    /// Empty history keeping at most `capacity` states per stack.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo: VecDeque::with_capacity(capacity),
            redo: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Record the state that precedes a mutating command.
    ///
    /// Evicts the oldest state past the capacity and invalidates the redo stack.
    pub fn push(&mut self, snapshot: T) {
        self.undo.push_back(snapshot);
        self.redo.clear();
        self.trim();
    }

    /// Step back: returns the previous state and stores `current` for redo.
    ///
    /// `None` when there is nothing to undo; `current` is then dropped unchanged.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.undo.pop_back()?;
        self.redo.push_back(current);
        self.trim();
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo.pop_back()?;
        self.undo.push_back(current);
        self.trim();
        Some(next)
    }

    /// Forget both stacks.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Whether an undo would change anything.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether a redo would change anything.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Undo stack, oldest first.
    pub fn undo_stack(&self) -> impl Iterator<Item = &T> {
        self.undo.iter()
    }

    /// Redo stack, oldest first.
    pub fn redo_stack(&self) -> impl Iterator<Item = &T> {
        self.redo.iter()
    }

    fn trim(&mut self) {
        while self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
        while self.redo.len() > self.capacity {
            self.redo.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_on_empty_stack_is_noop() {
        let mut history: UndoHistory<u32> = UndoHistory::new();
        assert_eq!(history.undo(7), None);
        assert_eq!(history.redo(7), None);
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_then_redo_restores_state() {
        let mut history = UndoHistory::new();
        let mut state = 0;
        for next in 1..=3 {
            history.push(state);
            state = next;
        }

        let before_undo = state;
        state = history.undo(state).unwrap();
        assert_eq!(state, 2);
        state = history.redo(state).unwrap();
        assert_eq!(state, before_undo);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut history = UndoHistory::new();
        for state in 0..15 {
            history.push(state);
        }
        let retained: Vec<_> = history.undo_stack().copied().collect();
        assert_eq!(retained, (5..15).collect::<Vec<_>>());

        let mut current = 15;
        let mut steps = 0;
        while let Some(previous) = history.undo(current) {
            current = previous;
            steps += 1;
        }
        assert_eq!(steps, UNDO_CAPACITY);
        assert_eq!(current, 5);
    }

    #[test]
    fn push_clears_redo() {
        let mut history = UndoHistory::new();
        history.push(1);
        history.undo(2);
        assert!(history.can_redo());

        history.push(1);
        assert!(!history.can_redo());
    }

    #[test]
    fn restored_stacks_are_trimmed() {
        let history = UndoHistory::from_stacks((0..12).collect(), vec![1, 2]);
        assert_eq!(history.undo_stack().count(), UNDO_CAPACITY);
        assert_eq!(history.undo_stack().next(), Some(&2));
        assert_eq!(history.redo_stack().count(), 2);
    }
}
