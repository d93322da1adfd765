//! Fan-in primitive
//!
//! A [`Gather`] buffers the results of a scatter whose width is only known at
//! run time and releases them exactly once, when the last expected result
//! arrives. It is not thread-safe on its own; [`super::RunContext`] keeps it
//! behind a mutex and every method here runs to completion without yielding,
//! so the count check and the drain can never interleave with another arrival.

use crate::domain::WorkflowError;

#[derive(Debug)]
pub struct Gather<T> {
    expected: Option<usize>,
    buffer: Vec<T>,
    arrived: usize,
    released: bool,
}

impl<T> Default for Gather<T> {
    fn default() -> Self {
        Self {
            expected: None,
            buffer: Vec::new(),
            arrived: 0,
            released: false,
        }
    }
}

impl<T> Gather<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the fan-out width
    ///
    /// A width of zero is satisfied immediately and returns the (empty)
    /// released set, so callers handle it through the same release path as
    /// a completed gather.
    pub fn expect(&mut self, width: usize) -> Result<Option<Vec<T>>, WorkflowError> {
        self.expected = Some(width);
        self.try_release()
    }

    /// Buffers one arrival; returns the whole set, in arrival order, once complete
    pub fn offer(&mut self, item: T) -> Result<Option<Vec<T>>, WorkflowError> {
        let expected = self.expected.ok_or(WorkflowError::FanOutWidthUnset)?;

        self.arrived += 1;
        if self.released || self.arrived > expected {
            return Err(WorkflowError::FanOutOverflow {
                expected,
                arrived: self.arrived,
            });
        }

        self.buffer.push(item);
        self.try_release()
    }

    /// Number of arrivals buffered and not yet released
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn expected(&self) -> Option<usize> {
        self.expected
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn try_release(&mut self) -> Result<Option<Vec<T>>, WorkflowError> {
        match self.expected {
            Some(expected) if !self.released && self.buffer.len() == expected => {
                self.released = true;
                Ok(Some(std::mem::take(&mut self.buffer)))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_releases_once_in_arrival_order() {
        let mut gather = Gather::new();
        assert!(gather.expect(3).unwrap().is_none());

        assert!(gather.offer("b").unwrap().is_none());
        assert!(gather.offer("c").unwrap().is_none());
        assert_eq!(gather.pending(), 2);

        let released = gather.offer("a").unwrap().unwrap();
        assert_eq!(released, vec!["b", "c", "a"]);
        assert!(gather.is_released());
        assert_eq!(gather.pending(), 0);
    }

    #[test]
    fn test_zero_width_releases_immediately() {
        let mut gather: Gather<u32> = Gather::new();
        let released = gather.expect(0).unwrap();
        assert_eq!(released, Some(vec![]));
    }

    #[test]
    fn test_offer_before_width_is_an_error() {
        let mut gather = Gather::new();
        assert!(matches!(gather.offer(1), Err(WorkflowError::FanOutWidthUnset)));
    }

    #[test]
    fn test_extra_arrival_is_an_error() {
        let mut gather = Gather::new();
        gather.expect(1).unwrap();
        assert!(gather.offer(1).unwrap().is_some());

        let err = gather.offer(2).unwrap_err();
        assert!(matches!(err, WorkflowError::FanOutOverflow { expected: 1, arrived: 2 }));
    }
}
