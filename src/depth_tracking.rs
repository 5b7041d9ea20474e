use crate::{
    element::Element,
    error::{Error, Result},
};

/// Tracks how many elements each open container still expects, so nesting can be followed
/// without recursion.
#[derive(Clone, Debug)]
pub struct DepthTracker {
    tracking: Vec<usize>,
    max_depth: usize,
}

impl DepthTracker {
    /// Create a new depth tracker
    pub fn new(max_depth: usize) -> Self {
        Self {
            tracking: Vec::new(),
            max_depth,
        }
    }

    /// Update the depth tracker on each new element. `offset` is only used for error reporting.
    pub fn update_elem(&mut self, elem: &Element, offset: usize) -> Result<()> {
        // Subtract from count for next element
        if let Some(v) = self.tracking.last_mut() {
            *v = v.saturating_sub(1);
        }

        // Increase nest depth if this is a nesting element
        match elem {
            Element::Map(len) => self.tracking.push(len.saturating_mul(2)), // 2 elements per map item
            Element::Array(len) => self.tracking.push(*len),
            _ => (),
        }

        // Check to see if we hit the nesting limit
        if self.tracking.len() > self.max_depth {
            return Err(Error::NestingTooDeep {
                offset,
                max: self.max_depth,
            });
        }

        self.purge_zeros();
        Ok(())
    }

    /// Number of containers still waiting on elements.
    pub fn depth(&self) -> usize {
        self.tracking.len()
    }

    /// True once every opened container has received all of its elements.
    pub fn is_complete(&self) -> bool {
        self.tracking.is_empty()
    }

    /// Drop any depth tracking elements that have hit zero
    pub fn purge_zeros(&mut self) {
        while let Some(0) = self.tracking.last() {
            self.tracking.pop();
        }
    }

    /// Drop a depth before we've seen enough elements. This can be used by map/seq serializers
    /// that didn't know their total length ahead of time. This way, they can put in a
    /// maximally-sized map/array element, then run through the depth tracker as normal, calling
    /// this when done.
    pub fn early_end(&mut self) {
        self.tracking.pop();
        self.purge_zeros();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nested_counts() {
        let mut tracker = DepthTracker::new(8);
        tracker.update_elem(&Element::Map(1), 0).unwrap();
        tracker.update_elem(&Element::Str("a"), 1).unwrap();
        assert!(!tracker.is_complete());
        assert_eq!(tracker.depth(), 1);
        tracker.update_elem(&Element::Array(2), 3).unwrap();
        tracker.update_elem(&Element::Nil, 4).unwrap();
        assert!(!tracker.is_complete());
        assert_eq!(tracker.depth(), 2);
        tracker.update_elem(&Element::Array(0), 5).unwrap();
        assert!(tracker.is_complete());
    }

    #[test]
    fn depth_limit() {
        let mut tracker = DepthTracker::new(2);
        tracker.update_elem(&Element::Array(1), 0).unwrap();
        tracker.update_elem(&Element::Array(1), 1).unwrap();
        assert_eq!(
            tracker.update_elem(&Element::Array(1), 2),
            Err(Error::NestingTooDeep { offset: 2, max: 2 })
        );
    }
}
