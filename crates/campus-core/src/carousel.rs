//! Infinite-loop carousel state machine.
//!
//! The rendered track holds a clone of the last slide before the first one
//! and a clone of the first slide after the last one:
//!
//! ```text
//! position:  0        1   2   ...  len      len+1
//! slide:     len-1    0   1   ...  len-1    0
//! ```
//!
//! Moving onto a clone animates normally; when that transition ends the
//! position snaps to the real twin without animation, so the loop never
//! shows a jump.

/// Result of finishing a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// Nothing to do, the position is a real slide.
    Stay,
    /// Jump to this track position with transitions disabled.
    Snap(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carousel {
    len: usize,
    position: usize,
    animating: bool,
}

impl Carousel {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            position: if len > 1 { 1 } else { 0 },
            animating: false,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn loops(&self) -> bool {
        self.len > 1
    }

    /// Real slide index for each track position.
    pub fn track(&self) -> Vec<usize> {
        if !self.loops() {
            return (0..self.len).collect();
        }
        let mut track = Vec::with_capacity(self.len + 2);
        track.push(self.len - 1);
        track.extend(0..self.len);
        track.push(0);
        track
    }

    /// Current track position, clones included.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Index of the real slide being shown.
    pub fn active(&self) -> usize {
        if !self.loops() {
            return 0;
        }
        match self.position {
            0 => self.len - 1,
            p if p == self.len + 1 => 0,
            p => p - 1,
        }
    }

    pub fn next(&mut self) -> bool {
        self.step(1)
    }

    pub fn prev(&mut self) -> bool {
        self.step(-1)
    }

    /// Autoplay advance.
    pub fn tick(&mut self) -> bool {
        self.next()
    }

    fn step(&mut self, delta: isize) -> bool {
        if !self.loops() || self.animating {
            return false;
        }
        let target = self.position as isize + delta;
        if target < 0 || target > (self.len + 1) as isize {
            return false;
        }
        self.position = target as usize;
        self.animating = true;
        true
    }

    /// Jump to a real slide.
    pub fn go_to(&mut self, index: usize) -> bool {
        if !self.loops() || self.animating || index >= self.len {
            return false;
        }
        let target = index + 1;
        if target == self.position {
            return false;
        }
        self.position = target;
        self.animating = true;
        true
    }

    /// Called when the slide transition finishes.
    pub fn transition_end(&mut self) -> Settle {
        self.animating = false;
        if !self.loops() {
            return Settle::Stay;
        }
        if self.position == 0 {
            self.position = self.len;
            Settle::Snap(self.position)
        } else if self.position == self.len + 1 {
            self.position = 1;
            Settle::Snap(self.position)
        } else {
            Settle::Stay
        }
    }
}
