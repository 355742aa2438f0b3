//! # options
//!
//! per adapter configuration of the computations it starts
//!

/// default generator stack size, in words
pub const DEFAULT_STACK_SIZE: usize = 0x4000;

/// smallest generator stack size accepted, in words
pub const MIN_STACK_SIZE: usize = 0x400;

/// computation options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    stack_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl Options {
    /// options with the default stack size
    pub fn new() -> Self {
        Options::default()
    }

    /// set the generator stack size in words
    pub fn stack_size(mut self, size: usize) -> Self {
        if size < MIN_STACK_SIZE {
            debug!("stack size {size:#x} raised to {MIN_STACK_SIZE:#x}");
        }
        self.stack_size = size.max(MIN_STACK_SIZE);
        self
    }

    /// the generator stack size in words
    #[inline]
    pub fn get_stack_size(&self) -> usize {
        self.stack_size
    }
}
