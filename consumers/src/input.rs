//! Consumer input.

use ember_model::BlockElement;
use ember_types::Height;

/// Where a candidate chain part originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    /// Origin unknown.
    Unknown,
    /// Produced locally (harvested or re-queued).
    Local,
    /// Pulled from a remote peer during synchronization.
    RemotePull,
    /// Pushed unsolicited by a remote peer.
    RemotePush,
}

/// An ordered candidate suffix of block elements tagged with its source.
#[derive(Debug)]
pub struct ConsumerInput {
    elements: Vec<BlockElement>,
    source: InputSource,
}

impl ConsumerInput {
    pub fn new(elements: Vec<BlockElement>, source: InputSource) -> Self {
        Self { elements, source }
    }

    pub fn source(&self) -> InputSource {
        self.source
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn blocks(&self) -> &[BlockElement] {
        &self.elements
    }

    /// Mutable access for the processor, which fills in per-element derived
    /// fields such as generation hashes.
    pub fn blocks_mut(&mut self) -> &mut [BlockElement] {
        &mut self.elements
    }

    /// Height of the first candidate block; `None` for an empty input.
    pub fn first_height(&self) -> Option<Height> {
        self.elements.first().map(BlockElement::height)
    }

    /// Whether the candidate heights form a contiguous ascending run.
    pub fn has_contiguous_heights(&self) -> bool {
        self.elements
            .windows(2)
            .all(|pair| pair[1].height() == pair[0].height() + 1)
    }
}
