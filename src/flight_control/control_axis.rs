use std::ops::{Index, IndexMut};
use strum_macros::{Display, EnumIter};

/// The four closed-loop control axes.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy, Hash, EnumIter, serde::Serialize, serde::Deserialize)]
pub enum ControlAxis {
    Roll,
    Pitch,
    Heading,
    Height,
}

impl ControlAxis {
    const fn slot(self) -> usize {
        match self {
            ControlAxis::Roll => 0,
            ControlAxis::Pitch => 1,
            ControlAxis::Heading => 2,
            ControlAxis::Height => 3,
        }
    }
}

/// One value per [`ControlAxis`], indexed by the axis itself.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct PerAxis<T> {
    slots: [T; 4],
}

impl<T: Copy> PerAxis<T> {
    /// Values in `Roll, Pitch, Heading, Height` order.
    pub const fn new(roll: T, pitch: T, heading: T, height: T) -> Self {
        Self { slots: [roll, pitch, heading, height] }
    }

    pub const fn splat(value: T) -> Self { Self { slots: [value; 4] } }
}

impl<T> Index<ControlAxis> for PerAxis<T> {
    type Output = T;

    fn index(&self, axis: ControlAxis) -> &Self::Output { &self.slots[axis.slot()] }
}

impl<T> IndexMut<ControlAxis> for PerAxis<T> {
    fn index_mut(&mut self, axis: ControlAxis) -> &mut Self::Output { &mut self.slots[axis.slot()] }
}
