//! Dense graph identifiers.
//!
//! Nodes and edges are numbered `0..n` by `RoadNetworkBuilder`, so an id is
//! also the position of that element in every per-node or per-edge `Vec`,
//! including the per-request weight overlay.  Sub-networks renumber from
//! zero and keep a map back to their parent ids.

use std::fmt;

macro_rules! graph_id {
    ($(#[$attr:meta])* $name:ident, $prefix:literal) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u32);

        impl $name {
            /// Marks "unset" in predecessor and lookup tables.
            pub const INVALID: $name = $name(u32::MAX);

            /// `None` if `index` does not fit below the sentinel.
            pub fn from_index(index: usize) -> Option<Self> {
                u32::try_from(index).ok().filter(|&i| i != u32::MAX).map($name)
            }

            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, concat!($prefix, "{}"), self.0)
                } else {
                    f.write_str(concat!($prefix, "?"))
                }
            }
        }
    };
}

graph_id! {
    /// An intersection of the road network.
    NodeId, "n"
}

graph_id! {
    /// One direction of a street segment.
    EdgeId, "e"
}
