use core::fmt;

/// Slot index plus generation. Implemented by every handle an [`crate::Arena`] hands out.
pub trait Handle: Copy + Eq {
    fn from_parts(index: u32, generation: u32) -> Self;
    fn index(self) -> u32;
    fn generation(self) -> u32;
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        pub struct $name { index: u32, generation: u32 }

        impl Handle for $name {
            #[inline] fn from_parts(index: u32, generation: u32) -> Self { Self { index, generation } }
            #[inline] fn index(self) -> u32 { self.index }
            #[inline] fn generation(self) -> u32 { self.generation }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({}v{})"), self.index, self.generation)
            }
        }
    };
}

handle!(
    /// Body handle. Stops resolving once the body is destroyed, even if the slot is reused.
    BodyId
);
handle!(ConstraintId);
handle!(StepListenerId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_index_and_generation() {
        let id = BodyId::from_parts(3, 1);
        assert_eq!(id.to_string(), "BodyId(3v1)");
        assert_eq!(ConstraintId::from_parts(0, 0).to_string(), "ConstraintId(0v0)");
    }

    #[test]
    fn ordering_follows_slot_then_generation() {
        let a = BodyId::from_parts(1, 5);
        let b = BodyId::from_parts(2, 0);
        assert!(a < b);
        assert!(BodyId::from_parts(1, 4) < a);
    }
}
