// ABOUTME: Sealed trait pattern for runtime traits.
// ABOUTME: Prevents external implementations so traits can grow without breakage.

/// Only runtime types inside this crate implement the capability traits.
pub trait Sealed {}
