//! Determinism helpers shared by the classifier, resolver, and id assignment.

pub mod normalize_text;
pub mod stable_sort;
