//! Records with a stable identity (categories, accounts).

/// A record identified by its key rather than its contents.
///
/// Renaming a category keeps it the same category.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
