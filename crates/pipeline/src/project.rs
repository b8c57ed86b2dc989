//! Projection seam: entity → DTO shape.
//!
//! Every entity exposes up to three read shapes derived from the same record
//! and never stored independently: a summary (id + core fields, nested
//! inside other details), a list item (minimal display fields), and a
//! details shape (full fields plus resolved reference labels and derived
//! counts, which handlers supply because the projection cannot know them).

/// Build a DTO shape from an entity. One impl per (entity, shape) pair.
pub trait ProjectFrom<E>: Sized {
    fn project(entity: &E) -> Self;
}

/// Project a whole collection, preserving order.
pub fn project_all<E, P: ProjectFrom<E>>(items: &[E]) -> Vec<P> {
    items.iter().map(P::project).collect()
}
