//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity modification.
#[derive(Clone, Copy, Debug)]
pub struct Modification;

/// Marker type describing an entity deletion.
#[derive(Clone, Copy, Debug)]
pub struct Deletion;

/// Marker type describing a beginning of a time span.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type describing an end of a time span.
#[derive(Clone, Copy, Debug)]
pub struct End;
