//! Reusable widgets shared by screens.

pub mod entity_select;
