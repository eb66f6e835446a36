pub mod note;
pub mod sync;
