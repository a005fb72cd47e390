//! Notes and goals organised into folders. Everything lives in a single json document which is
//! locked exclusively for every mutation, see [store::NotesStore].

pub mod entities;
pub mod filter;
pub mod store;
