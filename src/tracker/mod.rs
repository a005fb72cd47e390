//! The running timer. [timer::Timer] owns the transitions between "idle" and "running" and turns
//! a stopped timer into a stored session.

pub mod timer;
