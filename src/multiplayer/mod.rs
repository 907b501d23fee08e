//! Competitive layers on top of the session engine.
//!
//! Both engines own their state independently of the session and are
//! synchronized only through score-update calls; they emit ranking and
//! score-change events through the same pending-queue pattern the
//! session state uses.

pub mod elimination;
pub mod team;
