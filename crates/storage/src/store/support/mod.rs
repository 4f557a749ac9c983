#![forbid(unsafe_code)]

mod counters;
mod rows;
mod schema;
mod shifts;

pub(super) use counters::*;
pub(super) use rows::*;
pub(super) use schema::*;
pub(super) use shifts::*;
