//! Domain layer: the basket aggregate, its items, money and the ports the
//! application layer drives.

pub mod basket;
pub mod freeze;
pub mod item;
pub mod money;
pub mod payload;
pub mod ports;
