pub mod alerts;
pub mod crypto;
pub mod fiat;
pub mod fusion;
pub mod pipeline;
pub mod signals;
