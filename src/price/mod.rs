pub mod notation;

pub use notation::{decode_price, with_currency};
