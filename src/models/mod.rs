pub mod gacha;

pub use gacha::*;
