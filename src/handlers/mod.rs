pub mod gacha;

pub use gacha::{gacha_config, gacha_internal_config};
