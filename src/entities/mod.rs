pub mod gacha_daily_draws;
pub mod gacha_draw_history;
pub mod gacha_pity_counters;
pub mod gacha_ticket_balances;
pub mod user_badges;

pub use gacha_daily_draws as daily_draw_entity;
pub use gacha_draw_history as draw_history_entity;
pub use gacha_draw_history::DrawKind;
pub use gacha_pity_counters as pity_counter_entity;
pub use gacha_ticket_balances as ticket_balance_entity;
pub use user_badges as user_badge_entity;
