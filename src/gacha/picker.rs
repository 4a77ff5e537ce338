use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{AppError, AppResult};

use super::catalog::{BadgeCatalog, BadgeDefinition};
use super::rarity::RarityTier;

/// 在目录中指定稀有度的徽章里等概率选出一个
///
/// 该稀有度没有任何徽章时返回 `CatalogMisconfigured`，绝不降级为默认徽章。
pub fn pick_badge<'a, R: Rng + ?Sized>(
    catalog: &'a BadgeCatalog,
    tier: RarityTier,
    rng: &mut R,
) -> AppResult<&'a BadgeDefinition> {
    let pool: Vec<&BadgeDefinition> = catalog.by_rarity(tier).collect();
    match pool.choose(rng) {
        Some(badge) => Ok(*badge),
        None => {
            log::error!(
                "Badge catalog has no entries for rarity tier {}",
                tier.value()
            );
            Err(AppError::CatalogMisconfigured(format!(
                "No badges configured for rarity tier {}",
                tier.value()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    #[test]
    fn test_pick_stays_within_tier() {
        let catalog = BadgeCatalog::builtin();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for tier in RarityTier::ALL {
            for _ in 0..100 {
                let badge = pick_badge(&catalog, tier, &mut rng).unwrap();
                assert_eq!(badge.rarity, tier);
            }
        }
    }

    #[test]
    fn test_pick_is_roughly_uniform() {
        let catalog = BadgeCatalog::builtin();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let size = catalog.by_rarity(RarityTier::Common).count();
        let mut counts: HashMap<String, u32> = HashMap::new();
        let n = 40_000u32;
        for _ in 0..n {
            let badge = pick_badge(&catalog, RarityTier::Common, &mut rng).unwrap();
            *counts.entry(badge.code.clone()).or_default() += 1;
        }
        assert_eq!(counts.len(), size);
        let expected = f64::from(n) / size as f64;
        for count in counts.values() {
            assert!((f64::from(*count) - expected).abs() < expected * 0.05);
        }
    }

    #[test]
    fn test_fixed_rng_selects_tier_and_badge() {
        use crate::gacha::select_rarity;
        use rand::rngs::mock::StepRng;

        // 同一个固定随机源先决定稀有度再选徽章
        let catalog = BadgeCatalog::builtin();
        let mut rng = StepRng::new(0xFFFF_FFFF_0000_0000, 0);
        let tier = select_rarity(0, 0, &mut rng);
        assert_eq!(tier, RarityTier::Common);
        let badge = pick_badge(&catalog, tier, &mut rng).unwrap();
        assert_eq!(badge.rarity, RarityTier::Common);
        assert_eq!(badge, catalog.by_rarity(RarityTier::Common).next().unwrap());
    }

    #[test]
    fn test_empty_tier_is_fatal() {
        let badges = BadgeCatalog::builtin()
            .all()
            .iter()
            .filter(|b| b.rarity != RarityTier::Legendary)
            .cloned()
            .collect();
        let catalog = BadgeCatalog::new(badges).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let result = pick_badge(&catalog, RarityTier::Legendary, &mut rng);
        assert!(matches!(result, Err(AppError::CatalogMisconfigured(_))));
    }
}
