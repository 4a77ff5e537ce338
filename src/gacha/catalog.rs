use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::rarity::RarityTier;

/// 徽章定义（静态配置，运行期只读）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub code: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub rarity: RarityTier,
    pub category: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    badges: Vec<BadgeDefinition>,
}

/// 徽章目录
///
/// 启动时加载一次后以 `Arc<BadgeCatalog>` 注入服务，测试中可替换为自定义目录。
#[derive(Debug, Clone)]
pub struct BadgeCatalog {
    badges: Vec<BadgeDefinition>,
}

impl BadgeCatalog {
    pub fn new(badges: Vec<BadgeDefinition>) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for badge in &badges {
            if badge.code.trim().is_empty() {
                return Err(AppError::ConfigError("Badge code must not be empty".into()));
            }
            if !seen.insert(badge.code.as_str()) {
                return Err(AppError::ConfigError(format!(
                    "Duplicate badge code in catalog: {}",
                    badge.code
                )));
            }
        }
        Ok(Self { badges })
    }

    /// 从 TOML 文本加载，格式为若干 `[[badges]]` 表
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse badge catalog: {e}")))?;
        Self::new(file.badges)
    }

    /// 指定了路径则读取文件，否则使用内置目录
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    AppError::ConfigError(format!("Failed to read badge catalog {path}: {e}"))
                })?;
                let catalog = Self::from_toml_str(&content)?;
                log::info!(
                    "Loaded {} badges from catalog file {}",
                    catalog.len(),
                    path
                );
                Ok(catalog)
            }
            None => Ok(Self::builtin()),
        }
    }

    pub fn all(&self) -> &[BadgeDefinition] {
        &self.badges
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&BadgeDefinition> {
        self.badges.iter().find(|b| b.code == code)
    }

    pub fn by_rarity(&self, tier: RarityTier) -> impl Iterator<Item = &BadgeDefinition> + '_ {
        self.badges.iter().filter(move |b| b.rarity == tier)
    }

    /// 没有任何徽章的稀有度
    pub fn missing_tiers(&self) -> Vec<RarityTier> {
        RarityTier::ALL
            .into_iter()
            .filter(|tier| self.by_rarity(*tier).next().is_none())
            .collect()
    }

    /// 每个可能抽到的稀有度都必须至少有一个徽章，否则属于部署配置错误
    pub fn ensure_full_coverage(&self) -> AppResult<()> {
        let missing = self.missing_tiers();
        if missing.is_empty() {
            return Ok(());
        }
        let tiers: Vec<String> = missing.iter().map(|t| t.value().to_string()).collect();
        Err(AppError::CatalogMisconfigured(format!(
            "No badges configured for rarity tier(s): {}",
            tiers.join(", ")
        )))
    }

    /// 内置拉面徽章目录
    pub fn builtin() -> Self {
        let badge = |code: &str,
                     name: &str,
                     description: &str,
                     icon: &str,
                     rarity: RarityTier,
                     category: &str| BadgeDefinition {
            code: code.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            rarity,
            category: category.to_string(),
        };

        let badges = vec![
            // ★1
            badge(
                "gacha_nori_sheet",
                "Nori Sheet",
                "A crisp sheet of nori leaning on the rim of the bowl.",
                "🟩",
                RarityTier::Common,
                "topping",
            ),
            badge(
                "gacha_green_onion",
                "Green Onion",
                "Freshly sliced negi, the everyday hero.",
                "🧅",
                RarityTier::Common,
                "topping",
            ),
            badge(
                "gacha_menma",
                "Menma",
                "Fermented bamboo shoots with a satisfying crunch.",
                "🎋",
                RarityTier::Common,
                "topping",
            ),
            badge(
                "gacha_shoyu_sip",
                "Shoyu Sip",
                "The first spoonful of a clear soy-sauce broth.",
                "🥄",
                RarityTier::Common,
                "soup",
            ),
            // ★2
            badge(
                "gacha_ajitama",
                "Ajitama",
                "A marinated egg with a jammy golden yolk.",
                "🥚",
                RarityTier::Uncommon,
                "topping",
            ),
            badge(
                "gacha_chashu",
                "Chashu",
                "Slow-braised pork belly that melts on the tongue.",
                "🥓",
                RarityTier::Uncommon,
                "topping",
            ),
            badge(
                "gacha_shio_clarity",
                "Shio Clarity",
                "A salt broth so clear you can read the bowl's pattern.",
                "🧂",
                RarityTier::Uncommon,
                "soup",
            ),
            // ★3
            badge(
                "gacha_kaedama",
                "Kaedama",
                "Ordered a second serving of noodles without hesitation.",
                "🍜",
                RarityTier::Rare,
                "noodle",
            ),
            badge(
                "gacha_tsukemen_dip",
                "Tsukemen Dip",
                "Thick noodles dipped into a rich concentrated broth.",
                "🥢",
                RarityTier::Rare,
                "noodle",
            ),
            badge(
                "gacha_miso_depth",
                "Miso Depth",
                "A hearty miso broth from the northern winter.",
                "🫕",
                RarityTier::Rare,
                "soup",
            ),
            // ★4
            badge(
                "gacha_tonkotsu_cloud",
                "Tonkotsu Cloud",
                "A pork-bone broth boiled until it turned creamy white.",
                "☁️",
                RarityTier::Epic,
                "soup",
            ),
            badge(
                "gacha_jiro_mountain",
                "Jiro Mountain",
                "A towering heap of bean sprouts, garlic and back fat.",
                "⛰️",
                RarityTier::Epic,
                "special",
            ),
            // ★5
            badge(
                "gacha_golden_bowl",
                "Golden Bowl",
                "The legendary bowl only a lucky few have ever seen.",
                "🏆",
                RarityTier::Legendary,
                "special",
            ),
            badge(
                "gacha_ramen_sage",
                "Ramen Sage",
                "Enlightenment reached at the bottom of the bowl.",
                "🧘",
                RarityTier::Legendary,
                "special",
            ),
        ];

        Self { badges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_covers_all_tiers() {
        let catalog = BadgeCatalog::builtin();
        assert!(catalog.ensure_full_coverage().is_ok());
        assert!(BadgeCatalog::new(catalog.all().to_vec()).is_ok());
        for tier in RarityTier::ALL {
            assert!(catalog.by_rarity(tier).count() >= 1);
        }
    }

    #[test]
    fn test_missing_tier_is_reported() {
        let badges: Vec<BadgeDefinition> = BadgeCatalog::builtin()
            .all()
            .iter()
            .filter(|b| b.rarity != RarityTier::Epic)
            .cloned()
            .collect();
        let catalog = BadgeCatalog::new(badges).unwrap();
        assert_eq!(catalog.missing_tiers(), vec![RarityTier::Epic]);
        assert!(matches!(
            catalog.ensure_full_coverage(),
            Err(AppError::CatalogMisconfigured(_))
        ));
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let first = BadgeCatalog::builtin().all()[0].clone();
        let result = BadgeCatalog::new(vec![first.clone(), first]);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_from_toml_str() {
        let content = r#"
[[badges]]
code = "bowl"
name = "Bowl"
description = "Just a bowl"
icon = "🍜"
rarity = 1
category = "misc"

[[badges]]
code = "gold"
name = "Gold"
description = "Shiny"
icon = "🏆"
rarity = 5
category = "special"
"#;
        let catalog = BadgeCatalog::from_toml_str(content).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("gold").unwrap().rarity, RarityTier::Legendary);
        assert!(catalog.get("silver").is_none());
        assert_eq!(
            catalog.missing_tiers(),
            vec![RarityTier::Uncommon, RarityTier::Rare, RarityTier::Epic]
        );
    }

    #[test]
    fn test_from_toml_rejects_invalid_rarity() {
        let content = r#"
[[badges]]
code = "bowl"
name = "Bowl"
description = "Just a bowl"
icon = "🍜"
rarity = 7
category = "misc"
"#;
        assert!(matches!(
            BadgeCatalog::from_toml_str(content),
            Err(AppError::ConfigError(_))
        ));
    }
}
