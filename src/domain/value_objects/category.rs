use serde::{Deserialize, Serialize};
use std::fmt;

/// 投稿カテゴリ
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Workout,
    Diet,
    Routine,
    Free,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Workout,
        Category::Diet,
        Category::Routine,
        Category::Free,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Workout => "workout",
            Category::Diet => "diet",
            Category::Routine => "routine",
            Category::Free => "free",
        }
    }

    /// 名前からカテゴリを引く（大文字小文字は区別しない）
    pub fn find(name: &str) -> Option<Self> {
        let needle = name.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_is_case_insensitive() {
        assert_eq!(Category::find("Workout"), Some(Category::Workout));
        assert_eq!(Category::find(" DIET "), Some(Category::Diet));
        assert_eq!(Category::find("cooking"), None);
    }

    #[test]
    fn every_category_round_trips_by_name() {
        for category in Category::ALL {
            assert_eq!(Category::find(category.name()), Some(category));
        }
    }
}
