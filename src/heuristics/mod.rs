//! Unit-label inference for items without an explicit configured label.
//!
//! The rules are an ordered table evaluated top to bottom, first match
//! wins. Precedence matters: loose ("バラ") compounds must outrank the
//! bagged base item they contain, so they sit above it.

use crate::docstore::DocumentStore;
use crate::units::UnitMaster;

/// Stem-equivalent label, used for loose produce.
pub const LABEL_STEM: &str = "本";
/// Bag-equivalent label, used for bagged produce.
pub const LABEL_BAG: &str = "袋";

const LOOSE_MARKERS: &[&str] = &["バラ", "ばら"];
const LOOSE_NEGI: &[&str] = &["長ねぎバラ", "長ネギバラ", "ネギバラ", "ねぎバラ", "長ねぎばら"];
const LOOSE_CUCUMBER: &[&str] = &["胡瓜バラ", "きゅうりバラ", "キュウリバラ", "胡瓜ばら"];
const BAGGED_LEAFY: &[&str] = &["春菊", "青梗菜", "チンゲン菜"];

struct LabelRule {
    applies: fn(item: &str, spec: &str) -> bool,
    label: &'static str,
}

const RULES: &[LabelRule] = &[
    // loose long negi, sold by the stem
    LabelRule {
        applies: |item, _| contains_any(item, LOOSE_NEGI),
        label: LABEL_STEM,
    },
    // bagged negi
    LabelRule {
        applies: |item, _| {
            (item.contains("ネギ") || item.contains("ねぎ")) && !contains_any(item, LOOSE_MARKERS)
        },
        label: LABEL_BAG,
    },
    // loose cucumber
    LabelRule {
        applies: |item, _| contains_any(item, LOOSE_CUCUMBER),
        label: LABEL_STEM,
    },
    // bagged cucumber
    LabelRule {
        applies: |item, _| {
            (item.contains("胡瓜") || item.contains("きゅうり"))
                && !contains_any(item, LOOSE_MARKERS)
        },
        label: LABEL_BAG,
    },
    // a loose marker in the spec column means stems regardless of item
    LabelRule {
        applies: |_, spec| contains_any(spec, LOOSE_MARKERS),
        label: LABEL_STEM,
    },
    // leafy vegetables always ship bagged
    LabelRule {
        applies: |item, _| contains_any(item, BAGGED_LEAFY),
        label: LABEL_BAG,
    },
];

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// Label from the rule table alone. Falls back to the stem label when no
/// rule matches.
pub fn infer_unit_label(item: &str, spec: &str) -> &'static str {
    RULES
        .iter()
        .find(|rule| (rule.applies)(item, spec))
        .map(|rule| rule.label)
        .unwrap_or(LABEL_STEM)
}

/// Label for a record: an explicitly configured item setting wins, the
/// rule table covers everything else.
pub fn unit_label<S: DocumentStore>(master: &UnitMaster<S>, item: &str, spec: &str) -> String {
    match master.explicit_unit_type(item) {
        Some(label) => label,
        None => infer_unit_label(item, spec).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docstore::MemoryStore;
    use crate::units::ItemSetting;

    #[test]
    fn test_loose_compounds_outrank_base_items() {
        assert_eq!(infer_unit_label("長ネギバラ", ""), LABEL_STEM);
        assert_eq!(infer_unit_label("ネギバラ", ""), LABEL_STEM);
        assert_eq!(infer_unit_label("長ネギ", ""), LABEL_BAG);
        assert_eq!(infer_unit_label("胡瓜バラ", ""), LABEL_STEM);
        assert_eq!(infer_unit_label("きゅうり", ""), LABEL_BAG);
    }

    #[test]
    fn test_loose_marker_in_spec() {
        // the bagged-cucumber item rule sits above the spec rule
        assert_eq!(infer_unit_label("胡瓜", "バラ"), LABEL_BAG);
        assert_eq!(infer_unit_label("人参", "バラ"), LABEL_STEM);
        assert_eq!(infer_unit_label("人参", "ばら"), LABEL_STEM);
    }

    #[test]
    fn test_leafy_items_bag_and_default_stem() {
        assert_eq!(infer_unit_label("春菊", ""), LABEL_BAG);
        assert_eq!(infer_unit_label("青梗菜", ""), LABEL_BAG);
        assert_eq!(infer_unit_label("チンゲン菜", ""), LABEL_BAG);
        assert_eq!(infer_unit_label("人参", ""), LABEL_STEM);
    }

    #[test]
    fn test_explicit_setting_wins() {
        let mut master = UnitMaster::new(MemoryStore::new());
        master.set_item_setting(
            "大根",
            ItemSetting {
                default_unit: 10,
                unit_type: "袋".to_string(),
                receive_as_boxes: false,
            },
        );
        assert_eq!(unit_label(&master, "大根", ""), "袋");
        // no setting stored, cascade decides
        assert_eq!(unit_label(&master, "人参", ""), "本");
    }
}
