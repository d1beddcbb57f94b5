//! Follow-up question suggestions from fixed per-family templates.

use std::collections::HashSet;

use crate::catalog::ItemInfo;
use crate::tokens::overlap_count;

const SHIPPING: &str = "배송/교환/반품은 어떻게 되나요?";

/// Template questions for an item (or the item-less fallback).
///
/// The family is picked by keyword in the item name or category.
pub fn template_questions(item: Option<&ItemInfo>) -> Vec<String> {
    let Some(item) = item else {
        return vec![
            "이 제품의 핵심 특징을 알려주세요".into(),
            "구성품/옵션은 어떻게 되나요?".into(),
            "사이즈/무게는 어느 정도인가요?".into(),
            "사용/관리 방법을 알려주세요".into(),
            SHIPPING.into(),
        ];
    };

    let name = item.name.trim();
    let name = if name.is_empty() { "제품" } else { name };
    let has = |kw: &str| name.contains(kw) || item.category.as_deref().is_some_and(|c| c.contains(kw));

    let per_item: [&str; 4] = if has("이불") {
        [
            "소재는 무엇인가요?",
            "세탁/관리 방법은 어떻게 되나요?",
            "사이즈/구성 옵션을 알려주세요",
            "두께감/계절감은 어떤가요?",
        ]
    } else if has("쌀국수") {
        [
            "조리 방법을 알려주세요",
            "매운 정도가 어떤가요?",
            "보관/유통기한은 어떻게 되나요?",
            "1인분 기준 양이 어느 정도인가요?",
        ]
    } else {
        [
            "핵심 특징을 알려주세요",
            "구성품/옵션은 어떻게 되나요?",
            "사이즈/무게는 어느 정도인가요?",
            "사용/관리 방법을 알려주세요",
        ]
    };

    per_item
        .iter()
        .map(|q| format!("{name} {q}"))
        .chain(std::iter::once(SHIPPING.to_string()))
        .collect()
}

/// Up to `top_k` unseen template questions, most query-like first.
///
/// Ties keep template order. Never fails; may return an empty list.
pub fn suggest_related_questions(
    query: &str,
    item: Option<&ItemInfo>,
    asked: &[String],
    top_k: usize,
    stop: &HashSet<String>,
) -> Vec<String> {
    let asked: HashSet<&str> = asked.iter().map(|q| q.trim()).collect();

    let mut scored: Vec<(usize, String)> = template_questions(item)
        .into_iter()
        .filter(|q| !asked.contains(q.as_str()))
        .map(|q| (overlap_count(query, &q, stop), q))
        .collect();

    // stable: equal scores keep template order
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(top_k).map(|(_, q)| q).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::DEFAULT_STOP_TOKENS;

    fn stop() -> HashSet<String> {
        DEFAULT_STOP_TOKENS.iter().map(|s| s.to_string()).collect()
    }

    fn item(name: &str, category: Option<&str>) -> ItemInfo {
        ItemInfo {
            name: name.into(),
            category: category.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn picks_template_family() {
        let duvet = template_questions(Some(&item("구스 이불", None)));
        assert_eq!(duvet[0], "구스 이불 소재는 무엇인가요?");
        assert_eq!(duvet[4], SHIPPING);

        let noodle = template_questions(Some(&item("간편식", Some("쌀국수"))));
        assert_eq!(noodle[1], "간편식 매운 정도가 어떤가요?");

        let generic = template_questions(Some(&item("텀블러", None)));
        assert_eq!(generic[0], "텀블러 핵심 특징을 알려주세요");

        assert_eq!(template_questions(None)[0], "이 제품의 핵심 특징을 알려주세요");
    }

    #[test]
    fn ranks_by_overlap_with_stable_ties() {
        let it = item("구스 이불", None);
        let out = suggest_related_questions("세탁 어떻게 해요?", Some(&it), &[], 2, &stop());
        assert_eq!(
            out,
            vec![
                "구스 이불 세탁/관리 방법은 어떻게 되나요?".to_string(),
                "구스 이불 소재는 무엇인가요?".to_string(),
            ]
        );
    }

    #[test]
    fn excludes_asked_and_respects_top_k() {
        let asked = vec![" 이 제품의 핵심 특징을 알려주세요 ".to_string()];
        let out = suggest_related_questions("", None, &asked, 3, &stop());
        assert_eq!(out.len(), 3);
        assert!(!out.iter().any(|q| q.trim() == asked[0].trim()));

        assert!(suggest_related_questions("x", None, &[], 0, &stop()).is_empty());

        let all: Vec<String> = template_questions(None);
        assert!(suggest_related_questions("배송", None, &all, 2, &stop()).is_empty());
    }
}
