use serde::Serialize;

use super::grouping::{Located, location_key};

/// 两张照片的经纬度在小数点后 5 位上分别相同即视为同一地点
pub fn same_location<A: Located + ?Sized, B: Located + ?Sized>(a: &A, b: &B) -> bool {
    location_key(a.lat(), a.lng()) == location_key(b.lat(), b.lng())
}

/// 确定同地点照片列表。
///
/// 调用方给出显式列表（例如从地图红点点进来时携带的列表）就原样使用，
/// 保留用户看到的顺序；否则从全部照片里按同地点过滤，保持原有顺序。
pub fn resolve_siblings<T, C>(current: &C, explicit: Option<Vec<String>>, all: &[T]) -> Vec<String>
where
    T: Located,
    C: Located + ?Sized,
{
    match explicit {
        Some(ids) => ids,
        None => all
            .iter()
            .filter(|candidate| same_location(*candidate, current))
            .map(|candidate| candidate.id().to_string())
            .collect(),
    }
}

/// 同地点照片间的前后翻页状态。
///
/// 兄弟列表在一次浏览中固定不变，翻页只移动当前 ID。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingNavigator {
    siblings: Vec<String>,
    current: String,
}

impl SiblingNavigator {
    pub fn new(current: impl Into<String>, siblings: Vec<String>) -> Self {
        Self {
            siblings,
            current: current.into(),
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn siblings(&self) -> &[String] {
        &self.siblings
    }

    /// 当前 ID 不在列表中时为 None，此时翻页不可用
    pub fn current_index(&self) -> Option<usize> {
        self.siblings.iter().position(|id| *id == self.current)
    }

    pub fn has_prev(&self) -> bool {
        self.siblings.len() > 1 && matches!(self.current_index(), Some(i) if i > 0)
    }

    pub fn has_next(&self) -> bool {
        self.siblings.len() > 1
            && matches!(self.current_index(), Some(i) if i < self.siblings.len() - 1)
    }

    pub fn prev_id(&self) -> Option<&str> {
        if !self.has_prev() {
            return None;
        }
        let i = self.current_index()?;
        self.siblings.get(i - 1).map(String::as_str)
    }

    pub fn next_id(&self) -> Option<&str> {
        if !self.has_next() {
            return None;
        }
        let i = self.current_index()?;
        self.siblings.get(i + 1).map(String::as_str)
    }

    /// 移到上一张，列表原样带过去
    pub fn go_prev(&self) -> Option<Self> {
        self.prev_id()
            .map(|id| Self::new(id, self.siblings.clone()))
    }

    pub fn go_next(&self) -> Option<Self> {
        self.next_id()
            .map(|id| Self::new(id, self.siblings.clone()))
    }

    pub fn summary(&self) -> NavigationSummary {
        NavigationSummary {
            photo_id: self.current.clone(),
            sibling_ids: self.siblings.clone(),
            current_index: self.current_index(),
            prev_id: self.prev_id().map(str::to_string),
            next_id: self.next_id().map(str::to_string),
            has_prev: self.has_prev(),
            has_next: self.has_next(),
        }
    }
}

/// `GET /photos/{id}/siblings` 的返回内容
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSummary {
    pub photo_id: String,
    pub sibling_ids: Vec<String>,
    pub current_index: Option<usize>,
    pub prev_id: Option<String>,
    pub next_id: Option<String>,
    pub has_prev: bool,
    pub has_next: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::grouping::tests::pin;

    fn abc() -> Vec<String> {
        vec!["A".into(), "B".into(), "C".into()]
    }

    #[test]
    fn first_sibling_can_only_go_forward() {
        let nav = SiblingNavigator::new("A", abc());
        assert_eq!(nav.current_index(), Some(0));
        assert!(!nav.has_prev());
        assert!(nav.has_next());
        assert!(nav.go_prev().is_none());

        let next = nav.go_next().unwrap();
        assert_eq!(next.current(), "B");
        assert_eq!(next.siblings(), abc().as_slice());
    }

    #[test]
    fn last_sibling_can_only_go_back() {
        let nav = SiblingNavigator::new("C", abc());
        assert!(nav.has_prev());
        assert!(!nav.has_next());
        assert_eq!(nav.go_prev().unwrap().current(), "B");
        assert!(nav.go_next().is_none());
    }

    #[test]
    fn walking_forward_then_back_returns_to_start() {
        let nav = SiblingNavigator::new("A", abc());
        let end = nav.go_next().and_then(|n| n.go_next()).unwrap();
        assert_eq!(end.current(), "C");
        let back = end.go_prev().and_then(|n| n.go_prev()).unwrap();
        assert_eq!(back, nav);
    }

    #[test]
    fn absent_id_disables_navigation() {
        let nav = SiblingNavigator::new("Z", abc());
        assert_eq!(nav.current_index(), None);
        assert!(!nav.has_prev());
        assert!(!nav.has_next());
        assert!(nav.go_next().is_none());

        let summary = nav.summary();
        assert_eq!(summary.current_index, None);
        assert_eq!(summary.prev_id, None);
        assert_eq!(summary.next_id, None);
    }

    #[test]
    fn single_sibling_has_no_neighbours() {
        let nav = SiblingNavigator::new("A", vec!["A".into()]);
        assert_eq!(nav.current_index(), Some(0));
        assert!(!nav.has_prev());
        assert!(!nav.has_next());
    }

    #[test]
    fn explicit_list_is_used_verbatim() {
        let all = vec![pin("x", 1.0, 1.0), pin("y", 1.0, 1.0)];
        let explicit = vec!["y".to_string(), "unrelated".to_string(), "x".to_string()];
        let siblings = resolve_siblings(&all[0], Some(explicit.clone()), &all);
        assert_eq!(siblings, explicit);
    }

    #[test]
    fn derived_list_filters_by_location_in_fetch_order() {
        let all = vec![
            pin("new", 39.9042, 116.4074),
            pin("elsewhere", 31.2304, 121.4737),
            pin("old", 39.90420004, 116.4074),
        ];
        let current = pin("old", 39.90420004, 116.4074);
        let siblings = resolve_siblings(&current, None, &all);
        assert_eq!(siblings, vec!["new".to_string(), "old".to_string()]);

        let nav = SiblingNavigator::new("old", siblings);
        assert_eq!(nav.prev_id(), Some("new"));
        assert!(!nav.has_next());
    }

    #[test]
    fn summary_serializes_in_camel_case() {
        let summary = SiblingNavigator::new("B", abc()).summary();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["photoId"], "B");
        assert_eq!(json["currentIndex"], 1);
        assert_eq!(json["prevId"], "A");
        assert_eq!(json["nextId"], "C");
        assert_eq!(json["hasPrev"], true);
        assert_eq!(json["hasNext"], true);
    }
}
