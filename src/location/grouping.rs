use std::collections::HashMap;

use serde::Serialize;

/// 同地点判定精度：经纬度保留小数点后 5 位（约 1.1 米）
pub const LOCATION_PRECISION: usize = 5;

/// 带坐标的记录，分组和同地点导航都基于它
pub trait Located {
    fn id(&self) -> &str;
    fn lat(&self) -> f64;
    fn lng(&self) -> f64;
}

/// 非有限值按 0 处理，坏数据会并到 (0, 0) 这一组
pub(crate) fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// 保留 5 位小数，恰好在中点时远离零取整；结果为 0 时去掉负号
fn round_coordinate(v: f64) -> f64 {
    let scale = 10f64.powi(LOCATION_PRECISION as i32);
    let rounded = (finite_or_zero(v) * scale).round() / scale;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// 地点键，形如 `39.90420_116.40740`
pub fn location_key(lat: f64, lng: f64) -> String {
    format!(
        "{:.prec$}_{:.prec$}",
        round_coordinate(lat),
        round_coordinate(lng),
        prec = LOCATION_PRECISION
    )
}

/// 同一地点的一组照片（不落库，每次取列表时重新计算）
#[derive(Debug, Clone, Serialize)]
pub struct LocationGroup<T> {
    pub key: String,
    pub lat: f64,
    pub lng: f64,
    pub photos: Vec<T>,
}

impl<T: Located> LocationGroup<T> {
    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// 组内照片 ID，顺序与输入顺序一致，可直接作为导航的兄弟列表
    pub fn photo_ids(&self) -> Vec<String> {
        self.photos.iter().map(|p| p.id().to_string()).collect()
    }
}

/// 按地点分组。
///
/// 组内顺序保持输入顺序；组的顺序按键第一次出现的顺序；
/// 代表坐标取组内第一张照片的坐标，不求质心。
pub fn group_by_location<T, I>(photos: I) -> Vec<LocationGroup<T>>
where
    T: Located,
    I: IntoIterator<Item = T>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<LocationGroup<T>> = Vec::new();

    for photo in photos {
        let key = location_key(photo.lat(), photo.lng());
        match index.get(&key) {
            Some(&i) => groups[i].photos.push(photo),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(LocationGroup {
                    key,
                    lat: finite_or_zero(photo.lat()),
                    lng: finite_or_zero(photo.lng()),
                    photos: vec![photo],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct Pin {
        pub id: String,
        pub lat: f64,
        pub lng: f64,
    }

    pub(crate) fn pin(id: &str, lat: f64, lng: f64) -> Pin {
        Pin {
            id: id.to_string(),
            lat,
            lng,
        }
    }

    impl Located for Pin {
        fn id(&self) -> &str {
            &self.id
        }
        fn lat(&self) -> f64 {
            self.lat
        }
        fn lng(&self) -> f64 {
            self.lng
        }
    }

    #[test]
    fn empty_input_gives_no_groups() {
        let groups = group_by_location(Vec::<Pin>::new());
        assert!(groups.is_empty());
    }

    #[test]
    fn differences_beyond_fifth_decimal_collapse() {
        let groups = group_by_location(vec![
            pin("a", 39.904200, 116.407400),
            pin("b", 39.9042001, 116.40740001),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "39.90420_116.40740");
        assert_eq!(groups[0].photo_ids(), vec!["a", "b"]);
    }

    #[test]
    fn differences_at_fifth_decimal_split() {
        let groups = group_by_location(vec![
            pin("a", 39.90420, 116.40740),
            pin("b", 39.90421, 116.40740),
        ]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn representative_is_first_member_and_order_is_first_seen() {
        let groups = group_by_location(vec![
            pin("p1", 31.2304, 121.4737),
            pin("p2", 39.9042, 116.4074),
            pin("p3", 31.2304000004, 121.4737),
            pin("p4", 22.5431, 114.0579),
        ]);
        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["31.23040_121.47370", "39.90420_116.40740", "22.54310_114.05790"]
        );
        assert_eq!(groups[0].lat, 31.2304);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0].photo_ids(), vec!["p1", "p3"]);
    }

    #[test]
    fn non_finite_coordinates_merge_at_origin() {
        let groups = group_by_location(vec![
            pin("nan", f64::NAN, 10.0),
            pin("inf", 0.0, f64::INFINITY),
            pin("zero", 0.0, 0.0),
            pin("ten", 0.0, 10.0),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "0.00000_10.00000");
        assert_eq!(groups[0].photo_ids(), vec!["nan", "ten"]);
        assert_eq!(groups[1].key, "0.00000_0.00000");
        assert_eq!(groups[1].photo_ids(), vec!["inf", "zero"]);
    }

    #[test]
    fn signed_zero_shares_one_group() {
        let groups = group_by_location(vec![
            pin("pos", 0.0, 10.0),
            pin("neg", -0.0, 10.0),
            pin("tiny", -0.000004, 10.0),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "0.00000_10.00000");
        assert_eq!(groups[0].photo_ids(), vec!["pos", "neg", "tiny"]);
        assert_eq!(location_key(-0.0, -0.0), "0.00000_0.00000");
    }

    #[test]
    fn exact_midpoint_rounds_away_from_zero() {
        // 39.015625 = 39 + 1/64，浮点数能精确表示
        assert_eq!(location_key(39.015625, 116.015625), "39.01563_116.01563");
        assert_eq!(location_key(-33.015625, -70.015625), "-33.01563_-70.01563");
        assert_eq!(location_key(39.904204, 116.407396), "39.90420_116.40740");
    }

    #[test]
    fn flattening_and_regrouping_is_a_fixed_point() {
        let photos = vec![
            pin("a", 1.0, 2.0),
            pin("b", 3.0, 4.0),
            pin("c", 1.000001, 2.0),
            pin("d", 5.0, 6.0),
            pin("e", 3.0, 4.000002),
        ];
        let groups = group_by_location(photos.clone());

        let flattened: Vec<Pin> = groups.iter().flat_map(|g| g.photos.clone()).collect();
        assert_eq!(flattened.len(), photos.len());
        for p in &photos {
            assert!(flattened.contains(p));
        }

        let regrouped = group_by_location(flattened);
        let before: Vec<_> = groups.iter().map(|g| (g.key.clone(), g.photo_ids())).collect();
        let after: Vec<_> = regrouped
            .iter()
            .map(|g| (g.key.clone(), g.photo_ids()))
            .collect();
        assert_eq!(before, after);
    }
}
