//! 地点相关的纯计算：坐标偏移、按地点分组、同地点照片翻页

mod grouping;
mod navigation;
mod transform;

pub use grouping::{LOCATION_PRECISION, LocationGroup, Located, group_by_location, location_key};
pub use navigation::{NavigationSummary, SiblingNavigator, resolve_siblings, same_location};
pub use transform::{is_in_china, to_display_coordinate, wgs84_to_gcj02};
