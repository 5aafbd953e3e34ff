use std::f64::consts::PI;

/// 克拉索夫斯基椭球长半轴
const A: f64 = 6378245.0;
/// 偏心率平方
const EE: f64 = 0.00669342162296594323;

/// 中国境内粗略边界（用于判断是否需要偏移）
const CHINA_LAT_MIN: f64 = 18.0;
const CHINA_LAT_MAX: f64 = 54.0;
const CHINA_LNG_MIN: f64 = 73.0;
const CHINA_LNG_MAX: f64 = 135.0;

pub fn is_in_china(lat: f64, lng: f64) -> bool {
    (CHINA_LAT_MIN..=CHINA_LAT_MAX).contains(&lat) && (CHINA_LNG_MIN..=CHINA_LNG_MAX).contains(&lng)
}

fn transform_lat(x: f64, y: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * x + 3.0 * y + 0.2 * y * y + 0.1 * x * y + 0.2 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (y * PI).sin() + 40.0 * (y / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (y / 12.0 * PI).sin() + 320.0 * (y * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

fn transform_lng(x: f64, y: f64) -> f64 {
    let mut ret = 300.0 + x + 2.0 * y + 0.1 * x * x + 0.1 * x * y + 0.1 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (x * PI).sin() + 40.0 * (x / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (x / 12.0 * PI).sin() + 300.0 * (x / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}

/// WGS-84 转 GCJ-02，用于在国内底图上正确显示点位。
///
/// 不检查坐标是否在中国境内，境外坐标的结果没有意义，调用方需要先用
/// [`is_in_china`] 判断。NaN 输入得到 NaN 输出。
pub fn wgs84_to_gcj02(lat: f64, lng: f64) -> (f64, f64) {
    let d_lat = transform_lat(lng - 105.0, lat - 35.0);
    let d_lng = transform_lng(lng - 105.0, lat - 35.0);

    let rad_lat = lat / 180.0 * PI;
    let magic = 1.0 - EE * rad_lat.sin().powi(2);
    let sqrt_magic = magic.sqrt();

    let d_lat = d_lat * 180.0 / ((A * (1.0 - EE)) / (magic * sqrt_magic) * PI);
    let d_lng = d_lng * 180.0 / (A / sqrt_magic * rad_lat.cos() * PI);

    (lat + d_lat, lng + d_lng)
}

/// 地图展示用坐标：境内做 GCJ-02 偏移，境外原样返回
pub fn to_display_coordinate(lat: f64, lng: f64) -> (f64, f64) {
    if is_in_china(lat, lng) {
        wgs84_to_gcj02(lat, lng)
    } else {
        (lat, lng)
    }
}
