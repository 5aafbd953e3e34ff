use std::path::{Path, PathBuf};

use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// 上传文件名：`{毫秒时间戳}-{随机串}{扩展名}`，扩展名取原文件名，缺省 `.jpg`
pub fn upload_file_name(original: Option<&str>) -> String {
    let ext = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| ".jpg".to_string());

    let mut rng = rand::thread_rng();
    let suffix: String = (0..10)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    format!("{}-{}{}", chrono::Utc::now().timestamp_millis(), suffix, ext)
}

/// 把上传的图片写到上传目录，返回对外访问路径 `/uploads/{文件名}`
pub async fn save_upload(
    dir: &Path,
    original: Option<&str>,
    bytes: &[u8],
) -> std::io::Result<String> {
    tokio::fs::create_dir_all(dir).await?;

    let file_name = upload_file_name(original);
    let path: PathBuf = dir.join(&file_name);
    tokio::fs::write(&path, bytes).await?;

    tracing::debug!("Saved upload to {}", path.display());
    Ok(format!("/uploads/{}", file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_keeps_extension() {
        let name = upload_file_name(Some("IMG_0001.JPG"));
        assert!(name.ends_with(".jpg"), "{name}");

        let (millis, rest) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest.len(), 10 + ".jpg".len());
    }

    #[test]
    fn missing_or_odd_extension_defaults_to_jpg() {
        assert!(upload_file_name(None).ends_with(".jpg"));
        assert!(upload_file_name(Some("photo")).ends_with(".jpg"));
        assert!(upload_file_name(Some("a.p/ng")).ends_with(".jpg"));
        assert!(upload_file_name(Some("shot.heic")).ends_with(".heic"));
    }

    #[tokio::test]
    async fn save_upload_writes_into_dir() {
        let dir = tempfile::tempdir().unwrap();
        let url = save_upload(dir.path(), Some("a.png"), b"fake image").await.unwrap();

        let file_name = url.strip_prefix("/uploads/").unwrap();
        let written = tokio::fs::read(dir.path().join(file_name)).await.unwrap();
        assert_eq!(written, b"fake image");
    }
}
