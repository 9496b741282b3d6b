use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{AppError, AppResult};
use crate::services::ocr::ImageUpload;

/// 目录展开时收集的扩展名；不支持的图片格式也会被收集，随后由验证整批拒绝
const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "gif", "webp", "bmp", "heic", "tiff"];

pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
}

fn looks_like_image(path: &Path) -> bool {
    get_extension(path)
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// 展开命令行给出的路径
///
/// 文件原样保留；目录只展开一层，取其中的图片文件并按文件名排序。
pub fn collect_image_paths(inputs: &[PathBuf]) -> AppResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| !is_hidden(path) && looks_like_image(path))
                .collect();
            tracing::debug!(dir = %input.display(), count = found.len(), "Collected images from directory");
            paths.append(&mut found);
        } else if input.is_file() {
            paths.push(input.clone());
        } else {
            return Err(AppError::Validation(format!(
                "文件不存在: {}",
                input.display()
            )));
        }
    }
    Ok(paths)
}

/// 读取所有图片；任何一个文件读取失败都会中止
pub fn load_uploads(paths: &[PathBuf]) -> AppResult<Vec<ImageUpload>> {
    paths.iter().map(|path| ImageUpload::from_path(path)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn directories_expand_one_level_sorted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.png"), b"b").unwrap();
        fs::write(dir.path().join("a.JPG"), b"a").unwrap();
        fs::write(dir.path().join("c.gif"), b"c").unwrap();
        fs::write(dir.path().join("notes.txt"), b"n").unwrap();
        fs::write(dir.path().join(".hidden.png"), b"h").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("d.png"), b"d").unwrap();

        let paths = collect_image_paths(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png", "c.gif"]);
    }

    #[test]
    fn explicit_files_are_kept_and_missing_ones_fail() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("label.txt");
        fs::write(&file, b"x").unwrap();

        let paths = collect_image_paths(&[file.clone()]).unwrap();
        assert_eq!(paths, vec![file]);
        assert!(collect_image_paths(&[dir.path().join("missing.png")]).is_err());
    }

    #[test]
    fn test_get_extension() {
        assert_eq!(get_extension(Path::new("a/B.PNG")).as_deref(), Some("png"));
        assert_eq!(get_extension(Path::new("README")), None);
    }
}
